// ABOUTME: Converts raw user restrictions into canonical ban records
// ABOUTME: Moderator attribution follows the ban tooling's "Moderator - <name>; <reason>" convention

use crate::model::{BanRecord, UserRestriction, PERMANENT};
use crate::{Error, Result};
use chrono::SecondsFormat;

const MODERATOR_MARKER: &str = "Moderator - ";
const REASON_SEPARATOR: &str = "; ";
pub const MANUAL_BAN: &str = "Manual Ban";

/// Moderator name and internal reason pulled out of a private reason string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub moderator: String,
    pub reason: String,
}

/// Splits a private reason into moderator and reason.
///
/// | private reason                    | moderator     | reason             |
/// |-----------------------------------|---------------|--------------------|
/// | `... Moderator - <name>; <why>`   | `<name>`      | `<why>`            |
/// | `... Moderator - <name>`          | `<name>`      | `displayed_reason` |
/// | anything else                     | `Manual Ban`  | the private reason |
///
/// An empty name after the marker is attributed to `Manual Ban` so that
/// every record carries a moderator.
pub fn extract_moderator(private_reason: &str, displayed_reason: &str) -> Attribution {
    let Some((_, segment)) = private_reason.split_once(MODERATOR_MARKER) else {
        return Attribution {
            moderator: MANUAL_BAN.into(),
            reason: private_reason.into(),
        };
    };

    let (name, reason) = match segment.split_once(REASON_SEPARATOR) {
        Some((name, reason)) => (name, reason),
        None => (segment, displayed_reason),
    };

    let moderator = if name.is_empty() { MANUAL_BAN } else { name };

    Attribution {
        moderator: moderator.into(),
        reason: reason.into(),
    }
}

/// Second segment of a `users/<id>` reference.
pub fn user_id_from_reference(reference: &str) -> Result<String> {
    match reference.split('/').nth(1) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(Error::MalformedReference(reference.into())),
    }
}

/// Builds the canonical record for one restriction.
///
/// Creation is RFC 3339 UTC, or empty when the upstream start time is absent
/// or unparseable. Exports written by older tooling used Go's
/// `2006-01-02 15:04:05 +0000 UTC` layout; resuming such a file keeps its
/// replayed rows as they were, so one file can hold both layouts. Resume only
/// compares user id and moderator, so this does not affect the merge.
pub fn normalize(entry: &UserRestriction) -> Result<BanRecord> {
    let user_id = user_id_from_reference(&entry.user)?;
    let restriction = &entry.game_join_restriction;

    let Attribution { moderator, reason } =
        extract_moderator(&restriction.private_reason, &restriction.display_reason);

    let duration = restriction
        .duration
        .clone()
        .unwrap_or_else(|| PERMANENT.to_string());

    Ok(BanRecord {
        user_id,
        moderator,
        reason,
        display_reason: restriction.display_reason.clone(),
        creation: restriction
            .start_time
            .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            .unwrap_or_default(),
        duration,
    })
}
