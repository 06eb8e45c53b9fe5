// ABOUTME: Serde data models for user-restriction pages and ban records
// ABOUTME: Tolerant parsing of upstream pages, fixed column layout for the CSV export

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Header row of the export, in column order.
pub const CSV_HEADER: [&str; 6] = [
    "UserId",
    "Moderator",
    "Reason",
    "DisplayReason",
    "Creation",
    "Duration",
];

/// Duration written when a restriction has no end.
pub const PERMANENT: &str = "Permanent";

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unparseable or absent timestamps become `None` instead of failing the page.
fn lenient_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictionPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_restrictions: Vec<UserRestriction>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRestriction {
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    /// `users/<id>`; a missing value surfaces later as a malformed reference.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub game_join_restriction: GameJoinRestriction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameJoinRestriction {
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
    #[serde(default, deserialize_with = "lenient_time")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub private_reason: String,
    #[serde(
        default,
        rename = "displayReason",
        alias = "displayedReason",
        deserialize_with = "null_as_default"
    )]
    pub display_reason: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclude_alt_accounts: bool,
    #[serde(default, alias = "inherented", deserialize_with = "null_as_default")]
    pub inherited: bool,
}

/// Server-reported call budget attached to every page response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub remaining: i64,
    pub reset_seconds: u64,
}

/// One fetched page: entries, continuation cursor and rate-limit counters.
#[derive(Debug, Clone)]
pub struct Page {
    pub entries: Vec<UserRestriction>,
    pub next_cursor: Option<String>,
    pub rate: RateLimit,
}

impl Page {
    pub fn from_response(body: RestrictionPage, rate: RateLimit) -> Self {
        Page {
            entries: body.user_restrictions,
            next_cursor: body.next_page_token.filter(|token| !token.is_empty()),
            rate,
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// Canonical, persisted representation of one ban.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanRecord {
    #[serde(rename = "UserId")]
    pub user_id: String,
    #[serde(rename = "Moderator")]
    pub moderator: String,
    #[serde(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "DisplayReason")]
    pub display_reason: String,
    #[serde(rename = "Creation")]
    pub creation: String,
    #[serde(rename = "Duration")]
    pub duration: String,
}
