// ABOUTME: Incremental export: fetch new bans until the previous export's newest row
// ABOUTME: Then replay the old file and atomically publish the merged result

use crate::{
    api::PageSource,
    model::BanRecord,
    normalize::normalize,
    paginate::{Paginator, Sleeper},
    storage::{AtomicWriter, ExportPaths, PreviousExport},
    Error, Result,
};
use chrono::{DateTime, FixedOffset};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Resume from the previous export when one exists.
    Incremental,
    /// Ignore any previous export and fetch everything.
    Full,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub universe_id: String,
    pub paths: ExportPaths,
    pub mode: SyncMode,
    /// Abort instead of warning when creation times are not newest-first.
    pub strict_order: bool,
    pub show_progress: bool,
}

impl SyncConfig {
    pub fn new(universe_id: impl Into<String>, paths: ExportPaths) -> Self {
        SyncConfig {
            universe_id: universe_id.into(),
            paths,
            mode: SyncMode::Incremental,
            strict_order: false,
            show_progress: false,
        }
    }
}

/// How the run ended relative to the previous export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No previous export was used; every page was fetched.
    FullExport,
    /// The previous newest row was found and the old file was replayed.
    Resumed,
    /// Pagination ended without meeting the previous newest row; the old
    /// file was dropped.
    SentinelMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Freshly fetched records written ahead of any replayed rows.
    pub new_records: usize,
    /// Rows copied from the previous export, sentinel included.
    pub replayed_records: usize,
    pub pages: usize,
    pub outcome: SyncOutcome,
}

/// Where the scan over fresh pages stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanEnd {
    /// A fetched record matched the previous export's newest row.
    FoundSentinel,
    /// The cursor chain ran out first.
    Exhausted,
}

/// Checks that creation times never increase in fetch order.
///
/// The early stop at the sentinel is only sound when pages come back
/// newest-first; this makes that assumption observable. Creation values
/// that are empty or in another layout (older exports used Go's
/// `2006-01-02 15:04:05 +0000 UTC`) are skipped, not compared.
struct OrderCheck {
    strict: bool,
    previous: Option<DateTime<FixedOffset>>,
    violations: usize,
}

impl OrderCheck {
    fn new(strict: bool) -> Self {
        OrderCheck {
            strict,
            previous: None,
            violations: 0,
        }
    }

    fn observe(&mut self, record: &BanRecord) -> Result<()> {
        let Ok(created) = DateTime::parse_from_rfc3339(&record.creation) else {
            return Ok(());
        };

        if let Some(previous) = self.previous {
            if created > previous {
                self.violations += 1;
                if self.strict {
                    return Err(Error::OutOfOrder {
                        user_id: record.user_id.clone(),
                        created: record.creation.clone(),
                        previous: previous.to_rfc3339(),
                    });
                }
                warn!(
                    user_id = %record.user_id,
                    created = %record.creation,
                    previous = %previous.to_rfc3339(),
                    "restriction is newer than the one before it; resume point may be unreliable"
                );
            }
        }

        self.previous = Some(created);
        Ok(())
    }
}

fn progress_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {pos} bans fetched") {
        pb.set_style(style);
    }
    pb
}

/// Runs one export of `config.universe_id` into `config.paths.output`.
///
/// Nothing at the output path changes unless the whole run succeeds.
pub fn sync_bans<S: PageSource, Z: Sleeper>(
    source: &S,
    sleeper: &Z,
    config: &SyncConfig,
) -> Result<SyncReport> {
    let mut previous = match config.mode {
        SyncMode::Incremental => PreviousExport::open(&config.paths.output)?,
        SyncMode::Full => None,
    };

    if let Some(old) = &previous {
        info!(
            user_id = %old.sentinel().user_id,
            moderator = %old.sentinel().moderator,
            "resuming from previous export"
        );
    }

    let mut writer = AtomicWriter::create(&config.paths)?;
    let mut paginator = Paginator::new(source, sleeper, &config.universe_id);
    let mut order = OrderCheck::new(config.strict_order);
    let pb = progress_bar(config.show_progress);

    let mut scan_end = ScanEnd::Exhausted;
    let mut new_records = 0;
    let mut replayed_records = 0;

    'pages: while let Some(page) = paginator.next_page()? {
        for entry in &page.entries {
            let record = normalize(entry)?;
            order.observe(&record)?;

            if let Some(old) = &previous {
                if old.sentinel().matches(&record) {
                    info!(user_id = %record.user_id, "reached previous export");
                    scan_end = ScanEnd::FoundSentinel;
                    break 'pages;
                }
            }

            writer.write_record(&record)?;
            new_records += 1;
            pb.inc(1);
        }
    }

    let outcome = match (scan_end, previous.as_mut()) {
        (ScanEnd::FoundSentinel, Some(old)) => {
            replayed_records = old.replay_into(&mut writer)?;
            info!(rows = replayed_records, "replayed previous export");
            SyncOutcome::Resumed
        }
        (ScanEnd::Exhausted, Some(old)) => {
            warn!(
                user_id = %old.sentinel().user_id,
                "previous newest ban not found upstream; previous export discarded"
            );
            SyncOutcome::SentinelMissing
        }
        (_, None) => SyncOutcome::FullExport,
    };

    writer.commit()?;
    // The old handle is released only after the rename.
    drop(previous);

    pb.finish_and_clear();

    if order.violations > 0 {
        warn!(
            violations = order.violations,
            "upstream returned restrictions out of creation order"
        );
    }

    info!(
        new = new_records,
        replayed = replayed_records,
        pages = paginator.pages(),
        "export complete"
    );

    Ok(SyncReport {
        new_records,
        replayed_records,
        pages: paginator.pages(),
        outcome,
    })
}
