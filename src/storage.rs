// ABOUTME: Export paths, previous-export reader and atomic CSV writer
// ABOUTME: Output lands in <path>.tmp and is renamed over the final path only on commit

use crate::model::{BanRecord, CSV_HEADER};
use crate::{Error, Result};
use csv::{Reader, StringRecord, StringRecordsIntoIter, Writer};
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Rows written between flushes of the temporary file.
pub const FLUSH_EVERY: usize = 25;

#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub output: PathBuf,
    pub tmp: PathBuf,
}

impl ExportPaths {
    pub fn new(universe_id: &str, output_override: Option<PathBuf>) -> Self {
        let output =
            output_override.unwrap_or_else(|| PathBuf::from(format!("{}-bans.csv", universe_id)));

        let mut tmp = OsString::from(output.as_os_str());
        tmp.push(".tmp");

        ExportPaths {
            output,
            tmp: PathBuf::from(tmp),
        }
    }
}

fn invalid_data(path: &Path, what: &str) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("{}: {}", path.display(), what),
    ))
}

/// The `(user id, moderator)` pair of the newest row of a previous export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinel {
    pub user_id: String,
    pub moderator: String,
}

impl Sentinel {
    pub fn matches(&self, record: &BanRecord) -> bool {
        self.user_id == record.user_id && self.moderator == record.moderator
    }
}

/// A previous export opened for resuming: its first data row plus the
/// unread remainder.
pub struct PreviousExport {
    sentinel: Sentinel,
    first_row: StringRecord,
    rest: StringRecordsIntoIter<File>,
}

impl PreviousExport {
    /// Opens `path` and reads its header and first data row.
    ///
    /// Returns `None` when the file does not exist or holds only a header.
    pub fn open(path: &Path) -> Result<Option<Self>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };
        let mut rows = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file)
            .into_records();

        match rows.next() {
            Some(header) => {
                header?;
            }
            None => return Err(invalid_data(path, "missing header row")),
        }

        let first_row = match rows.next() {
            Some(row) => row?,
            None => return Ok(None),
        };

        let sentinel = match (first_row.get(0), first_row.get(1)) {
            (Some(user_id), Some(moderator)) => Sentinel {
                user_id: user_id.to_string(),
                moderator: moderator.to_string(),
            },
            _ => return Err(invalid_data(path, "first row has fewer than two columns")),
        };

        Ok(Some(PreviousExport {
            sentinel,
            first_row,
            rest: rows,
        }))
    }

    pub fn sentinel(&self) -> &Sentinel {
        &self.sentinel
    }

    /// Copies the first row and every remaining row into `writer`, unchanged.
    ///
    /// Returns the number of rows copied. The underlying file handle stays
    /// open until `self` is dropped.
    pub fn replay_into(&mut self, writer: &mut AtomicWriter) -> Result<usize> {
        writer.write_raw(&self.first_row)?;
        let mut copied = 1;

        for row in self.rest.by_ref() {
            writer.write_raw(&row?)?;
            copied += 1;
        }

        Ok(copied)
    }
}

/// Reads every data row of an export. Mostly useful for inspection and tests.
pub fn read_records(path: &Path) -> Result<Vec<BanRecord>> {
    let mut reader: Reader<File> = csv::ReaderBuilder::new().from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// CSV writer over `<output>.tmp`, published to `<output>` by [`commit`].
///
/// Dropping the writer without committing leaves the temporary file in
/// place and the final path untouched.
///
/// [`commit`]: AtomicWriter::commit
pub struct AtomicWriter {
    output: PathBuf,
    tmp: PathBuf,
    writer: Writer<File>,
    rows: usize,
}

impl AtomicWriter {
    /// Creates the temporary file and writes the header row.
    pub fn create(paths: &ExportPaths) -> Result<Self> {
        if let Some(parent) = paths.tmp.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&paths.tmp)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&paths.tmp, perms)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);
        writer.write_record(CSV_HEADER)?;

        Ok(AtomicWriter {
            output: paths.output.clone(),
            tmp: paths.tmp.clone(),
            writer,
            rows: 0,
        })
    }

    /// Data rows written so far, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn write_record(&mut self, record: &BanRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.row_written()
    }

    pub fn write_raw(&mut self, row: &StringRecord) -> Result<()> {
        self.writer.write_record(row)?;
        self.row_written()
    }

    fn row_written(&mut self) -> Result<()> {
        self.rows += 1;
        if self.rows % FLUSH_EVERY == 0 {
            self.writer.flush()?;
        }
        Ok(())
    }

    /// Flushes, syncs and closes the temporary file, then renames it over
    /// the final path. A failed rename leaves `<output>.tmp` behind.
    pub fn commit(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        let file = self
            .writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.tmp, &self.output)?;
        Ok(self.output)
    }
}
