//! Append-only, version-aware record log
//!
//! One CSV file per resource. Every write appends a full row; the latest row
//! per id wins. An in-memory `id -> byte offset` index and an `id -> version`
//! map are rebuilt by linear scan on open and maintained on every append, so
//! reads never scan for a single record.
//!
//! Row state is encoded in the `_v` column: `"0"` is a tombstone, any
//! positive integer is a live version.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::schema::FieldType;

use super::errors::{LogError, LogResult};

/// Position and type of one sortable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortColumn {
    /// Column index in the log row
    pub index: usize,
    /// Field type governing the comparison
    pub field_type: FieldType,
}

/// Sortable columns of a log, keyed by field name.
pub type SortSchema = HashMap<String, SortColumn>;

struct Inner {
    /// Append handle; reads open their own handle against `path`
    file: File,
    /// id -> byte offset of the latest row
    index: HashMap<String, u64>,
    /// id -> latest version (0 if tombstoned or never seen)
    version: HashMap<String, i64>,
    closed: bool,
}

/// Append-only CSV log with an in-memory offset+version index.
///
/// All writes take the exclusive lock for the full operation; reads share
/// the lock, so they observe either the pre-write or post-write state but
/// never a partial row.
pub struct RecordLog {
    path: PathBuf,
    sort_schema: SortSchema,
    inner: RwLock<Inner>,
}

impl RecordLog {
    /// Opens (or creates) the log file and rebuilds the index by linear scan.
    ///
    /// Every row with at least two columns overwrites the index entry for its
    /// id with the row's byte offset and parsed version; tombstones are
    /// recorded the same way, so later live rows correctly supersede them.
    pub fn open(path: &Path, sort_schema: SortSchema) -> LogResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let mut index = HashMap::new();
        let mut version = HashMap::new();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(&file);

        let mut row = csv::StringRecord::new();
        loop {
            let pos = reader.position().byte();
            if !reader.read_record(&mut row)? {
                break;
            }
            if row.len() > 1 {
                let id = row[0].to_string();
                version.insert(id.clone(), row[1].parse().unwrap_or(0));
                index.insert(id, pos);
            }
        }
        drop(reader);

        Ok(Self {
            path: path.to_path_buf(),
            sort_schema,
            inner: RwLock::new(Inner {
                file,
                index,
                version,
                closed: false,
            }),
        })
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a new row with version 1.
    ///
    /// The record must carry a non-empty id. An id that already has a live
    /// row is rejected; deleting it first makes the id reusable.
    pub fn create(&self, mut rec: Vec<String>) -> LogResult<()> {
        let mut inner = self.write_lock()?;
        if inner.closed {
            return Err(LogError::Closed);
        }
        if rec.len() < 2 || rec[0].is_empty() {
            return Err(LogError::InvalidRecord);
        }
        if inner.version.get(&rec[0]).copied().unwrap_or(0) >= 1 {
            return Err(LogError::AlreadyExists);
        }

        rec[1] = "1".to_string();

        Self::append(&mut inner, &rec)
    }

    /// Appends a new row with the id's next version.
    pub fn update(&self, mut rec: Vec<String>) -> LogResult<()> {
        let mut inner = self.write_lock()?;
        if inner.closed {
            return Err(LogError::Closed);
        }
        if rec.len() < 2 || rec[0].is_empty() {
            return Err(LogError::InvalidRecord);
        }

        let next = inner.version.get(&rec[0]).copied().unwrap_or(0) + 1;
        rec[1] = next.to_string();

        Self::append(&mut inner, &rec)
    }

    /// Appends a two-column tombstone row, terminating the id.
    pub fn delete(&self, id: &str) -> LogResult<()> {
        let mut inner = self.write_lock()?;
        if inner.closed {
            return Err(LogError::Closed);
        }
        if inner.version.get(id).copied().unwrap_or(0) < 1 {
            return Err(LogError::NotFound);
        }

        Self::append(&mut inner, &[id.to_string(), "0".to_string()])
    }

    /// Reads the latest live row for an id.
    pub fn read_one(&self, id: &str) -> LogResult<Vec<String>> {
        let inner = self.read_lock()?;
        if inner.closed {
            return Err(LogError::Closed);
        }
        if inner.version.get(id).copied().unwrap_or(0) < 1 {
            return Err(LogError::NotFound);
        }

        // An id with a live version must be indexed; anything else means the
        // maps have diverged and the caller must not get a silent empty row.
        let offset = *inner
            .index
            .get(id)
            .ok_or_else(|| LogError::CorruptIndex { id: id.to_string() })?;

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut row = csv::StringRecord::new();
        if !reader.read_record(&mut row)? {
            return Err(LogError::CorruptIndex { id: id.to_string() });
        }
        if row.get(0) != Some(id) {
            return Err(LogError::CorruptIndex { id: id.to_string() });
        }

        Ok(row.iter().map(String::from).collect())
    }

    /// Streams the latest live row of every id, optionally sorted.
    ///
    /// `sort_by` must name a column in this log's sort schema; the empty
    /// string skips sorting and returns rows in file order.
    pub fn list(&self, sort_by: &str) -> LogResult<Vec<Vec<String>>> {
        let mut rows = self.scan_live()?;

        if sort_by.is_empty() {
            return Ok(rows);
        }

        let col = *self
            .sort_schema
            .get(sort_by)
            .ok_or_else(|| LogError::UnknownSortField {
                field: sort_by.to_string(),
            })?;

        rows.sort_by(|a, b| compare_rows(a, b, col));

        Ok(rows)
    }

    /// Drains in-flight writers, makes the file durable, and marks the log
    /// closed. Every subsequent operation fails.
    pub fn close(&self) -> LogResult<()> {
        let mut inner = self.write_lock()?;
        if inner.closed {
            return Err(LogError::Closed);
        }
        inner.file.sync_all()?;
        inner.closed = true;
        Ok(())
    }

    /// Scans the file from offset zero, keeping each row iff its version
    /// column matches the id's current live version.
    fn scan_live(&self) -> LogResult<Vec<Vec<String>>> {
        let inner = self.read_lock()?;
        if inner.closed {
            return Err(LogError::Closed);
        }

        let file = File::open(&self.path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut rows = Vec::new();
        let mut row = csv::StringRecord::new();

        while reader.read_record(&mut row)? {
            if row.len() < 2 {
                continue;
            }
            let (id, v) = (&row[0], &row[1]);
            let current = inner.version.get(id).copied().unwrap_or(0);
            if v == "0" || v != current.to_string() {
                continue; // deleted or superseded
            }
            rows.push(row.iter().map(String::from).collect());
        }

        Ok(rows)
    }

    /// Appends one row and updates the maps. Caller holds the write lock.
    ///
    /// The row is flushed before the maps change; a crash in between leaves
    /// a durable row that the next open's scan folds back into the index.
    fn append(inner: &mut Inner, rec: &[String]) -> LogResult<()> {
        let pos = inner.file.seek(SeekFrom::End(0))?;
        let next_version: i64 = rec[1].parse()?;

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(&mut inner.file);
        writer.write_record(rec)?;
        writer.flush()?;
        drop(writer);

        inner.index.insert(rec[0].clone(), pos);
        inner.version.insert(rec[0].clone(), next_version);

        Ok(())
    }

    fn read_lock(&self) -> LogResult<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| LogError::Poisoned)
    }

    fn write_lock(&self) -> LogResult<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| LogError::Poisoned)
    }
}

/// Sort comparator: empty cells sort after non-empty ones; number columns
/// compare by best-effort float parse, text columns lexicographically, and
/// everything else compares equal.
fn compare_rows(a: &[String], b: &[String], col: SortColumn) -> Ordering {
    let (Some(x), Some(y)) = (a.get(col.index), b.get(col.index)) else {
        return Ordering::Equal;
    };

    match (x.is_empty(), y.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match col.field_type {
            FieldType::Number => {
                let xf: f64 = x.parse().unwrap_or(0.0);
                let yf: f64 = y.parse().unwrap_or(0.0);
                xf.partial_cmp(&yf).unwrap_or(Ordering::Equal)
            }
            FieldType::Text => x.cmp(y),
            FieldType::List => Ordering::Equal,
        },
    }
}
