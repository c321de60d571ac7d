//! Dataset access layer over a redb key-value store.

/// Owner lock handling.
pub mod lock;
/// Table definitions.
pub mod tables;
/// Dataset creation helpers.
pub mod writer;

pub use writer::DatasetWriter;

use crate::codec::{decode_count, decode_image, label_key, record_keys, COUNT_KEY};
use crate::constants::{
    DB_OWNER_LOCK_FILE_NAME, DEFAULT_CACHE_SIZE_BYTES, REDB_FILE_NAME, TOMBSTONE_LABEL,
};
use crate::error::AppError;
use crate::models::record::{PatchImage, Record};
use lock::OwnerLockGuard;
use redb::ReadableDatabase;
use std::path::{Path, PathBuf};
use tables::RECORDS;

/// Knobs applied when opening a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetOptions {
    /// Upper bound for redb's page cache.
    pub cache_size_bytes: usize,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            cache_size_bytes: DEFAULT_CACHE_SIZE_BYTES,
        }
    }
}

/// Resolve the redb file and owner lock file for a dataset path.
///
/// A directory holds `data.redb`; any other path is taken as the redb file.
pub(crate) fn dataset_files(path: &Path) -> (PathBuf, PathBuf) {
    if path.is_dir() {
        (path.join(REDB_FILE_NAME), path.join(DB_OWNER_LOCK_FILE_NAME))
    } else {
        let mut lock_name = path.as_os_str().to_owned();
        lock_name.push(".");
        lock_name.push(DB_OWNER_LOCK_FILE_NAME);
        (path.to_path_buf(), PathBuf::from(lock_name))
    }
}

/// One connected dataset.
///
/// The redb handle is declared before the owner lock so it closes first.
pub struct Dataset {
    db: redb::Database,
    _owner_lock: OwnerLockGuard,
    path: PathBuf,
    record_count: u64,
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("path", &self.path)
            .field("record_count", &self.record_count)
            .finish_non_exhaustive()
    }
}

fn read_record_count(db: &redb::Database) -> Result<Option<u64>, AppError> {
    let read_txn = db.begin_read()?;
    let table = match read_txn.open_table(RECORDS) {
        Ok(table) => table,
        Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let Some(value) = table.get(COUNT_KEY)? else {
        return Ok(None);
    };
    let count = decode_count(value.value());
    if count.is_none() {
        tracing::warn!("Ignoring malformed '{}' entry", COUNT_KEY);
    }
    Ok(count)
}

fn decode_label(index: u64, bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(err) => {
            tracing::warn!("Label {} is not valid UTF-8: {}", index, err);
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

impl Dataset {
    /// Connect to the dataset at `path`.
    ///
    /// # Arguments
    /// - `path`: Dataset directory (or redb file).
    /// - `options`: Open options.
    ///
    /// # Returns
    /// A connected [`Dataset`] with a non-zero cached record count.
    ///
    /// # Errors
    /// - [`AppError::NotFound`] when `path` does not exist.
    /// - [`AppError::OpenFailed`] when the owner lock is held or redb cannot open the file.
    /// - [`AppError::Empty`] when the record count is missing, malformed, or zero.
    pub fn connect(path: impl AsRef<Path>, options: &DatasetOptions) -> Result<Self, AppError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::error!("Cannot find dataset at {}", path.display());
            return Err(AppError::NotFound(path.to_path_buf()));
        }

        let (db_file, lock_file) = dataset_files(path);
        let owner_lock = OwnerLockGuard::acquire(&lock_file)?;

        let db = redb::Builder::new()
            .set_cache_size(options.cache_size_bytes)
            .open(&db_file)
            .map_err(|err| {
                tracing::error!("Cannot open dataset {}: {}", db_file.display(), err);
                AppError::OpenFailed(format!("{}: {}", db_file.display(), err))
            })?;

        let record_count = read_record_count(&db)
            .map_err(|err| AppError::OpenFailed(format!("{}: {}", db_file.display(), err)))?
            .unwrap_or(0);
        if record_count == 0 {
            tracing::error!("Dataset {} is empty", path.display());
            return Err(AppError::Empty(path.to_path_buf()));
        }

        tracing::info!(
            "Connected dataset {} ({} records)",
            path.display(),
            record_count
        );
        Ok(Self {
            db,
            _owner_lock: owner_lock,
            path: path.to_path_buf(),
            record_count,
        })
    }

    /// Path this dataset was connected from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `path` names this dataset, under any spelling.
    ///
    /// The directory and its redb file are the same dataset, as are paths
    /// that canonicalize to the same redb file.
    pub fn refers_to(&self, path: &Path) -> bool {
        if self.path == path {
            return true;
        }
        let resolve = |path: &Path| std::fs::canonicalize(dataset_files(path).0).ok();
        match (resolve(&self.path), resolve(path)) {
            (Some(open), Some(other)) => open == other,
            _ => false,
        }
    }

    /// Cached record count; never touches storage.
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Re-read the record count in place.
    ///
    /// # Returns
    /// The refreshed count.
    ///
    /// # Errors
    /// Returns [`AppError::Empty`] when the count is missing or zero; the cached
    /// value is left unchanged in that case.
    pub fn refresh_record_count(&mut self) -> Result<u64, AppError> {
        match read_record_count(&self.db)? {
            Some(count) if count > 0 => {
                self.record_count = count;
                Ok(count)
            }
            _ => Err(AppError::Empty(self.path.clone())),
        }
    }

    /// Fetch records in `[start, min(start + limit, record_count))`.
    ///
    /// All records come from one read transaction, so a page is a consistent
    /// snapshot. Records whose image is missing or undecodable are flagged
    /// through [`PatchImage`] instead of failing the page.
    ///
    /// # Returns
    /// The records in index order; empty when `start >= record_count`.
    ///
    /// # Errors
    /// Returns an error when storage access fails.
    pub fn fetch_range(&self, start: u64, limit: usize) -> Result<Vec<Record>, AppError> {
        let end = start
            .saturating_add(u64::try_from(limit).unwrap_or(u64::MAX))
            .min(self.record_count);
        if start >= end {
            return Ok(Vec::new());
        }

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS)?;
        let mut records = Vec::with_capacity((end - start) as usize);

        for index in start..end {
            let (image_key, label_key) = record_keys(index);
            let image = match table.get(image_key.as_str())? {
                Some(bytes) => match decode_image(bytes.value()) {
                    Ok(image) => PatchImage::Decoded(image),
                    Err(err) => {
                        tracing::warn!("Flagging record {}: {}", index, err);
                        PatchImage::Undecodable {
                            reason: err.to_string(),
                        }
                    }
                },
                None => {
                    tracing::warn!("Flagging record {}: image entry missing", index);
                    PatchImage::Missing
                }
            };
            let label = table
                .get(label_key.as_str())?
                .map(|value| decode_label(index, value.value()));
            records.push(Record {
                index,
                image,
                label,
            });
        }

        tracing::debug!("Fetched records [{}, {})", start, end);
        Ok(records)
    }

    /// Read one label.
    ///
    /// # Returns
    /// `Ok(None)` when the label was never written.
    ///
    /// # Errors
    /// Returns an error when storage access fails.
    pub fn label(&self, index: u64) -> Result<Option<String>, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS)?;
        Ok(table
            .get(label_key(index).as_str())?
            .map(|value| decode_label(index, value.value())))
    }

    /// Replace the label of `index` in one write transaction.
    ///
    /// The image entry is untouched and `index` is not checked against the
    /// record count.
    ///
    /// # Errors
    /// Returns [`AppError::WriteFailed`] when the write does not commit; nothing
    /// is applied in that case.
    pub fn set_label(&self, index: u64, text: &str) -> Result<(), AppError> {
        self.write_label(index, text).map_err(|err| match err {
            AppError::WriteFailed(_) => err,
            other => {
                tracing::error!("Label write for {} rolled back: {}", index, other);
                AppError::WriteFailed(other.to_string())
            }
        })
    }

    fn write_label(&self, index: u64, text: &str) -> Result<(), AppError> {
        let key = label_key(index);
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RECORDS)?;
            table.insert(key.as_str(), text.as_bytes())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Mark `index` deleted by writing the tombstone label.
    ///
    /// # Errors
    /// Same as [`Dataset::set_label`].
    pub fn mark_deleted(&self, index: u64) -> Result<(), AppError> {
        self.set_label(index, TOMBSTONE_LABEL)
    }
}

#[cfg(test)]
mod tests;
