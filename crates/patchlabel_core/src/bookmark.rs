//! Durable resume position: last dataset path and page-start index.

use crate::constants::LEGACY_RESUME_INDEX;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// How the stored index is applied when a bookmark is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumePolicy {
    /// Resume at the stored index.
    #[default]
    Exact,
    /// Discard the stored index and resume at [`LEGACY_RESUME_INDEX`].
    LegacyNearEnd,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct BookmarkRecord {
    last_path: Option<String>,
    last_index: u64,
}

/// Single-record bookmark persisted to one local file.
#[derive(Debug)]
pub struct BookmarkStore {
    file: PathBuf,
    record: BookmarkRecord,
}

fn read_record(file: &Path) -> Result<Option<BookmarkRecord>, AppError> {
    let bytes = match std::fs::read(file) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    Ok(Some(bincode::deserialize(&bytes)?))
}

fn temp_path(file: &Path) -> PathBuf {
    let mut name = OsString::from(file.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

impl BookmarkStore {
    /// Load the bookmark stored at `file`.
    ///
    /// A missing file yields an empty bookmark. An unreadable or corrupt file
    /// is logged and also treated as empty.
    pub fn load(file: impl Into<PathBuf>, policy: ResumePolicy) -> Self {
        let file = file.into();
        let mut record = match read_record(&file) {
            Ok(Some(record)) => record,
            Ok(None) => BookmarkRecord::default(),
            Err(err) => {
                tracing::warn!("Ignoring unreadable bookmark {}: {}", file.display(), err);
                BookmarkRecord::default()
            }
        };
        if policy == ResumePolicy::LegacyNearEnd {
            record.last_index = LEGACY_RESUME_INDEX;
        }
        Self { file, record }
    }

    /// File backing this bookmark.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Remembered dataset path, if any.
    pub fn last_path(&self) -> Option<&str> {
        self.record.last_path.as_deref()
    }

    /// Remembered page-start index; meaningful only with a path.
    pub fn last_index(&self) -> u64 {
        self.record.last_index
    }

    /// Persist both fields.
    ///
    /// # Errors
    /// Returns an error when serialization or the file write fails; the
    /// in-memory bookmark is unchanged in that case.
    pub fn update_all(&mut self, path: &str, index: u64) -> Result<(), AppError> {
        self.replace(BookmarkRecord {
            last_path: Some(path.to_string()),
            last_index: index,
        })
    }

    /// Persist a new index while keeping the current path.
    ///
    /// The whole record is rewritten.
    ///
    /// # Errors
    /// Same as [`BookmarkStore::update_all`].
    pub fn update_index(&mut self, index: u64) -> Result<(), AppError> {
        self.replace(BookmarkRecord {
            last_path: self.record.last_path.clone(),
            last_index: index,
        })
    }

    fn replace(&mut self, record: BookmarkRecord) -> Result<(), AppError> {
        let encoded = bincode::serialize(&record)?;
        if let Some(parent) = self.file.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        // Write-then-rename so readers never see a torn record.
        let temp = temp_path(&self.file);
        std::fs::write(&temp, &encoded)?;
        if let Err(err) = std::fs::rename(&temp, &self.file) {
            let _ = std::fs::remove_file(&temp);
            return Err(err.into());
        }
        self.record = record;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bookmark_file(dir: &TempDir) -> PathBuf {
        dir.path().join(".bookmark")
    }

    #[test]
    fn missing_file_loads_empty_bookmark() {
        let dir = TempDir::new().expect("temp dir");
        let store = BookmarkStore::load(bookmark_file(&dir), ResumePolicy::Exact);
        assert_eq!(store.last_path(), None);
        assert_eq!(store.last_index(), 0);
    }

    #[test]
    fn update_all_roundtrips_with_exact_policy() {
        let dir = TempDir::new().expect("temp dir");
        let mut store = BookmarkStore::load(bookmark_file(&dir), ResumePolicy::Exact);
        store.update_all("foo", 3).expect("update");

        let reloaded = BookmarkStore::load(bookmark_file(&dir), ResumePolicy::Exact);
        assert_eq!(reloaded.last_path(), Some("foo"));
        assert_eq!(reloaded.last_index(), 3);
    }

    #[test]
    fn legacy_policy_overrides_stored_index() {
        let dir = TempDir::new().expect("temp dir");
        let mut store = BookmarkStore::load(bookmark_file(&dir), ResumePolicy::Exact);
        store.update_all("foo", 3).expect("update");

        let reloaded = BookmarkStore::load(bookmark_file(&dir), ResumePolicy::LegacyNearEnd);
        assert_eq!(reloaded.last_path(), Some("foo"));
        assert_eq!(reloaded.last_index(), LEGACY_RESUME_INDEX);
    }

    #[test]
    fn legacy_policy_applies_even_without_file() {
        let dir = TempDir::new().expect("temp dir");
        let store = BookmarkStore::load(bookmark_file(&dir), ResumePolicy::LegacyNearEnd);
        assert_eq!(store.last_path(), None);
        assert_eq!(store.last_index(), LEGACY_RESUME_INDEX);
    }

    #[test]
    fn update_index_keeps_path() {
        let dir = TempDir::new().expect("temp dir");
        let mut store = BookmarkStore::load(bookmark_file(&dir), ResumePolicy::Exact);
        store.update_all("datasets/train", 12).expect("update all");
        store.update_index(18).expect("update index");

        let reloaded = BookmarkStore::load(bookmark_file(&dir), ResumePolicy::Exact);
        assert_eq!(reloaded.last_path(), Some("datasets/train"));
        assert_eq!(reloaded.last_index(), 18);
    }

    #[test]
    fn rewrite_leaves_no_temp_file() {
        let dir = TempDir::new().expect("temp dir");
        let file = bookmark_file(&dir);
        let mut store = BookmarkStore::load(&file, ResumePolicy::Exact);
        store.update_all("foo", 1).expect("update");
        store.update_index(2).expect("update");

        assert!(file.exists());
        assert!(!temp_path(&file).exists());
        let entries = std::fs::read_dir(dir.path()).expect("read dir").count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn corrupt_file_loads_empty_bookmark() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(bookmark_file(&dir), [0x05]).expect("write garbage");
        let store = BookmarkStore::load(bookmark_file(&dir), ResumePolicy::Exact);
        assert_eq!(store.last_path(), None);
        assert_eq!(store.last_index(), 0);
    }

    #[test]
    fn failed_write_keeps_previous_state() {
        let dir = TempDir::new().expect("temp dir");
        // A directory at the target path makes the rename fail.
        let file = dir.path().join("occupied");
        std::fs::create_dir_all(file.join("child")).expect("mkdir");
        let mut store = BookmarkStore::load(&file, ResumePolicy::Exact);

        assert!(store.update_all("foo", 9).is_err());
        assert_eq!(store.last_path(), None);
        assert_eq!(store.last_index(), 0);
        assert!(!temp_path(&file).exists());
    }

    #[test]
    fn parent_directories_are_created() {
        let dir = TempDir::new().expect("temp dir");
        let file = dir.path().join("state").join("nested").join(".bookmark");
        let mut store = BookmarkStore::load(&file, ResumePolicy::Exact);
        store.update_all("foo", 4).expect("update");
        assert_eq!(
            BookmarkStore::load(&file, ResumePolicy::Exact).last_index(),
            4
        );
    }
}
