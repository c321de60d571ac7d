//! Dataset creation for ingestion tooling and tests.

use super::dataset_files;
use super::tables::RECORDS;
use crate::codec::{encode_count, encode_image, record_keys, COUNT_KEY};
use crate::error::AppError;
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Appends records to a new or existing dataset directory.
///
/// Records are numbered from zero in append order. The record count entry is
/// only written by [`DatasetWriter::finish`] or [`DatasetWriter::write_count`].
pub struct DatasetWriter {
    db: redb::Database,
    path: PathBuf,
    next_index: u64,
}

impl DatasetWriter {
    /// Create the dataset directory and its redb file.
    ///
    /// # Errors
    /// Returns an error when the directory or database cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let (db_file, _) = dataset_files(path);
        let db = redb::Database::create(&db_file)?;

        let write_txn = db.begin_write()?;
        write_txn.open_table(RECORDS)?;
        write_txn.commit()?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
            next_index: 0,
        })
    }

    /// Dataset directory being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encode and append one record.
    ///
    /// # Returns
    /// Index assigned to the record.
    ///
    /// # Errors
    /// Returns an error when encoding or the write transaction fails.
    pub fn append(&mut self, image: &DynamicImage, label: Option<&str>) -> Result<u64, AppError> {
        let encoded = encode_image(image)?;
        self.append_encoded(&encoded, label)
    }

    /// Append one record from already-compressed image bytes.
    ///
    /// Image and label entries are written in the same transaction.
    ///
    /// # Returns
    /// Index assigned to the record.
    ///
    /// # Errors
    /// Returns an error when the write transaction fails.
    pub fn append_encoded(&mut self, image: &[u8], label: Option<&str>) -> Result<u64, AppError> {
        let index = self.next_index;
        let (image_key, label_key) = record_keys(index);

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RECORDS)?;
            table.insert(image_key.as_str(), image)?;
            if let Some(label) = label {
                table.insert(label_key.as_str(), label.as_bytes())?;
            }
        }
        write_txn.commit()?;

        self.next_index += 1;
        Ok(index)
    }

    /// Overwrite the stored record count.
    ///
    /// # Errors
    /// Returns an error when the write transaction fails.
    pub fn write_count(&self, count: u64) -> Result<(), AppError> {
        let encoded = encode_count(count);
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RECORDS)?;
            table.insert(COUNT_KEY, encoded.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove a raw entry, for building damaged fixtures.
    #[cfg(test)]
    pub(crate) fn remove_entry(&self, key: &str) -> Result<(), AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RECORDS)?;
            let _ = table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Write the record count for everything appended and close the file.
    ///
    /// # Returns
    /// Number of records in the dataset.
    ///
    /// # Errors
    /// Returns an error when the count cannot be written.
    pub fn finish(self) -> Result<u64, AppError> {
        self.write_count(self.next_index)?;
        tracing::info!(
            "Wrote {} records to {}",
            self.next_index,
            self.path.display()
        );
        Ok(self.next_index)
    }
}
