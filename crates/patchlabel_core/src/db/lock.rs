//! Owner lock file that keeps a dataset bound to one process.

use crate::error::AppError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Exclusive lock on a dataset's owner lock file, released on drop.
#[derive(Debug)]
pub struct OwnerLockGuard {
    file: File,
    lock_path: PathBuf,
}

fn is_contention(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::PermissionDenied
    )
}

fn open_lock_file(lock_path: &Path, create: bool) -> io::Result<File> {
    OpenOptions::new()
        .create(create)
        .read(true)
        .write(true)
        .truncate(false)
        .open(lock_path)
}

impl OwnerLockGuard {
    /// Take the lock at `lock_path`, creating the file when needed.
    ///
    /// # Errors
    /// Returns [`AppError::OpenFailed`] when the file cannot be opened or
    /// another connection already holds the lock.
    pub fn acquire(lock_path: &Path) -> Result<Self, AppError> {
        let describe = |err: io::Error| {
            if is_contention(&err) {
                format!("dataset is in use ('{}' is locked)", lock_path.display())
            } else {
                format!("owner lock '{}': {}", lock_path.display(), err)
            }
        };
        let file = open_lock_file(lock_path, true)
            .map_err(|err| AppError::OpenFailed(describe(err)))?;
        file.try_lock_exclusive()
            .map_err(|err| AppError::OpenFailed(describe(err)))?;
        tracing::debug!("Locked {}", lock_path.display());
        Ok(Self {
            file,
            lock_path: lock_path.to_path_buf(),
        })
    }

    /// Path of the held lock file.
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for OwnerLockGuard {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            tracing::warn!("Could not release {}: {}", self.lock_path.display(), err);
        }
    }
}

/// Whether some connection currently holds the lock at `lock_path`.
///
/// A missing file is not held. Probe failures are logged and read as not held.
pub fn owner_lock_held(lock_path: &Path) -> bool {
    let file = match open_lock_file(lock_path, false) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return false,
        Err(err) => {
            tracing::warn!("Lock probe on {} failed: {}", lock_path.display(), err);
            return false;
        }
    };
    match file.try_lock_exclusive() {
        Ok(()) => {
            let _ = file.unlock();
            false
        }
        Err(err) => {
            if !is_contention(&err) {
                tracing::warn!("Lock probe on {} failed: {}", lock_path.display(), err);
            }
            is_contention(&err)
        }
    }
}
