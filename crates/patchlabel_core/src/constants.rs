//! Shared constants used across patchlabel crates.

/// Label text that marks a record as logically deleted.
pub const TOMBSTONE_LABEL: &str = "__#TO_BE_DELETED#__";

/// Index substituted for the stored one under [`crate::ResumePolicy::LegacyNearEnd`].
pub const LEGACY_RESUME_INDEX: u64 = 1_000_000;

/// Default bookmark file, relative to the working directory.
pub const DEFAULT_BOOKMARK_FILE_NAME: &str = ".bookmark";

/// Default redb cache bound in bytes.
pub const DEFAULT_CACHE_SIZE_BYTES: usize = 100_000_000;

/// Default number of records shown per page by the presentation layer.
pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Default recognizer input width used when exporting patches.
pub const DEFAULT_PATCH_WIDTH: u32 = 128;
/// Default recognizer input height used when exporting patches.
pub const DEFAULT_PATCH_HEIGHT: u32 = 32;

/// File name of the redb database inside a dataset directory.
pub const REDB_FILE_NAME: &str = "data.redb";

/// Owner lock file held while a dataset is connected.
pub const DB_OWNER_LOCK_FILE_NAME: &str = "patchlabel.owner.lock";
