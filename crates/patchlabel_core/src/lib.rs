//! Core library for patchlabel (codec, dataset storage, bookmark, pagination).

/// Persisted resume position.
pub mod bookmark;
/// Record key and image encoding.
pub mod codec;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants.
pub mod constants;
/// Page navigation over an open dataset.
pub mod controller;
/// Dataset access layer.
pub mod db;
/// Application error types.
pub mod error;
/// Record models returned by page fetches.
pub mod models;

#[cfg(test)]
pub(crate) mod test_support;

pub use bookmark::{BookmarkStore, ResumePolicy};
pub use config::Config;
pub use constants::*;
pub use controller::{Controller, PageView};
pub use db::{Dataset, DatasetOptions, DatasetWriter};
pub use error::AppError;
pub use models::record::{PatchImage, Record};
