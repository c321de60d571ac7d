//! Record model: one (image, label) pair addressed by index.

use crate::constants::TOMBSTONE_LABEL;
use image::DynamicImage;

/// Image payload of a record as it came out of the store.
#[derive(Debug, Clone)]
pub enum PatchImage {
    /// Stored bytes decoded successfully.
    Decoded(DynamicImage),
    /// No image entry exists for the index.
    Missing,
    /// Stored bytes could not be decoded.
    Undecodable { reason: String },
}

impl PatchImage {
    /// Decoded image, if any.
    pub fn decoded(&self) -> Option<&DynamicImage> {
        match self {
            PatchImage::Decoded(image) => Some(image),
            _ => None,
        }
    }

    /// Whether this record needs attention instead of display.
    pub fn is_flagged(&self) -> bool {
        !matches!(self, PatchImage::Decoded(_))
    }
}

/// One record of a page window.
#[derive(Debug, Clone)]
pub struct Record {
    pub index: u64,
    pub image: PatchImage,
    /// `None` when no label entry was ever written.
    pub label: Option<String>,
}

impl Record {
    /// Whether the label is the deletion tombstone.
    pub fn is_deleted(&self) -> bool {
        self.label.as_deref() == Some(TOMBSTONE_LABEL)
    }

    /// Label text with unset labels read as empty.
    pub fn label_or_empty(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }
}
