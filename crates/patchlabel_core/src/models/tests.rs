use super::record::{PatchImage, Record};
use crate::constants::TOMBSTONE_LABEL;
use image::DynamicImage;

fn record(label: Option<&str>, image: PatchImage) -> Record {
    Record {
        index: 3,
        image,
        label: label.map(str::to_string),
    }
}

#[test]
fn tombstone_label_marks_record_deleted() {
    assert!(record(Some(TOMBSTONE_LABEL), PatchImage::Missing).is_deleted());
    assert!(!record(Some("hello"), PatchImage::Missing).is_deleted());
    assert!(!record(None, PatchImage::Missing).is_deleted());
}

#[test]
fn unset_label_reads_as_empty() {
    assert_eq!(record(None, PatchImage::Missing).label_or_empty(), "");
    assert_eq!(record(Some("abc"), PatchImage::Missing).label_or_empty(), "abc");
}

#[test]
fn only_decoded_images_are_unflagged() {
    let decoded = PatchImage::Decoded(DynamicImage::new_rgb8(2, 2));
    assert!(!decoded.is_flagged());
    assert!(decoded.decoded().is_some());
    assert!(PatchImage::Missing.is_flagged());
    assert!(PatchImage::Undecodable {
        reason: "bad".to_string()
    }
    .is_flagged());
}
