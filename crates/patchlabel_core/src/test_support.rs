//! Shared test-only helpers for patchlabel_core.

use crate::controller::PageView;
use crate::db::DatasetWriter;
use crate::models::record::Record;
use image::{DynamicImage, Rgb, RgbImage};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

/// Small solid patch whose width varies with `index`.
pub(crate) fn sample_patch(index: u64) -> DynamicImage {
    let width = 16 + (index % 5) as u32 * 4;
    let shade = (index * 37 % 256) as u8;
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, 8, Rgb([shade, 255 - shade, 64])))
}

/// Label written for `index` by [`setup_temp_dataset`].
pub(crate) fn sample_label(index: u64) -> String {
    format!("text-{}", index)
}

/// Creates a dataset of `count` labeled records in a fresh temp dir.
///
/// Keep the [`TempDir`] alive for the full test to preserve the backing files.
///
/// # Panics
/// Panics if the temp dir or any dataset write fails.
pub(crate) fn setup_temp_dataset(count: u64) -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("dataset");
    write_dataset(&path, count);
    (path, temp_dir)
}

/// Writes `count` labeled records to `path`.
///
/// # Panics
/// Panics if any dataset write fails.
pub(crate) fn write_dataset(path: &std::path::Path, count: u64) {
    let mut writer = DatasetWriter::create(path).expect("create dataset");
    for index in 0..count {
        let label = sample_label(index);
        writer
            .append(&sample_patch(index), Some(label.as_str()))
            .expect("append record");
    }
    writer.finish().expect("finish dataset");
}

/// Pages pushed to a [`RecordingView`], as record indices.
pub(crate) type PageLog = Rc<RefCell<Vec<Vec<u64>>>>;

/// View that records every pushed page.
pub(crate) struct RecordingView {
    page_size: usize,
    pages: PageLog,
}

impl RecordingView {
    /// Create a view and the shared log it writes into.
    pub(crate) fn new(page_size: usize) -> (Self, PageLog) {
        let pages = PageLog::default();
        (
            Self {
                page_size,
                pages: Rc::clone(&pages),
            },
            pages,
        )
    }
}

impl PageView for RecordingView {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn show_page(&mut self, page: &[Record]) {
        self.pages
            .borrow_mut()
            .push(page.iter().map(|record| record.index).collect());
    }
}
