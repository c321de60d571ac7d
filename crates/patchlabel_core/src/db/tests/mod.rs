//! Dataset storage tests.

use super::*;
use crate::codec::{encode_count, image_key, label_key};
use crate::test_support::{sample_label, sample_patch, setup_temp_dataset, write_dataset};
use tempfile::TempDir;

fn connect(path: &Path) -> Dataset {
    Dataset::connect(path, &DatasetOptions::default()).expect("connect dataset")
}
