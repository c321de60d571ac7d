//! Page navigation over one open dataset with a persisted resume position.
//!
//! The controller owns the dataset handle and the bookmark. Every successful
//! open or navigation pushes the new page to the attached [`PageView`] and
//! rewrites the bookmark.

use crate::bookmark::BookmarkStore;
use crate::config::Config;
use crate::db::{Dataset, DatasetOptions};
use crate::error::AppError;
use crate::models::record::Record;
use std::path::Path;

/// Presentation capability the controller pushes pages to.
pub trait PageView {
    /// Records displayed per page.
    fn page_size(&self) -> usize;

    /// Display a freshly fetched page.
    fn show_page(&mut self, page: &[Record]);
}

/// Navigation state for one labeling session.
pub struct Controller {
    bookmark: BookmarkStore,
    dataset: Option<Dataset>,
    options: DatasetOptions,
    start_index: u64,
    record_count: u64,
    view: Option<Box<dyn PageView>>,
}

impl Controller {
    /// Create a controller and load its bookmark.
    ///
    /// No dataset is opened until [`Controller::load_bookmark`] or
    /// [`Controller::open`] is called.
    pub fn new(config: &Config, view: Option<Box<dyn PageView>>) -> Self {
        let bookmark = BookmarkStore::load(&config.bookmark_path, config.resume_policy());
        let start_index = bookmark.last_index();
        Self {
            bookmark,
            dataset: None,
            options: config.dataset_options(),
            start_index,
            record_count: 0,
            view,
        }
    }

    /// Re-open the remembered dataset, if any.
    ///
    /// # Returns
    /// `Ok(true)` when a dataset was restored, `Ok(false)` without a bookmark.
    ///
    /// # Errors
    /// Propagates [`Controller::open`] failures.
    pub fn load_bookmark(&mut self) -> Result<bool, AppError> {
        let Some(path) = self.bookmark.last_path().map(str::to_string) else {
            return Ok(false);
        };
        self.open(&path, None)?;
        Ok(true)
    }

    /// Connect to `path` and show the page at `start_index` (or the current one).
    ///
    /// Re-opening the dataset that is already open, under any spelling of its
    /// path, refreshes its record count in place.
    ///
    /// The page is fetched and the bookmark written before the controller
    /// switches over.
    ///
    /// # Errors
    /// Returns the connect, fetch, or bookmark failure; the previously open
    /// dataset, if any, stays open and the position is unchanged.
    pub fn open(
        &mut self,
        path: impl AsRef<Path>,
        start_index: Option<u64>,
    ) -> Result<(), AppError> {
        let path = path.as_ref();
        let start = start_index.unwrap_or(self.start_index);

        let replacement = match self.dataset.as_mut() {
            Some(open) if open.refers_to(path) => {
                open.refresh_record_count()?;
                None
            }
            _ => Some(Dataset::connect(path, &self.options)?),
        };
        let Some(dataset) = replacement.as_ref().or(self.dataset.as_ref()) else {
            return Err(AppError::NotConnected);
        };

        let page = match self.view.as_ref() {
            Some(view) => Some(dataset.fetch_range(start, view.page_size())?),
            None => None,
        };
        let record_count = dataset.record_count();
        let stored_path = dataset.path().to_string_lossy().into_owned();
        self.bookmark.update_all(&stored_path, start)?;

        // Replacing the handle drops the previous connection and its locks.
        if let Some(dataset) = replacement {
            self.dataset = Some(dataset);
        }
        self.record_count = record_count;
        self.start_index = start;
        tracing::info!(
            "Opened {} at {} ({} records)",
            stored_path,
            start,
            record_count
        );

        match (self.view.as_mut(), page) {
            (Some(view), Some(page)) => view.show_page(&page),
            _ => tracing::info!("No view attached; opened {} without display", stored_path),
        }
        Ok(())
    }

    /// Advance one page, wrapping to the top past the end.
    ///
    /// Without a view there is no page size, so this only logs.
    ///
    /// # Errors
    /// Returns [`AppError::NotConnected`] without a dataset, or a fetch or
    /// bookmark write failure.
    pub fn next_page(&mut self) -> Result<(), AppError> {
        self.require_dataset()?;
        let Some(page_size) = self.view_page_size() else {
            tracing::info!("No view attached; next page ignored");
            return Ok(());
        };

        self.start_index = if self.start_index.saturating_add(page_size) > self.record_count {
            0
        } else {
            self.start_index + page_size
        };
        self.navigate()
    }

    /// Go back one page, jumping to the last full page before the top.
    ///
    /// The jump target is clamped at 0 when the dataset is smaller than a page.
    ///
    /// # Errors
    /// Same as [`Controller::next_page`].
    pub fn prev_page(&mut self) -> Result<(), AppError> {
        self.require_dataset()?;
        let Some(page_size) = self.view_page_size() else {
            tracing::info!("No view attached; previous page ignored");
            return Ok(());
        };

        self.start_index = if self.start_index < page_size {
            self.record_count.saturating_sub(page_size)
        } else {
            self.start_index - page_size
        };
        self.navigate()
    }

    /// Start the page at `index`.
    ///
    /// # Errors
    /// Returns [`AppError::IndexOutOfRange`] (state unchanged) when `index` is
    /// not below the record count, plus the failures of [`Controller::next_page`].
    pub fn go_to(&mut self, index: u64) -> Result<(), AppError> {
        self.require_dataset()?;
        if index >= self.record_count {
            return Err(AppError::IndexOutOfRange {
                index,
                count: self.record_count,
            });
        }
        self.start_index = index;
        if self.view.is_none() {
            tracing::info!("No view attached; moved to {} without display", index);
            return self.bookmark.update_index(self.start_index);
        }
        self.navigate()
    }

    /// Push the current page to the view again.
    ///
    /// # Errors
    /// Returns [`AppError::NotConnected`] without a dataset or a fetch failure.
    pub fn show_current_page(&mut self) -> Result<(), AppError> {
        self.require_dataset()?;
        self.push_page()
    }

    /// Fetch up to `limit` records from the current page start.
    ///
    /// # Errors
    /// Returns [`AppError::NotConnected`] without a dataset or a fetch failure.
    pub fn current_page(&self, limit: usize) -> Result<Vec<Record>, AppError> {
        self.require_dataset()?.fetch_range(self.start_index, limit)
    }

    /// Write a new label for `index`.
    ///
    /// The page is not re-pushed; the view reflects the edit itself.
    ///
    /// # Errors
    /// Returns [`AppError::NotConnected`] or [`AppError::WriteFailed`].
    pub fn edit_label(&mut self, index: u64, text: &str) -> Result<(), AppError> {
        self.require_dataset()?.set_label(index, text)
    }

    /// Tombstone the label for `index`.
    ///
    /// # Errors
    /// Same as [`Controller::edit_label`].
    pub fn mark_deleted(&mut self, index: u64) -> Result<(), AppError> {
        self.require_dataset()?.mark_deleted(index)
    }

    /// `"<path>: <start>/<count>"`, or `None` with no dataset open.
    pub fn status_text(&self) -> Option<String> {
        self.dataset.as_ref().map(|dataset| {
            format!(
                "{}: {}/{}",
                dataset.path().display(),
                self.start_index,
                self.record_count
            )
        })
    }

    /// Close the open dataset, releasing its locks.
    pub fn close(&mut self) {
        if let Some(dataset) = self.dataset.take() {
            tracing::info!("Closed {}", dataset.path().display());
        }
        self.record_count = 0;
    }

    /// Current page start.
    pub fn start_index(&self) -> u64 {
        self.start_index
    }

    /// Record count of the open dataset (0 when none).
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Whether a dataset is connected.
    pub fn is_open(&self) -> bool {
        self.dataset.is_some()
    }

    /// The persisted bookmark.
    pub fn bookmark(&self) -> &BookmarkStore {
        &self.bookmark
    }

    fn require_dataset(&self) -> Result<&Dataset, AppError> {
        self.dataset.as_ref().ok_or(AppError::NotConnected)
    }

    fn view_page_size(&self) -> Option<u64> {
        self.view
            .as_ref()
            .map(|view| u64::try_from(view.page_size()).unwrap_or(u64::MAX))
    }

    fn navigate(&mut self) -> Result<(), AppError> {
        self.push_page()?;
        self.bookmark.update_index(self.start_index)
    }

    fn push_page(&mut self) -> Result<(), AppError> {
        let Some(view) = self.view.as_mut() else {
            return Ok(());
        };
        let Some(dataset) = self.dataset.as_ref() else {
            return Err(AppError::NotConnected);
        };
        let page = dataset.fetch_range(self.start_index, view.page_size())?;
        tracing::debug!("Showing {} records from {}", page.len(), self.start_index);
        view.show_page(&page);
        Ok(())
    }
}
