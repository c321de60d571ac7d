//! Terminal page view: renders pushed pages into a shared buffer.

use patchlabel_core::{PageView, PatchImage, Record};
use std::cell::RefCell;
use std::rc::Rc;

/// Rendered lines of the most recently pushed page.
pub(crate) type PageBuffer = Rc<RefCell<Option<Vec<String>>>>;

/// [`PageView`] that renders records as text rows.
pub(crate) struct TerminalView {
    page_size: usize,
    rendered: PageBuffer,
}

impl TerminalView {
    pub(crate) fn new(page_size: usize) -> (Self, PageBuffer) {
        let rendered = PageBuffer::default();
        (
            Self {
                page_size,
                rendered: Rc::clone(&rendered),
            },
            rendered,
        )
    }
}

impl PageView for TerminalView {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn show_page(&mut self, page: &[Record]) {
        let lines = page.iter().map(format_record).collect();
        *self.rendered.borrow_mut() = Some(lines);
    }
}

/// One display row: index, image geometry (or flag), label.
pub(crate) fn format_record(record: &Record) -> String {
    let image = match &record.image {
        PatchImage::Decoded(image) => format!("{}x{}", image.width(), image.height()),
        PatchImage::Missing => "missing".to_string(),
        PatchImage::Undecodable { .. } => "corrupt".to_string(),
    };
    let label = if record.is_deleted() {
        "<deleted>".to_string()
    } else {
        match record.label.as_deref() {
            Some(label) => format!("{:?}", label),
            None => "<unset>".to_string(),
        }
    };
    format!("{:>9}  {:<9}  {}", record.index, image, label)
}

/// Take the last rendered page, if one was pushed since the previous take.
pub(crate) fn take_rendered(buffer: &PageBuffer) -> Option<Vec<String>> {
    buffer.borrow_mut().take()
}
