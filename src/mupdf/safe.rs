//! Thread-safe document wrapper for MuPDF
//!
//! Provides a safe abstraction over a MuPDF document that ensures
//! thread-safe access through serialization.
//!
//! # Design
//!
//! MuPDF documents are not `Send`. This wrapper:
//!
//! 1. Reads the PDF file and opens the document once
//! 2. Keeps the open document behind a `parking_lot::Mutex`
//! 3. Closes it when the wrapper is dropped
//!
//! The wrapper can therefore be moved into `spawn_blocking` closures while
//! pages loaded from it never leave the closure.

use std::path::Path;

use mupdf::{Document, Page};
use parking_lot::Mutex;

use crate::document::{ConvertError, Result};

const PDF_MIME: &str = "application/pdf";

/// Open PDF with serialized MuPDF access
pub struct SafeDocument {
    /// The open document; every use holds the lock
    document: Mutex<Document>,
    /// Document identifier (file name for logs)
    id: String,
    /// Cached page count
    page_count: usize,
}

// SAFETY: SafeDocument is Send + Sync because:
//
// 1. The MuPDF document is only reachable through `with_page`, which holds
//    the mutex for the whole call, so no two threads touch it at once.
//    MuPDF allows a document to move between cloned per-thread contexts as
//    long as its use is not concurrent.
//
// 2. Pages loaded from the document are passed by reference to the closure
//    and dropped before the lock is released; none escape.
//
// 3. `id` and `page_count` are immutable after construction.
unsafe impl Send for SafeDocument {}
unsafe impl Sync for SafeDocument {}

impl SafeDocument {
    /// Read and open a PDF from disk
    ///
    /// The file handle is closed before this returns.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            ConvertError::Input(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(data, id)
    }

    /// Open a SafeDocument from bytes
    ///
    /// MuPDF keeps its own copy of the data, so `data` is freed here.
    pub fn from_bytes(data: Vec<u8>, id: String) -> Result<Self> {
        if !data.starts_with(b"%PDF") {
            return Err(ConvertError::Input(format!("{} is not a PDF file", id)));
        }

        let document = Document::from_bytes(&data, PDF_MIME)
            .map_err(|e| ConvertError::Input(format!("Failed to open {}: {}", id, e)))?;
        let page_count = document
            .page_count()
            .map_err(|e| ConvertError::Input(format!("Failed to count pages of {}: {}", id, e)))?
            as usize;

        Ok(Self {
            document: Mutex::new(document),
            id,
            page_count,
        })
    }

    /// Get the document ID
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Execute a closure with a loaded page (0-based index)
    ///
    /// A MuPDF failure while loading surfaces as `ConvertError::Rasterize`.
    pub fn with_page<F, R>(&self, page_index: usize, f: F) -> Result<R>
    where
        F: FnOnce(&Page) -> Result<R>,
    {
        if page_index >= self.page_count {
            return Err(ConvertError::Rasterize(format!(
                "Page {} not found (document has {} pages)",
                page_index + 1,
                self.page_count
            )));
        }

        let document = self.document.lock();
        let page = document.load_page(page_index as i32)?;
        f(&page)
    }
}
