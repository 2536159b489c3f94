//! MuPDF access
//!
//! `SafeDocument` holds the PDF bytes and opens a fresh MuPDF document for
//! each page operation under a lock, so the wrapper itself is `Send + Sync`
//! and can cross into `spawn_blocking` while the MuPDF handles never leave
//! the closure.
//!
//! ```rust,ignore
//! use crate::mupdf::{extract_glyph_runs, SafeDocument};
//!
//! let doc = SafeDocument::from_path("deck.pdf")?;
//! let runs = doc.with_page(0, extract_glyph_runs)?;
//! ```

mod safe;
mod stext;

pub use safe::SafeDocument;
pub use stext::{extract_glyph_runs, GlyphRun};
