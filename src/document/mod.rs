//! Page data model
//!
//! Types that flow between the pipeline stages:
//!
//! ```text
//! Page ──► TextRegion[] ──► mask ──► CleanedPage ──► Slide
//! ```
//!
//! Ownership is tree-shaped. A `Page` owns its pixels, a `CleanedPage` owns
//! the inpainted pixels plus the region list, and nothing points back up.

mod error;
mod types;

pub use error::{ConvertError, Result};
pub use types::{CleanedPage, FontHints, Page, PixelRect, Rgb24, TextRegion, Vertex};
