//! pdf2deck Library
//!
//! Rebuilds flat PDF slide decks as editable presentations: each page is
//! rasterized, its text detected, the text pixels painted out, and the text
//! placed back as editable frames over the cleaned image.
//!
//! # Modules
//!
//! - `raster`: Page rasterization via MuPDF
//! - `fallback`: Embedded text layer extraction (skips OCR when sufficient)
//! - `ocr`: Remote text detection with retry
//! - `mask`: Text mask construction
//! - `inpaint`: Mask-driven background reconstruction
//! - `layout`: Pixel → slide coordinate mapping
//! - `pptx`: Presentation model and package writer
//! - `pipeline`: Per-page orchestration, progress and reporting

pub mod config;
pub mod document;
pub mod fallback;
pub mod inpaint;
pub mod layout;
pub mod mask;
pub mod ocr;
pub mod pipeline;
pub mod pptx;
pub mod raster;

// MuPDF wrappers used by raster and fallback
mod mupdf;

#[cfg(test)]
mod test_support;

pub use config::ConvertConfig;
pub use document::{ConvertError, Result};
pub use pipeline::{ConversionReport, Converter, Outcome};
