//! Conversion error types
//!
//! Unified error handling for every stage of the PDF → presentation pipeline.

use thiserror::Error;

use crate::ocr::OcrError;

/// Unified conversion error type
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Bad options or missing credential
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input PDF could not be read or opened
    #[error("Input error: {0}")]
    Input(String),

    /// A page could not be decoded or rendered
    #[error("Rasterize error: {0}")]
    Rasterize(String),

    /// OCR credential rejected
    #[error("OCR authentication error: {0}")]
    OcrAuth(String),

    /// OCR network failure or server error (after retries)
    #[error("OCR transport error: {0}")]
    OcrTransport(String),

    /// OCR response missing required fields
    #[error("OCR format error: {0}")]
    OcrFormat(String),

    /// Mask/image invariant violated during inpainting
    #[error("Inpaint error: {0}")]
    Inpaint(String),

    /// Presentation could not be encoded or written
    #[error("Assemble error: {0}")]
    Assemble(String),
}

impl ConvertError {
    /// Whether the error aborts the whole conversion
    ///
    /// Fatal errors are surfaced to the caller; every other error is recorded
    /// as a page failure and the coordinator moves on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Input(_) | Self::OcrAuth(_) | Self::Assemble(_)
        )
    }
}

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

impl From<mupdf::Error> for ConvertError {
    fn from(err: mupdf::Error) -> Self {
        ConvertError::Rasterize(err.to_string())
    }
}

impl From<OcrError> for ConvertError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::Auth(msg) => ConvertError::OcrAuth(msg),
            OcrError::Transport(msg) => ConvertError::OcrTransport(msg),
            OcrError::Format(msg) => ConvertError::OcrFormat(msg),
        }
    }
}

impl From<crate::inpaint::InpaintError> for ConvertError {
    fn from(err: crate::inpaint::InpaintError) -> Self {
        ConvertError::Inpaint(err.to_string())
    }
}

impl From<zip::result::ZipError> for ConvertError {
    fn from(err: zip::result::ZipError) -> Self {
        ConvertError::Assemble(err.to_string())
    }
}

impl From<quick_xml::Error> for ConvertError {
    fn from(err: quick_xml::Error) -> Self {
        ConvertError::Assemble(err.to_string())
    }
}

impl From<image::ImageError> for ConvertError {
    fn from(err: image::ImageError) -> Self {
        ConvertError::Assemble(err.to_string())
    }
}
