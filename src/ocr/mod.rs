//! OCR Module
//!
//! Detects block-level text in rasterized pages.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pdf2deck::ocr::{OcrService, RetryPolicy, VisionProvider};
//!
//! let provider = VisionProvider::new(endpoint, &api_key, Duration::from_secs(60))?;
//! let service = OcrService::new(Arc::new(provider), RetryPolicy::default(), 0.0);
//! let regions = service.recognize(&page.pixels).await?;
//! ```

mod provider;
mod service;
mod types;

pub use provider::{TextDetector, VisionProvider};
pub use service::{OcrService, RetryPolicy};
pub use types::OcrError;

#[cfg(test)]
pub use provider::ScriptedDetector;
