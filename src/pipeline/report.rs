//! Conversion results

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::document::ConvertError;

/// Per-page stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Rasterize,
    Ocr,
    Mask,
    Inpaint,
    Assemble,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Rasterize => "rasterize",
            Phase::Ocr => "ocr",
            Phase::Mask => "mask",
            Phase::Inpaint => "inpaint",
            Phase::Assemble => "assemble",
        };
        f.write_str(name)
    }
}

/// A page that fell back to a placeholder slide
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageFailure {
    /// 1-based page ordinal
    pub index: usize,
    pub phase: Phase,
    pub error: String,
}

impl PageFailure {
    pub fn new(index: usize, phase: Phase, error: &ConvertError) -> Self {
        Self {
            index,
            phase,
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Partial,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub presentation_path: PathBuf,
    /// Slides written
    pub page_count: usize,
    pub failures: Vec<PageFailure>,
    pub cancelled: bool,
}

impl ConversionReport {
    /// Failed when every written slide is a placeholder
    pub fn outcome(&self) -> Outcome {
        if !self.failures.is_empty() && self.failures.len() >= self.page_count {
            Outcome::Failed
        } else if !self.failures.is_empty() || self.cancelled {
            Outcome::Partial
        } else {
            Outcome::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(page_count: usize, failed: &[usize], cancelled: bool) -> ConversionReport {
        ConversionReport {
            presentation_path: PathBuf::from("out.pptx"),
            page_count,
            failures: failed
                .iter()
                .map(|&index| {
                    PageFailure::new(index, Phase::Inpaint, &ConvertError::Inpaint("x".into()))
                })
                .collect(),
            cancelled,
        }
    }

    #[test]
    fn test_outcome() {
        assert_eq!(report(3, &[], false).outcome(), Outcome::Success);
        assert_eq!(report(3, &[2], false).outcome(), Outcome::Partial);
        assert_eq!(report(2, &[1, 2], false).outcome(), Outcome::Failed);
        assert_eq!(report(2, &[], true).outcome(), Outcome::Partial);
    }

    #[test]
    fn test_serializes_phase_lowercase() {
        let json = serde_json::to_value(report(3, &[2], false)).unwrap();
        assert_eq!(json["failures"][0]["phase"], "inpaint");
        assert_eq!(json["failures"][0]["index"], 2);
        assert_eq!(json["page_count"], 3);
    }
}
