//! Structured Text Helpers
//!
//! Helpers for extracting embedded glyph runs from MuPDF pages,
//! including line positions and font sizes.

use mupdf::{Page, TextPageOptions};

use crate::document::Result;

/// One line of embedded text in PDF point space (origin top-left)
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub text: String,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    /// Largest glyph size on the line, in points
    pub font_size: Option<f32>,
    /// Non-whitespace glyphs on the line
    pub glyph_count: usize,
}

impl GlyphRun {
    pub fn area(&self) -> f32 {
        (self.x1 - self.x0).max(0.0) * (self.y1 - self.y0).max(0.0)
    }
}

/// Extract glyph runs from a page, one per stext line, in reading order
///
/// Lines containing only whitespace are skipped. Font name, weight and
/// colour are not exposed per character by the MuPDF 0.5 bindings, so only
/// the size is reported.
pub fn extract_glyph_runs(page: &Page) -> Result<Vec<GlyphRun>> {
    let text_page = page.to_text_page(TextPageOptions::PRESERVE_WHITESPACE)?;
    let mut runs = Vec::new();

    for block in text_page.blocks() {
        for line in block.lines() {
            let mut text = String::new();
            let mut font_size: Option<f32> = None;
            let mut glyph_count = 0;

            for ch in line.chars() {
                if let Some(c) = ch.char() {
                    text.push(c);
                    if !c.is_whitespace() {
                        glyph_count += 1;
                        let size = ch.size();
                        font_size = Some(font_size.map_or(size, |s: f32| s.max(size)));
                    }
                }
            }

            if glyph_count == 0 {
                continue;
            }

            let bounds = line.bounds();
            runs.push(GlyphRun {
                text: text.trim().to_string(),
                x0: bounds.x0,
                y0: bounds.y0,
                x1: bounds.x1,
                y1: bounds.y1,
                font_size,
                glyph_count,
            });
        }
    }

    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mupdf::SafeDocument;
    use crate::test_support::{PdfBuilder, PdfPage};

    #[test]
    fn test_glyph_runs_in_reading_order() {
        let pdf = PdfBuilder::new()
            .page(
                PdfPage::blank(600.0, 400.0)
                    .text(100.0, 100.0, 24.0, "Quarterly Review")
                    .text(100.0, 200.0, 12.0, "Revenue grew"),
            )
            .build();
        let doc = SafeDocument::from_bytes(pdf, "runs.pdf".into()).unwrap();

        let runs = doc.with_page(0, extract_glyph_runs).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Quarterly Review");
        assert_eq!(runs[1].text, "Revenue grew");
        assert_eq!(runs[0].glyph_count, 15);
        assert!(runs[0].y0 < runs[1].y0);
        assert!((runs[0].font_size.unwrap() - 24.0).abs() < 0.5);
    }

    #[test]
    fn test_blank_page_has_no_runs() {
        let pdf = PdfBuilder::new().page(PdfPage::blank(300.0, 200.0)).build();
        let doc = SafeDocument::from_bytes(pdf, "blank.pdf".into()).unwrap();
        let runs = doc.with_page(0, extract_glyph_runs).unwrap();
        assert!(runs.is_empty());
    }
}
