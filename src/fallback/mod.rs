//! Embedded text fallback
//!
//! Pages exported with a real text layer don't need OCR. The extractor
//! turns MuPDF glyph runs into `TextRegion`s and decides whether the layer
//! is dense enough to trust.

use crate::document::{FontHints, PixelRect, Result, TextRegion};
use crate::mupdf::{extract_glyph_runs, GlyphRun};

/// Acceptance thresholds for an embedded text layer
#[derive(Debug, Clone, Copy)]
pub struct FallbackExtractor {
    zoom: f32,
    min_glyphs: usize,
    min_area_ratio: f32,
}

impl FallbackExtractor {
    pub fn new(zoom: f32, min_glyphs: usize, min_area_ratio: f32) -> Self {
        Self {
            zoom,
            min_glyphs,
            min_area_ratio,
        }
    }

    /// Extract regions from a loaded page, or `None` when OCR is needed
    ///
    /// `pixel_width`/`pixel_height` are the rasterized page dimensions the
    /// regions are clamped to. The pixmap starts at the page bounds origin,
    /// so runs are moved into that frame first.
    pub fn extract(
        &self,
        page: &mupdf::Page,
        pixel_width: u32,
        pixel_height: u32,
    ) -> Result<Option<Vec<TextRegion>>> {
        let bounds = page.bounds()?;
        let runs = relative_to(extract_glyph_runs(page)?, bounds.x0, bounds.y0);
        Ok(self.accept(&runs, pixel_width, pixel_height))
    }

    /// Apply the density policy to already extracted runs
    pub fn accept(
        &self,
        runs: &[GlyphRun],
        pixel_width: u32,
        pixel_height: u32,
    ) -> Option<Vec<TextRegion>> {
        let glyphs: usize = runs.iter().map(|r| r.glyph_count).sum();
        if glyphs == 0 || glyphs < self.min_glyphs {
            return None;
        }

        let regions: Vec<TextRegion> = runs
            .iter()
            .map(|run| self.to_region(run, pixel_width, pixel_height))
            .filter(|region| region.has_text())
            .collect();

        // A zero glyph threshold means any embedded text wins
        if self.min_glyphs > 0 {
            let covered: u64 = regions.iter().map(|r| r.bounds.area()).sum();
            let page_area = pixel_width as f64 * pixel_height as f64;
            if (covered as f64) < self.min_area_ratio as f64 * page_area {
                tracing::debug!(
                    "Embedded text covers {} of {} px, below ratio {}",
                    covered,
                    page_area,
                    self.min_area_ratio
                );
                return None;
            }
        }

        Some(regions)
    }

    fn to_region(&self, run: &GlyphRun, pixel_width: u32, pixel_height: u32) -> TextRegion {
        let bounds = PixelRect::from_edges(
            run.x0 * self.zoom,
            run.y0 * self.zoom,
            run.x1 * self.zoom,
            run.y1 * self.zoom,
            pixel_width,
            pixel_height,
        );
        let font = FontHints {
            size_px: run.font_size.map(|size| size * self.zoom),
            ..Default::default()
        };
        TextRegion::new(run.text.clone(), bounds).with_font(font)
    }
}

/// Translate runs so `(origin_x, origin_y)` becomes the top-left corner
fn relative_to(mut runs: Vec<GlyphRun>, origin_x: f32, origin_y: f32) -> Vec<GlyphRun> {
    if origin_x == 0.0 && origin_y == 0.0 {
        return runs;
    }
    for run in &mut runs {
        run.x0 -= origin_x;
        run.x1 -= origin_x;
        run.y0 -= origin_y;
        run.y1 -= origin_y;
    }
    runs
}
