//! Pixel → slide layout
//!
//! Maps text regions from page pixel space onto the output slide and picks
//! the run formatting for each frame.

use crate::document::{Rgb24, TextRegion};
use crate::pptx::{SlideGeometry, TextFrame, TextStyle, EMU_PER_INCH, EMU_PER_POINT};

/// Bounds for estimated font sizes, in points
const MIN_ESTIMATED_PT: f64 = 8.0;
const MAX_ESTIMATED_PT: f64 = 48.0;

/// Box height to font size ratio
const CAP_HEIGHT_FACTOR: f64 = 0.6;

/// Font sizes DrawingML accepts, in hundredths of a point
const MIN_SIZE: u32 = 100;
const MAX_SIZE: u32 = 400_000;

#[derive(Debug, Clone)]
pub struct LayoutMapper {
    geometry: SlideGeometry,
    font_name: Option<String>,
}

impl LayoutMapper {
    pub fn new(geometry: SlideGeometry, font_name: Option<String>) -> Self {
        Self {
            geometry,
            font_name,
        }
    }

    pub fn geometry(&self) -> SlideGeometry {
        self.geometry
    }

    /// One frame per region with visible text, in region order
    pub fn map_regions(&self, pixel_width: u32, pixel_height: u32, regions: &[TextRegion]) -> Vec<TextFrame> {
        regions
            .iter()
            .filter(|r| r.has_text())
            .map(|r| self.map_region(pixel_width, pixel_height, r))
            .collect()
    }

    pub fn map_region(&self, pixel_width: u32, pixel_height: u32, region: &TextRegion) -> TextFrame {
        let scale_x = self.geometry.scale_x(pixel_width);
        let scale_y = self.geometry.scale_y(pixel_height);
        let (slide_w, slide_h) = (self.geometry.slide_width, self.geometry.slide_height);

        let x = scale(region.bounds.x, scale_x).clamp(0, slide_w);
        let y = scale(region.bounds.y, scale_y).clamp(0, slide_h);
        let cx = scale(region.bounds.width, scale_x).clamp(0, slide_w - x);
        let cy = scale(region.bounds.height, scale_y).clamp(0, slide_h - y);

        TextFrame {
            x,
            y,
            cx,
            cy,
            text: region.text.clone(),
            style: self.style_for(region, scale_y),
        }
    }

    fn style_for(&self, region: &TextRegion, scale_y: f64) -> TextStyle {
        let font = region.font.as_ref();

        let size = match font.and_then(|f| f.size_px) {
            Some(size_px) => source_size(size_px, scale_y),
            None => estimate_font_pt(region.bounds.height, scale_y) * 100,
        };

        TextStyle {
            size,
            bold: font.and_then(|f| f.bold).unwrap_or(false),
            italic: font.and_then(|f| f.italic).unwrap_or(false),
            color: font.and_then(|f| f.color).unwrap_or(Rgb24::DEFAULT_TEXT),
            font_name: font
                .and_then(|f| f.name.clone())
                .or_else(|| self.font_name.clone()),
        }
    }
}

fn scale(value: u32, factor: f64) -> i64 {
    (value as f64 * factor).round() as i64
}

/// Estimated size in whole points for a box `height_px` tall
pub fn estimate_font_pt(height_px: u32, scale_y: f64) -> u32 {
    let inches = height_px as f64 * scale_y / EMU_PER_INCH as f64;
    (inches * 72.0 * CAP_HEIGHT_FACTOR)
        .round()
        .clamp(MIN_ESTIMATED_PT, MAX_ESTIMATED_PT) as u32
}

/// Embedded font size (page pixels) in hundredths of a slide point
fn source_size(size_px: f32, scale_y: f64) -> u32 {
    let points = size_px as f64 * scale_y / EMU_PER_POINT as f64;
    ((points * 100.0).round() as u32).clamp(MIN_SIZE, MAX_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FontHints, PixelRect};

    fn mapper() -> LayoutMapper {
        LayoutMapper::new(SlideGeometry::WIDESCREEN, None)
    }

    #[test]
    fn test_maps_hello_region() {
        // 2000×1125 page is exactly 16:9 at this slide size
        let region = TextRegion::new("Hello", PixelRect::new(100, 100, 400, 80));
        let frame = mapper().map_region(2000, 1125, &region);

        assert_eq!(frame.x, 609_585);
        assert_eq!(frame.y, 609_600);
        assert_eq!(frame.cx, 2_438_339);
        assert_eq!(frame.cy, 487_680);
        assert_eq!(frame.text, "Hello");
        // 0.533 in × 72 × 0.6 = 23.04
        assert_eq!(frame.style.size, 2300);
        assert_eq!(frame.style.color, Rgb24::DEFAULT_TEXT);
        assert!(!frame.style.bold);
    }

    #[test]
    fn test_estimate_is_clamped() {
        assert_eq!(estimate_font_pt(1, 4572.0), 8);
        assert_eq!(estimate_font_pt(1500, 4572.0), 48);
        for h in [0, 3, 20, 90, 400, 2000] {
            let pt = estimate_font_pt(h, 4572.0);
            assert!((8..=48).contains(&pt));
        }
    }

    #[test]
    fn test_frames_stay_inside_slide() {
        let m = mapper();
        let g = m.geometry();
        for (pw, ph) in [(1600, 1200), (2000, 1125), (595, 842), (7, 3)] {
            let region = TextRegion::new("edge", PixelRect::new(0, 0, pw, ph));
            let frame = m.map_region(pw, ph, &region);
            assert!(frame.x >= 0 && frame.x + frame.cx <= g.slide_width);
            assert!(frame.y >= 0 && frame.y + frame.cy <= g.slide_height);
            assert!((frame.cx - g.slide_width).abs() <= 1);
            assert!((frame.cy - g.slide_height).abs() <= 1);
        }
    }

    #[test]
    fn test_non_widescreen_scales_per_axis() {
        // 4:3 page stretched onto 16:9
        let region = TextRegion::new("t", PixelRect::new(800, 600, 160, 120));
        let frame = mapper().map_region(1600, 1200, &region);
        let g = SlideGeometry::WIDESCREEN;
        assert_eq!(frame.x, (800.0 * g.slide_width as f64 / 1600.0).round() as i64);
        assert_eq!(frame.y, g.slide_height / 2);
        assert_eq!(frame.cy, (120.0 * g.slide_height as f64 / 1200.0).round() as i64);
    }

    #[test]
    fn test_source_font_hints_win() {
        let font = FontHints {
            size_px: Some(48.0),
            bold: Some(true),
            italic: Some(true),
            color: Some(Rgb24(0xFF, 0, 0)),
            name: Some("Georgia".to_string()),
        };
        let region = TextRegion::new("Title", PixelRect::new(0, 0, 100, 60)).with_font(font);
        let m = LayoutMapper::new(SlideGeometry::WIDESCREEN, Some("Arial".to_string()));

        // 48 px on a 1500 px tall page: 48 × 4572 / 12700 = 17.28 pt
        let frame = m.map_region(2000, 1500, &region);
        assert_eq!(frame.style.size, 1728);
        assert!(frame.style.bold && frame.style.italic);
        assert_eq!(frame.style.color, Rgb24(0xFF, 0, 0));
        assert_eq!(frame.style.font_name.as_deref(), Some("Georgia"));
    }

    #[test]
    fn test_configured_font_name_applies_without_source() {
        let m = LayoutMapper::new(SlideGeometry::WIDESCREEN, Some("Arial".to_string()));
        let region = TextRegion::new("x", PixelRect::new(0, 0, 10, 10));
        let frame = m.map_region(100, 100, &region);
        assert_eq!(frame.style.font_name.as_deref(), Some("Arial"));
    }

    #[test]
    fn test_empty_regions_dropped() {
        let regions = vec![
            TextRegion::new("A", PixelRect::new(0, 0, 10, 10)),
            TextRegion::new("  ", PixelRect::new(0, 0, 10, 10)),
            TextRegion::new("B\nC", PixelRect::new(0, 20, 10, 10)),
        ];
        let frames = mapper().map_regions(100, 100, &regions);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].text, "B\nC");
    }
}
