//! Core page types
//!
//! Pixel buffers and text regions shared by the raster, OCR, mask,
//! inpaint and layout stages.

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// A single rasterized source page
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based ordinal
    pub index: usize,
    /// Buffer width in pixels
    pub pixel_width: u32,
    /// Buffer height in pixels
    pub pixel_height: u32,
    /// Three-channel RGB buffer (`width * height * 3` bytes)
    pub pixels: RgbImage,
}

impl Page {
    pub fn new(index: usize, pixels: RgbImage) -> Self {
        Self {
            index,
            pixel_width: pixels.width(),
            pixel_height: pixels.height(),
            pixels,
        }
    }
}

/// A page after text removal
#[derive(Debug, Clone)]
pub struct CleanedPage {
    pub index: usize,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Same format as `Page::pixels`, text areas reconstructed
    pub clean_pixels: RgbImage,
    /// Regions used to build the mask, in engine order
    pub regions: Vec<TextRegion>,
}

/// Axis-aligned rectangle in page pixel coordinates (origin top-left)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from floating-point edges, clamped to the page
    ///
    /// Edges are rounded outward so the result never shrinks the source box.
    pub fn from_edges(x0: f32, y0: f32, x1: f32, y1: f32, page_width: u32, page_height: u32) -> Self {
        let (lo_x, hi_x) = (x0.min(x1), x0.max(x1));
        let (lo_y, hi_y) = (y0.min(y1), y0.max(y1));

        let left = clamp_coord(lo_x.floor(), page_width);
        let top = clamp_coord(lo_y.floor(), page_height);
        let right = clamp_coord(hi_x.ceil(), page_width).max(left);
        let bottom = clamp_coord(hi_y.ceil(), page_height).max(top);

        Self::new(left, top, right - left, bottom - top)
    }

    /// Bounding rectangle of a vertex list, clamped to the page
    pub fn enclosing(vertices: &[Vertex], page_width: u32, page_height: u32) -> Option<Self> {
        let first = vertices.first()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for v in &vertices[1..] {
            x0 = x0.min(v.x);
            y0 = y0.min(v.y);
            x1 = x1.max(v.x);
            y1 = y1.max(v.y);
        }
        Some(Self::from_edges(
            x0 as f32,
            y0 as f32,
            x1 as f32,
            y1 as f32,
            page_width,
            page_height,
        ))
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether the rectangle lies inside a `width × height` page
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }

    /// Grow by `pad` pixels on every side, clipped to the page
    pub fn expand(&self, pad: u32, page_width: u32, page_height: u32) -> Self {
        let left = self.x.saturating_sub(pad);
        let top = self.y.saturating_sub(pad);
        let right = self.right().saturating_add(pad).min(page_width);
        let bottom = self.bottom().saturating_add(pad).min(page_height);
        Self::new(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        )
    }
}

fn clamp_coord(value: f32, limit: u32) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= limit as f32 {
        limit
    } else {
        value as u32
    }
}

/// Polygon vertex in page pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
}

impl Vertex {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// 24-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb24(pub u8, pub u8, pub u8);

impl Rgb24 {
    /// Dark gray used when the source colour is unknown
    pub const DEFAULT_TEXT: Rgb24 = Rgb24(0x33, 0x33, 0x33);

    /// Unpack a `0xRRGGBB` integer
    pub fn from_packed(value: u32) -> Self {
        Self(
            ((value >> 16) & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        )
    }

    /// Uppercase hex form used by DrawingML (`333333`)
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Font attributes recovered from an embedded text layer
///
/// OCR never fills these; only the fallback extractor does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontHints {
    /// Font size in page pixels (points × zoom)
    pub size_px: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<Rgb24>,
    pub name: Option<String>,
}

/// One OCR-detected (or embedded) block of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    /// Recognized text, intra-block line breaks preserved
    pub text: String,
    /// Bounds in page pixel coordinates
    pub bounds: PixelRect,
    /// Optional hull (≥ 4 vertices) in page pixel coordinates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<Vertex>>,
    /// Engine self-reported quality in `[0, 1]`
    pub confidence: f32,
    /// Font metadata from the embedded text layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontHints>,
}

impl TextRegion {
    pub fn new(text: impl Into<String>, bounds: PixelRect) -> Self {
        Self {
            text: text.into(),
            bounds,
            polygon: None,
            confidence: 1.0,
            font: None,
        }
    }

    pub fn with_polygon(mut self, polygon: Vec<Vertex>) -> Self {
        self.polygon = if polygon.len() >= 4 { Some(polygon) } else { None };
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_font(mut self, font: FontHints) -> Self {
        self.font = Some(font);
        self
    }

    /// Whether the region carries any visible text
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_edges_rounds_outward_and_clamps() {
        let rect = PixelRect::from_edges(10.4, 20.6, 30.2, 40.1, 100, 100);
        assert_eq!(rect, PixelRect::new(10, 20, 21, 21));

        let clipped = PixelRect::from_edges(-5.0, 90.0, 120.0, 130.0, 100, 100);
        assert_eq!(clipped, PixelRect::new(0, 90, 100, 10));
        assert!(clipped.fits_within(100, 100));
    }

    #[test]
    fn test_rect_enclosing_vertices() {
        let vertices = vec![
            Vertex::new(50, 50),
            Vertex::new(170, 48),
            Vertex::new(172, 90),
            Vertex::new(48, 92),
        ];
        let rect = PixelRect::enclosing(&vertices, 800, 600).unwrap();
        assert_eq!(rect, PixelRect::new(48, 48, 124, 44));
        assert!(PixelRect::enclosing(&[], 800, 600).is_none());
    }

    #[test]
    fn test_rect_expand_clips_to_page() {
        let rect = PixelRect::new(2, 3, 10, 10).expand(5, 14, 100);
        assert_eq!(rect, PixelRect::new(0, 0, 14, 18));
    }

    #[test]
    fn test_region_polygon_requires_four_vertices() {
        let region = TextRegion::new("Hi", PixelRect::new(0, 0, 4, 4))
            .with_polygon(vec![Vertex::new(0, 0), Vertex::new(4, 0), Vertex::new(4, 4)]);
        assert!(region.polygon.is_none());
    }

    #[test]
    fn test_region_has_text() {
        assert!(TextRegion::new("Hello", PixelRect::new(0, 0, 1, 1)).has_text());
        assert!(!TextRegion::new(" \n\t", PixelRect::new(0, 0, 1, 1)).has_text());
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb24::DEFAULT_TEXT.to_hex(), "333333");
        assert_eq!(Rgb24::from_packed(0x12AB00), Rgb24(0x12, 0xAB, 0x00));
    }
}
