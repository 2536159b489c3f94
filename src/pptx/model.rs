//! Presentation model
//!
//! In-memory slides ready for serialization. Geometry is in EMU
//! (914 400 per inch).

use crate::document::Rgb24;

/// EMU per inch
pub const EMU_PER_INCH: i64 = 914_400;

/// EMU per typographic point
pub const EMU_PER_POINT: i64 = 12_700;

/// Output slide dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideGeometry {
    pub slide_width: i64,
    pub slide_height: i64,
}

impl SlideGeometry {
    /// 13.333 in × 7.5 in
    pub const WIDESCREEN: SlideGeometry = SlideGeometry {
        slide_width: 12_191_695,
        slide_height: 6_858_000,
    };

    pub fn scale_x(&self, pixel_width: u32) -> f64 {
        self.slide_width as f64 / pixel_width.max(1) as f64
    }

    pub fn scale_y(&self, pixel_height: u32) -> f64 {
        self.slide_height as f64 / pixel_height.max(1) as f64
    }
}

impl Default for SlideGeometry {
    fn default() -> Self {
        Self::WIDESCREEN
    }
}

/// Full-slide background image
#[derive(Debug, Clone)]
pub struct Picture {
    /// Encoded PNG
    pub png: Vec<u8>,
}

/// Run formatting for a text frame
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Hundredths of a point
    pub size: u32,
    pub bold: bool,
    pub italic: bool,
    pub color: Rgb24,
    pub font_name: Option<String>,
}

/// Positioned text box
#[derive(Debug, Clone, PartialEq)]
pub struct TextFrame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
    /// Verbatim text; `\n` becomes a line break
    pub text: String,
    pub style: TextStyle,
}

#[derive(Debug, Clone, Default)]
pub struct Slide {
    pub background: Option<Picture>,
    /// In z-order, all above the background
    pub text_frames: Vec<TextFrame>,
}

impl Slide {
    /// Slide with nothing on it
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn with_background(png: Vec<u8>) -> Self {
        Self {
            background: Some(Picture { png }),
            text_frames: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Presentation {
    pub geometry: SlideGeometry,
    pub slides: Vec<Slide>,
}

impl Presentation {
    pub fn new(geometry: SlideGeometry) -> Self {
        Self {
            geometry,
            slides: Vec::new(),
        }
    }

    pub fn push(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}
