//! Slide assembly
//!
//! Turns cleaned pages into slides: a full-slide background picture followed
//! by one text frame per region.

use std::io::Cursor;
use std::path::Path;

use image::RgbImage;

use super::model::{Presentation, Slide};
use super::writer::write_presentation;
use crate::document::{CleanedPage, Page, Result};
use crate::layout::LayoutMapper;

pub struct PresentationAssembler {
    layout: LayoutMapper,
    use_background: bool,
    /// 0-100, blended over white
    background_opacity: u8,
    presentation: Presentation,
}

impl PresentationAssembler {
    pub fn new(layout: LayoutMapper, use_background: bool, background_opacity: u8) -> Self {
        let presentation = Presentation::new(layout.geometry());
        Self {
            layout,
            use_background,
            background_opacity: background_opacity.min(100),
            presentation,
        }
    }

    /// Append a slide for a cleaned page; the page buffer is released here
    pub fn add_cleaned(&mut self, page: CleanedPage) -> Result<()> {
        let mut slide = self.background_slide(&page.clean_pixels)?;
        slide.text_frames = self
            .layout
            .map_regions(page.pixel_width, page.pixel_height, &page.regions);
        tracing::debug!(
            "Slide {} has {} text frames",
            page.index,
            slide.text_frames.len()
        );
        self.presentation.push(slide);
        Ok(())
    }

    /// Append a slide showing the raw page with no text frames
    pub fn add_raw(&mut self, page: Page) -> Result<()> {
        let slide = self.background_slide(&page.pixels)?;
        self.presentation.push(slide);
        Ok(())
    }

    pub fn add_blank(&mut self) {
        self.presentation.push(Slide::blank());
    }

    pub fn slide_count(&self) -> usize {
        self.presentation.len()
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_presentation(&self.presentation, path)
    }

    fn background_slide(&self, pixels: &RgbImage) -> Result<Slide> {
        if !self.use_background {
            return Ok(Slide::blank());
        }
        let png = if self.background_opacity >= 100 {
            encode_png(pixels)?
        } else {
            encode_png(&blend_with_white(pixels, self.background_opacity))?
        };
        Ok(Slide::with_background(png))
    }
}

/// Encode an RGB buffer as PNG
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
    Ok(buffer)
}

/// Fade an image toward white; `opacity` is a percentage
fn blend_with_white(image: &RgbImage, opacity: u8) -> RgbImage {
    let alpha = opacity.min(100) as f32 / 100.0;
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            let value = *channel as f32 * alpha + 255.0 * (1.0 - alpha);
            *channel = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
