//! Page rasterization
//!
//! Renders PDF pages to RGB buffers through MuPDF pixmaps.

use image::{Rgb, RgbImage};
use mupdf::{Colorspace, Matrix};

use crate::document::{ConvertError, Page, Result};

/// Page → pixel buffer rendering
pub trait Render: Send + Sync {
    /// Render a loaded MuPDF page; `index` is the 1-based ordinal
    fn render(&self, page: &mupdf::Page, index: usize) -> Result<Page>;
}

/// Renders pages at a fixed zoom (pixels per point)
#[derive(Debug, Clone, Copy)]
pub struct Rasterizer {
    zoom: f32,
}

impl Rasterizer {
    pub fn new(zoom: f32) -> Self {
        Self { zoom }
    }

    /// Target buffer size for a page of `width × height` points
    pub fn pixel_size(&self, point_width: f32, point_height: f32) -> (u32, u32) {
        let scale = |points: f32| (points * self.zoom).round().max(1.0) as u32;
        (scale(point_width), scale(point_height))
    }
}

impl Render for Rasterizer {
    /// Render a loaded MuPDF page into an RGB `Page`
    fn render(&self, page: &mupdf::Page, index: usize) -> Result<Page> {
        let bounds = page.bounds()?;
        let (width, height) = self.pixel_size(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0);

        let matrix = Matrix::new_scale(self.zoom, self.zoom);
        let colorspace = Colorspace::device_rgb();
        let pixmap = page.to_pixmap(&matrix, &colorspace, false, true)?;

        let rendered = pixmap_to_rgb(&pixmap)?;
        let pixels = fit_to_size(rendered, width, height);

        tracing::debug!(
            "Rasterized page {} to {}x{} at zoom {}",
            index,
            width,
            height,
            self.zoom
        );

        Ok(Page::new(index, pixels))
    }
}

/// Convert pixmap samples to RGB, compositing any alpha over white
fn pixmap_to_rgb(pixmap: &mupdf::Pixmap) -> Result<RgbImage> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    if n < 3 {
        return Err(ConvertError::Rasterize(format!(
            "Unexpected pixmap with {} components",
            n
        )));
    }

    let mut rgb_buffer = Vec::with_capacity((width * height * 3) as usize);

    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(255);
            let g = samples.get(offset + 1).copied().unwrap_or(255);
            let b = samples.get(offset + 2).copied().unwrap_or(255);
            if n >= 4 {
                let a = samples.get(offset + 3).copied().unwrap_or(255);
                rgb_buffer.extend_from_slice(&[
                    over_white(r, a),
                    over_white(g, a),
                    over_white(b, a),
                ]);
            } else {
                rgb_buffer.extend_from_slice(&[r, g, b]);
            }
        }
    }

    RgbImage::from_raw(width, height, rgb_buffer)
        .ok_or_else(|| ConvertError::Rasterize("Failed to create image buffer".to_string()))
}

/// Composite a premultiplied channel over a white backdrop
fn over_white(channel: u8, alpha: u8) -> u8 {
    let inverse = 255 - alpha as u16;
    (channel as u16 + inverse).min(255) as u8
}

/// Crop or pad (white) so the buffer matches the computed page size exactly
fn fit_to_size(image: RgbImage, width: u32, height: u32) -> RgbImage {
    if image.width() == width && image.height() == height {
        return image;
    }

    let mut out = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let copy_w = width.min(image.width());
    let copy_h = height.min(image.height());
    for y in 0..copy_h {
        for x in 0..copy_w {
            out.put_pixel(x, y, *image.get_pixel(x, y));
        }
    }
    out
}
