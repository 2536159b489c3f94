//! Inpainting
//!
//! Reconstructs masked pixels from their surroundings. Pixels outside the
//! mask are returned byte-identical, and identical inputs always produce
//! identical output.

mod diffusion;
mod telea;

use image::{GrayImage, RgbImage};
use thiserror::Error;

use crate::config::InpaintMethod;

#[derive(Debug, Error)]
pub enum InpaintError {
    #[error("mask is {mask_width}x{mask_height} but image is {image_width}x{image_height}")]
    ShapeMismatch {
        image_width: u32,
        image_height: u32,
        mask_width: u32,
        mask_height: u32,
    },

    #[error("inpaint radius must be at least 1")]
    InvalidRadius,
}

/// Mask-driven image reconstruction
pub trait Inpaint: Send + Sync {
    fn inpaint(&self, image: &RgbImage, mask: &GrayImage) -> Result<RgbImage, InpaintError>;
}

/// Default inpainter
#[derive(Debug, Clone, Copy)]
pub struct MaskInpainter {
    pub method: InpaintMethod,
    pub radius: u32,
}

impl MaskInpainter {
    pub fn new(method: InpaintMethod, radius: u32) -> Self {
        Self { method, radius }
    }
}

impl Default for MaskInpainter {
    fn default() -> Self {
        Self::new(InpaintMethod::Telea, 5)
    }
}

impl Inpaint for MaskInpainter {
    fn inpaint(&self, image: &RgbImage, mask: &GrayImage) -> Result<RgbImage, InpaintError> {
        if image.dimensions() != mask.dimensions() {
            return Err(InpaintError::ShapeMismatch {
                image_width: image.width(),
                image_height: image.height(),
                mask_width: mask.width(),
                mask_height: mask.height(),
            });
        }
        if self.radius == 0 {
            return Err(InpaintError::InvalidRadius);
        }

        let mut out = image.clone();
        if mask.pixels().all(|p| p.0[0] == 0) {
            return Ok(out);
        }

        telea::fill(&mut out, mask, self.radius);
        if self.method == InpaintMethod::Ns {
            diffusion::smooth(&mut out, mask, self.radius);
        }
        Ok(out)
    }
}
