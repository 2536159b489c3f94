//! Text mask construction
//!
//! Rasterizes text regions into a binary mask (255 = reconstruct,
//! 0 = keep) that the inpainter consumes.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
use imageproc::morphology::dilate_mut;
use imageproc::point::Point;
use imageproc::rect::Rect;

use crate::config::ConvertConfig;
use crate::document::{PixelRect, TextRegion, Vertex};

const MASKED: Luma<u8> = Luma([255]);

#[derive(Debug, Clone, Copy)]
pub struct MaskOptions {
    /// Padding around axis-aligned bounds
    pub padding_px: u32,
    /// Outward push of polygon vertices, as a fraction of their centroid distance
    pub polygon_padding_ratio: f32,
    /// 3×3 dilation passes
    pub dilation_iterations: u32,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            padding_px: 5,
            polygon_padding_ratio: 0.10,
            dilation_iterations: 2,
        }
    }
}

impl From<&ConvertConfig> for MaskOptions {
    fn from(config: &ConvertConfig) -> Self {
        Self {
            padding_px: config.ocr_padding_px,
            polygon_padding_ratio: config.polygon_padding_ratio,
            dilation_iterations: config.dilation_iterations,
        }
    }
}

/// Build the mask for `regions` on a `width × height` page
pub fn build_mask(width: u32, height: u32, regions: &[TextRegion], options: &MaskOptions) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return mask;
    }

    for region in regions {
        match &region.polygon {
            Some(polygon) => {
                fill_rect(&mut mask, &region.bounds);
                let expanded = expand_polygon(polygon, options.polygon_padding_ratio, width, height);
                match closed_outline(&expanded) {
                    Some(points) => draw_polygon_mut(&mut mask, &points, MASKED),
                    None => {
                        let padded = region.bounds.expand(options.padding_px, width, height);
                        fill_rect(&mut mask, &padded);
                    }
                }
            }
            None => {
                let padded = region.bounds.expand(options.padding_px, width, height);
                fill_rect(&mut mask, &padded);
            }
        }
    }

    for _ in 0..options.dilation_iterations {
        dilate_mut(&mut mask, Norm::LInf, 1);
    }

    mask
}

/// Number of masked pixels
pub fn coverage(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p.0[0] > 0).count()
}

fn fill_rect(mask: &mut GrayImage, rect: &PixelRect) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    draw_filled_rect_mut(
        mask,
        Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width, rect.height),
        MASKED,
    );
}

/// Push each vertex away from the centroid, rounding outward, then clip
fn expand_polygon(polygon: &[Vertex], ratio: f32, width: u32, height: u32) -> Vec<Vertex> {
    let n = polygon.len() as f32;
    let cx = polygon.iter().map(|v| v.x as f32).sum::<f32>() / n;
    let cy = polygon.iter().map(|v| v.y as f32).sum::<f32>() / n;

    let push = |value: i32, center: f32, limit: u32| -> i32 {
        let offset = (value as f32 - center) * (1.0 + ratio);
        let moved = center + offset;
        let rounded = if offset >= 0.0 { moved.ceil() } else { moved.floor() };
        (rounded as i32).clamp(0, limit.saturating_sub(1) as i32)
    };

    polygon
        .iter()
        .map(|v| Vertex::new(push(v.x, cx, width), push(v.y, cy, height)))
        .collect()
}

/// Outline acceptable to the polygon filler: no repeated neighbours,
/// first distinct from last, at least three distinct points
fn closed_outline(vertices: &[Vertex]) -> Option<Vec<Point<i32>>> {
    let mut points: Vec<Point<i32>> = Vec::with_capacity(vertices.len());
    for v in vertices {
        let point = Point::new(v.x, v.y);
        if points.last() != Some(&point) {
            points.push(point);
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    let mut distinct = points.clone();
    distinct.sort_by_key(|p| (p.x, p.y));
    distinct.dedup();
    if distinct.len() < 3 {
        return None;
    }
    Some(points)
}
