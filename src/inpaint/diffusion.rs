//! Diffusion smoothing of a filled hole
//!
//! Repeatedly replaces each masked pixel with the mean of its four
//! neighbours (Gauss-Seidel, raster order), which propagates isophotes
//! smoothly across the hole. Known pixels act as fixed boundary values.

use image::{GrayImage, Rgb, RgbImage};

/// Sweeps per unit of inpaint radius
const SWEEPS_PER_RADIUS: u32 = 10;

pub(crate) fn smooth(image: &mut RgbImage, mask: &GrayImage, radius: u32) {
    let (width, height) = image.dimensions();
    let masked: Vec<(u32, u32)> = mask
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 0)
        .map(|(x, y, _)| (x, y))
        .collect();
    if masked.is_empty() {
        return;
    }

    let mut values: Vec<[f32; 3]> = image
        .pixels()
        .map(|p| [p.0[0] as f32, p.0[1] as f32, p.0[2] as f32])
        .collect();
    let idx = |x: u32, y: u32| y as usize * width as usize + x as usize;

    for _ in 0..radius.saturating_mul(SWEEPS_PER_RADIUS) {
        for &(x, y) in &masked {
            let mut acc = [0.0f32; 3];
            let mut count = 0.0f32;
            let mut add = |nx: u32, ny: u32| {
                let v = values[idx(nx, ny)];
                acc[0] += v[0];
                acc[1] += v[1];
                acc[2] += v[2];
                count += 1.0;
            };
            if x > 0 {
                add(x - 1, y);
            }
            if x + 1 < width {
                add(x + 1, y);
            }
            if y > 0 {
                add(x, y - 1);
            }
            if y + 1 < height {
                add(x, y + 1);
            }
            if count > 0.0 {
                values[idx(x, y)] = [acc[0] / count, acc[1] / count, acc[2] / count];
            }
        }
    }

    for &(x, y) in &masked {
        let v = values[idx(x, y)];
        image.put_pixel(
            x,
            y,
            Rgb([
                v[0].round().clamp(0.0, 255.0) as u8,
                v[1].round().clamp(0.0, 255.0) as u8,
                v[2].round().clamp(0.0, 255.0) as u8,
            ]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_interpolates_between_boundaries() {
        // Left column black, right column white, hole in between
        let mut image = RgbImage::from_pixel(5, 1, Rgb([0, 0, 0]));
        image.put_pixel(4, 0, Rgb([200, 200, 200]));
        let mut mask = GrayImage::new(5, 1);
        for x in 1..4 {
            mask.put_pixel(x, 0, Luma([255]));
        }

        smooth(&mut image, &mask, 10);
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(image.get_pixel(2, 0), &Rgb([100, 100, 100]));
        assert_eq!(image.get_pixel(4, 0), &Rgb([200, 200, 200]));
    }
}
