//! Fast marching inpainting (Telea 2004)
//!
//! Masked pixels are filled in order of their distance from the known
//! region. Each new value is a weighted mean of already known pixels within
//! `radius`, weighted by direction, distance and level-set proximity.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use image::{GrayImage, Rgb, RgbImage};

const UNREACHED: f32 = 1.0e6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Known,
    Band,
    Inside,
}

/// Heap entry; smaller arrival time first, then insertion order
#[derive(Debug, Clone, Copy)]
struct Candidate {
    time: f32,
    seq: u64,
    x: u32,
    y: u32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Field {
    width: u32,
    height: u32,
    state: Vec<State>,
    time: Vec<f32>,
}

impl Field {
    fn idx(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn state_at(&self, x: i64, y: i64) -> Option<State> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.state[self.idx(x as u32, y as u32)])
    }

    fn time_at(&self, x: i64, y: i64) -> f32 {
        match self.state_at(x, y) {
            Some(_) => self.time[self.idx(x as u32, y as u32)],
            None => UNREACHED,
        }
    }

    fn settled(&self, x: i64, y: i64) -> bool {
        matches!(self.state_at(x, y), Some(State::Known) | Some(State::Band))
    }

    /// Eikonal update from one horizontal and one vertical neighbour
    fn solve(&self, x1: i64, y1: i64, x2: i64, y2: i64) -> f32 {
        let a = self.settled(x1, y1);
        let b = self.settled(x2, y2);
        match (a, b) {
            (true, true) => {
                let t1 = self.time_at(x1, y1);
                let t2 = self.time_at(x2, y2);
                let diff = t1 - t2;
                let disc = 2.0 - diff * diff;
                if disc > 0.0 {
                    let r = disc.sqrt();
                    let s = (t1 + t2 - r) / 2.0;
                    if s >= t1 && s >= t2 {
                        return s;
                    }
                    let s = s + r;
                    if s >= t1 && s >= t2 {
                        return s;
                    }
                }
                1.0 + t1.min(t2)
            }
            (true, false) => 1.0 + self.time_at(x1, y1),
            (false, true) => 1.0 + self.time_at(x2, y2),
            (false, false) => UNREACHED,
        }
    }

    fn arrival_time(&self, x: i64, y: i64) -> f32 {
        [
            self.solve(x - 1, y, x, y - 1),
            self.solve(x + 1, y, x, y - 1),
            self.solve(x - 1, y, x, y + 1),
            self.solve(x + 1, y, x, y + 1),
        ]
        .into_iter()
        .fold(UNREACHED, f32::min)
    }

    /// Lower the arrival time of a band or inside pixel to its best solve
    ///
    /// Returns the new time when it improved.
    fn relax(&mut self, x: i64, y: i64) -> Option<f32> {
        let i = self.idx(x as u32, y as u32);
        let solved = self.arrival_time(x, y);
        if solved < self.time[i] {
            self.time[i] = solved;
            Some(solved)
        } else {
            None
        }
    }

    /// Central (or one-sided) difference of arrival time at a pixel
    fn gradient(&self, x: i64, y: i64) -> (f32, f32) {
        let t = self.time_at(x, y);
        let axis = |prev: (i64, i64), next: (i64, i64)| -> f32 {
            let p = self.settled(prev.0, prev.1);
            let n = self.settled(next.0, next.1);
            match (p, n) {
                (true, true) => (self.time_at(next.0, next.1) - self.time_at(prev.0, prev.1)) * 0.5,
                (false, true) => self.time_at(next.0, next.1) - t,
                (true, false) => t - self.time_at(prev.0, prev.1),
                (false, false) => 0.0,
            }
        };
        (axis((x - 1, y), (x + 1, y)), axis((x, y - 1), (x, y + 1)))
    }
}

/// Fill masked pixels of `image` in place
pub(crate) fn fill(image: &mut RgbImage, mask: &GrayImage, radius: u32) {
    let (width, height) = image.dimensions();
    let len = width as usize * height as usize;

    let mut field = Field {
        width,
        height,
        state: vec![State::Known; len],
        time: vec![0.0; len],
    };

    for (x, y, p) in mask.enumerate_pixels() {
        if p.0[0] > 0 {
            let i = field.idx(x, y);
            field.state[i] = State::Inside;
            field.time[i] = UNREACHED;
        }
    }

    let mut heap = BinaryHeap::new();
    let mut seq: u64 = 0;

    // Known pixels touching the hole form the initial band
    for y in 0..height {
        for x in 0..width {
            let i = field.idx(x, y);
            if field.state[i] != State::Known {
                continue;
            }
            let touches_hole = neighbours(x as i64, y as i64)
                .iter()
                .any(|&(nx, ny)| field.state_at(nx, ny) == Some(State::Inside));
            if touches_hole {
                field.state[i] = State::Band;
                heap.push(Candidate { time: 0.0, seq, x, y });
                seq += 1;
            }
        }
    }

    let radius = radius as i64;
    while let Some(current) = heap.pop() {
        let ci = field.idx(current.x, current.y);
        if field.state[ci] == State::Known {
            continue;
        }
        field.state[ci] = State::Known;

        for (nx, ny) in neighbours(current.x as i64, current.y as i64) {
            let state = field.state_at(nx, ny);
            if !matches!(state, Some(State::Inside) | Some(State::Band)) {
                continue;
            }
            // Band pixels stay queued; a lower time re-queues them ahead of the stale entry
            let Some(time) = field.relax(nx, ny) else {
                continue;
            };

            if state == Some(State::Inside) {
                let value = estimate(image, &field, nx, ny, radius)
                    .unwrap_or(*image.get_pixel(current.x, current.y));
                image.put_pixel(nx as u32, ny as u32, value);
                let ni = field.idx(nx as u32, ny as u32);
                field.state[ni] = State::Band;
            }

            heap.push(Candidate {
                time,
                seq,
                x: nx as u32,
                y: ny as u32,
            });
            seq += 1;
        }
    }
}

fn neighbours(x: i64, y: i64) -> [(i64, i64); 4] {
    [(x, y - 1), (x - 1, y), (x + 1, y), (x, y + 1)]
}

/// Weighted mean of settled pixels around `(x, y)`
fn estimate(image: &RgbImage, field: &Field, x: i64, y: i64, radius: i64) -> Option<Rgb<u8>> {
    let (grad_x, grad_y) = field.gradient(x, y);
    let time = field.time_at(x, y);
    let radius_sq = radius * radius;

    let mut sum = [0.0f64; 3];
    let mut total = 0.0f64;

    for ky in (y - radius)..=(y + radius) {
        for kx in (x - radius)..=(x + radius) {
            let (rx, ry) = (x - kx, y - ky);
            let dist_sq = rx * rx + ry * ry;
            if dist_sq == 0 || dist_sq > radius_sq || !field.settled(kx, ky) {
                continue;
            }

            let dist_sq = dist_sq as f32;
            let distance = 1.0 / (dist_sq * dist_sq.sqrt());
            let level = 1.0 / (1.0 + (field.time_at(kx, ky) - time).abs());
            let mut direction = (rx as f32 * grad_x + ry as f32 * grad_y).abs();
            if direction <= 0.01 {
                direction = 1.0e-6;
            }

            let weight = (distance * level * direction) as f64;
            let p = image.get_pixel(kx as u32, ky as u32);
            for c in 0..3 {
                sum[c] += weight * p.0[c] as f64;
            }
            total += weight;
        }
    }

    if total <= 0.0 {
        return None;
    }
    Some(Rgb([
        (sum[0] / total).round().clamp(0.0, 255.0) as u8,
        (sum[1] / total).round().clamp(0.0, 255.0) as u8,
        (sum[2] / total).round().clamp(0.0, 255.0) as u8,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_candidate_order_is_min_time_then_fifo() {
        let mut heap = BinaryHeap::new();
        heap.push(Candidate { time: 2.0, seq: 0, x: 0, y: 0 });
        heap.push(Candidate { time: 1.0, seq: 2, x: 1, y: 0 });
        heap.push(Candidate { time: 1.0, seq: 1, x: 2, y: 0 });

        assert_eq!(heap.pop().unwrap().x, 2);
        assert_eq!(heap.pop().unwrap().x, 1);
        assert_eq!(heap.pop().unwrap().x, 0);
    }

    #[test]
    fn test_band_time_takes_minimum_solve() {
        // [Known 0][Band 3][Known 0] in a single row
        let mut field = Field {
            width: 3,
            height: 1,
            state: vec![State::Known, State::Band, State::Known],
            time: vec![0.0, 3.0, 0.0],
        };

        assert_eq!(field.relax(1, 0), Some(1.0));
        assert_eq!(field.time[1], 1.0);
        assert_eq!(field.relax(1, 0), None);

        // An earlier time is never raised
        field.time[1] = 0.5;
        assert_eq!(field.relax(1, 0), None);
        assert_eq!(field.time[1], 0.5);
    }

    #[test]
    fn test_fills_hole_in_flat_image() {
        let mut image = RgbImage::from_pixel(20, 20, Rgb([40, 120, 200]));
        let mut mask = GrayImage::new(20, 20);
        for y in 8..12 {
            for x in 8..12 {
                image.put_pixel(x, y, Rgb([0, 0, 0]));
                mask.put_pixel(x, y, Luma([255]));
            }
        }

        fill(&mut image, &mask, 3);
        for y in 8..12 {
            for x in 8..12 {
                assert_eq!(image.get_pixel(x, y), &Rgb([40, 120, 200]));
            }
        }
    }

    #[test]
    fn test_fully_masked_image_left_alone() {
        let mut image = RgbImage::from_pixel(4, 4, Rgb([9, 9, 9]));
        let mask = GrayImage::from_pixel(4, 4, Luma([255]));
        fill(&mut image, &mask, 2);
        assert_eq!(image.get_pixel(0, 0), &Rgb([9, 9, 9]));
    }
}
