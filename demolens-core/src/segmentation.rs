//! SLIC superpixel segmentation.
//!
//! Clusters pixels in CIELAB color space plus image coordinates, starting
//! from a regular grid of roughly `n_segments` centers. Disconnected
//! fragments smaller than a quarter of the expected region size are merged
//! into an adjacent region, so every region id in the result is one
//! 4-connected area.

use crate::config::SegmentationConfig;
use image::{Rgb, RgbImage};
use std::collections::VecDeque;

/// Region id per pixel, with the image it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentMap {
    pub width: usize,
    pub height: usize,
    /// Row-major region id per pixel, in `0..count`.
    pub labels: Vec<usize>,
    pub count: usize,
    pub base: RgbImage,
}

impl SegmentMap {
    pub fn region_at(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| self.labels[y * self.width + x])
    }

    /// Pixel count of each region.
    pub fn region_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.count];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    /// Copy of the base image with every region whose `keep` entry is false filled with `color`.
    pub fn fill_regions(&self, keep: &[bool], color: [u8; 3]) -> RgbImage {
        let mut out = self.base.clone();
        for (i, pixel) in out.pixels_mut().enumerate() {
            if !keep.get(self.labels[i]).copied().unwrap_or(true) {
                *pixel = Rgb(color);
            }
        }
        out
    }

    /// Copy of the base image with a single region filled with `color`.
    pub fn fill_region(&self, region: usize, color: [u8; 3]) -> RgbImage {
        let keep: Vec<bool> = (0..self.count).map(|r| r != region).collect();
        self.fill_regions(&keep, color)
    }

    /// Spread one score per region onto its pixels, row-major.
    ///
    /// Scores are rescaled to `[0, 1]` when the maximum is positive and
    /// exceeds the minimum.
    pub fn pixel_scores(&self, region_scores: &[f64]) -> Vec<Vec<f64>> {
        let mut flat: Vec<f64> = self
            .labels
            .iter()
            .map(|&label| region_scores.get(label).copied().unwrap_or(0.0))
            .collect();
        let max = flat.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = flat.iter().copied().fold(f64::INFINITY, f64::min);
        if max > 0.0 && max > min {
            for s in &mut flat {
                *s = (*s - min) / (max - min);
            }
        }
        if self.width == 0 {
            return Vec::new();
        }
        flat.chunks(self.width).map(<[f64]>::to_vec).collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct Center {
    y: f64,
    x: f64,
    color: [f64; 3],
}

/// Segment `img` into superpixels.
pub fn slic(img: &RgbImage, config: &SegmentationConfig) -> SegmentMap {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let n = width * height;
    if n == 0 {
        return SegmentMap {
            width,
            height,
            labels: Vec::new(),
            count: 0,
            base: img.clone(),
        };
    }

    let mut lab: Vec<[f64; 3]> = img.pixels().map(|p| rgb_to_lab(p.0)).collect();
    if config.sigma > 0.0 {
        lab = gaussian_blur(&lab, width, height, config.sigma);
    }

    let n_segments = config.n_segments.clamp(1, n);
    let interval = (n as f64 / n_segments as f64).sqrt().max(1.0);
    let rows = ((height as f64 / interval).round() as usize).clamp(1, height);
    let cols = ((width as f64 / interval).round() as usize).clamp(1, width);

    let mut centers = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let y = (r as f64 + 0.5) * height as f64 / rows as f64;
            let x = (c as f64 + 0.5) * width as f64 / cols as f64;
            let idx = (y as usize).min(height - 1) * width + (x as usize).min(width - 1);
            centers.push(Center { y, x, color: lab[idx] });
        }
    }

    let mut labels: Vec<usize> = (0..n)
        .map(|i| {
            let (y, x) = (i / width, i % width);
            (y * rows / height) * cols + x * cols / width
        })
        .collect();
    let mut distance = vec![f64::INFINITY; n];
    let spatial_weight = (config.compactness / interval).powi(2);
    let reach = 2.0 * interval;

    for _ in 0..config.max_iterations.max(1) {
        distance.fill(f64::INFINITY);
        for (k, center) in centers.iter().enumerate() {
            let y0 = (center.y - reach).floor().max(0.0) as usize;
            let y1 = ((center.y + reach).ceil() as usize).min(height);
            let x0 = (center.x - reach).floor().max(0.0) as usize;
            let x1 = ((center.x + reach).ceil() as usize).min(width);
            for y in y0..y1 {
                for x in x0..x1 {
                    let i = y * width + x;
                    let color = color_distance(&lab[i], &center.color);
                    let dy = y as f64 + 0.5 - center.y;
                    let dx = x as f64 + 0.5 - center.x;
                    let d = color + (dy * dy + dx * dx) * spatial_weight;
                    if d < distance[i] {
                        distance[i] = d;
                        labels[i] = k;
                    }
                }
            }
        }

        let mut sums = vec![[0.0f64; 6]; centers.len()];
        for (i, &label) in labels.iter().enumerate() {
            let s = &mut sums[label];
            s[0] += (i / width) as f64 + 0.5;
            s[1] += (i % width) as f64 + 0.5;
            for (acc, v) in s[2..5].iter_mut().zip(lab[i]) {
                *acc += v;
            }
            s[5] += 1.0;
        }
        for (center, s) in centers.iter_mut().zip(&sums) {
            if s[5] > 0.0 {
                center.y = s[0] / s[5];
                center.x = s[1] / s[5];
                center.color = [s[2] / s[5], s[3] / s[5], s[4] / s[5]];
            }
        }
    }

    let min_size = n / n_segments / 4;
    let (labels, count) = enforce_connectivity(&labels, width, height, min_size);
    tracing::debug!(width, height, requested = n_segments, regions = count, "Image segmented");
    SegmentMap {
        width,
        height,
        labels,
        count,
        base: img.clone(),
    }
}

/// Relabel 4-connected components consecutively, merging components
/// smaller than `min_size` into an already-labelled neighbor.
fn enforce_connectivity(
    labels: &[usize],
    width: usize,
    height: usize,
    min_size: usize,
) -> (Vec<usize>, usize) {
    const UNSET: usize = usize::MAX;
    let n = labels.len();
    let mut out = vec![UNSET; n];
    let mut next = 0;
    let mut queue = VecDeque::new();
    let mut component = Vec::new();

    for start in 0..n {
        if out[start] != UNSET {
            continue;
        }
        let original = labels[start];
        let mut adjacent = None;
        component.clear();
        out[start] = next;
        queue.push_back(start);
        while let Some(i) = queue.pop_front() {
            component.push(i);
            let (y, x) = (i / width, i % width);
            let mut neighbors = [None; 4];
            if x > 0 {
                neighbors[0] = Some(i - 1);
            }
            if x + 1 < width {
                neighbors[1] = Some(i + 1);
            }
            if y > 0 {
                neighbors[2] = Some(i - width);
            }
            if y + 1 < height {
                neighbors[3] = Some(i + width);
            }
            for j in neighbors.into_iter().flatten() {
                if out[j] == UNSET && labels[j] == original {
                    out[j] = next;
                    queue.push_back(j);
                } else if out[j] != UNSET && out[j] != next {
                    adjacent = Some(out[j]);
                }
            }
        }
        match adjacent {
            Some(target) if component.len() < min_size => {
                for &i in &component {
                    out[i] = target;
                }
            }
            _ => next += 1,
        }
    }
    (out, next)
}

fn color_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b).map(|(p, q)| (p - q) * (p - q)).sum()
}

/// sRGB (D65) to CIELAB.
fn rgb_to_lab(rgb: [u8; 3]) -> [f64; 3] {
    let linear = |c: u8| {
        let c = f64::from(c) / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    let (r, g, b) = (linear(rgb[0]), linear(rgb[1]), linear(rgb[2]));
    let x = (0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b) / 0.950_47;
    let y = 0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b;
    let z = (0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b) / 1.088_83;
    let f = |t: f64| {
        if t > 0.008_856 {
            t.cbrt()
        } else {
            7.787 * t + 16.0 / 116.0
        }
    };
    let (fx, fy, fz) = (f(x), f(y), f(z));
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Separable Gaussian blur with edge clamping.
fn gaussian_blur(data: &[[f64; 3]], width: usize, height: usize, sigma: f64) -> Vec<[f64; 3]> {
    let radius = (3.0 * sigma).ceil() as isize;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|i| (-(i * i) as f64 / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= total);

    let pass = |src: &[[f64; 3]], horizontal: bool| -> Vec<[f64; 3]> {
        let mut dst = vec![[0.0; 3]; src.len()];
        for y in 0..height {
            for x in 0..width {
                let mut acc = [0.0; 3];
                for (k, weight) in kernel.iter().enumerate() {
                    let offset = k as isize - radius;
                    let (sy, sx) = if horizontal {
                        (y, (x as isize + offset).clamp(0, width as isize - 1) as usize)
                    } else {
                        ((y as isize + offset).clamp(0, height as isize - 1) as usize, x)
                    };
                    for (a, v) in acc.iter_mut().zip(src[sy * width + sx]) {
                        *a += weight * v;
                    }
                }
                dst[y * width + x] = acc;
            }
        }
        dst
    };
    let horizontal = pass(data, true);
    pass(&horizontal, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadrants(size: u32) -> RgbImage {
        RgbImage::from_fn(size, size, |x, y| match (x < size / 2, y < size / 2) {
            (true, true) => Rgb([255, 0, 0]),
            (false, true) => Rgb([0, 255, 0]),
            (true, false) => Rgb([0, 0, 255]),
            (false, false) => Rgb([255, 255, 0]),
        })
    }

    fn config(n_segments: usize) -> SegmentationConfig {
        SegmentationConfig {
            n_segments,
            ..SegmentationConfig::default()
        }
    }

    #[test]
    fn test_labels_cover_image() {
        let img = quadrants(32);
        let map = slic(&img, &config(20));
        assert_eq!(map.labels.len(), 32 * 32);
        assert!(map.count >= 1);
        assert!(map.labels.iter().all(|&l| l < map.count));
        assert_eq!(map.region_sizes().iter().sum::<usize>(), 32 * 32);
        assert!(map.region_sizes().iter().all(|&s| s > 0));
    }

    #[test]
    fn test_regions_do_not_straddle_color_edges() {
        let img = quadrants(32);
        let map = slic(
            &img,
            &SegmentationConfig {
                sigma: 0.0,
                ..config(4)
            },
        );
        let mut colors = vec![None; map.count];
        for (i, &label) in map.labels.iter().enumerate() {
            let pixel = img.get_pixel((i % 32) as u32, (i / 32) as u32).0;
            match colors[label] {
                None => colors[label] = Some(pixel),
                Some(seen) => assert_eq!(seen, pixel, "region {label} mixes colors"),
            }
        }
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let img = quadrants(24);
        assert_eq!(slic(&img, &config(9)), slic(&img, &config(9)));
    }

    #[test]
    fn test_fill_region() {
        let img = quadrants(16);
        let map = slic(&img, &config(4));
        let region = map.region_at(0, 0).unwrap();
        let filled = map.fill_region(region, [0, 0, 0]);
        assert_eq!(filled.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(filled.get_pixel(15, 15).0, [255, 255, 0]);
    }

    #[test]
    fn test_pixel_scores_normalized() {
        let img = RgbImage::from_fn(4, 2, |x, _| if x < 2 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) });
        let map = SegmentMap {
            width: 4,
            height: 2,
            labels: vec![0, 0, 1, 1, 0, 0, 1, 1],
            count: 2,
            base: img,
        };
        assert_eq!(
            map.pixel_scores(&[2.0, 4.0]),
            vec![vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 0.0, 1.0, 1.0]]
        );
        assert_eq!(
            map.pixel_scores(&[-1.0, -1.0]),
            vec![vec![-1.0; 4], vec![-1.0; 4]]
        );
    }

    #[test]
    fn test_empty_image() {
        let map = slic(&RgbImage::new(0, 0), &SegmentationConfig::default());
        assert_eq!(map.count, 0);
        assert!(map.pixel_scores(&[]).is_empty());
    }
}
