//! Minimum-eigenvalue corner detection ("good features to track")
//!
//! The corner strength of a pixel is the smaller eigenvalue of the 2x2
//! structure tensor accumulated over a 3x3 block of Sobel gradients. A corner
//! is a local maximum of that strength above a fraction of the frame's
//! strongest response; accepted corners keep a minimum distance from each
//! other, strongest first.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use crate::config::TrackerConfig;

/// A detected keypoint with position, scale, response strength, and orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPoint {
    /// X coordinate (column) in pixels
    pub x: f32,
    /// Y coordinate (row) in pixels
    pub y: f32,
    /// Detection scale; the descriptor samples a disc of radius `size / 2`
    pub size: f32,
    /// Minimum-eigenvalue corner response (higher = stronger corner)
    pub response: f32,
    /// Orientation in radians, filled in by the descriptor stage
    pub angle: f32,
}

impl KeyPoint {
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            x,
            y,
            size,
            response: 0.0,
            angle: 0.0,
        }
    }

    pub fn distance_to(&self, other: &KeyPoint) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Response map produced by [`CornerDetector::corner_response`]
pub type ResponseImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Corner detector with quality and minimum-distance filtering
#[derive(Debug, Clone)]
pub struct CornerDetector {
    /// Maximum number of corners to return
    max_corners: usize,
    /// Fraction of the strongest response a corner must exceed
    quality_ratio: f32,
    /// Minimum distance between accepted corners (pixels)
    min_separation: f32,
    /// Size assigned to every keypoint
    keypoint_size: f32,
}

impl Default for CornerDetector {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}

impl CornerDetector {
    pub fn new(
        max_corners: usize,
        quality_ratio: f32,
        min_separation: f32,
        keypoint_size: f32,
    ) -> Self {
        Self {
            max_corners,
            quality_ratio,
            min_separation,
            keypoint_size,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(
            config.max_corners,
            config.quality_ratio,
            config.min_separation_px,
            config.descriptor_scale,
        )
    }

    /// Compute the minimum-eigenvalue response for every pixel
    ///
    /// Exposed publicly so the response map can be visualized.
    pub fn corner_response(&self, image: &GrayImage) -> ResponseImage {
        let (width, height) = image.dimensions();
        let gx = horizontal_sobel(image);
        let gy = vertical_sobel(image);

        let len = (width * height) as usize;
        let mut ixx = Vec::with_capacity(len);
        let mut iyy = Vec::with_capacity(len);
        let mut ixy = Vec::with_capacity(len);
        for (px, py) in gx.pixels().zip(gy.pixels()) {
            let dx = px.0[0] as f32;
            let dy = py.0[0] as f32;
            ixx.push(dx * dx);
            iyy.push(dy * dy);
            ixy.push(dx * dy);
        }

        let w = width as i64;
        let h = height as i64;
        let at = |x: i64, y: i64| (y.clamp(0, h - 1) * w + x.clamp(0, w - 1)) as usize;

        ImageBuffer::from_fn(width, height, |x, y| {
            let (x, y) = (x as i64, y as i64);
            let mut a = 0.0f32;
            let mut b = 0.0f32;
            let mut c = 0.0f32;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let i = at(x + dx, y + dy);
                    a += ixx[i];
                    b += ixy[i];
                    c += iyy[i];
                }
            }
            // Smaller eigenvalue of [[a, b], [b, c]]
            let half_trace = 0.5 * (a + c);
            let root = (0.25 * (a - c) * (a - c) + b * b).sqrt();
            Luma([(half_trace - root).max(0.0)])
        })
    }

    /// Detect corners in a grayscale image
    ///
    /// Returns at most `max_corners` keypoints ordered by decreasing response.
    /// An image without texture yields an empty vector.
    pub fn detect(&self, image: &GrayImage) -> Vec<KeyPoint> {
        let (width, height) = image.dimensions();
        if width < 3 || height < 3 {
            return Vec::new();
        }

        let response = self.corner_response(image);
        let max_response = response.pixels().fold(0.0f32, |acc, p| acc.max(p.0[0]));
        if max_response <= 0.0 {
            return Vec::new();
        }
        let threshold = max_response * self.quality_ratio;

        // Step 1: thresholded 3x3 local maxima, skipping the one-pixel border
        let mut candidates: Vec<(u32, u32, f32)> = Vec::new();
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let r = response.get_pixel(x, y).0[0];
                if r > threshold && is_local_max(&response, x, y, r) {
                    candidates.push((x, y, r));
                }
            }
        }

        // Step 2: strongest first; the stable sort keeps raster order among ties
        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

        // Step 3: greedy minimum-distance selection
        let mut grid = SeparationGrid::new(width, height, self.min_separation);
        let mut keypoints = Vec::with_capacity(candidates.len().min(self.max_corners));
        for (x, y, r) in candidates {
            if keypoints.len() >= self.max_corners {
                break;
            }
            let (fx, fy) = (x as f32, y as f32);
            if !grid.try_insert(fx, fy) {
                continue;
            }
            keypoints.push(KeyPoint {
                response: r,
                ..KeyPoint::new(fx, fy, self.keypoint_size)
            });
        }

        keypoints
    }
}

fn is_local_max(response: &ResponseImage, x: u32, y: u32, value: f32) -> bool {
    for ny in y - 1..=y + 1 {
        for nx in x - 1..=x + 1 {
            if response.get_pixel(nx, ny).0[0] > value {
                return false;
            }
        }
    }
    true
}

/// Bucket grid of accepted corners, cell size equal to the minimum distance,
/// so only the 3x3 neighbouring cells can hold a conflicting corner.
struct SeparationGrid {
    cell: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<(f32, f32)>>,
}

impl SeparationGrid {
    fn new(width: u32, height: u32, min_distance: f32) -> Self {
        // Distinct pixel positions are at least 1 apart, so a smaller
        // distance never rejects anything.
        if min_distance < 1.0 {
            return Self {
                cell: 0.0,
                cols: 0,
                rows: 0,
                cells: Vec::new(),
            };
        }
        let cols = (width as f32 / min_distance).ceil() as usize;
        let rows = (height as f32 / min_distance).ceil() as usize;
        Self {
            cell: min_distance,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    fn try_insert(&mut self, x: f32, y: f32) -> bool {
        if self.cells.is_empty() {
            return true;
        }
        let cx = ((x / self.cell) as usize).min(self.cols - 1);
        let cy = ((y / self.cell) as usize).min(self.rows - 1);
        let min_sq = self.cell * self.cell;

        for ny in cy.saturating_sub(1)..=(cy + 1).min(self.rows - 1) {
            for nx in cx.saturating_sub(1)..=(cx + 1).min(self.cols - 1) {
                let conflict = self.cells[ny * self.cols + nx].iter().any(|&(px, py)| {
                    let dx = px - x;
                    let dy = py - y;
                    dx * dx + dy * dy < min_sq
                });
                if conflict {
                    return false;
                }
            }
        }

        self.cells[cy * self.cols + cx].push((x, y));
        true
    }
}
