//! Oriented BRIEF descriptors
//!
//! Each keypoint gets a 256-bit binary descriptor: 256 intensity comparisons
//! between point pairs of a fixed sampling pattern, rotated by the keypoint's
//! intensity-centroid orientation and scaled to its patch radius.

use image::GrayImage;
use imageproc::filter::gaussian_blur_f32;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::error::{FrontendError, Result};
use crate::KeyPoint;

/// Number of binary tests per descriptor
pub const DESCRIPTOR_BITS: usize = 256;

/// Seed of the sampling pattern. Changing it invalidates stored descriptors.
const PATTERN_SEED: u64 = 0x6f72_6231;

/// Standard deviation of pattern points, as a fraction of the patch radius
const PATTERN_SIGMA: f32 = 0.5;

/// Smoothing applied before the binary tests
const BLUR_SIGMA: f32 = 2.0;

/// A 256-bit BRIEF descriptor stored as 4 x u64
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BriefDescriptor(pub [u64; 4]);

impl BriefDescriptor {
    /// Create a zero descriptor
    pub fn zeros() -> Self {
        Self([0; 4])
    }

    /// Compute Hamming distance between two descriptors
    ///
    /// Returns the number of bits that differ (0-256)
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        (self.0[0] ^ other.0[0]).count_ones()
            + (self.0[1] ^ other.0[1]).count_ones()
            + (self.0[2] ^ other.0[2]).count_ones()
            + (self.0[3] ^ other.0[3]).count_ones()
    }

    /// Euclidean distance between the 32 descriptor bytes taken as numbers
    pub fn l2_distance(&self, other: &Self) -> f32 {
        let sum: u32 = self
            .to_bytes()
            .iter()
            .zip(other.to_bytes().iter())
            .map(|(&a, &b)| {
                let d = a as i32 - b as i32;
                (d * d) as u32
            })
            .sum();
        (sum as f32).sqrt()
    }

    /// Little-endian byte view, bit `i` of the descriptor is bit `i % 8` of byte `i / 8`
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (chunk, word) in bytes.chunks_exact_mut(8).zip(self.0.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    pub fn bit(&self, i: usize) -> bool {
        (self.0[i / 64] >> (i % 64)) & 1 == 1
    }
}

/// Keypoints paired positionally with their descriptors
///
/// Index `i` of [`keypoints`](Self::keypoints) and [`descriptors`](Self::descriptors)
/// always refers to the same image point; the two vectors cannot diverge in length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    keypoints: Vec<KeyPoint>,
    descriptors: Vec<BriefDescriptor>,
}

impl FeatureSet {
    /// Pair two vectors, rejecting a length mismatch
    pub fn new(keypoints: Vec<KeyPoint>, descriptors: Vec<BriefDescriptor>) -> Result<Self> {
        if keypoints.len() != descriptors.len() {
            return Err(FrontendError::LengthMismatch {
                keypoints: keypoints.len(),
                descriptors: descriptors.len(),
            });
        }
        Ok(Self {
            keypoints,
            descriptors,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn keypoints(&self) -> &[KeyPoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &[BriefDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, index: usize) -> Option<(&KeyPoint, &BriefDescriptor)> {
        Some((self.keypoints.get(index)?, self.descriptors.get(index)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KeyPoint, &BriefDescriptor)> {
        self.keypoints.iter().zip(self.descriptors.iter())
    }
}

impl FromIterator<(KeyPoint, BriefDescriptor)> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = (KeyPoint, BriefDescriptor)>>(iter: I) -> Self {
        let (keypoints, descriptors) = iter.into_iter().unzip();
        Self {
            keypoints,
            descriptors,
        }
    }
}

/// One binary test: two points in patch-radius units, inside the unit disc
#[derive(Debug, Clone, Copy, PartialEq)]
struct PointPair {
    a: (f32, f32),
    b: (f32, f32),
}

/// Oriented BRIEF extractor with a fixed-seed Gaussian sampling pattern
#[derive(Debug, Clone)]
pub struct BriefExtractor {
    pattern: Vec<PointPair>,
}

impl Default for BriefExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl BriefExtractor {
    pub fn new() -> Self {
        Self {
            pattern: Self::generate_pattern(),
        }
    }

    /// Draw the 256 point pairs. The seed is fixed so descriptors are
    /// comparable across runs.
    fn generate_pattern() -> Vec<PointPair> {
        let mut rng = ChaCha8Rng::seed_from_u64(PATTERN_SEED);
        let mut pattern = Vec::with_capacity(DESCRIPTOR_BITS);
        while pattern.len() < DESCRIPTOR_BITS {
            let a = sample_unit_disc(&mut rng);
            let b = sample_unit_disc(&mut rng);
            // Pairs that collapse to one pixel at small scales carry no information
            if (a.0 - b.0).hypot(a.1 - b.1) < 0.15 {
                continue;
            }
            pattern.push(PointPair { a, b });
        }
        pattern
    }

    /// Patch radius in pixels for a keypoint
    pub fn patch_radius(keypoint: &KeyPoint) -> i64 {
        ((keypoint.size * 0.5).round() as i64).max(1)
    }

    /// Whether the keypoint's patch, plus a pixel of rounding margin, lies inside the image
    pub fn fits(image: &GrayImage, keypoint: &KeyPoint) -> bool {
        let (width, height) = image.dimensions();
        let r = Self::patch_radius(keypoint) + 1;
        let cx = keypoint.x.round() as i64;
        let cy = keypoint.y.round() as i64;
        cx - r >= 0 && cy - r >= 0 && cx + r < width as i64 && cy + r < height as i64
    }

    /// Intensity-centroid orientation over the keypoint's disc
    ///
    /// Returns angle in radians
    pub fn orientation(image: &GrayImage, keypoint: &KeyPoint) -> f32 {
        let radius = Self::patch_radius(keypoint);
        let (width, height) = image.dimensions();
        let cx = keypoint.x.round() as i64;
        let cy = keypoint.y.round() as i64;

        let mut m10: f32 = 0.0;
        let mut m01: f32 = 0.0;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                let px = cx + dx;
                let py = cy + dy;
                if px < 0 || py < 0 || px >= width as i64 || py >= height as i64 {
                    continue;
                }
                let intensity = image.get_pixel(px as u32, py as u32).0[0] as f32;
                m10 += dx as f32 * intensity;
                m01 += dy as f32 * intensity;
            }
        }

        m01.atan2(m10)
    }

    /// Compute the descriptor for a keypoint whose orientation is already set
    ///
    /// `smoothed` must be the blurred intensity image. Returns `None` when the
    /// patch does not fit inside the image.
    pub fn describe(&self, smoothed: &GrayImage, keypoint: &KeyPoint) -> Option<BriefDescriptor> {
        if !Self::fits(smoothed, keypoint) {
            return None;
        }

        let radius = Self::patch_radius(keypoint) as f32;
        let (sin_a, cos_a) = keypoint.angle.sin_cos();
        let sample = |(x, y): (f32, f32)| {
            let rx = (x * cos_a - y * sin_a) * radius;
            let ry = (x * sin_a + y * cos_a) * radius;
            let px = (keypoint.x + rx).round() as u32;
            let py = (keypoint.y + ry).round() as u32;
            smoothed.get_pixel(px, py).0[0]
        };

        let mut descriptor = [0u64; 4];
        for (i, pair) in self.pattern.iter().enumerate() {
            if sample(pair.a) > sample(pair.b) {
                descriptor[i / 64] |= 1 << (i % 64);
            }
        }

        Some(BriefDescriptor(descriptor))
    }

    /// Orient and describe a single keypoint
    pub fn compute(
        &self,
        image: &GrayImage,
        smoothed: &GrayImage,
        keypoint: &KeyPoint,
    ) -> Option<(KeyPoint, BriefDescriptor)> {
        if !Self::fits(image, keypoint) {
            return None;
        }
        let oriented = KeyPoint {
            angle: Self::orientation(image, keypoint),
            ..*keypoint
        };
        let descriptor = self.describe(smoothed, &oriented)?;
        Some((oriented, descriptor))
    }

    /// Compute descriptors for all keypoints
    ///
    /// Keypoints too close to the border are dropped together with their
    /// descriptor; the survivors keep their input order.
    pub fn compute_all(&self, image: &GrayImage, keypoints: &[KeyPoint]) -> FeatureSet {
        if keypoints.is_empty() {
            return FeatureSet::empty();
        }
        let smoothed = gaussian_blur_f32(image, BLUR_SIGMA);
        keypoints
            .iter()
            .filter_map(|kp| self.compute(image, &smoothed, kp))
            .collect()
    }
}

fn sample_unit_disc(rng: &mut ChaCha8Rng) -> (f32, f32) {
    loop {
        let x = rng.sample::<f32, _>(StandardNormal) * PATTERN_SIGMA;
        let y = rng.sample::<f32, _>(StandardNormal) * PATTERN_SIGMA;
        if x * x + y * y <= 1.0 {
            return (x, y);
        }
    }
}
