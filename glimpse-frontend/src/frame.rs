//! Frame preparation: validation, resizing and intensity reduction

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, RgbImage};

use crate::error::{FrontendError, Result};

/// Check that a decoded frame has three color channels and a non-zero size
pub fn validate_frame(frame: &DynamicImage) -> Result<()> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        return Err(FrontendError::MalformedFrame(format!(
            "zero-sized frame ({}x{})",
            width, height
        )));
    }
    let channels = frame.color().channel_count();
    if channels != 3 {
        return Err(FrontendError::MalformedFrame(format!(
            "expected 3 color channels, got {} ({:?})",
            channels,
            frame.color()
        )));
    }
    Ok(())
}

/// Validate a decoded frame and convert it to 8-bit RGB
pub fn to_rgb(frame: &DynamicImage) -> Result<RgbImage> {
    validate_frame(frame)?;
    Ok(match frame {
        DynamicImage::ImageRgb8(rgb) => rgb.clone(),
        other => other.to_rgb8(),
    })
}

/// Rescales frames to the fixed working resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resizer {
    width: u32,
    height: u32,
}

impl Resizer {
    /// Target dimensions must be positive;
    /// [`TrackerConfig::validate`](crate::TrackerConfig::validate) enforces this
    /// before a resizer is built.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bilinear resize. A frame already at the target size is copied unchanged.
    pub fn resize(&self, frame: &RgbImage) -> RgbImage {
        if frame.dimensions() == (self.width, self.height) {
            return frame.clone();
        }
        imageops::resize(frame, self.width, self.height, FilterType::Triangle)
    }
}

/// Reduce an RGB frame to one channel with the plain mean of R, G and B
///
/// The mean is truncated, not rounded, and there is no luma weighting.
pub fn mean_intensity(frame: &RgbImage) -> GrayImage {
    let (width, height) = frame.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b] = frame.get_pixel(x, y).0;
        Luma([((r as u16 + g as u16 + b as u16) / 3) as u8])
    })
}
