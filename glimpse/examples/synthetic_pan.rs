//! Example: Track a synthetic camera pan and show it in Rerun
//!
//! Usage:
//!   cargo run --release --example synthetic_pan -- [num_frames]
//!
//! Renders random rectangles on a large canvas and slides a window across it,
//! so every match should point the same way.

use glimpse::{run, MemorySource, RerunRenderer};
use glimpse_frontend::{FeatureTracker, TrackerConfig};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::env;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 360;
// Pixels per frame
const PAN_X: u32 = 3;
const PAN_Y: u32 = 1;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let num_frames: u32 = env::args()
        .nth(1)
        .map(|s| s.parse::<u32>())
        .transpose()?
        .unwrap_or(60);

    let canvas = canvas(WIDTH + PAN_X * num_frames, HEIGHT + PAN_Y * num_frames, 42);
    let frames = (0..num_frames).map(|i| {
        let view = image::imageops::crop_imm(&canvas, i * PAN_X, i * PAN_Y, WIDTH, HEIGHT);
        DynamicImage::ImageRgb8(view.to_image())
    });
    let mut source = MemorySource::new(frames);

    let config = TrackerConfig {
        width: WIDTH,
        height: HEIGHT,
        draw_matches: true,
        ..Default::default()
    };
    let mut tracker = FeatureTracker::new(config)?;
    let mut renderer = RerunRenderer::spawn("glimpse_synthetic_pan")?;
    println!("Rerun viewer spawned successfully");

    let summary = run(&mut tracker, &mut source, &mut renderer, None)?;

    println!("\nTracked {} frames in {:.2?}", summary.frames, summary.elapsed);
    println!("  Mean keypoints: {:.1}", summary.mean_keypoints());
    println!("  Mean matches:   {:.1}", summary.mean_matches());

    Ok(())
}

/// Random gray rectangles over mild noise
fn canvas(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut image = RgbImage::from_fn(width, height, |_, _| {
        let v = rng.random_range(90..110u8);
        Rgb([v, v, v])
    });
    let count = (width * height / 2500) as usize;
    for _ in 0..count {
        let x = rng.random_range(0..width as i32);
        let y = rng.random_range(0..height as i32);
        let w = rng.random_range(8..60u32);
        let h = rng.random_range(8..60u32);
        let v = rng.random_range(0..=255u8);
        draw_filled_rect_mut(&mut image, Rect::at(x, y).of_size(w, h), Rgb([v, v, v]));
    }
    image
}
