//! Example: Match features between two consecutive frames
//!
//! Usage:
//!   cargo run --example match_pair -- <previous_image> <current_image> [output_image]
//!
//! If no output path is given, saves to "output_matches.png"

use glimpse_frontend::{FeatureTracker, TrackedFrame, TrackerConfig};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <previous_image> <current_image> [output_image]", args[0]);
        eprintln!("\nThis example matches the features of the second image against the first");
        eprintln!("and draws the good matches side by side.");
        std::process::exit(1);
    }

    let output_path = args.get(3).map(|s| s.as_str()).unwrap_or("output_matches.png");

    let previous_img = image::open(&args[1])?;
    let current_img = image::open(&args[2])?;

    // Work at the first image's resolution
    let config = TrackerConfig {
        width: previous_img.width(),
        height: previous_img.height(),
        ..Default::default()
    };
    let mut tracker = FeatureTracker::new(config)?;

    let start = std::time::Instant::now();
    let first = tracker.process(&previous_img)?;
    let second = tracker.process(&current_img)?;
    println!(
        "Processed both frames in {:?}: {} / {} features",
        start.elapsed(),
        first.features.len(),
        second.features.len()
    );
    println!("  Found {} good matches", second.matches.len());

    if !second.matches.is_empty() {
        let distances: Vec<f32> = second.matches.iter().map(|m| m.distance).collect();
        let avg = distances.iter().sum::<f32>() / distances.len() as f32;
        let max = distances.iter().cloned().fold(0.0f32, f32::max);
        println!("\nMatch distance: avg={:.1}, max={:.1}", avg, max);
    }

    println!("\nSaving visualization to: {}", output_path);
    side_by_side(&first, &second).save(output_path)?;

    Ok(())
}

/// Previous frame on the left, current on the right, matches as lines
fn side_by_side(previous: &TrackedFrame, current: &TrackedFrame) -> RgbImage {
    let (width, height) = previous.display.dimensions();
    let mut output = RgbImage::new(width * 2, height);
    image::imageops::replace(&mut output, &previous.display, 0, 0);
    image::imageops::replace(&mut output, &current.display, width as i64, 0);

    for (cur, prev) in current.match_segments() {
        draw_line_segment_mut(
            &mut output,
            (prev[0], prev[1]),
            (cur[0] + width as f32, cur[1]),
            Rgb([255, 0, 255]),
        );
    }

    output
}
