//! Example: Detect corners and describe them on a single image
//!
//! Usage:
//!   cargo run --example detect_features -- <input_image> [output_image]
//!
//! If no output path is given, saves to "output_features.png"

use glimpse_frontend::{frame, BriefExtractor, CornerDetector, FeatureSet, TrackerConfig};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <input_image> [output_image]", args[0]);
        eprintln!("\nThis example detects corners, computes oriented BRIEF descriptors");
        eprintln!("and saves an annotated image showing the described keypoints.");
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = args.get(2).map(|s| s.as_str()).unwrap_or("output_features.png");

    println!("Loading image: {}", input_path);

    let img = match image::open(input_path) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Failed to load image: {}", e);
            std::process::exit(1);
        }
    };

    let rgb = img.to_rgb8();
    let gray = frame::mean_intensity(&rgb);
    let (width, height) = gray.dimensions();
    println!("Image size: {}x{}", width, height);

    let config = TrackerConfig::default();

    println!("\nDetecting corners...");
    let detector = CornerDetector::from_config(&config);
    let start = std::time::Instant::now();
    let keypoints = detector.detect(&gray);
    println!("  Found {} keypoints in {:?}", keypoints.len(), start.elapsed());

    println!("\nComputing descriptors...");
    let extractor = BriefExtractor::new();
    let start = std::time::Instant::now();
    let features = extractor.compute_all(&gray, &keypoints);
    println!(
        "  Computed {} descriptors in {:?}",
        features.len(),
        start.elapsed()
    );
    println!(
        "  ({} keypoints too close to border)",
        keypoints.len() - features.len()
    );

    if !features.is_empty() {
        let responses: Vec<f32> = features.keypoints().iter().map(|kp| kp.response).collect();
        let avg = responses.iter().sum::<f32>() / responses.len() as f32;
        let max = responses.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min = responses.iter().cloned().fold(f32::INFINITY, f32::min);
        println!("\nKeypoint statistics:");
        println!("  Response: min={:.1}, max={:.1}, avg={:.1}", min, max, avg);
    }

    println!("\nSaving visualization to: {}", output_path);
    let output = visualize_keypoints(&rgb, &features);
    if let Err(e) = output.save(output_path) {
        eprintln!("Failed to save output image: {}", e);
        std::process::exit(1);
    }
}

/// Draw keypoints with their patch radius and orientation
fn visualize_keypoints(image: &RgbImage, features: &FeatureSet) -> RgbImage {
    let mut output = image.clone();
    let strongest = features
        .keypoints()
        .iter()
        .map(|kp| kp.response)
        .fold(0.0f32, f32::max);

    for kp in features.keypoints() {
        let x = kp.x as i32;
        let y = kp.y as i32;

        // Green for strong corners, orange for weak ones
        let color = if kp.response > 0.25 * strongest {
            Rgb([0, 255, 0])
        } else if kp.response > 0.05 * strongest {
            Rgb([255, 255, 0])
        } else {
            Rgb([255, 128, 0])
        };

        let radius = BriefExtractor::patch_radius(kp) as i32;
        draw_hollow_circle_mut(&mut output, (x, y), radius, color);

        let ex = kp.x + radius as f32 * kp.angle.cos();
        let ey = kp.y + radius as f32 * kp.angle.sin();
        draw_line_segment_mut(&mut output, (kp.x, kp.y), (ex, ey), Rgb([255, 0, 0]));
    }

    output
}
