//! End-to-end runs over synthetic sequences

use glimpse::{
    run, FrameSource, ImageDirectorySource, MemorySource, NullRenderer, Renderer, RunError,
};
use glimpse_frontend::{FeatureTracker, FrontendError, TrackedFrame, TrackerConfig};
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const WIDTH: u32 = 160;
const HEIGHT: u32 = 120;

/// Gray rectangles on a noisy background, larger than the working resolution
fn scene(seed: u64) -> RgbImage {
    let (width, height) = (WIDTH + 40, HEIGHT + 40);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut image = RgbImage::from_fn(width, height, |_, _| {
        let v = rng.random_range(95..105u8);
        Rgb([v, v, v])
    });
    for _ in 0..60 {
        let x = rng.random_range(0..width as i32 - 8);
        let y = rng.random_range(0..height as i32 - 8);
        let w = rng.random_range(6..30u32);
        let h = rng.random_range(6..30u32);
        let v = rng.random_range(0..=255u8);
        draw_filled_rect_mut(&mut image, Rect::at(x, y).of_size(w, h), Rgb([v, v, v]));
    }
    image
}

/// Working-size view into `scene`, moved by (dx, dy) pixels
fn view(scene: &RgbImage, dx: u32, dy: u32) -> DynamicImage {
    let cropped = image::imageops::crop_imm(scene, 20 - dx, 20 - dy, WIDTH, HEIGHT).to_image();
    DynamicImage::ImageRgb8(cropped)
}

fn tracker() -> FeatureTracker {
    FeatureTracker::new(TrackerConfig {
        width: WIDTH,
        height: HEIGHT,
        ..Default::default()
    })
    .unwrap()
}

/// Keeps every presented frame
#[derive(Default)]
struct Collect {
    frames: Vec<TrackedFrame>,
}

impl Renderer for Collect {
    fn present(&mut self, frame: &TrackedFrame) -> glimpse::Result<bool> {
        self.frames.push(frame.clone());
        Ok(false)
    }
}

#[test]
fn test_camera_pan_is_tracked() {
    let scene = scene(11);
    let mut source =
        MemorySource::new([view(&scene, 0, 0), view(&scene, 2, 1), view(&scene, 4, 2)]);
    let mut renderer = Collect::default();

    let summary = run(&mut tracker(), &mut source, &mut renderer, None).unwrap();
    assert_eq!(summary.frames, 3);
    assert!(summary.total_matches > 0);

    let frames = &renderer.frames;
    assert!(frames[0].matches.is_empty());
    assert!(!frames[0].features.is_empty());

    for tracked in &frames[1..] {
        let following = tracked
            .match_segments()
            .iter()
            .filter(|(cur, prev)| {
                (cur[0] - prev[0] - 2.0).abs() <= 1.0 && (cur[1] - prev[1] - 1.0).abs() <= 1.0
            })
            .count();
        assert!(following >= 1, "frame {} has no match following the pan", tracked.index);
    }
}

#[test]
fn test_every_frame_presented_in_order() {
    let scene = scene(12);
    let mut source = MemorySource::new((0..4).map(|i| view(&scene, i, 0)));
    let mut renderer = Collect::default();

    run(&mut tracker(), &mut source, &mut renderer, None).unwrap();
    let indices: Vec<usize> = renderer.frames.iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);

    for pair in renderer.frames.windows(2) {
        assert_eq!(pair[1].previous.as_ref(), Some(&pair[0].features));
    }
}

#[test]
fn test_quit_request_ends_run() {
    let scene = scene(13);
    let mut source = MemorySource::new((0..5).map(|_| view(&scene, 0, 0)));
    let mut tracker = tracker();

    let mut renderer = NullRenderer::quit_after(3);
    let summary = run(&mut tracker, &mut source, &mut renderer, None).unwrap();
    assert!(summary.quit_requested);
    assert_eq!(summary.frames, 3);
    assert_eq!(source.remaining(), 2);
    assert!(tracker.state().previous().is_some());
}

#[test]
fn test_max_frames() {
    let scene = scene(14);
    let mut source = MemorySource::new((0..5).map(|_| view(&scene, 0, 0)));
    let mut renderer = NullRenderer::new();
    let summary = run(&mut tracker(), &mut source, &mut renderer, Some(2)).unwrap();
    assert_eq!(summary.frames, 2);
    assert!(!summary.quit_requested);
}

#[test]
fn test_empty_source() {
    let mut source = MemorySource::new([]);
    let mut renderer = NullRenderer::new();
    let summary = run(&mut tracker(), &mut source, &mut renderer, None).unwrap();
    assert_eq!(summary.frames, 0);
    assert_eq!(summary.mean_keypoints(), 0.0);
    assert_eq!(renderer.presented(), 0);
}

#[test]
fn test_malformed_frame_ends_run() {
    let scene = scene(15);
    let mut source = MemorySource::new([
        view(&scene, 0, 0),
        DynamicImage::ImageRgba8(RgbaImage::new(WIDTH, HEIGHT)),
        view(&scene, 0, 0),
    ]);
    let mut renderer = NullRenderer::new();

    let result = run(&mut tracker(), &mut source, &mut renderer, None);
    assert!(matches!(
        result,
        Err(RunError::Frontend(FrontendError::MalformedFrame(_)))
    ));
    assert_eq!(renderer.presented(), 1);
    assert_eq!(source.remaining(), 1);
}

#[test]
fn test_directory_sequence() {
    let scene = scene(16);
    let dir = tempfile::tempdir().unwrap();
    for i in 0..3u32 {
        view(&scene, i, i)
            .save(dir.path().join(format!("{:06}.png", i)))
            .unwrap();
    }

    let mut source = ImageDirectorySource::open(dir.path()).unwrap();
    assert_eq!(source.len(), 3);
    let boxed: &mut dyn FrameSource = &mut source;
    let mut renderer = Collect::default();
    let summary = run(&mut tracker(), boxed, &mut renderer, None).unwrap();

    assert_eq!(summary.frames, 3);
    assert!(summary.total_matches > 0);
    assert_eq!(renderer.frames[0].display.dimensions(), (WIDTH, HEIGHT));
}

#[test]
fn test_directory_with_alpha_frame_ends_run() {
    let scene = scene(17);
    let dir = tempfile::tempdir().unwrap();
    view(&scene, 0, 0).save(dir.path().join("000000.png")).unwrap();
    RgbaImage::from_pixel(WIDTH, HEIGHT, image::Rgba([90, 90, 90, 255]))
        .save(dir.path().join("000001.png"))
        .unwrap();
    view(&scene, 1, 0).save(dir.path().join("000002.png")).unwrap();

    let mut source = ImageDirectorySource::open(dir.path()).unwrap();
    let mut renderer = NullRenderer::new();
    let result = run(&mut tracker(), &mut source, &mut renderer, None);

    assert!(matches!(
        result,
        Err(RunError::Frontend(FrontendError::MalformedFrame(_)))
    ));
    assert_eq!(renderer.presented(), 1);
}
