//! Single-threaded run loop: acquire, track, present, repeat

use std::time::{Duration, Instant};

use glimpse_frontend::FeatureTracker;
use log::{debug, info};

use crate::error::Result;
use crate::render::Renderer;
use crate::source::FrameSource;

/// Totals over a finished run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Frames processed
    pub frames: usize,
    /// Described keypoints over all frames
    pub total_keypoints: usize,
    /// Good matches over all frames
    pub total_matches: usize,
    pub elapsed: Duration,
    /// The renderer asked to stop before the source ran out
    pub quit_requested: bool,
}

impl RunSummary {
    pub fn mean_keypoints(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.total_keypoints as f64 / self.frames as f64
        }
    }

    pub fn mean_matches(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.total_matches as f64 / self.frames as f64
        }
    }

    /// Frames per second over the whole run
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// Feed frames from `source` through `tracker` into `renderer`
///
/// Stops when the source is exhausted, when `max_frames` frames have been
/// processed, or after the frame on which the renderer requests quit. Any
/// source, tracking or render error ends the run.
pub fn run(
    tracker: &mut FeatureTracker,
    source: &mut dyn FrameSource,
    renderer: &mut dyn Renderer,
    max_frames: Option<usize>,
) -> Result<RunSummary> {
    let start = Instant::now();
    let mut summary = RunSummary::default();

    info!("tracking at {}x{}", tracker.config().width, tracker.config().height);

    while max_frames.map_or(true, |limit| summary.frames < limit) {
        let Some(input) = source.next_frame()? else {
            debug!("end of stream");
            break;
        };

        let tracked = tracker.process(&input)?;
        summary.frames += 1;
        summary.total_keypoints += tracked.features.len();
        summary.total_matches += tracked.matches.len();

        if renderer.present(&tracked)? {
            info!("quit requested after frame {}", tracked.index);
            summary.quit_requested = true;
            break;
        }
    }

    summary.elapsed = start.elapsed();
    info!(
        "processed {} frames in {:.2?} ({:.1} fps)",
        summary.frames,
        summary.elapsed,
        summary.fps()
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NullRenderer;
    use crate::source::MemorySource;
    use glimpse_frontend::TrackerConfig;
    use image::{DynamicImage, Rgb, RgbImage};

    fn flat_frames(n: usize) -> MemorySource {
        let frame = RgbImage::from_pixel(64, 48, Rgb([50, 50, 50]));
        MemorySource::new((0..n).map(|_| DynamicImage::ImageRgb8(frame.clone())))
    }

    fn tracker() -> FeatureTracker {
        FeatureTracker::new(TrackerConfig {
            width: 64,
            height: 48,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_summary_means() {
        let summary = RunSummary {
            frames: 4,
            total_keypoints: 10,
            total_matches: 6,
            ..Default::default()
        };
        assert_eq!(summary.mean_keypoints(), 2.5);
        assert_eq!(summary.mean_matches(), 1.5);
        assert_eq!(RunSummary::default().mean_keypoints(), 0.0);
        assert_eq!(RunSummary::default().fps(), 0.0);
    }

    #[test]
    fn test_runs_to_end_of_stream() {
        let mut source = flat_frames(5);
        let mut renderer = NullRenderer::new();
        let summary = run(&mut tracker(), &mut source, &mut renderer, None).unwrap();
        assert_eq!(summary.frames, 5);
        assert!(!summary.quit_requested);
        assert_eq!(renderer.presented(), 5);
    }

    #[test]
    fn test_quit_stops_after_current_frame() {
        let mut source = flat_frames(5);
        let mut renderer = NullRenderer::quit_after(2);
        let mut tracker = tracker();
        let summary = run(&mut tracker, &mut source, &mut renderer, None).unwrap();
        assert_eq!(summary.frames, 2);
        assert!(summary.quit_requested);
        assert_eq!(tracker.frame_index(), 2);
        assert_eq!(source.remaining(), 3);
    }

    #[test]
    fn test_max_frames_limit() {
        let mut source = flat_frames(5);
        let summary = run(&mut tracker(), &mut source, &mut NullRenderer::new(), Some(3)).unwrap();
        assert_eq!(summary.frames, 3);
        assert!(!summary.quit_requested);
        assert_eq!(source.remaining(), 2);
    }
}
