//! Per-frame feature tracking pipeline
//!
//! Combines:
//! - Resizing to the working resolution and mean-intensity reduction
//! - Corner detection and oriented BRIEF description
//! - Ratio-test matching against the previous frame's features

use std::time::Instant;

use image::{DynamicImage, RgbImage};
use log::{debug, trace};

use crate::{
    error::{FrontendError, Result},
    frame::{self, Resizer},
    overlay, BriefExtractor, CornerDetector, DescriptorMatcher, FeatureSet, Match,
    TemporalMatchState, TrackerConfig,
};

/// Everything the tracker produced for one frame
#[derive(Debug, Clone)]
pub struct TrackedFrame {
    /// Zero-based index of the frame in the sequence
    pub index: usize,
    /// Resized frame with keypoint (and optionally match) markers
    pub display: RgbImage,
    /// Number of corners found before border filtering
    pub detected: usize,
    /// Described keypoints of this frame
    pub features: FeatureSet,
    /// Good matches against the previous frame (empty on the first frame)
    pub matches: Vec<Match>,
    /// Features of the previous frame, which `matches` index into
    pub previous: Option<FeatureSet>,
}

impl TrackedFrame {
    /// Matched positions as (current, previous) point pairs
    pub fn match_segments(&self) -> Vec<([f32; 2], [f32; 2])> {
        let Some(previous) = &self.previous else {
            return Vec::new();
        };
        self.matches
            .iter()
            .filter_map(|m| {
                let cur = self.features.keypoints().get(m.current_idx)?;
                let prev = previous.keypoints().get(m.previous_idx)?;
                Some(([cur.x, cur.y], [prev.x, prev.y]))
            })
            .collect()
    }
}

/// Tracks features between consecutive frames of a monocular sequence
pub struct FeatureTracker {
    config: TrackerConfig,
    resizer: Resizer,
    /// Corner detector
    detector: CornerDetector,
    /// Descriptor extractor
    extractor: BriefExtractor,
    /// Previous-frame matcher
    matcher: DescriptorMatcher,
    /// Features of the last processed frame
    state: TemporalMatchState,
    /// Frame counter
    frame_idx: usize,
}

impl FeatureTracker {
    /// Create a tracker, failing on an invalid configuration
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            resizer: Resizer::new(config.width, config.height),
            detector: CornerDetector::from_config(&config),
            extractor: BriefExtractor::new(),
            matcher: DescriptorMatcher::from_config(&config),
            state: TemporalMatchState::new(),
            frame_idx: 0,
            config,
        })
    }

    /// Start from a given temporal state instead of an empty one
    pub fn with_state(mut self, state: TemporalMatchState) -> Self {
        self.state = state;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> &TemporalMatchState {
        &self.state
    }

    /// Number of frames processed so far
    pub fn frame_index(&self) -> usize {
        self.frame_idx
    }

    /// Forget the previous frame and restart the frame counter
    pub fn reset(&mut self) {
        self.state.clear();
        self.frame_idx = 0;
    }

    /// Process a decoded frame
    ///
    /// Frames that are not 3-channel or have no pixels are rejected with
    /// [`FrontendError::MalformedFrame`] and leave the state untouched.
    pub fn process(&mut self, input: &DynamicImage) -> Result<TrackedFrame> {
        let rgb = frame::to_rgb(input)?;
        self.process_rgb(&rgb)
    }

    /// Process an RGB frame of any size
    pub fn process_rgb(&mut self, input: &RgbImage) -> Result<TrackedFrame> {
        let (width, height) = input.dimensions();
        if width == 0 || height == 0 {
            return Err(FrontendError::MalformedFrame(format!(
                "zero-sized frame ({}x{})",
                width, height
            )));
        }

        let index = self.frame_idx;
        self.frame_idx += 1;

        // Step 1: working resolution and intensity
        let start = Instant::now();
        let resized = self.resizer.resize(input);
        let gray = frame::mean_intensity(&resized);

        // Step 2: corners and descriptors
        let keypoints = self.detector.detect(&gray);
        let detect_time = start.elapsed();
        let features = self.extractor.compute_all(&gray, &keypoints);
        let describe_time = start.elapsed() - detect_time;

        // Step 3: match against the previous frame
        let matches = self.matcher.match_against(&features, &self.state);
        let match_time = start.elapsed() - detect_time - describe_time;

        // Step 4: markers go on a copy; detection already used `gray`
        let mut display = resized;
        overlay::draw_keypoints(&mut display, &keypoints);
        if self.config.draw_matches {
            if let Some(previous) = self.state.previous() {
                overlay::draw_matches(&mut display, &features, previous, &matches);
            }
        }

        // Step 5: this frame becomes the previous one, whatever matching found
        let previous = self.state.replace(features.clone());

        debug!(
            "frame {}: {} corners, {} described, {} matches",
            index,
            keypoints.len(),
            features.len(),
            matches.len()
        );
        trace!(
            "frame {}: detect {:?}, describe {:?}, match {:?}",
            index,
            detect_time,
            describe_time,
            match_time
        );

        Ok(TrackedFrame {
            index,
            display,
            detected: keypoints.len(),
            features,
            matches,
            previous,
        })
    }
}
