//! Glimpse frontend: monocular feature tracking between consecutive frames
//!
//! This crate provides minimum-eigenvalue corner detection, oriented BRIEF
//! descriptors and ratio-test matching against the previous frame, for use
//! as the input stage of a visual odometry pipeline.

pub mod config;
pub mod descriptor;
pub mod detector;
pub mod error;
pub mod frame;
pub mod matcher;
pub mod overlay;
pub mod state;
pub mod tracker;

pub use config::TrackerConfig;
pub use descriptor::{BriefDescriptor, BriefExtractor, FeatureSet};
pub use detector::{CornerDetector, KeyPoint};
pub use error::{FrontendError, Result};
pub use frame::Resizer;
pub use matcher::{DescriptorMatcher, DistanceMetric, Match};
pub use state::TemporalMatchState;
pub use tracker::{FeatureTracker, TrackedFrame};
