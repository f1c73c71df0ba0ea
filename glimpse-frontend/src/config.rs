//! Tracker configuration
//!
//! Every threshold the pipeline uses lives here with its default value. The
//! defaults reproduce the fixed constants the tracker was tuned with.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FrontendError, Result};
use crate::matcher::DistanceMetric;

/// Configuration for [`FeatureTracker`](crate::FeatureTracker)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Working frame width in pixels (frames are resized to this)
    pub width: u32,
    /// Working frame height in pixels
    pub height: u32,
    /// Maximum number of corners kept per frame
    pub max_corners: usize,
    /// Corners weaker than this fraction of the strongest response are discarded
    pub quality_ratio: f32,
    /// Minimum Euclidean distance between two accepted corners (pixels)
    pub min_separation_px: f32,
    /// Keypoint size; the descriptor patch radius is half of it
    pub descriptor_scale: f32,
    /// Ratio test threshold: best < threshold * second best
    pub match_ratio_threshold: f32,
    /// Descriptor distance used by the matcher
    pub distance_metric: DistanceMetric,
    /// Keep only mutual nearest neighbours
    pub cross_check: bool,
    /// Draw match segments on the display frame in addition to keypoints
    pub draw_matches: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            width: 3840 / 4,
            height: 2160 / 4,
            max_corners: 3000,
            quality_ratio: 0.01,
            min_separation_px: 3.0,
            descriptor_scale: 20.0,
            match_ratio_threshold: 0.75,
            distance_metric: DistanceMetric::Hamming,
            cross_check: false,
            draw_matches: false,
        }
    }
}

impl TrackerConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FrontendError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check every field. Called by the tracker constructor so a bad
    /// configuration fails before the first frame.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(invalid("width", "must be positive"));
        }
        if self.height == 0 {
            return Err(invalid("height", "must be positive"));
        }
        if self.max_corners == 0 {
            return Err(invalid("max_corners", "must be positive"));
        }
        if !(self.quality_ratio > 0.0 && self.quality_ratio <= 1.0) {
            return Err(invalid(
                "quality_ratio",
                format!("must be in (0, 1], got {}", self.quality_ratio),
            ));
        }
        if !(self.min_separation_px > 0.0 && self.min_separation_px.is_finite()) {
            return Err(invalid(
                "min_separation_px",
                format!("must be a positive finite distance, got {}", self.min_separation_px),
            ));
        }
        if !(self.descriptor_scale >= 2.0 && self.descriptor_scale.is_finite()) {
            return Err(invalid(
                "descriptor_scale",
                format!("must be at least 2, got {}", self.descriptor_scale),
            ));
        }
        if !(self.match_ratio_threshold > 0.0 && self.match_ratio_threshold <= 1.0) {
            return Err(invalid(
                "match_ratio_threshold",
                format!("must be in (0, 1], got {}", self.match_ratio_threshold),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> FrontendError {
    FrontendError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!((config.width, config.height), (960, 540));
        assert_eq!(config.max_corners, 3000);
        assert_eq!(config.match_ratio_threshold, 0.75);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let config = TrackerConfig {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FrontendError::InvalidConfig { field: "width", .. })
        ));

        let config = TrackerConfig {
            height: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FrontendError::InvalidConfig { field: "height", .. })
        ));
    }

    #[test]
    fn test_detector_limits_rejected() {
        let bad = [
            TrackerConfig {
                max_corners: 0,
                ..Default::default()
            },
            TrackerConfig {
                quality_ratio: 0.0,
                ..Default::default()
            },
            TrackerConfig {
                min_separation_px: -1.0,
                ..Default::default()
            },
            TrackerConfig {
                descriptor_scale: 0.0,
                ..Default::default()
            },
            TrackerConfig {
                match_ratio_threshold: 1.5,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{:?} should be rejected", config);
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            TrackerConfig::from_json_str(r#"{ "width": 320, "distance_metric": "l2" }"#).unwrap();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 540);
        assert_eq!(config.distance_metric, DistanceMetric::L2);
        assert!(!config.cross_check);
    }

    #[test]
    fn test_invalid_json_config_rejected() {
        assert!(matches!(
            TrackerConfig::from_json_str(r#"{ "height": 0 }"#),
            Err(FrontendError::InvalidConfig { field: "height", .. })
        ));
        assert!(matches!(
            TrackerConfig::from_json_str("not json"),
            Err(FrontendError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        let config = TrackerConfig {
            max_corners: 500,
            cross_check: true,
            ..Default::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(TrackerConfig::from_json_file(&path).unwrap(), config);

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            TrackerConfig::from_json_file(&missing),
            Err(FrontendError::ConfigRead { .. })
        ));
    }
}
