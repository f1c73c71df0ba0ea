//! Single-slot memory of the previous frame's features

use crate::descriptor::FeatureSet;

/// Holds the feature set of the most recently processed frame
///
/// Empty before the first frame. Each processed frame replaces the slot
/// wholesale, so matching always runs against the immediately preceding frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemporalMatchState {
    previous: Option<FeatureSet>,
}

impl TemporalMatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the state with a prior frame, e.g. a synthetic one in tests
    pub fn with_previous(previous: FeatureSet) -> Self {
        Self {
            previous: Some(previous),
        }
    }

    pub fn previous(&self) -> Option<&FeatureSet> {
        self.previous.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_none()
    }

    /// Store `current` as the new previous frame, returning the one it replaces
    pub fn replace(&mut self, current: FeatureSet) -> Option<FeatureSet> {
        self.previous.replace(current)
    }

    pub fn clear(&mut self) {
        self.previous = None;
    }
}
