//! Frame-to-frame descriptor matching
//!
//! Brute-force two-nearest-neighbour search of every current descriptor
//! against the previous frame's descriptors, filtered by the distance ratio
//! test. Matches are independent per current descriptor, so one previous
//! descriptor can be matched several times unless cross-checking is enabled.

use serde::{Deserialize, Serialize};

use crate::config::TrackerConfig;
use crate::descriptor::{BriefDescriptor, FeatureSet};
use crate::state::TemporalMatchState;

/// Descriptor distance used for neighbour search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Number of differing bits
    #[default]
    Hamming,
    /// Euclidean distance over the descriptor bytes
    L2,
}

impl DistanceMetric {
    pub fn distance(&self, a: &BriefDescriptor, b: &BriefDescriptor) -> f32 {
        match self {
            DistanceMetric::Hamming => a.hamming_distance(b) as f32,
            DistanceMetric::L2 => a.l2_distance(b),
        }
    }
}

/// A correspondence between a current-frame and a previous-frame feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Index into the current frame's feature set
    pub current_idx: usize,
    /// Index into the previous frame's feature set
    pub previous_idx: usize,
    /// Distance of the accepted (nearest) candidate
    pub distance: f32,
}

/// A candidate returned by the neighbour search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

/// Brute-force matcher with ratio test
#[derive(Debug, Clone)]
pub struct DescriptorMatcher {
    /// Best must be strictly below this fraction of the second best
    ratio_threshold: f32,
    metric: DistanceMetric,
    /// Keep only mutual nearest neighbours
    cross_check: bool,
}

impl Default for DescriptorMatcher {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}

impl DescriptorMatcher {
    pub fn new(ratio_threshold: f32, metric: DistanceMetric) -> Self {
        Self {
            ratio_threshold,
            metric,
            cross_check: false,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.match_ratio_threshold, config.distance_metric)
            .with_cross_check(config.cross_check)
    }

    /// Enable or disable the mutual nearest neighbour check
    pub fn with_cross_check(mut self, cross_check: bool) -> Self {
        self.cross_check = cross_check;
        self
    }

    /// Find the nearest and second-nearest descriptors in `train`
    ///
    /// Ties go to the lower index. Returns `None` when `train` has fewer than
    /// two descriptors.
    pub fn two_nearest(
        &self,
        query: &BriefDescriptor,
        train: &[BriefDescriptor],
    ) -> Option<(Neighbor, Neighbor)> {
        if train.len() < 2 {
            return None;
        }

        let mut best = Neighbor {
            index: usize::MAX,
            distance: f32::INFINITY,
        };
        let mut second = best;

        for (index, candidate) in train.iter().enumerate() {
            let distance = self.metric.distance(query, candidate);
            if distance < best.distance {
                second = best;
                best = Neighbor { index, distance };
            } else if distance < second.distance {
                second = Neighbor { index, distance };
            }
        }

        Some((best, second))
    }

    /// Strict ratio test: `best < ratio * second`
    pub fn passes_ratio_test(&self, best: f32, second: f32) -> bool {
        best < self.ratio_threshold * second
    }

    /// Match every current descriptor against the previous descriptors
    ///
    /// Output order follows `current`.
    pub fn match_descriptors(
        &self,
        current: &[BriefDescriptor],
        previous: &[BriefDescriptor],
    ) -> Vec<Match> {
        let mut matches: Vec<Match> = current
            .iter()
            .enumerate()
            .filter_map(|(current_idx, query)| {
                let (best, second) = self.two_nearest(query, previous)?;
                self.passes_ratio_test(best.distance, second.distance)
                    .then_some(Match {
                        current_idx,
                        previous_idx: best.index,
                        distance: best.distance,
                    })
            })
            .collect();

        if self.cross_check {
            matches = self.keep_mutual(matches, current, previous);
        }

        matches
    }

    /// Match a feature set against the temporal state
    ///
    /// An empty state (first frame) gives no matches.
    pub fn match_against(&self, current: &FeatureSet, state: &TemporalMatchState) -> Vec<Match> {
        match state.previous() {
            Some(previous) => self.match_descriptors(current.descriptors(), previous.descriptors()),
            None => Vec::new(),
        }
    }

    /// Drop matches whose previous descriptor prefers another current descriptor
    fn keep_mutual(
        &self,
        matches: Vec<Match>,
        current: &[BriefDescriptor],
        previous: &[BriefDescriptor],
    ) -> Vec<Match> {
        let mut reverse: Vec<Option<usize>> = vec![None; previous.len()];
        matches
            .into_iter()
            .filter(|m| {
                let back = *reverse[m.previous_idx]
                    .get_or_insert_with(|| self.nearest(&previous[m.previous_idx], current));
                back == m.current_idx
            })
            .collect()
    }

    fn nearest(&self, query: &BriefDescriptor, train: &[BriefDescriptor]) -> usize {
        let mut best_idx = 0;
        let mut best_dist = f32::INFINITY;
        for (index, candidate) in train.iter().enumerate() {
            let distance = self.metric.distance(query, candidate);
            if distance < best_dist {
                best_dist = distance;
                best_idx = index;
            }
        }
        best_idx
    }
}
