//! Configuration for scene detection and segment building.

use serde::{Deserialize, Serialize};

use slideclip_models::RegionOfInterest;

/// Scene detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDetectionConfig {
    /// Scene score threshold for `select=gt(scene,t)`.
    ///
    /// Slide decks change abruptly but often only in part of the frame, so
    /// the default is far below FFmpeg's usual 0.3-0.4.
    pub sensitivity: f64,

    /// Region of the frame analysed for changes.
    pub region: RegionOfInterest,
}

impl Default for SceneDetectionConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.02,
            region: RegionOfInterest::upper_half(),
        }
    }
}

impl SceneDetectionConfig {
    /// Builder-style setter for sensitivity.
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity.clamp(0.0, 1.0);
        self
    }

    /// Builder-style setter for the analysed region.
    pub fn with_region(mut self, region: RegionOfInterest) -> Self {
        self.region = region;
        self
    }
}

/// Segment builder parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Segments shorter than this are merged into a neighbour.
    pub min_segment_secs: f64,

    /// Boundaries closer than this are treated as one.
    pub dedup_epsilon_secs: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_segment_secs: 0.5,
            dedup_epsilon_secs: 0.001,
        }
    }
}

impl SegmentationConfig {
    /// Builder-style setter for the minimum segment length.
    pub fn with_min_segment_secs(mut self, secs: f64) -> Self {
        self.min_segment_secs = secs.max(0.0);
        self
    }

    /// Builder-style setter for the deduplication epsilon.
    pub fn with_dedup_epsilon_secs(mut self, secs: f64) -> Self {
        self.dedup_epsilon_secs = secs.max(0.0);
        self
    }
}
