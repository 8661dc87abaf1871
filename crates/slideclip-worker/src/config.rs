//! Pipeline configuration.

use std::path::{Path, PathBuf};

use slideclip_media::{SceneDetectionConfig, SegmentationConfig, TrimPolicies};
use slideclip_models::RegionOfInterest;

use crate::error::{PipelineError, PipelineResult};

/// Manifest file name inside the output directory.
pub const MANIFEST_FILE: &str = "sections_summary.json";

/// Player page file name inside the output directory.
pub const PLAYER_FILE: &str = "index.html";

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory receiving images, audio, manifest and player page
    pub output_dir: PathBuf,
    /// Scene detection sensitivity and region of interest
    pub scene: SceneDetectionConfig,
    /// Segment builder parameters
    pub segmentation: SegmentationConfig,
    /// Seconds into each segment at which its image is captured
    pub image_offset_secs: f64,
    /// Clips processed concurrently within a pass
    pub max_parallel_clips: usize,
    /// Timeout for a single FFmpeg invocation
    pub ffmpeg_timeout_secs: Option<u64>,
    /// Trim policies of both passes
    pub policies: TrimPolicies,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            scene: SceneDetectionConfig::default(),
            segmentation: SegmentationConfig::default(),
            image_offset_secs: slideclip_media::frame::DEFAULT_IMAGE_OFFSET_SECS,
            max_parallel_clips: 1,
            ffmpeg_timeout_secs: None,
            policies: TrimPolicies::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    ///
    /// Unset or unparseable variables keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let region = std::env::var("SLIDECLIP_REGION")
            .ok()
            .and_then(|s| parse_region(&s).ok())
            .unwrap_or(defaults.scene.region);

        Self {
            output_dir: std::env::var("SLIDECLIP_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            scene: SceneDetectionConfig::default()
                .with_sensitivity(
                    env_parse("SLIDECLIP_SCENE_SENSITIVITY").unwrap_or(defaults.scene.sensitivity),
                )
                .with_region(region),
            segmentation: SegmentationConfig::default().with_min_segment_secs(
                env_parse("SLIDECLIP_MIN_SEGMENT_SECS")
                    .unwrap_or(defaults.segmentation.min_segment_secs),
            ),
            image_offset_secs: env_parse("SLIDECLIP_IMAGE_OFFSET_SECS")
                .unwrap_or(defaults.image_offset_secs),
            max_parallel_clips: env_parse("SLIDECLIP_MAX_PARALLEL")
                .unwrap_or(defaults.max_parallel_clips),
            ffmpeg_timeout_secs: env_parse("SLIDECLIP_FFMPEG_TIMEOUT_SECS"),
            policies: defaults.policies,
        }
    }

    /// Replace the trim policies with those in a JSON policy file.
    pub fn with_policy_file(mut self, path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::config_error(format!("cannot read policy file {}: {}", path.display(), e))
        })?;
        self.policies = serde_json::from_str(&contents).map_err(|e| {
            PipelineError::config_error(format!("invalid policy file {}: {}", path.display(), e))
        })?;
        Ok(self)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_parallel_clips == 0 {
            return Err(PipelineError::config_error("max_parallel_clips must be at least 1"));
        }
        if !self.scene.region.is_valid() {
            return Err(PipelineError::config_error(format!(
                "region of interest {:?} is not inside the frame",
                self.scene.region
            )));
        }
        if !self.image_offset_secs.is_finite() || self.image_offset_secs < 0.0 {
            return Err(PipelineError::config_error("image offset must be non-negative"));
        }
        self.policies.validate().map_err(PipelineError::config_error)
    }

    /// Path of the manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(MANIFEST_FILE)
    }

    /// Path of the player page.
    pub fn player_path(&self) -> PathBuf {
        self.output_dir.join(PLAYER_FILE)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

/// Parse a region given as `x,y,width,height` fractions of the frame.
pub fn parse_region(s: &str) -> Result<RegionOfInterest, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid region '{}': {}", s, e))?;

    let [x, y, width, height] = parts.as_slice() else {
        return Err(format!("invalid region '{}': expected x,y,width,height", s));
    };

    let region = RegionOfInterest::new(*x, *y, *width, *height);
    if !region.is_valid() {
        return Err(format!("invalid region '{}': must lie within the frame", s));
    }
    Ok(region)
}
