//! Pipeline error types.

use std::path::PathBuf;

use thiserror::Error;

use slideclip_media::MediaError;
use slideclip_models::ModelError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Manifest error: {0}")]
    ManifestError(String),

    #[error("Source video not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn manifest_error(msg: impl Into<String>) -> Self {
        Self::ManifestError(msg.into())
    }

    /// Check if the error concerns a single clip's media rather than the run.
    pub fn is_clip_local(&self) -> bool {
        matches!(
            self,
            PipelineError::Model(_)
                | PipelineError::Media(MediaError::MediaUnreadable { .. })
                | PipelineError::Media(MediaError::TranscodeFailed { .. })
                | PipelineError::Media(MediaError::FfmpegFailed { .. })
                | PipelineError::Media(MediaError::FileNotFound(_))
                | PipelineError::Media(MediaError::Timeout(_))
                | PipelineError::Media(MediaError::InvalidAnalysis(_))
        )
    }
}
