//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use slideclip_models::ModelError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("Media unreadable: {path}: {reason}")]
    MediaUnreadable { path: PathBuf, reason: String },

    #[error("Transcode failed: {message}")]
    TranscodeFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid analysis output: {0}")]
    InvalidAnalysis(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a media-unreadable error.
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MediaUnreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a transcode failure error.
    pub fn transcode_failed(message: impl Into<String>) -> Self {
        Self::TranscodeFailed {
            message: message.into(),
            stderr: None,
            exit_code: None,
        }
    }

    /// Re-label a generic FFmpeg failure as a transcode failure.
    pub fn into_transcode_failure(self) -> Self {
        match self {
            MediaError::FfmpegFailed {
                message,
                stderr,
                exit_code,
            } => MediaError::TranscodeFailed {
                message,
                stderr,
                exit_code,
            },
            MediaError::Timeout(secs) => {
                MediaError::transcode_failed(format!("timed out after {} seconds", secs))
            }
            other => other,
        }
    }

    /// Whether the error is a missing or corrupt input rather than a tool failure.
    pub fn is_unreadable(&self) -> bool {
        matches!(
            self,
            MediaError::MediaUnreadable { .. } | MediaError::FileNotFound(_)
        )
    }
}
