//! FFmpeg CLI wrapper and trim decision logic for slide recordings.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Scene change and silence detection
//! - Frame and audio extraction, trimmed transcoding
//! - Slide segmentation and edge silence trim planning
//! - The [`MediaToolkit`] collaborator trait and its FFmpeg implementation

pub mod audio;
pub mod command;
pub mod error;
pub mod frame;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod scene_detect;
pub mod segmentation;
pub mod silence_detect;
pub mod silence_trim;
pub mod toolkit;

pub use audio::AudioFormat;
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_media, MediaInfo};
pub use progress::FfmpegProgress;
pub use segmentation::{build_segments, SceneDetectionConfig, SegmentationConfig};
pub use silence_trim::{
    analyze_clip, apply_trim, plan_trim, should_transcode, ClipAnalysis, TrimPolicies, TrimPolicy,
};
pub use toolkit::{FfmpegToolkit, MediaToolkit};
