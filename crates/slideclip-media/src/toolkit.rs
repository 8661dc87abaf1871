//! The media collaborator used by the pipeline.
//!
//! Everything the pipeline needs from FFmpeg goes through [`MediaToolkit`],
//! so the orchestration and trimming logic can run against a scripted
//! implementation in tests.

use std::path::Path;

use async_trait::async_trait;

use slideclip_models::{Interval, RegionOfInterest};

use crate::audio::{self, AudioFormat};
use crate::command::{check_ffmpeg, check_ffprobe, FfmpegRunner};
use crate::error::MediaResult;
use crate::frame;
use crate::probe;
use crate::scene_detect;
use crate::silence_detect;

/// Media analysis and transformation operations.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Duration of a media file in seconds.
    ///
    /// Fails with `MediaUnreadable` when the file cannot be probed.
    async fn get_duration(&self, path: &Path) -> MediaResult<f64>;

    /// Video frame size `(width, height)`.
    async fn frame_size(&self, video: &Path) -> MediaResult<(u32, u32)>;

    /// Scene change timestamps within `region`, in detection order.
    async fn detect_scene_boundaries(
        &self,
        video: &Path,
        region: &RegionOfInterest,
        sensitivity: f64,
    ) -> MediaResult<Vec<f64>>;

    /// Silent stretches below `noise_db` lasting at least `min_silence_secs`.
    ///
    /// Silence still running at the end of the media is returned open-ended.
    async fn detect_silence_intervals(
        &self,
        audio: &Path,
        noise_db: f64,
        min_silence_secs: f64,
    ) -> MediaResult<Vec<Interval>>;

    /// Write a single still frame taken at `at_secs`.
    async fn extract_frame(&self, video: &Path, at_secs: f64, output: &Path) -> MediaResult<()>;

    /// Write `[start, start + duration)` of the audio as 48 kHz stereo PCM.
    async fn extract_audio_range(
        &self,
        video: &Path,
        start: f64,
        duration: f64,
        output: &Path,
    ) -> MediaResult<()>;

    /// Write `keep_duration` seconds of `audio` starting at `lead_trim`.
    ///
    /// Fails with `TranscodeFailed`; `audio` itself is never modified.
    async fn transcode_range(
        &self,
        audio: &Path,
        lead_trim: f64,
        keep_duration: f64,
        format: AudioFormat,
        output: &Path,
    ) -> MediaResult<()>;
}

/// [`MediaToolkit`] backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegToolkit {
    runner: FfmpegRunner,
}

impl FfmpegToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill any single FFmpeg invocation running longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    /// Fail early when either binary is missing from `PATH`.
    pub fn ensure_available(&self) -> MediaResult<()> {
        check_ffmpeg()?;
        check_ffprobe()?;
        Ok(())
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn get_duration(&self, path: &Path) -> MediaResult<f64> {
        probe::get_duration(path).await
    }

    async fn frame_size(&self, video: &Path) -> MediaResult<(u32, u32)> {
        probe::get_frame_size(video).await
    }

    async fn detect_scene_boundaries(
        &self,
        video: &Path,
        region: &RegionOfInterest,
        sensitivity: f64,
    ) -> MediaResult<Vec<f64>> {
        scene_detect::detect_scene_changes(&self.runner, video, region, sensitivity).await
    }

    async fn detect_silence_intervals(
        &self,
        audio: &Path,
        noise_db: f64,
        min_silence_secs: f64,
    ) -> MediaResult<Vec<Interval>> {
        silence_detect::detect_silence(&self.runner, audio, noise_db, min_silence_secs).await
    }

    async fn extract_frame(&self, video: &Path, at_secs: f64, output: &Path) -> MediaResult<()> {
        frame::extract_frame(&self.runner, video, at_secs, output).await
    }

    async fn extract_audio_range(
        &self,
        video: &Path,
        start: f64,
        duration: f64,
        output: &Path,
    ) -> MediaResult<()> {
        audio::extract_audio_range(&self.runner, video, start, duration, output).await
    }

    async fn transcode_range(
        &self,
        audio: &Path,
        lead_trim: f64,
        keep_duration: f64,
        format: AudioFormat,
        output: &Path,
    ) -> MediaResult<()> {
        audio::transcode_range(&self.runner, audio, lead_trim, keep_duration, format, output).await
    }
}
