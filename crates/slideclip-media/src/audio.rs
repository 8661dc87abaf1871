//! Audio extraction and trimmed transcoding.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::progress::FfmpegProgress;

/// Sample rate of extracted section audio.
pub const EXTRACT_SAMPLE_RATE: u32 = 48_000;

/// Channel count of extracted section audio.
pub const EXTRACT_CHANNELS: u8 = 2;

/// Input seeks further than this go through a keyframe seek first.
const FAST_SEEK_MARGIN_SECS: f64 = 5.0;

/// Output audio format of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    /// 16-bit PCM WAV
    Wav,
    /// MP3 via libmp3lame, VBR quality 2
    Mp3,
}

impl AudioFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }

    /// MIME type used by the player page.
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }

    /// Infer the format from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "wav" => Some(AudioFormat::Wav),
            "mp3" => Some(AudioFormat::Mp3),
            _ => None,
        }
    }

    fn apply(&self, cmd: FfmpegCommand) -> FfmpegCommand {
        match self {
            AudioFormat::Wav => cmd.audio_codec("pcm_s16le"),
            AudioFormat::Mp3 => cmd.audio_codec("libmp3lame").audio_quality(2),
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Split a seek into a fast input seek and an accurate output seek.
///
/// Returns `(input_seek, output_seek)`; the input seek lands a few seconds
/// early so the accurate seek decodes only a short stretch.
pub fn split_seek(start: f64) -> (f64, f64) {
    let fast = (start - FAST_SEEK_MARGIN_SECS).max(0.0);
    (fast, start - fast)
}

/// Extract `[start, start + duration)` of the source's audio as 48 kHz
/// stereo 16-bit PCM.
pub async fn extract_audio_range(
    runner: &FfmpegRunner,
    video: &Path,
    start: f64,
    duration: f64,
    output: &Path,
) -> MediaResult<()> {
    let (fast_seek, accurate_seek) = split_seek(start);

    debug!(
        video = %video.display(),
        start,
        duration,
        output = %output.display(),
        "Extracting audio range"
    );

    let cmd = FfmpegCommand::new(video, output)
        .seek(fast_seek)
        .accurate_seek(accurate_seek)
        .duration(duration)
        .no_video();
    let cmd = AudioFormat::Wav
        .apply(cmd)
        .audio_layout(EXTRACT_SAMPLE_RATE, EXTRACT_CHANNELS);

    runner.run(&cmd).await
}

/// Re-encode `audio` keeping `keep_duration` seconds starting at `lead_trim`.
///
/// Any FFmpeg failure is reported as `TranscodeFailed`.
pub async fn transcode_range(
    runner: &FfmpegRunner,
    audio: &Path,
    lead_trim: f64,
    keep_duration: f64,
    format: AudioFormat,
    output: &Path,
) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(audio, output)
        .accurate_seek(lead_trim)
        .duration(keep_duration)
        .no_video();
    let cmd = format.apply(cmd);

    let total_ms = (keep_duration * 1000.0) as i64;
    let label = output.display().to_string();
    runner
        .run_with_progress(&cmd, move |progress: FfmpegProgress| {
            debug!(
                output = %label,
                percent = format!("{:.0}", progress.percentage(total_ms)),
                "Transcode progress"
            );
        })
        .await
        .map_err(|e| e.into_transcode_failure())?;

    info!(
        input = %audio.display(),
        output = %output.display(),
        lead_trim,
        keep_duration,
        format = %format,
        "Transcoded audio"
    );

    Ok(())
}
