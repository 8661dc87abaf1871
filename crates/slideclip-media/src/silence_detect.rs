//! Silence detection with FFmpeg's `silencedetect` filter.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use slideclip_models::Interval;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

fn silence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"silence_(start|end):\s*(-?[0-9]+(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?)")
            .expect("valid regex")
    })
}

/// Build the `silencedetect` filter expression.
pub fn silence_filter(noise_db: f64, min_silence_secs: f64) -> String {
    format!("silencedetect=noise={}dB:d={}", noise_db, min_silence_secs)
}

/// Pair `silence_start` / `silence_end` markers into intervals.
///
/// A start with no matching end means the silence runs to the end of the
/// media and becomes an open interval. An end with no preceding start is
/// ignored. FFmpeg can report slightly negative starts for silence at the
/// very beginning; those are clamped to zero.
pub fn parse_silence_log(log: &str) -> MediaResult<Vec<Interval>> {
    let mut intervals = Vec::new();
    let mut current_start: Option<f64> = None;

    for caps in silence_regex().captures_iter(log) {
        let Ok(value) = caps[2].parse::<f64>() else {
            continue;
        };
        match &caps[1] {
            "start" => current_start = Some(value.max(0.0)),
            _ => {
                if let Some(start) = current_start.take() {
                    intervals.push(Interval::new(start, value.max(start))?);
                }
            }
        }
    }

    if let Some(start) = current_start {
        intervals.push(Interval::open(start)?);
    }

    Ok(intervals)
}

/// Detect silent stretches in `audio`.
pub async fn detect_silence(
    runner: &FfmpegRunner,
    audio: &Path,
    noise_db: f64,
    min_silence_secs: f64,
) -> MediaResult<Vec<Interval>> {
    let cmd = FfmpegCommand::analysis(audio)
        .audio_filter(silence_filter(noise_db, min_silence_secs))
        .format("null");

    let log = runner.run_capture(&cmd).await?;
    let intervals = parse_silence_log(&log)?;

    debug!(
        audio = %audio.display(),
        noise_db,
        min_silence_secs,
        intervals = intervals.len(),
        "Silence detection complete"
    );

    Ok(intervals)
}
