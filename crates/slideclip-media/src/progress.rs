//! Parsing of FFmpeg's `-progress pipe:2` output.
//!
//! Progress arrives as blocks of bare `key=value` lines terminated by
//! `progress=continue` or `progress=end`, interleaved on stderr with the
//! filter diagnostics the analysis passes read.

use serde::{Deserialize, Serialize};

/// Snapshot of one progress block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Output time as string (HH:MM:SS.microseconds)
    pub out_time: String,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Whether a stderr line belongs to the progress stream.
    ///
    /// Progress keys never contain spaces or brackets, unlike filter
    /// diagnostics such as `[silencedetect @ 0x..] silence_start: 1`.
    pub fn is_progress_line(line: &str) -> bool {
        match line.trim().split_once('=') {
            Some((key, _)) => !key.is_empty() && !key.contains(' ') && !key.contains('['),
            None => false,
        }
    }

    /// Fold one progress line into this snapshot.
    ///
    /// Returns a copy of the snapshot when the line closes a block.
    pub fn update(&mut self, line: &str) -> Option<FfmpegProgress> {
        let (key, value) = line.trim().split_once('=')?;
        match key {
            // Both keys carry microseconds despite the name
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_ms = us / 1000;
                }
            }
            "out_time" => self.out_time = value.to_string(),
            "speed" => {
                if let Some(speed) = value.trim().strip_suffix('x').and_then(|s| s.parse().ok()) {
                    self.speed = speed;
                }
            }
            "progress" => {
                self.is_complete = value == "end";
                return Some(self.clone());
            }
            _ => {}
        }
        None
    }

    /// Progress percentage against the expected output duration.
    pub fn percentage(&self, total_duration_ms: i64) -> f64 {
        if total_duration_ms <= 0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / total_duration_ms as f64) * 100.0).min(100.0)
    }
}
