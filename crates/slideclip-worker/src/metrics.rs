//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding application installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const SEGMENTS_BUILT_TOTAL: &str = "slideclip_segments_built_total";
    pub const CLIPS_PROCESSED_TOTAL: &str = "slideclip_clips_processed_total";
    pub const CLIPS_FAILED_TOTAL: &str = "slideclip_clips_failed_total";
    pub const SAFETY_VETOES_TOTAL: &str = "slideclip_safety_vetoes_total";
    pub const SECONDS_TRIMMED: &str = "slideclip_seconds_trimmed";
    pub const CLIP_DURATION_SECONDS: &str = "slideclip_clip_duration_seconds";
}

/// Record the segments built from one source video.
pub fn record_segments_built(count: usize) {
    counter!(names::SEGMENTS_BUILT_TOTAL).increment(count as u64);
}

/// Record a clip that completed a pass.
pub fn record_clip_processed(pass: &str, duration_secs: f64) {
    let labels = [("pass", pass.to_string())];
    counter!(names::CLIPS_PROCESSED_TOTAL, &labels).increment(1);
    histogram!(names::CLIP_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a clip that failed a pass.
pub fn record_clip_failed(pass: &str) {
    let labels = [("pass", pass.to_string())];
    counter!(names::CLIPS_FAILED_TOTAL, &labels).increment(1);
}

/// Record a planner safety veto.
pub fn record_safety_veto(pass: &str) {
    let labels = [("pass", pass.to_string())];
    counter!(names::SAFETY_VETOES_TOTAL, &labels).increment(1);
}

/// Record seconds removed from one clip in one pass.
pub fn record_seconds_trimmed(pass: &str, secs: f64) {
    let labels = [("pass", pass.to_string())];
    histogram!(names::SECONDS_TRIMMED, &labels).record(secs);
}
