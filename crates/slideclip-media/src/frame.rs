//! Still frame extraction.

use std::path::Path;

use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// JPEG quality for extracted slides (`-q:v`, 2 is near lossless).
pub const SLIDE_IMAGE_QUALITY: u8 = 2;

/// Seconds into a segment at which its slide image is captured.
///
/// The first frames after a cut can still carry the transition, so the image
/// is taken slightly later.
pub const DEFAULT_IMAGE_OFFSET_SECS: f64 = 0.3;

/// Pick the capture timestamp for a segment `[start, end]`.
///
/// Uses `start + offset`, pulled back inside the segment when it is shorter
/// than the offset.
pub fn capture_time(start: f64, end: f64, offset: f64) -> f64 {
    let target = start + offset.max(0.0);
    if target < end {
        target
    } else {
        start + (end - start).max(0.0) / 2.0
    }
}

/// Extract a single frame at `at_secs` into `output` (format from extension).
pub async fn extract_frame(
    runner: &FfmpegRunner,
    video: &Path,
    at_secs: f64,
    output: &Path,
) -> MediaResult<()> {
    debug!(
        video = %video.display(),
        at_secs,
        output = %output.display(),
        "Extracting frame"
    );

    let cmd = FfmpegCommand::new(video, output)
        .seek(at_secs)
        .single_frame()
        .image_quality(SLIDE_IMAGE_QUALITY);

    runner.run(&cmd).await
}
