//! Scene-change detection with FFmpeg's `select` + `showinfo` filters.
//!
//! Slides change abruptly, so the scene score of the first frame of a new
//! slide jumps well above the threshold. The analysis can be restricted to a
//! region of the frame so overlays (buttons, progress bars, a presenter
//! thumbnail) do not register as slide changes.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use slideclip_models::RegionOfInterest;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe::get_frame_size;

fn pts_time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"pts_time:\s*([0-9]+(?:\.[0-9]+)?)").expect("valid regex"))
}

/// Build the filter graph for scene detection.
///
/// `crop` is `(width, height, x, y)` in pixels, or `None` for the full frame.
pub fn scene_filter(crop: Option<(u32, u32, u32, u32)>, sensitivity: f64) -> String {
    let select = format!("select=gt(scene\\,{}),showinfo", sensitivity);
    match crop {
        Some((w, h, x, y)) => format!("crop={}:{}:{}:{},{}", w, h, x, y, select),
        None => select,
    }
}

/// Extract the timestamps reported by `showinfo`, in log order.
pub fn parse_scene_times(log: &str) -> Vec<f64> {
    log.lines()
        .filter(|line| line.contains("showinfo"))
        .filter_map(|line| pts_time_regex().captures(line))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
        .collect()
}

/// Detect scene changes in `video`, looking only at `region`.
///
/// Lower `sensitivity` values detect subtler changes.
pub async fn detect_scene_changes(
    runner: &FfmpegRunner,
    video: &Path,
    region: &RegionOfInterest,
    sensitivity: f64,
) -> MediaResult<Vec<f64>> {
    let crop = if region.is_full_frame() {
        None
    } else {
        let (width, height) = get_frame_size(video).await?;
        let crop = region.to_pixels(width, height);
        debug!(
            width,
            height,
            crop_width = crop.0,
            crop_height = crop.1,
            "Restricting scene analysis to region of interest"
        );
        Some(crop)
    };

    let cmd = FfmpegCommand::analysis(video)
        .video_filter(scene_filter(crop, sensitivity))
        .output_arg("-an")
        .format("null");

    let log = runner.run_capture(&cmd).await?;
    let times = parse_scene_times(&log);

    info!(
        video = %video.display(),
        sensitivity,
        changes = times.len(),
        "Scene detection complete"
    );

    Ok(times)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_filter_with_crop() {
        let filter = scene_filter(Some((1920, 540, 0, 0)), 0.02);
        assert_eq!(filter, "crop=1920:540:0:0,select=gt(scene\\,0.02),showinfo");
        assert_eq!(scene_filter(None, 0.3), "select=gt(scene\\,0.3),showinfo");
    }

    #[test]
    fn test_parse_scene_times() {
        let log = "\
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'talk.mp4':
[Parsed_showinfo_2 @ 0x55e0c8b0] config in time_base: 1/12800, frame_rate: 25/1
[Parsed_showinfo_2 @ 0x55e0c8b0] n:   0 pts:  64000 pts_time:5       duration:    512 fmt:yuv420p
[Parsed_showinfo_2 @ 0x55e0c8b0] n:   1 pts: 153600 pts_time:12.04   duration:    512 fmt:yuv420p
[Parsed_showinfo_2 @ 0x55e0c8b0] n:   2 pts: 153601 pts_time: 31.5  duration:    512
[out#0/null @ 0x55e0c9a0] video:0KiB audio:0KiB";

        assert_eq!(parse_scene_times(log), vec![5.0, 12.04, 31.5]);
    }

    #[test]
    fn test_parse_scene_times_empty() {
        assert!(parse_scene_times("").is_empty());
        assert!(parse_scene_times("frame=100\nprogress=end").is_empty());
    }
}
