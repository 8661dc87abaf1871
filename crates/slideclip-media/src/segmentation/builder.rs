//! Segment builder.
//!
//! Scene detection on slide recordings is noisy: fades and animations fire
//! several changes within a fraction of a second, and timestamps arrive in
//! filter output order. The builder normalizes them into contiguous
//! segments covering `[0, duration]`.

use tracing::debug;

use slideclip_models::{ModelError, ModelResult, Segment};

use super::config::SegmentationConfig;

/// Build content segments from scene boundary timestamps.
///
/// Boundaries may be unsorted, duplicated, or outside `[0, duration]`; those
/// outside the range and non-finite values are discarded. Boundaries within
/// `dedup_epsilon_secs` of each other collapse to the first of the cluster.
/// A candidate shorter than `min_segment_secs` is merged into the following
/// candidate, or into the previous one when it is last. Segments are indexed
/// from 1.
///
/// # Errors
///
/// [`ModelError::InvalidDuration`] when `duration` is not a positive finite
/// number.
pub fn build_segments(
    boundaries: &[f64],
    duration: f64,
    config: &SegmentationConfig,
) -> ModelResult<Vec<Segment>> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(ModelError::InvalidDuration(duration));
    }

    let cuts = normalize_boundaries(boundaries, duration, config.dedup_epsilon_secs);
    let candidates: Vec<(f64, f64)> = cuts.windows(2).map(|w| (w[0], w[1])).collect();
    let merged = merge_short_candidates(&candidates, config.min_segment_secs);

    debug!(
        boundaries = boundaries.len(),
        candidates = candidates.len(),
        segments = merged.len(),
        duration,
        "Built segments"
    );

    merged
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| Segment::new(i as u32 + 1, start, end))
        .collect()
}

/// Sorted, deduplicated cut points starting at `0.0` and ending at `duration`.
fn normalize_boundaries(boundaries: &[f64], duration: f64, epsilon: f64) -> Vec<f64> {
    let mut points: Vec<f64> = boundaries
        .iter()
        .copied()
        .filter(|t| t.is_finite() && *t >= 0.0 && *t <= duration)
        .collect();
    points.push(0.0);
    points.push(duration);
    points.sort_by(|a, b| a.total_cmp(b));

    let mut cuts: Vec<f64> = Vec::with_capacity(points.len());
    for t in points {
        match cuts.last() {
            Some(&last) if t - last <= epsilon => {}
            _ => cuts.push(t),
        }
    }

    // The end of the media always closes the last segment, even when a
    // detected boundary just before it won the dedup.
    cuts[0] = 0.0;
    if cuts.len() == 1 {
        cuts.push(duration);
    } else if let Some(last) = cuts.last_mut() {
        *last = duration;
    }

    cuts
}

fn merge_short_candidates(candidates: &[(f64, f64)], min_secs: f64) -> Vec<(f64, f64)> {
    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(candidates.len());
    let mut pending_start: Option<f64> = None;

    for (i, &(start, end)) in candidates.iter().enumerate() {
        let start = pending_start.take().unwrap_or(start);
        let is_last = i + 1 == candidates.len();

        if end - start < min_secs {
            if !is_last {
                pending_start = Some(start);
                continue;
            }
            if let Some(previous) = merged.last_mut() {
                previous.1 = end;
                continue;
            }
        }

        merged.push((start, end));
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(boundaries: &[f64], duration: f64) -> Vec<Segment> {
        build_segments(boundaries, duration, &SegmentationConfig::default()).unwrap()
    }

    fn spans(segments: &[Segment]) -> Vec<(f64, f64)> {
        segments.iter().map(|s| (s.start, s.end)).collect()
    }

    fn assert_partition(segments: &[Segment], duration: f64) {
        assert!(!segments.is_empty());
        assert_eq!(segments[0].start, 0.0);
        assert_eq!(segments[segments.len() - 1].end, duration);
        for (i, pair) in segments.windows(2).enumerate() {
            assert_eq!(pair[0].end, pair[1].start, "gap or overlap after segment {}", i + 1);
        }
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.index, i as u32 + 1);
        }
    }

    #[test]
    fn test_short_middle_segment_merges_forward() {
        let segments = build(&[5.0, 5.05, 12.0], 12.0);
        assert_eq!(spans(&segments), vec![(0.0, 5.0), (5.0, 12.0)]);
    }

    #[test]
    fn test_empty_boundaries_cover_everything() {
        let segments = build(&[], 42.5);
        assert_eq!(spans(&segments), vec![(0.0, 42.5)]);
        assert_eq!(segments[0].index, 1);
    }

    #[test]
    fn test_unsorted_duplicated_and_out_of_range() {
        let segments = build(&[20.0, 10.0, 10.0, 10.0005, -3.0, 99.0, f64::NAN], 30.0);
        assert_eq!(spans(&segments), vec![(0.0, 10.0), (10.0, 20.0), (20.0, 30.0)]);
    }

    #[test]
    fn test_short_final_segment_merges_backward() {
        let segments = build(&[4.0, 9.8], 10.0);
        assert_eq!(spans(&segments), vec![(0.0, 4.0), (4.0, 10.0)]);
    }

    #[test]
    fn test_short_first_segment_merges_forward() {
        let segments = build(&[0.2, 6.0], 10.0);
        assert_eq!(spans(&segments), vec![(0.0, 6.0), (6.0, 10.0)]);
    }

    #[test]
    fn test_run_of_short_candidates_accumulates() {
        // Fade animation: many changes 0.1s apart
        let segments = build(&[3.0, 3.1, 3.2, 3.3, 3.4, 3.5, 3.6, 8.0], 10.0);
        assert_partition(&segments, 10.0);
        assert_eq!(spans(&segments), vec![(0.0, 3.0), (3.0, 3.5), (3.5, 8.0), (8.0, 10.0)]);
    }

    #[test]
    fn test_boundary_just_before_end_is_absorbed() {
        let segments = build(&[5.0, 9.9995], 10.0);
        assert_eq!(spans(&segments), vec![(0.0, 5.0), (5.0, 10.0)]);
    }

    #[test]
    fn test_total_shorter_than_minimum() {
        let segments = build(&[0.1, 0.2], 0.3);
        assert_eq!(spans(&segments), vec![(0.0, 0.3)]);
    }

    #[test]
    fn test_invalid_duration() {
        let config = SegmentationConfig::default();
        for duration in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = build_segments(&[1.0], duration, &config).unwrap_err();
            assert!(matches!(err, ModelError::InvalidDuration(_)));
        }
    }

    #[test]
    fn test_partition_properties_for_noisy_input() {
        // Deterministic pseudo-random boundaries in varied order
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        };

        let config = SegmentationConfig::default();
        for round in 0..50 {
            let duration = 1.0 + next() * 300.0;
            let count = (next() * 60.0) as usize;
            let boundaries: Vec<f64> = (0..count)
                .map(|_| next() * (duration + 20.0) - 10.0)
                .collect();

            let segments = build_segments(&boundaries, duration, &config).unwrap();
            assert_partition(&segments, duration);

            if segments.len() > 1 {
                for segment in &segments {
                    assert!(
                        segment.duration() >= config.min_segment_secs,
                        "round {}: segment {} is {:.3}s",
                        round,
                        segment.index,
                        segment.duration()
                    );
                }
            }
        }
    }
}
