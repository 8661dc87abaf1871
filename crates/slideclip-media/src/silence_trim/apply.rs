//! Apply a trim plan by re-encoding the kept range.
//!
//! The output is written under a temporary name next to the target and only
//! renamed over it once FFmpeg succeeds, so a failed transcode leaves the
//! previous file (and the clip's recorded state) intact. The same path can be
//! used as source and target for in-place trims.

use std::path::Path;

use tracing::debug;

use slideclip_models::{TrimDecision, TrimPlan};

use super::config::TrimPolicy;
use crate::audio::AudioFormat;
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{commit, temp_sibling};
use crate::toolkit::MediaToolkit;

/// Check whether a decision is worth a re-encode under `policy`.
///
/// Returns `false` for no-op and vetoed decisions, and when neither trim
/// exceeds `min_significant_trim_secs`.
pub fn should_transcode(decision: &TrimDecision, policy: &TrimPolicy) -> bool {
    if decision.plan.is_noop() {
        debug!(outcome = %decision.outcome, "Nothing to trim, skipping transcode");
        return false;
    }

    let threshold = policy.min_significant_trim_secs;
    let significant = decision.plan.lead_trim > threshold || decision.plan.tail_trim > threshold;
    if !significant {
        debug!(
            lead = decision.plan.lead_trim,
            tail = decision.plan.tail_trim,
            threshold,
            "Trims below significance threshold, skipping transcode"
        );
    }
    significant
}

/// Write `source` minus `plan` to `target` in `format`.
///
/// `duration` is the measured duration of `source`. With an empty plan this
/// is a straight format conversion.
pub async fn apply_trim<T>(
    toolkit: &T,
    source: &Path,
    target: &Path,
    plan: &TrimPlan,
    duration: f64,
    format: AudioFormat,
) -> MediaResult<()>
where
    T: MediaToolkit + ?Sized,
{
    let keep = plan.kept_duration(duration);
    if !keep.is_finite() || keep <= 0.0 {
        return Err(MediaError::transcode_failed(format!(
            "plan keeps {:.3}s of {:.3}s",
            keep, duration
        )));
    }

    let temp = temp_sibling(target)?;
    toolkit
        .transcode_range(source, plan.lead_trim, keep, format, &temp)
        .await?;
    commit(temp, target)?;

    debug!(
        source = %source.display(),
        target = %target.display(),
        lead = plan.lead_trim,
        tail = plan.tail_trim,
        keep,
        "Applied trim"
    );

    Ok(())
}
