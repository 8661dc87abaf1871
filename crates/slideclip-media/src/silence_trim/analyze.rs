//! Silence analysis of a clip's current audio.

use std::path::Path;

use tracing::debug;

use slideclip_models::TrimDecision;

use super::config::TrimPolicy;
use super::planner::plan_trim;
use crate::error::MediaResult;
use crate::toolkit::MediaToolkit;

/// Result of analysing one clip for a trimming pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipAnalysis {
    /// Probed duration of the audio as it is now.
    pub duration: f64,
    /// Number of silent stretches detected.
    pub silence_count: usize,
    /// The planner's decision.
    pub decision: TrimDecision,
}

/// Probe `audio`, detect its silence, and plan its trims under `policy`.
///
/// Planning always uses the file's measured duration, so a clip trimmed by
/// an earlier pass is judged on what it contains now.
pub async fn analyze_clip<T>(
    toolkit: &T,
    audio: &Path,
    policy: &TrimPolicy,
) -> MediaResult<ClipAnalysis>
where
    T: MediaToolkit + ?Sized,
{
    let duration = toolkit.get_duration(audio).await?;
    let silences = toolkit
        .detect_silence_intervals(audio, policy.noise_floor_db, policy.min_silence_secs)
        .await?;
    let decision = plan_trim(&silences, duration, policy)?;

    debug!(
        audio = %audio.display(),
        duration,
        silences = silences.len(),
        lead = decision.plan.lead_trim,
        tail = decision.plan.tail_trim,
        outcome = %decision.outcome,
        "Planned trim"
    );

    Ok(ClipAnalysis {
        duration,
        silence_count: silences.len(),
        decision,
    })
}
