//! Trim planning.

use tracing::debug;

use slideclip_models::{
    Interval, IntervalEnd, ModelError, ModelResult, TrimDecision, TrimOutcome, TrimPlan,
};

use super::config::TrimPolicy;

/// Slack for comparisons against timestamps parsed from FFmpeg's log.
const TIME_TOLERANCE: f64 = 1e-9;

/// Decide how much leading and trailing silence to remove from a clip.
///
/// `silences` may be unsorted or overlapping. Only silence touching an edge
/// of the clip (within `edge_epsilon_secs`) is trimmed, minus the policy's
/// padding. The result is pure and deterministic:
///
/// - a clip that is silent from start to end (open silence at zero) is left
///   [`TrimOutcome::Untouched`];
/// - each trim is capped at `max_trim_fraction` of the duration; when the
///   capped trims would leave less than `min_viable_secs`, nothing is trimmed
///   ([`TrimOutcome::SafetyVetoApplied`]).
///
/// # Errors
///
/// [`ModelError::InvalidDuration`] when `duration` is not a positive finite
/// number.
pub fn plan_trim(
    silences: &[Interval],
    duration: f64,
    policy: &TrimPolicy,
) -> ModelResult<TrimDecision> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(ModelError::InvalidDuration(duration));
    }

    let mut sorted = silences.to_vec();
    sorted.sort_by(|a, b| a.start().total_cmp(&b.start()));

    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return Ok(TrimDecision::keep(TrimOutcome::NothingToTrim));
    };

    let lead = if first.start() <= policy.edge_epsilon_secs + TIME_TOLERANCE {
        match first.end() {
            IntervalEnd::Open => {
                debug!(duration, "Clip is silent end to end, leaving untouched");
                return Ok(TrimDecision::keep(TrimOutcome::Untouched));
            }
            IntervalEnd::At(end) => (end.min(duration) - policy.padding_lead_secs).max(0.0),
        }
    } else {
        0.0
    };

    let reaches_end = match last.end() {
        IntervalEnd::Open => true,
        IntervalEnd::At(end) => end >= duration - policy.edge_epsilon_secs - TIME_TOLERANCE,
    };
    let tail = if reaches_end {
        (duration - last.start() - policy.padding_tail_secs).max(0.0)
    } else {
        0.0
    };

    let cap = duration * policy.max_trim_fraction;
    let plan = TrimPlan::new(lead.min(cap), tail.min(cap));

    if plan.kept_duration(duration) < policy.min_viable_secs {
        debug!(
            duration,
            lead = plan.lead_trim,
            tail = plan.tail_trim,
            min_viable_secs = policy.min_viable_secs,
            "Capped trims leave too little audio, vetoing"
        );
        return Ok(TrimDecision::keep(TrimOutcome::SafetyVetoApplied));
    }

    Ok(TrimDecision::trim(plan))
}
