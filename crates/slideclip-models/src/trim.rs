//! Trim plans and planner outcomes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Seconds to remove from the start and end of a clip's current media.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TrimPlan {
    /// Seconds removed from the start.
    pub lead_trim: f64,
    /// Seconds removed from the end.
    pub tail_trim: f64,
}

impl TrimPlan {
    /// The plan that removes nothing.
    pub const NONE: TrimPlan = TrimPlan {
        lead_trim: 0.0,
        tail_trim: 0.0,
    };

    /// Create a plan; negative inputs are floored at zero.
    pub fn new(lead_trim: f64, tail_trim: f64) -> Self {
        Self {
            lead_trim: lead_trim.max(0.0),
            tail_trim: tail_trim.max(0.0),
        }
    }

    /// Total seconds removed.
    pub fn total(&self) -> f64 {
        self.lead_trim + self.tail_trim
    }

    /// Whether applying the plan changes nothing.
    pub fn is_noop(&self) -> bool {
        self.lead_trim <= 0.0 && self.tail_trim <= 0.0
    }

    /// Duration left after applying the plan to media of `duration` seconds.
    pub fn kept_duration(&self, duration: f64) -> f64 {
        duration - self.total()
    }
}

/// Why the planner produced the plan it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrimOutcome {
    /// Leading and/or trailing silence will be removed.
    Trimmed,
    /// No leading or trailing silence was found.
    NothingToTrim,
    /// The clip is silent end to end and is left as is.
    Untouched,
    /// Trimming would leave too little audio; declined to protect content.
    SafetyVetoApplied,
    /// Silence was found but the trims were too small to justify a transcode.
    BelowThreshold,
}

impl TrimOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrimOutcome::Trimmed => "trimmed",
            TrimOutcome::NothingToTrim => "nothing_to_trim",
            TrimOutcome::Untouched => "untouched",
            TrimOutcome::SafetyVetoApplied => "safety_veto_applied",
            TrimOutcome::BelowThreshold => "below_threshold",
        }
    }
}

impl std::fmt::Display for TrimOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A plan together with the reason behind it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrimDecision {
    pub plan: TrimPlan,
    pub outcome: TrimOutcome,
}

impl TrimDecision {
    /// A decision that removes nothing.
    pub fn keep(outcome: TrimOutcome) -> Self {
        Self {
            plan: TrimPlan::NONE,
            outcome,
        }
    }

    /// A decision that removes the given plan.
    pub fn trim(plan: TrimPlan) -> Self {
        if plan.is_noop() {
            return Self::keep(TrimOutcome::NothingToTrim);
        }
        Self {
            plan,
            outcome: TrimOutcome::Trimmed,
        }
    }

    /// Whether the veto fired.
    pub fn is_vetoed(&self) -> bool {
        self.outcome == TrimOutcome::SafetyVetoApplied
    }
}
