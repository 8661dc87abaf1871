//! Cumulative trim ledger.
//!
//! Every trim pass over a clip is recorded here, including passes that
//! removed nothing. The running totals only ever grow, so a clip's current
//! duration only ever shrinks, and a pass number can be recorded once. This
//! is what lets the conversion pass and the later cleanup pass compose
//! without counting the same silence twice.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::trim::{TrimDecision, TrimOutcome};

/// One recorded trim pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PassEntry {
    /// Pass number (1 = conversion, 2 = cleanup).
    pub pass: u8,
    /// Seconds removed from the start in this pass.
    pub lead_trim: f64,
    /// Seconds removed from the end in this pass.
    pub tail_trim: f64,
    /// Clip duration before the pass.
    pub duration_before: f64,
    /// Clip duration after the pass.
    pub duration_after: f64,
    /// Planner outcome that produced the applied trims.
    pub outcome: TrimOutcome,
    /// When the pass was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl PassEntry {
    /// Whether this pass removed anything.
    pub fn is_noop(&self) -> bool {
        self.lead_trim <= 0.0 && self.tail_trim <= 0.0
    }
}

/// Running trim totals for one clip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TrimLedger {
    #[serde(rename = "trim_start", default)]
    cumulative_lead_trim: f64,
    #[serde(rename = "trim_end", default)]
    cumulative_tail_trim: f64,
    #[serde(default)]
    passes: Vec<PassEntry>,
}

impl TrimLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the decision of `pass` applied to media of `duration_before`
    /// seconds, returning the new entry.
    ///
    /// A no-op decision is still recorded so every attempted pass is visible.
    pub fn record(
        &mut self,
        pass: u8,
        decision: &TrimDecision,
        duration_before: f64,
    ) -> ModelResult<&PassEntry> {
        if self.has_pass(pass) {
            return Err(ModelError::PassAlreadyRecorded(pass));
        }
        if !duration_before.is_finite() || duration_before <= 0.0 {
            return Err(ModelError::InvalidDuration(duration_before));
        }

        let plan = decision.plan;
        let valid_amounts = plan.lead_trim.is_finite()
            && plan.tail_trim.is_finite()
            && plan.lead_trim >= 0.0
            && plan.tail_trim >= 0.0;
        if !valid_amounts || (!plan.is_noop() && plan.total() >= duration_before) {
            return Err(ModelError::InvalidTrim {
                lead: plan.lead_trim,
                tail: plan.tail_trim,
                duration: duration_before,
            });
        }

        self.cumulative_lead_trim += plan.lead_trim;
        self.cumulative_tail_trim += plan.tail_trim;
        self.passes.push(PassEntry {
            pass,
            lead_trim: plan.lead_trim,
            tail_trim: plan.tail_trim,
            duration_before,
            duration_after: duration_before - plan.total(),
            outcome: decision.outcome,
            recorded_at: Utc::now(),
        });

        Ok(&self.passes[self.passes.len() - 1])
    }

    /// Total seconds removed from clip starts across all passes.
    pub fn cumulative_lead_trim(&self) -> f64 {
        self.cumulative_lead_trim
    }

    /// Total seconds removed from clip ends across all passes.
    pub fn cumulative_tail_trim(&self) -> f64 {
        self.cumulative_tail_trim
    }

    /// Total seconds removed across all passes.
    pub fn cumulative_total(&self) -> f64 {
        self.cumulative_lead_trim + self.cumulative_tail_trim
    }

    /// All recorded passes in order.
    pub fn passes(&self) -> &[PassEntry] {
        &self.passes
    }

    /// The entry for a given pass, if recorded.
    pub fn pass(&self, pass: u8) -> Option<&PassEntry> {
        self.passes.iter().find(|entry| entry.pass == pass)
    }

    /// Whether a given pass has been recorded.
    pub fn has_pass(&self, pass: u8) -> bool {
        self.pass(pass).is_some()
    }

    /// Number of passes that fired the safety veto.
    pub fn veto_count(&self) -> usize {
        self.passes
            .iter()
            .filter(|entry| entry.outcome == TrimOutcome::SafetyVetoApplied)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trim::TrimPlan;

    #[test]
    fn test_record_accumulates() {
        let mut ledger = TrimLedger::new();

        let entry = ledger
            .record(1, &TrimDecision::trim(TrimPlan::new(0.9, 1.4)), 10.0)
            .unwrap();
        assert!((entry.duration_after - 7.7).abs() < 1e-9);

        let entry = ledger
            .record(2, &TrimDecision::trim(TrimPlan::new(0.2, 0.0)), 7.7)
            .unwrap();
        assert!((entry.duration_after - 7.5).abs() < 1e-9);

        assert!((ledger.cumulative_lead_trim() - 1.1).abs() < 1e-9);
        assert!((ledger.cumulative_tail_trim() - 1.4).abs() < 1e-9);
        assert_eq!(ledger.passes().len(), 2);
    }

    #[test]
    fn test_noop_pass_is_recorded_without_changing_totals() {
        let mut ledger = TrimLedger::new();
        ledger
            .record(1, &TrimDecision::trim(TrimPlan::new(0.9, 0.0)), 10.0)
            .unwrap();

        let entry = ledger
            .record(2, &TrimDecision::keep(TrimOutcome::NothingToTrim), 9.1)
            .unwrap();
        assert!(entry.is_noop());
        assert_eq!(entry.duration_after, 9.1);

        assert_eq!(ledger.cumulative_lead_trim(), 0.9);
        assert_eq!(ledger.cumulative_tail_trim(), 0.0);
        assert!(ledger.has_pass(2));
    }

    #[test]
    fn test_pass_recorded_once() {
        let mut ledger = TrimLedger::new();
        let decision = TrimDecision::trim(TrimPlan::new(0.5, 0.5));
        ledger.record(1, &decision, 10.0).unwrap();

        assert_eq!(
            ledger.record(1, &decision, 9.0).unwrap_err(),
            ModelError::PassAlreadyRecorded(1)
        );
        assert!((ledger.cumulative_total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_trim_past_duration() {
        let mut ledger = TrimLedger::new();
        let result = ledger.record(1, &TrimDecision::trim(TrimPlan::new(1.0, 1.0)), 2.0);
        assert!(matches!(result, Err(ModelError::InvalidTrim { .. })));
        assert!(ledger.passes().is_empty());

        let result = ledger.record(1, &TrimDecision::keep(TrimOutcome::Untouched), 0.0);
        assert!(matches!(result, Err(ModelError::InvalidDuration(_))));
    }

    #[test]
    fn test_veto_count() {
        let mut ledger = TrimLedger::new();
        ledger
            .record(1, &TrimDecision::keep(TrimOutcome::SafetyVetoApplied), 2.0)
            .unwrap();
        ledger
            .record(2, &TrimDecision::keep(TrimOutcome::NothingToTrim), 2.0)
            .unwrap();
        assert_eq!(ledger.veto_count(), 1);
    }
}
