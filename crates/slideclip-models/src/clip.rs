//! Clip records and their lifecycle stage.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::ledger::{PassEntry, TrimLedger};
use crate::segment::Segment;
use crate::trim::TrimDecision;

/// Lifecycle stage of a clip.
///
/// `Extracted → Converted → Trimmed{1} → Trimmed{2} → Final`. Stages only
/// move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClipStage {
    /// Image and raw audio have been extracted from the source.
    #[default]
    Extracted,
    /// Audio has been converted to the delivery format.
    Converted,
    /// A trim pass has been recorded.
    Trimmed { pass: u8 },
    /// All passes are done.
    Final,
}

impl ClipStage {
    fn rank(&self) -> u16 {
        match self {
            ClipStage::Extracted => 0,
            ClipStage::Converted => 1,
            ClipStage::Trimmed { pass } => 1 + u16::from(*pass),
            ClipStage::Final => u16::MAX,
        }
    }

    /// Whether this stage is at or past `other`.
    pub fn has_reached(&self, other: ClipStage) -> bool {
        self.rank() >= other.rank()
    }

    pub fn as_str(&self) -> String {
        match self {
            ClipStage::Extracted => "extracted".to_string(),
            ClipStage::Converted => "converted".to_string(),
            ClipStage::Trimmed { pass } => format!("trimmed(pass={})", pass),
            ClipStage::Final => "final".to_string(),
        }
    }
}

impl std::fmt::Display for ClipStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// One (image, audio clip) pair and its trim history.
///
/// Field names follow the manifest consumed by the player page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipRecord {
    /// Section index, unique and stable across passes.
    pub section: u32,
    /// Segment start on the original timeline.
    pub start_time: f64,
    /// Segment end on the original timeline.
    pub end_time: f64,
    /// Current audio duration in seconds.
    pub duration: f64,
    /// Audio duration right after extraction.
    pub original_duration: f64,
    /// Image file name, relative to the output directory.
    pub image: String,
    /// Audio file name, relative to the output directory.
    pub audio: String,
    /// Cumulative trims and per-pass history.
    #[serde(flatten)]
    pub ledger: TrimLedger,
    /// Lifecycle stage.
    #[serde(default)]
    pub stage: ClipStage,
    /// Last failure, if the most recent step for this clip failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl ClipRecord {
    /// Create the record for a freshly extracted segment.
    pub fn extracted(
        segment: &Segment,
        image: impl Into<String>,
        audio: impl Into<String>,
        original_duration: f64,
    ) -> ModelResult<Self> {
        if !original_duration.is_finite() || original_duration <= 0.0 {
            return Err(ModelError::InvalidDuration(original_duration));
        }
        Ok(Self {
            section: segment.index,
            start_time: segment.start,
            end_time: segment.end,
            duration: original_duration,
            original_duration,
            image: image.into(),
            audio: audio.into(),
            ledger: TrimLedger::new(),
            stage: ClipStage::Extracted,
            failure: None,
        })
    }

    /// Apply a trim decision as `pass`, shrinking the current duration.
    ///
    /// `measured_duration` is the duration the planner saw; it replaces the
    /// stored duration before the trim is subtracted, so the record tracks
    /// the actual media rather than accumulated rounding.
    pub fn apply_trim(
        &mut self,
        pass: u8,
        decision: &TrimDecision,
        measured_duration: f64,
    ) -> ModelResult<PassEntry> {
        let entry = self.ledger.record(pass, decision, measured_duration)?.clone();
        // Never let a re-probe grow the clip.
        self.duration = entry.duration_after.min(self.duration);
        Ok(entry)
    }

    /// Move to a later stage.
    pub fn advance(&mut self, next: ClipStage) -> ModelResult<()> {
        if self.stage.has_reached(next) {
            return Err(ModelError::StageRegression {
                from: self.stage.to_string(),
                to: next.to_string(),
            });
        }
        self.stage = next;
        self.failure = None;
        Ok(())
    }

    /// Record a failure without changing the stage.
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
    }

    /// Whether all passes are done.
    pub fn is_final(&self) -> bool {
        self.stage == ClipStage::Final
    }

    /// Cumulative seconds removed from the start.
    pub fn trim_start(&self) -> f64 {
        self.ledger.cumulative_lead_trim()
    }

    /// Cumulative seconds removed from the end.
    pub fn trim_end(&self) -> f64 {
        self.ledger.cumulative_tail_trim()
    }
}
