//! Content segments on the source timeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::interval::Interval;

/// One slide's span of the source recording.
///
/// Segments are created once per source item and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// 1-based position in the source timeline.
    pub index: u32,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
}

impl Segment {
    /// Create a segment, validating the index and the span.
    pub fn new(index: u32, start: f64, end: f64) -> ModelResult<Self> {
        if index == 0 {
            return Err(ModelError::malformed("segment index must be positive"));
        }
        // Reuse interval validation for the span itself.
        Interval::new(start, end)?;
        Ok(Self { index, start, end })
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// The segment's span as an interval.
    pub fn as_interval(&self) -> ModelResult<Interval> {
        Interval::new(self.start, self.end)
    }
}
