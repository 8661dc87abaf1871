//! Timeline intervals.
//!
//! An [`Interval`] is a span of a single media item in seconds. Its end may be
//! [`IntervalEnd::Open`] when the analysis saw the span begin but never saw it
//! close, meaning it runs to the end of the media.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// End of an interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntervalEnd {
    /// Concrete end timestamp in seconds.
    At(f64),
    /// Extends to the end of the media.
    Open,
}

/// A validated `[start, end)` span in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInterval", into = "RawInterval")]
pub struct Interval {
    start: f64,
    end: IntervalEnd,
}

/// Wire form of an interval; a missing `end` means open-ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawInterval {
    start: f64,
    #[serde(default)]
    end: Option<f64>,
}

impl Interval {
    /// Create a closed interval.
    ///
    /// Fails with [`ModelError::MalformedInterval`] when either timestamp is
    /// negative or non-finite, or when `end < start`.
    pub fn new(start: f64, end: f64) -> ModelResult<Self> {
        validate_timestamp("start", start)?;
        validate_timestamp("end", end)?;
        if end < start {
            return Err(ModelError::malformed(format!(
                "end {:.3}s is before start {:.3}s",
                end, start
            )));
        }
        Ok(Self {
            start,
            end: IntervalEnd::At(end),
        })
    }

    /// Create an interval that extends to the end of the media.
    pub fn open(start: f64) -> ModelResult<Self> {
        validate_timestamp("start", start)?;
        Ok(Self {
            start,
            end: IntervalEnd::Open,
        })
    }

    /// Start timestamp in seconds.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End of the interval.
    pub fn end(&self) -> IntervalEnd {
        self.end
    }

    /// Concrete end timestamp, or `None` when open-ended.
    pub fn end_secs(&self) -> Option<f64> {
        match self.end {
            IntervalEnd::At(end) => Some(end),
            IntervalEnd::Open => None,
        }
    }

    /// Whether the interval runs to the end of the media.
    pub fn is_open(&self) -> bool {
        matches!(self.end, IntervalEnd::Open)
    }

    /// Duration in seconds; `None` until an open interval is resolved
    /// against a concrete total.
    pub fn duration(&self) -> Option<f64> {
        self.end_secs().map(|end| end - self.start)
    }

    /// Duration after resolving an open end against `total`.
    pub fn duration_within(&self, total: f64) -> f64 {
        let resolved = self.clamp_to_duration(total);
        resolved.end_secs().unwrap_or(resolved.start) - resolved.start
    }

    /// Resolve an open end to `total` and clamp both ends into `[0, total]`.
    ///
    /// The result is always closed.
    pub fn clamp_to_duration(&self, total: f64) -> Interval {
        let total = total.max(0.0);
        let start = self.start.min(total);
        let end = match self.end {
            IntervalEnd::At(end) => end.min(total),
            IntervalEnd::Open => total,
        };
        Interval {
            start,
            end: IntervalEnd::At(end.max(start)),
        }
    }

    /// Whether two intervals share any time. Open ends extend to infinity.
    pub fn overlaps(&self, other: &Interval) -> bool {
        let self_end = self.end_secs().unwrap_or(f64::INFINITY);
        let other_end = other.end_secs().unwrap_or(f64::INFINITY);
        self.start < other_end && other.start < self_end
    }

    /// Whether `t` falls inside `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && self.end_secs().map_or(true, |end| t < end)
    }
}

fn validate_timestamp(name: &str, value: f64) -> ModelResult<()> {
    if !value.is_finite() {
        return Err(ModelError::malformed(format!("{} is not finite", name)));
    }
    if value < 0.0 {
        return Err(ModelError::malformed(format!(
            "{} {:.3}s is negative",
            name, value
        )));
    }
    Ok(())
}

impl TryFrom<RawInterval> for Interval {
    type Error = ModelError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        match raw.end {
            Some(end) => Interval::new(raw.start, end),
            None => Interval::open(raw.start),
        }
    }
}

impl From<Interval> for RawInterval {
    fn from(interval: Interval) -> Self {
        RawInterval {
            start: interval.start,
            end: interval.end_secs(),
        }
    }
}
