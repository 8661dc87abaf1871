//! Edge silence trimming.
//!
//! Each pass detects silence on a clip's current audio, plans how much
//! leading and trailing silence to remove, and re-encodes the kept range.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ silencedetect│───►│ plan_trim    │───►│ apply_trim   │
//! │ (intervals)  │    │ (lead, tail) │    │ (temp+rename)│
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! The planner never trims into speech: it only removes silence touching
//! the edges of the clip, keeps a little padding, caps each trim at a
//! fraction of the clip, and declines entirely when too little would remain.
//!
//! # Usage
//!
//! ```rust
//! use slideclip_media::silence_trim::{plan_trim, TrimPolicy};
//! use slideclip_models::{Interval, TrimOutcome};
//!
//! let silences = vec![Interval::new(0.0, 1.0).unwrap(), Interval::new(8.5, 10.0).unwrap()];
//! let decision = plan_trim(&silences, 10.0, &TrimPolicy::conversion()).unwrap();
//! assert_eq!(decision.outcome, TrimOutcome::Trimmed);
//! assert!((decision.plan.kept_duration(10.0) - 7.7).abs() < 1e-9);
//! ```

mod analyze;
mod apply;
mod config;
mod planner;

pub use analyze::{analyze_clip, ClipAnalysis};
pub use apply::{apply_trim, should_transcode};
pub use config::{TrimPolicies, TrimPolicy};
pub use planner::plan_trim;
