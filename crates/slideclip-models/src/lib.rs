//! Shared data models for the SlideClip pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Timeline intervals and content segments
//! - Trim plans and planner outcomes
//! - The cumulative trim ledger kept per clip
//! - Clip records, their lifecycle stage, and the manifest
//! - Regions of interest used for scene detection

pub mod clip;
pub mod error;
pub mod interval;
pub mod ledger;
pub mod manifest;
pub mod rect;
pub mod segment;
pub mod timestamp;
pub mod trim;

// Re-export common types
pub use clip::{ClipRecord, ClipStage};
pub use error::{ModelError, ModelResult};
pub use interval::{Interval, IntervalEnd};
pub use ledger::{PassEntry, TrimLedger};
pub use manifest::Manifest;
pub use rect::RegionOfInterest;
pub use segment::Segment;
pub use trim::{TrimDecision, TrimOutcome, TrimPlan};
