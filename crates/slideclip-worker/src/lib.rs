//! Slide recording pipeline.
//!
//! This crate provides:
//! - The orchestrator driving extraction and both trim passes
//! - Manifest persistence with atomic checkpoints
//! - Static player page generation
//! - Configuration, structured clip logging, and metrics

pub mod config;
pub mod error;
pub mod logging;
pub mod manifest_store;
pub mod metrics;
pub mod orchestrator;
pub mod player;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::ClipLogger;
pub use manifest_store::ManifestStore;
pub use orchestrator::{Orchestrator, PassSummary, RunSummary, TrimPass};
