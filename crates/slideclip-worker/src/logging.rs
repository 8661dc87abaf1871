//! Structured clip logging utilities.
//!
//! Provides consistent, structured logging for per-clip processing with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Generate an identifier for one pipeline invocation.
pub fn new_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Clip logger for structured logging with consistent formatting.
///
/// Every event carries the run ID, the section index and the pass, so the
/// interleaved output of parallel clips can be told apart.
#[derive(Debug, Clone)]
pub struct ClipLogger {
    run_id: String,
    section: u32,
    operation: String,
}

impl ClipLogger {
    /// Create a new clip logger.
    ///
    /// # Arguments
    /// * `run_id` - Identifier of the pipeline run
    /// * `section` - Section index of the clip
    /// * `operation` - The pass or step (e.g., "extract", "conversion", "cleanup")
    pub fn new(run_id: &str, section: u32, operation: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            section,
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            section = self.section,
            operation = %self.operation,
            "Clip started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            section = self.section,
            operation = %self.operation,
            "Clip progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            section = self.section,
            operation = %self.operation,
            "Clip warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            section = self.section,
            operation = %self.operation,
            "Clip failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            section = self.section,
            operation = %self.operation,
            "Clip completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn section(&self) -> u32 {
        self.section
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this clip.
    ///
    /// Events from the media layer emitted inside the span inherit its fields.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "clip",
            run_id = %self.run_id,
            section = self.section,
            operation = %self.operation
        )
    }
}
