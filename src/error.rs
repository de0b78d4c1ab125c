//! Error types for the pipeline.

use thiserror::Error;

/// Pipeline error types.
///
/// End-of-stream is deliberately absent: record sources signal exhaustion
/// with `Ok(None)`, which is the sanctioned way a run completes, not a
/// failure.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A trace append was not index-aligned with the fixed schema.
    #[error("Trace shape mismatch: expected record {expected}, got {got}")]
    Shape { expected: u64, got: u64 },

    /// A collaborator (inference network or cluster engine) failed mid-step.
    ///
    /// Never retried. Per-step statistics are only meaningful if every prior
    /// step succeeded in order, so the run aborts immediately.
    #[error("Collaborator failure: {0}")]
    Collaborator(String),

    /// Invalid configuration, rejected at construction time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
