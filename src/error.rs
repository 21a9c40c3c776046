//! Error types for the appraisal engine and its project store
//!
//! Leaf calculations (NPV, IRR, B/C, payback) report "no solution" through
//! `Option` and sentinel values. `AppraisalError` is reserved for invalid
//! inputs, store lookups and faults caught at the orchestrator boundary.

use thiserror::Error;

use crate::project::{LineItemId, ProjectId};

/// Main error type for appraisal operations
#[derive(Error, Debug)]
pub enum AppraisalError {
    /// Discount or trial rate at or below -1 (or not finite)
    #[error("Invalid rate {rate}: rate must be finite and greater than -1")]
    InvalidRate { rate: f64 },

    /// Engine configuration that cannot produce a meaningful result
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected numeric fault during a full evaluation
    #[error("Arithmetic fault in {stage}: {detail}")]
    ArithmeticFault {
        stage: &'static str,
        detail: String,
    },

    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("{kind} not found: {id}")]
    LineItemNotFound {
        kind: &'static str,
        id: LineItemId,
    },

    /// Field-level validation performed by the store before records are accepted
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
