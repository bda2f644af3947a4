//! Error types for the money-coach pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {

    // =============================
    // Core Pipeline Errors
    // =============================

    /// Transport-level failure of the optional model adapter. Always
    /// recovered by the deterministic fallback path.
    #[error("Model adapter error: {0}")]
    ModelAdapter(String),

    /// The model responded but its output failed schema or invariant
    /// validation. Always recovered by the deterministic fallback path.
    #[error("Model response rejected: {0}")]
    ModelRejected(String),

    /// A deterministic-path invariant was broken. This signals a defect
    /// and is never converted into a degraded answer.
    #[error("Guardrail violation: {0}")]
    GuardrailViolation(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
