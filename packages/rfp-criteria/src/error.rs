//! Typed errors for the criteria pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Callers get distinct
//! variants for "not found", "processing failed" and "feature unavailable
//! due to configuration".

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in the criteria pipeline.
#[derive(Debug, Error)]
pub enum CriteriaError {
    /// A backend this operation needs is not configured
    #[error("{service} not available: {reason}")]
    Unavailable {
        service: &'static str,
        reason: String,
    },

    /// AI or research call failed, or returned malformed output
    #[error("upstream error: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An external call exceeded its time limit
    #[error("{operation} timed out after {limit:?}")]
    Timeout {
        operation: &'static str,
        limit: Duration,
    },

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Document exists but has no extracted text yet
    #[error("document {document_id} has no content")]
    NoContent { document_id: Uuid },

    /// Criterion data violates an invariant
    #[error("invalid criterion: {reason}")]
    InvalidCriterion { reason: String },

    /// Categorization did not assign every text exactly once
    #[error("incomplete categorization: {reason}")]
    IncompleteCategorization { reason: String },

    /// Every extraction path failed
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl CriteriaError {
    /// Wrap any upstream failure.
    pub fn upstream(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Upstream(err.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn unavailable(service: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            service,
            reason: reason.into(),
        }
    }

    /// Whether this error means "not configured" rather than "failed".
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Result type alias for criteria operations.
pub type Result<T> = std::result::Result<T, CriteriaError>;
