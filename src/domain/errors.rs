//! Domain errors for the kaizen control loop.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::LoopStatus;

/// A malformed goal specification or metrics snapshot.
///
/// Always names the offending field so the caller can correct it and retry.
/// Nothing is mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// Dotted path of the field that failed validation (e.g. `success_criteria.min_test_coverage`).
    pub field: String,
    /// Human-readable explanation.
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "is required")
    }

    pub fn negative(field: impl Into<String>) -> Self {
        Self::new(field, "must not be negative")
    }
}

/// Domain-level errors that can occur in the kaizen system.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Goal not found: {0}")]
    GoalNotFound(Uuid),

    #[error("Feedback loop not found: {0}")]
    LoopNotFound(Uuid),

    #[error("Feedback loop {loop_id} is {status} and accepts no further iterations")]
    InvalidState { loop_id: Uuid, status: LoopStatus },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Errors the caller caused and can fix by changing its input.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::GoalNotFound(_)
                | Self::LoopNotFound(_)
                | Self::InvalidState { .. }
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
