//! Feedback loop repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::FeedbackLoop;

/// Repository interface for FeedbackLoop persistence.
///
/// Each loop is stored as one whole record (history and convergence
/// metrics included). Implementations must replace the record atomically so
/// a crash leaves the last fully written snapshot, never a partial one.
#[async_trait]
pub trait LoopRepository: Send + Sync {
    /// Persist or upsert a loop snapshot.
    ///
    /// If a loop with the same ID already exists, it is replaced.
    async fn save(&self, feedback_loop: &FeedbackLoop) -> DomainResult<()>;

    /// Load a loop by its ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<FeedbackLoop>>;

    /// List all loops, newest first.
    async fn list(&self) -> DomainResult<Vec<FeedbackLoop>>;

    /// List the loops started for one goal, newest first.
    async fn list_by_goal(&self, goal_id: Uuid) -> DomainResult<Vec<FeedbackLoop>>;
}
