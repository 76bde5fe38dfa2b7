//! Goal repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Goal;

/// Repository interface for Goal persistence.
///
/// One durable record per goal, keyed by id. Goals are immutable, so `save`
/// is an upsert that in practice only ever inserts.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Persist or upsert a goal.
    async fn save(&self, goal: &Goal) -> DomainResult<()>;

    /// Get a goal by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Goal>>;

    /// List all goals, newest first.
    async fn list(&self) -> DomainResult<Vec<Goal>>;
}
