//! Goal store: validates, registers and serves immutable goals.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Goal, GoalSpec};
use crate::domain::ports::GoalRepository;
use crate::services::snapshot_writer::SnapshotWriter;

pub struct GoalService<R: GoalRepository + ?Sized> {
    repository: Arc<R>,
    goals: RwLock<HashMap<Uuid, Goal>>,
    writer: SnapshotWriter,
}

impl<R: GoalRepository + ?Sized> GoalService<R> {
    pub fn new(repository: Arc<R>, writer: SnapshotWriter) -> Self {
        Self {
            repository,
            goals: RwLock::new(HashMap::new()),
            writer,
        }
    }

    /// Validate a goal specification and register it under a fresh id.
    ///
    /// Persistence is queued and never fails the call; a rejected spec leaves
    /// no trace.
    pub async fn create_goal(&self, spec: GoalSpec) -> DomainResult<Goal> {
        let goal = spec.into_goal()?;

        self.goals.write().await.insert(goal.id, goal.clone());
        self.writer.save_goal(&goal);

        tracing::info!(
            goal_id = %goal.id,
            title = %goal.title,
            test_specs = goal.test_specs.len(),
            "Goal created"
        );
        Ok(goal)
    }

    /// Get a goal by ID, falling back to durable storage on a cache miss.
    pub async fn get_goal(&self, id: Uuid) -> DomainResult<Goal> {
        if let Some(goal) = self.goals.read().await.get(&id) {
            return Ok(goal.clone());
        }

        match self.repository.get(id).await {
            Ok(Some(goal)) => {
                let mut goals = self.goals.write().await;
                Ok(goals.entry(id).or_insert(goal).clone())
            }
            Ok(None) => Err(DomainError::GoalNotFound(id)),
            Err(e) => {
                tracing::warn!(goal_id = %id, error = %e, "Failed to load goal from storage");
                Err(DomainError::GoalNotFound(id))
            }
        }
    }

    /// List every known goal, newest first.
    ///
    /// Goals only in durable storage are included; a storage failure degrades
    /// to the in-memory view.
    pub async fn list_goals(&self) -> DomainResult<Vec<Goal>> {
        let mut by_id: HashMap<Uuid, Goal> = match self.repository.list().await {
            Ok(stored) => stored.into_iter().map(|g| (g.id, g)).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list goals from storage");
                HashMap::new()
            }
        };
        for (id, goal) in self.goals.read().await.iter() {
            by_id.insert(*id, goal.clone());
        }

        let mut goals: Vec<Goal> = by_id.into_values().collect();
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(goals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryGoalRepository, InMemoryLoopRepository};
    use crate::domain::models::{SuccessCriteria, TestSpec};

    fn setup_service() -> (GoalService<InMemoryGoalRepository>, Arc<InMemoryGoalRepository>, SnapshotWriter) {
        let repo = Arc::new(InMemoryGoalRepository::new());
        let writer = SnapshotWriter::spawn(repo.clone(), Arc::new(InMemoryLoopRepository::new()));
        (GoalService::new(repo.clone(), writer.clone()), repo, writer)
    }

    fn criteria() -> SuccessCriteria {
        SuccessCriteria {
            min_quality_score: 85.0,
            max_lint_errors: 0,
            max_type_errors: 0,
            max_security_issues: 0,
            min_test_coverage: 80.0,
            min_tests_passed: 6,
        }
    }

    #[tokio::test]
    async fn test_create_goal() {
        let (service, repo, writer) = setup_service();
        let goal = service
            .create_goal(GoalSpec::new("Harden parser", criteria()))
            .await
            .unwrap();

        assert_eq!(goal.title, "Harden parser");
        assert_eq!(service.get_goal(goal.id).await.unwrap(), goal);

        writer.flush().await;
        assert_eq!(repo.get(goal.id).await.unwrap(), Some(goal));
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (service, _, _) = setup_service();
        let a = service.create_goal(GoalSpec::new("A", criteria())).await.unwrap();
        let b = service.create_goal(GoalSpec::new("A", criteria())).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(service.list_goals().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_goal_is_not_stored() {
        let (service, _, _) = setup_service();
        let mut spec = GoalSpec::new("Bad deps", criteria());
        spec.test_specs = vec![
            TestSpec::new("t1", "first", "src/parser.rs", "parses").depends_on("t2"),
            TestSpec::new("t2", "second", "src/parser.rs", "rejects garbage"),
        ];

        let err = service.create_goal(spec).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(service.list_goals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_goal() {
        let (service, _, _) = setup_service();
        let id = Uuid::new_v4();
        assert!(matches!(
            service.get_goal(id).await,
            Err(DomainError::GoalNotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_get_goal_falls_back_to_storage() {
        let (service, repo, _) = setup_service();
        let stored = GoalSpec::new("Stored", criteria()).into_goal().unwrap();
        repo.save(&stored).await.unwrap();

        assert_eq!(service.get_goal(stored.id).await.unwrap(), stored);
        assert_eq!(service.list_goals().await.unwrap(), vec![stored]);
    }
}
