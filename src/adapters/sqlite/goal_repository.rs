//! SQLite implementation of the GoalRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Goal;
use crate::domain::ports::GoalRepository;

#[derive(Clone)]
pub struct SqliteGoalRepository {
    pool: SqlitePool,
}

impl SqliteGoalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GoalRepository for SqliteGoalRepository {
    async fn save(&self, goal: &Goal) -> DomainResult<()> {
        let record = serde_json::to_string(goal)?;

        sqlx::query(
            r#"INSERT INTO goals (id, title, priority, record, created_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   title = excluded.title,
                   priority = excluded.priority,
                   record = excluded.record"#,
        )
        .bind(goal.id.to_string())
        .bind(&goal.title)
        .bind(goal.priority.as_str())
        .bind(&record)
        .bind(goal.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Goal>> {
        let row: Option<GoalRow> = sqlx::query_as("SELECT id, record FROM goals WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Goal>> {
        let rows: Vec<GoalRow> =
            sqlx::query_as("SELECT id, record FROM goals ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }
}

#[derive(sqlx::FromRow)]
struct GoalRow {
    id: String,
    record: String,
}

impl TryFrom<GoalRow> for Goal {
    type Error = DomainError;

    fn try_from(row: GoalRow) -> Result<Self, Self::Error> {
        let goal: Goal = serde_json::from_str(&row.record)?;
        if goal.id.to_string() != row.id {
            return Err(DomainError::SerializationError(format!(
                "goal row {} holds record for {}",
                row.id, goal.id
            )));
        }
        Ok(goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::{GoalPriority, GoalSpec, SuccessCriteria, TestSpec};

    async fn setup() -> SqliteGoalRepository {
        SqliteGoalRepository::new(create_migrated_test_pool().await.unwrap())
    }

    fn goal(title: &str) -> Goal {
        let criteria = SuccessCriteria {
            min_quality_score: 80.0,
            max_lint_errors: 2,
            max_type_errors: 0,
            max_security_issues: 0,
            min_test_coverage: 70.0,
            min_tests_passed: 3,
        };
        GoalSpec::new(title, criteria)
            .with_priority(GoalPriority::High)
            .with_test_spec(TestSpec::new("t1", "parses", "src/lib.rs", "accepts input"))
            .into_goal()
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let repo = setup().await;
        let goal = goal("Persisted");
        repo.save(&goal).await.unwrap();

        assert_eq!(repo.get(goal.id).await.unwrap(), Some(goal));
        assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let repo = setup().await;
        let goal = goal("Twice");
        repo.save(&goal).await.unwrap();
        repo.save(&goal).await.unwrap();

        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_record_is_an_error() {
        let pool = create_migrated_test_pool().await.unwrap();
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO goals (id, title, priority, record, created_at) VALUES (?, 'x', 'medium', '{not json', '2024-01-01T00:00:00Z')")
            .bind(id.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let repo = SqliteGoalRepository::new(pool);
        assert!(matches!(repo.get(id).await, Err(DomainError::SerializationError(_))));
    }
}
