//! SQLite implementation of the LoopRepository.
//!
//! A loop is stored as a single row whose `record` column holds the whole
//! serialized snapshot; the other columns exist for filtering and are kept in
//! sync by the same upsert, so a row is always replaced atomically.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::FeedbackLoop;
use crate::domain::ports::LoopRepository;

const SELECT_LOOP: &str = "SELECT id, record FROM feedback_loops";

#[derive(Clone)]
pub struct SqliteLoopRepository {
    pool: SqlitePool,
}

impl SqliteLoopRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoopRepository for SqliteLoopRepository {
    async fn save(&self, feedback_loop: &FeedbackLoop) -> DomainResult<()> {
        let record = serde_json::to_string(feedback_loop)?;

        sqlx::query(
            r#"INSERT INTO feedback_loops (id, goal_id, status, iteration, record, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   status = excluded.status,
                   iteration = excluded.iteration,
                   record = excluded.record,
                   updated_at = excluded.updated_at"#,
        )
        .bind(feedback_loop.id.to_string())
        .bind(feedback_loop.goal_id.to_string())
        .bind(feedback_loop.status.as_str())
        .bind(i64::from(feedback_loop.iteration))
        .bind(&record)
        .bind(feedback_loop.created_at.to_rfc3339())
        .bind(feedback_loop.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<FeedbackLoop>> {
        let row: Option<LoopRow> = sqlx::query_as(&format!("{SELECT_LOOP} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<FeedbackLoop>> {
        let rows: Vec<LoopRow> = sqlx::query_as(&format!("{SELECT_LOOP} ORDER BY created_at DESC"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list_by_goal(&self, goal_id: Uuid) -> DomainResult<Vec<FeedbackLoop>> {
        let rows: Vec<LoopRow> = sqlx::query_as(&format!(
            "{SELECT_LOOP} WHERE goal_id = ? ORDER BY created_at DESC"
        ))
        .bind(goal_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }
}

#[derive(sqlx::FromRow)]
struct LoopRow {
    id: String,
    record: String,
}

impl TryFrom<LoopRow> for FeedbackLoop {
    type Error = DomainError;

    fn try_from(row: LoopRow) -> Result<Self, Self::Error> {
        let feedback_loop: FeedbackLoop = serde_json::from_str(&row.record)?;
        if feedback_loop.id.to_string() != row.id {
            return Err(DomainError::SerializationError(format!(
                "loop row {} holds record for {}",
                row.id, feedback_loop.id
            )));
        }
        Ok(feedback_loop)
    }
}
