//! Process-wide wiring of the goal store and loop orchestrator.
//!
//! Built once at start-up and shared by handle; there is no global state.

use std::sync::Arc;

use crate::adapters::memory::{InMemoryGoalRepository, InMemoryLoopRepository};
use crate::adapters::sqlite::{
    initialize_database, DatabaseError, SqliteGoalRepository, SqliteLoopRepository,
};
use crate::domain::models::{Config, PersistenceBackend};
use crate::domain::ports::{GoalRepository, LoopRepository};
use crate::services::{ConsumptionValidator, GoalService, LoopOrchestrator, SnapshotWriter};

pub type DynGoalService = GoalService<dyn GoalRepository>;
pub type DynLoopOrchestrator = LoopOrchestrator<dyn GoalRepository, dyn LoopRepository>;

/// The goal store and loop orchestrator over one pair of repositories.
pub struct Kaizen {
    goals: Arc<DynGoalService>,
    loops: Arc<DynLoopOrchestrator>,
}

impl Kaizen {
    /// Wire services over the given repositories. Must run inside a tokio runtime.
    pub fn new(
        goal_repository: Arc<dyn GoalRepository>,
        loop_repository: Arc<dyn LoopRepository>,
        config: &Config,
    ) -> Self {
        let writer = SnapshotWriter::spawn(goal_repository.clone(), loop_repository.clone());
        let goals = Arc::new(GoalService::new(goal_repository, writer.clone()));
        let loops = Arc::new(LoopOrchestrator::new(
            goals.clone(),
            loop_repository,
            ConsumptionValidator::new(config.scoring.clone()),
            config.loop_settings.clone(),
            writer,
        ));
        Self { goals, loops }
    }

    /// Services with no durable storage.
    pub fn in_memory(config: &Config) -> Self {
        Self::new(
            Arc::new(InMemoryGoalRepository::new()),
            Arc::new(InMemoryLoopRepository::new()),
            config,
        )
    }

    /// Services over the backend named in the configuration.
    pub async fn open(config: &Config) -> Result<Self, DatabaseError> {
        match config.persistence.backend {
            PersistenceBackend::Memory => Ok(Self::in_memory(config)),
            PersistenceBackend::Sqlite => {
                let pool = initialize_database(&config.persistence).await?;
                tracing::info!(path = %config.persistence.path, "Using SQLite persistence");
                Ok(Self::new(
                    Arc::new(SqliteGoalRepository::new(pool.clone())),
                    Arc::new(SqliteLoopRepository::new(pool)),
                    config,
                ))
            }
        }
    }

    pub fn goals(&self) -> &Arc<DynGoalService> {
        &self.goals
    }

    pub fn loops(&self) -> &Arc<DynLoopOrchestrator> {
        &self.loops
    }

    /// Drain queued snapshots. Returns how many remain unwritten.
    pub async fn flush(&self) -> usize {
        let parked = self.loops.flush().await;
        if parked > 0 {
            tracing::warn!(parked, "Some snapshots could not be persisted");
        }
        parked
    }
}
