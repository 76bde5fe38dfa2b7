use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Goal;
use crate::domain::ports::GoalRepository;

#[derive(Default)]
pub struct InMemoryGoalRepository {
    goals: RwLock<HashMap<Uuid, Goal>>,
}

impl InMemoryGoalRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GoalRepository for InMemoryGoalRepository {
    async fn save(&self, goal: &Goal) -> DomainResult<()> {
        self.goals.write().await.insert(goal.id, goal.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Goal>> {
        Ok(self.goals.read().await.get(&id).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<Goal>> {
        let mut goals: Vec<Goal> = self.goals.read().await.values().cloned().collect();
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(goals)
    }
}
