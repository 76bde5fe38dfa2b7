use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::FeedbackLoop;
use crate::domain::ports::LoopRepository;

#[derive(Default)]
pub struct InMemoryLoopRepository {
    loops: RwLock<HashMap<Uuid, FeedbackLoop>>,
}

impl InMemoryLoopRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect(&self, keep: impl Fn(&FeedbackLoop) -> bool) -> Vec<FeedbackLoop> {
        let mut loops: Vec<FeedbackLoop> = self
            .loops
            .read()
            .await
            .values()
            .filter(|l| keep(l))
            .cloned()
            .collect();
        loops.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        loops
    }
}

#[async_trait]
impl LoopRepository for InMemoryLoopRepository {
    async fn save(&self, feedback_loop: &FeedbackLoop) -> DomainResult<()> {
        self.loops
            .write()
            .await
            .insert(feedback_loop.id, feedback_loop.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<FeedbackLoop>> {
        Ok(self.loops.read().await.get(&id).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<FeedbackLoop>> {
        Ok(self.collect(|_| true).await)
    }

    async fn list_by_goal(&self, goal_id: Uuid) -> DomainResult<Vec<FeedbackLoop>> {
        Ok(self.collect(|l| l.goal_id == goal_id).await)
    }
}
