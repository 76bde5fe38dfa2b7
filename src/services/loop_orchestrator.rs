//! Loop orchestrator: owns feedback loops and drives their state machine.
//!
//! Each loop lives behind its own mutex, so iterations on one loop are
//! strictly serialized while distinct loops proceed in parallel. The loop
//! table lock is only held long enough to look up or insert a handle.
//!
//! An iteration either lands completely (score history, iteration record,
//! counter and status all updated together) or not at all: validation and
//! scoring happen before the first mutation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    record_score, ActualMetrics, ConsumptionReport, FeedbackLoop, Iteration, LoopConfig,
    LoopStatus,
};
use crate::domain::ports::{GoalRepository, LoopRepository};
use crate::services::consumption_validator::ConsumptionValidator;
use crate::services::feedback::build_feedback;
use crate::services::goal_service::GoalService;
use crate::services::snapshot_writer::SnapshotWriter;

type LoopHandle = Arc<Mutex<FeedbackLoop>>;

pub struct LoopOrchestrator<G: GoalRepository + ?Sized, L: LoopRepository + ?Sized> {
    goals: Arc<GoalService<G>>,
    repository: Arc<L>,
    validator: ConsumptionValidator,
    config: LoopConfig,
    loops: RwLock<HashMap<Uuid, LoopHandle>>,
    writer: SnapshotWriter,
}

impl<G, L> LoopOrchestrator<G, L>
where
    G: GoalRepository + ?Sized,
    L: LoopRepository + ?Sized,
{
    /// Build an orchestrator. A zero iteration cap or convergence window is
    /// raised to 1, so a freshly started loop can always take an iteration.
    pub fn new(
        goals: Arc<GoalService<G>>,
        repository: Arc<L>,
        validator: ConsumptionValidator,
        mut config: LoopConfig,
        writer: SnapshotWriter,
    ) -> Self {
        if config.max_iterations == 0 || config.min_iterations_before_convergence == 0 {
            warn!(
                max_iterations = config.max_iterations,
                min_iterations_before_convergence = config.min_iterations_before_convergence,
                "Loop limits below 1 raised to 1"
            );
            config.max_iterations = config.max_iterations.max(1);
            config.min_iterations_before_convergence =
                config.min_iterations_before_convergence.max(1);
        }
        Self {
            goals,
            repository,
            validator,
            config,
            loops: RwLock::new(HashMap::new()),
            writer,
        }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Start a new loop for an existing goal. The loop is returned running.
    #[instrument(skip(self), fields(goal_id = %goal_id))]
    pub async fn start_loop(&self, goal_id: Uuid) -> DomainResult<FeedbackLoop> {
        self.goals.get_goal(goal_id).await?;

        let mut feedback_loop = FeedbackLoop::new(goal_id, self.config.max_iterations);
        feedback_loop
            .transition_to(LoopStatus::Running)
            .map_err(DomainError::InvariantViolation)?;

        self.loops
            .write()
            .await
            .insert(feedback_loop.id, Arc::new(Mutex::new(feedback_loop.clone())));
        self.writer.save_loop(&feedback_loop);

        info!(
            loop_id = %feedback_loop.id,
            max_iterations = feedback_loop.max_iterations,
            "Feedback loop started"
        );
        Ok(feedback_loop)
    }

    /// Score one reported attempt and advance the loop.
    ///
    /// Terminal loops reject the call with [`DomainError::InvalidState`] and
    /// are left untouched; malformed metrics fail with a validation error
    /// before anything is recorded.
    #[instrument(skip(self, session_id, metrics), fields(loop_id = %loop_id))]
    pub async fn execute_iteration(
        &self,
        loop_id: Uuid,
        session_id: impl Into<String>,
        metrics: ActualMetrics,
    ) -> DomainResult<Iteration> {
        let handle = self.handle(loop_id).await?;
        let mut feedback_loop = handle.lock().await;

        if feedback_loop.status != LoopStatus::Running {
            return Err(DomainError::InvalidState {
                loop_id,
                status: feedback_loop.status,
            });
        }

        if let Err(reason) = feedback_loop.check_invariants() {
            return Err(self.fail_loop(&mut feedback_loop, reason));
        }
        if feedback_loop.iteration >= feedback_loop.max_iterations {
            let reason = format!(
                "running loop already has {} of {} iterations",
                feedback_loop.iteration, feedback_loop.max_iterations
            );
            return Err(self.fail_loop(&mut feedback_loop, reason));
        }

        let goal = self.goals.get_goal(feedback_loop.goal_id).await?;
        let report = self.validator.score(&goal, &metrics)?;

        let window = self.config.min_iterations_before_convergence as usize;
        let improvement = record_score(
            &mut feedback_loop.convergence_metrics,
            report.overall_score,
            window,
            self.config.convergence_threshold,
        );
        feedback_loop.iteration += 1;

        let feedback = self.config.auto_refinement_enabled.then(|| {
            build_feedback(
                &report,
                improvement,
                feedback_loop.iteration,
                feedback_loop.max_iterations,
            )
        });
        let next_status = Self::next_status(&feedback_loop, &report);

        let iteration = Iteration {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            consumption_report: report,
            score_improvement: improvement,
            feedback,
        };
        feedback_loop.iterations.push(iteration.clone());
        feedback_loop.updated_at = iteration.timestamp;

        if next_status != LoopStatus::Running {
            feedback_loop
                .transition_to(next_status)
                .map_err(DomainError::InvariantViolation)?;
        }

        info!(
            iteration = feedback_loop.iteration,
            score = iteration.consumption_report.overall_score,
            improvement,
            gaps = iteration.consumption_report.gaps.len(),
            status = %feedback_loop.status,
            "Iteration recorded"
        );
        self.writer.save_loop(&feedback_loop);

        Ok(iteration)
    }

    /// Snapshot of a loop's current state.
    pub async fn get_loop(&self, loop_id: Uuid) -> DomainResult<FeedbackLoop> {
        let handle = self.handle(loop_id).await?;
        let feedback_loop = handle.lock().await;
        Ok(feedback_loop.clone())
    }

    /// Cancel a loop. Stopping a loop that already finished is a no-op.
    #[instrument(skip(self, reason), fields(loop_id = %loop_id))]
    pub async fn stop_loop(
        &self,
        loop_id: Uuid,
        reason: impl Into<String>,
    ) -> DomainResult<FeedbackLoop> {
        let handle = self.handle(loop_id).await?;
        let mut feedback_loop = handle.lock().await;

        if feedback_loop.is_terminal() {
            debug!(status = %feedback_loop.status, "Loop already terminal; stop ignored");
            return Ok(feedback_loop.clone());
        }

        feedback_loop
            .transition_to(LoopStatus::Cancelled)
            .map_err(DomainError::InvariantViolation)?;
        let reason = reason.into();
        info!(reason = %reason, iteration = feedback_loop.iteration, "Feedback loop stopped");
        feedback_loop.stop_reason = Some(reason);
        self.writer.save_loop(&feedback_loop);

        Ok(feedback_loop.clone())
    }

    /// List loops, optionally only those for one goal, newest first.
    pub async fn list_loops(&self, goal_id: Option<Uuid>) -> DomainResult<Vec<FeedbackLoop>> {
        let stored = match goal_id {
            Some(goal_id) => self.repository.list_by_goal(goal_id).await,
            None => self.repository.list().await,
        };
        let mut by_id: HashMap<Uuid, FeedbackLoop> = match stored {
            Ok(stored) => stored.into_iter().map(|l| (l.id, l)).collect(),
            Err(e) => {
                warn!(error = %e, "Failed to list loops from storage");
                HashMap::new()
            }
        };

        let handles: Vec<LoopHandle> = self.loops.read().await.values().cloned().collect();
        for handle in handles {
            let feedback_loop = handle.lock().await;
            if goal_id.map_or(true, |g| feedback_loop.goal_id == g) {
                by_id.insert(feedback_loop.id, feedback_loop.clone());
            }
        }

        let mut loops: Vec<FeedbackLoop> = by_id.into_values().collect();
        loops.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(loops)
    }

    /// Wait for queued snapshots to be written. Returns the number parked after failures.
    pub async fn flush(&self) -> usize {
        self.writer.flush().await
    }

    /// Termination precedence: goal achieved, then cap reached, then plateau.
    ///
    /// The convergence window is enforced by `is_converging` itself.
    fn next_status(feedback_loop: &FeedbackLoop, report: &ConsumptionReport) -> LoopStatus {
        if report.goal_achieved {
            LoopStatus::GoalAchieved
        } else if feedback_loop.iteration >= feedback_loop.max_iterations {
            LoopStatus::MaxIterationsReached
        } else if feedback_loop.convergence_metrics.is_converging {
            LoopStatus::Converged
        } else {
            LoopStatus::Running
        }
    }

    fn fail_loop(&self, feedback_loop: &mut FeedbackLoop, reason: String) -> DomainError {
        error!(loop_id = %feedback_loop.id, reason = %reason, "Loop invariant violated; marking failed");
        feedback_loop.fail(reason.clone());
        self.writer.save_loop(feedback_loop);
        DomainError::InvariantViolation(reason)
    }

    /// Find the loop in memory, loading it from durable storage on a miss.
    async fn handle(&self, loop_id: Uuid) -> DomainResult<LoopHandle> {
        if let Some(handle) = self.loops.read().await.get(&loop_id) {
            return Ok(handle.clone());
        }

        let loaded = match self.repository.get(loop_id).await {
            Ok(Some(feedback_loop)) => feedback_loop,
            Ok(None) => return Err(DomainError::LoopNotFound(loop_id)),
            Err(e) => {
                warn!(loop_id = %loop_id, error = %e, "Failed to load loop from storage");
                return Err(DomainError::LoopNotFound(loop_id));
            }
        };

        let mut loops = self.loops.write().await;
        if let Some(handle) = loops.get(&loop_id) {
            return Ok(handle.clone());
        }
        let handle = Arc::new(Mutex::new(self.recover(loaded)));
        loops.insert(loop_id, handle.clone());
        Ok(handle)
    }

    /// Loops with inconsistent history are marked failed instead of resumed.
    fn recover(&self, mut feedback_loop: FeedbackLoop) -> FeedbackLoop {
        if let Err(reason) = feedback_loop.check_invariants() {
            if feedback_loop.is_terminal() {
                warn!(
                    loop_id = %feedback_loop.id,
                    status = %feedback_loop.status,
                    reason = %reason,
                    "Loaded terminal loop has inconsistent history"
                );
            } else {
                self.fail_loop(&mut feedback_loop, format!("corrupted on load: {reason}"));
            }
        } else {
            debug!(loop_id = %feedback_loop.id, status = %feedback_loop.status, "Loop loaded from storage");
        }
        feedback_loop
    }
}
