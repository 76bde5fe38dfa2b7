//! Feedback loop domain model.
//!
//! A feedback loop is the stateful record of repeated attempts toward one
//! goal. It is created by `start_loop`, mutated only by `execute_iteration`
//! and `stop_loop`, and never deleted by this crate.
//!
//! ## Lifecycle
//!
//! ```text
//! pending ──start──▶ running ──▶ goal_achieved
//!    │                  │ ├────▶ max_iterations_reached
//!    │                  │ ├────▶ converged
//!    └──────stop────────┴─┴────▶ cancelled / failed
//! ```
//!
//! Every state other than `pending` and `running` is terminal.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ConsumptionReport, Criterion, GapSeverity};

// ============================================================================
// Status
// ============================================================================

/// Status of a feedback loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStatus {
    /// Created but not yet accepting iterations
    Pending,
    /// Accepting iteration reports
    Running,
    /// Every success criterion was met
    GoalAchieved,
    /// The iteration cap was exhausted without reaching the goal
    MaxIterationsReached,
    /// Improvement plateaued below the convergence threshold
    Converged,
    /// Stopped explicitly by a caller
    Cancelled,
    /// An internal invariant was violated
    Failed,
}

impl Default for LoopStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl LoopStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::GoalAchieved => "goal_achieved",
            Self::MaxIterationsReached => "max_iterations_reached",
            Self::Converged => "converged",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "goal_achieved" => Some(Self::GoalAchieved),
            "max_iterations_reached" => Some(Self::MaxIterationsReached),
            "converged" => Some(Self::Converged),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns true once no transition can leave this state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }

    /// Check if this status can transition to another status.
    pub fn can_transition_to(&self, new_status: Self) -> bool {
        matches!(
            (self, new_status),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Cancelled)
                | (Self::Pending, Self::Failed)
                | (Self::Running, Self::GoalAchieved)
                | (Self::Running, Self::MaxIterationsReached)
                | (Self::Running, Self::Converged)
                | (Self::Running, Self::Cancelled)
                | (Self::Running, Self::Failed)
        )
    }
}

impl fmt::Display for LoopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Convergence Metrics
// ============================================================================

/// Running statistics over a loop's score history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceMetrics {
    /// One overall score per iteration, in order.
    pub score_history: Vec<f64>,
    /// Trailing mean of recent score deltas, in score points.
    pub improvement_rate: f64,
    /// True once improvement has plateaued.
    pub is_converging: bool,
}

// ============================================================================
// Feedback
// ============================================================================

/// A structured callout for one unmet criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapCallout {
    pub criterion: Criterion,
    pub severity: GapSeverity,
    /// Concrete next action, e.g. "Fix 8 lint errors".
    pub message: String,
}

/// Guidance handed back to the session runner for its next attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub summary: String,
    pub callouts: Vec<GapCallout>,
}

// ============================================================================
// Iteration
// ============================================================================

/// Append-only record of one reported attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    /// Caller-supplied, opaque session identifier.
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub consumption_report: ConsumptionReport,
    /// Current score minus previous score; 0 for the first iteration.
    pub score_improvement: f64,
    /// `None` when refinement feedback is disabled.
    pub feedback: Option<Feedback>,
}

// ============================================================================
// FeedbackLoop
// ============================================================================

/// The stateful record of repeated attempts toward one goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackLoop {
    /// Unique identifier (the loop id)
    pub id: Uuid,
    /// The goal being pursued. A reference, not ownership.
    pub goal_id: Uuid,
    pub status: LoopStatus,
    /// Number of accepted iterations
    pub iteration: u32,
    pub iterations: Vec<Iteration>,
    pub convergence_metrics: ConvergenceMetrics,
    /// Iteration cap in force when the loop was started
    pub max_iterations: u32,
    /// Why the loop was cancelled or failed
    pub stop_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl FeedbackLoop {
    /// Create a pending loop for the given goal.
    pub fn new(goal_id: Uuid, max_iterations: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            goal_id,
            status: LoopStatus::Pending,
            iteration: 0,
            iterations: Vec::new(),
            convergence_metrics: ConvergenceMetrics::default(),
            max_iterations,
            stop_reason: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The most recent iteration, if any.
    pub fn latest(&self) -> Option<&Iteration> {
        self.iterations.last()
    }

    /// The most recent overall score, if any.
    pub fn latest_score(&self) -> Option<f64> {
        self.convergence_metrics.score_history.last().copied()
    }

    /// Transition to a new status, updating timestamps.
    pub fn transition_to(&mut self, new_status: LoopStatus) -> Result<(), String> {
        if !self.status.can_transition_to(new_status) {
            return Err(format!(
                "Cannot transition from {} to {}",
                self.status, new_status
            ));
        }
        let now = Utc::now();
        self.status = new_status;
        self.updated_at = now;
        if new_status.is_terminal() {
            self.completed_at = Some(now);
        }
        Ok(())
    }

    /// Move to `failed`, recording the reason. No-op if already terminal.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.transition_to(LoopStatus::Failed).is_ok() {
            self.stop_reason = Some(reason.into());
        }
    }

    /// Check the history invariants.
    ///
    /// `len(score_history) == iteration == len(iterations)`, every score is a
    /// finite value in `[0, 100]` matching its iteration's report, and the
    /// iteration count never exceeds the cap.
    pub fn check_invariants(&self) -> Result<(), String> {
        let history = &self.convergence_metrics.score_history;
        let count = self.iteration as usize;

        if history.len() != count || self.iterations.len() != count {
            return Err(format!(
                "history length mismatch: iteration={}, score_history={}, iterations={}",
                self.iteration,
                history.len(),
                self.iterations.len()
            ));
        }
        if self.iteration > self.max_iterations {
            return Err(format!(
                "iteration {} exceeds max_iterations {}",
                self.iteration, self.max_iterations
            ));
        }
        if self.status == LoopStatus::Pending && self.iteration > 0 {
            return Err("pending loop has recorded iterations".to_string());
        }
        for (index, (score, record)) in history.iter().zip(&self.iterations).enumerate() {
            if !score.is_finite() || !(0.0..=100.0).contains(score) {
                return Err(format!("score_history[{index}] out of range: {score}"));
            }
            if (record.consumption_report.overall_score - score).abs() > f64::EPSILON {
                return Err(format!(
                    "score_history[{index}] does not match its iteration report"
                ));
            }
        }
        Ok(())
    }
}
