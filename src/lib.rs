//! Kaizen - an improve-until-good-enough control loop
//!
//! A caller registers a goal with measurable success criteria, starts a
//! feedback loop for it, and reports the metrics of each attempt. Every report
//! is scored against the goal; the loop ends when the goal is achieved, the
//! iteration cap is reached, or progress plateaus.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and repository ports
//! - **Service Layer** (`services`): goal store, consumption validator, loop orchestrator
//! - **Adapters** (`adapters`): SQLite and in-memory repositories
//! - **Application Layer** (`application`): process-wide wiring
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use kaizen::application::Kaizen;
//! use kaizen::domain::models::{ActualMetrics, Config, GoalSpec, SuccessCriteria};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let kaizen = Kaizen::in_memory(&Config::default());
//!     let goal = kaizen.goals().create_goal(GoalSpec::new("Ship", criteria)).await?;
//!     let started = kaizen.loops().start_loop(goal.id).await?;
//!     kaizen.loops().execute_iteration(started.id, "session-1", metrics).await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::Kaizen;
pub use domain::errors::{DomainError, DomainResult, ValidationError};
pub use domain::models::{
    ActualMetrics, Config, ConsumptionReport, FeedbackLoop, Gap, GapSeverity, Goal, GoalSpec,
    Iteration, LoopStatus, SuccessCriteria,
};
pub use services::{ConsumptionValidator, GoalService, LoopOrchestrator};
