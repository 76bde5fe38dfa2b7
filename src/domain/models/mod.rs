//! Domain models for goals, metrics, scoring reports and feedback loops.

pub mod config;
pub mod consumption;
pub mod convergence;
pub mod feedback_loop;
pub mod goal;
pub mod metrics;

pub use config::{
    Config, LoggingConfig, LoopConfig, PersistenceBackend, PersistenceConfig, ScoringConfig,
    ScoringWeights,
};
pub use consumption::{ConsumptionReport, Gap, GapSeverity};
pub use convergence::{
    improvement_rate, is_converging, record_score, score_deltas, stalled_streak,
};
pub use feedback_loop::{
    ConvergenceMetrics, Feedback, FeedbackLoop, GapCallout, Iteration, LoopStatus,
};
pub use goal::{
    validate_test_specs, Goal, GoalMetadata, GoalPriority, GoalSpec, SuccessCriteria,
    SuccessCriteriaSpec, TestKind, TestSpec, TestSpecStatus,
};
pub use metrics::{ActualMetrics, Bound, Criterion};
