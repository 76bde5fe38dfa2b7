pub mod consumption_validator;
pub mod feedback;
pub mod goal_service;
pub mod loop_orchestrator;
pub mod snapshot_writer;

pub use consumption_validator::ConsumptionValidator;
pub use feedback::build_feedback;
pub use goal_service::GoalService;
pub use loop_orchestrator::LoopOrchestrator;
pub use snapshot_writer::SnapshotWriter;
