pub mod kaizen;

pub use kaizen::{DynGoalService, DynLoopOrchestrator, Kaizen};
