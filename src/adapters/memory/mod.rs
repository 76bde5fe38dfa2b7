//! In-memory repositories.
//!
//! Used when persistence is disabled and as the default test double for the
//! services. Contents vanish with the process.

mod goal_repository;
mod loop_repository;

pub use goal_repository::InMemoryGoalRepository;
pub use loop_repository::InMemoryLoopRepository;
