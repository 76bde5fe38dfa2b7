//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that persistence adapters must implement:
//! - GoalRepository: durable goal records
//! - LoopRepository: durable feedback loop snapshots
//!
//! The orchestrator only ever talks to these traits, so the scoring and
//! convergence state machine can be tested against in-memory adapters.

pub mod goal_repository;
pub mod loop_repository;

pub use goal_repository::GoalRepository;
pub use loop_repository::LoopRepository;
