//! Common test utilities for integration tests
//!
//! Shared fixtures for goals, metrics snapshots and service wiring.

#![allow(dead_code)]

use std::path::PathBuf;

use kaizen::domain::models::{
    ActualMetrics, Config, GoalSpec, LoopConfig, PersistenceBackend, SuccessCriteria, TestSpec,
};
use kaizen::Kaizen;
use tempfile::TempDir;

/// Setup test logging
///
/// Call this at the beginning of tests that need log output.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Create a temporary SQLite database path
///
/// The database lives as long as the returned TempDir.
pub fn temp_db_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("kaizen.db");
    (dir, db_path)
}

/// The quality bar used throughout the scenarios.
pub fn criteria() -> SuccessCriteria {
    SuccessCriteria {
        min_quality_score: 85.0,
        max_lint_errors: 0,
        max_type_errors: 0,
        max_security_issues: 0,
        min_test_coverage: 80.0,
        min_tests_passed: 6,
    }
}

pub fn goal_spec(title: &str) -> GoalSpec {
    GoalSpec::new(title, criteria())
        .with_description("Bring the module up to the team quality bar")
        .with_test_spec(TestSpec::new("parse", "parses input", "src/parser.rs", "accepts valid input"))
        .with_test_spec(
            TestSpec::new("reject", "rejects garbage", "src/parser.rs", "returns an error")
                .depends_on("parse"),
        )
        .with_acceptance("No new warnings")
}

/// Early attempt: every criterion but security is unmet.
pub fn early_metrics() -> ActualMetrics {
    ActualMetrics {
        quality_score: 55.0,
        lint_errors: 8,
        type_errors: 3,
        security_issues: 0,
        test_coverage: 45.0,
        tests_passed: 2,
        tests_failed: 4,
        ..ActualMetrics::default()
    }
}

/// Every criterion met.
pub fn passing_metrics() -> ActualMetrics {
    ActualMetrics {
        quality_score: 92.0,
        lint_errors: 0,
        type_errors: 0,
        security_issues: 0,
        test_coverage: 88.0,
        tests_passed: 8,
        tests_failed: 0,
        ..ActualMetrics::default()
    }
}

/// Not achieved (coverage short); overall score moves ~0.35 points per quality point.
pub fn stalled_metrics(quality: f64) -> ActualMetrics {
    ActualMetrics {
        quality_score: quality,
        test_coverage: 50.0,
        tests_passed: 6,
        ..ActualMetrics::default()
    }
}

pub fn config_with(loop_settings: LoopConfig) -> Config {
    let mut config = Config::default();
    config.loop_settings = loop_settings;
    config.persistence.backend = PersistenceBackend::Memory;
    config
}

pub fn in_memory() -> Kaizen {
    Kaizen::in_memory(&config_with(LoopConfig::default()))
}

pub fn sqlite_config(db_path: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.persistence.backend = PersistenceBackend::Sqlite;
    config.persistence.path = db_path.to_string_lossy().into_owned();
    config
}
