use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::{Config, PersistenceBackend};

/// Configuration error types
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid loop.max_iterations: {0}. Must be at least 1")]
    InvalidMaxIterations(u32),

    #[error("Invalid loop.min_iterations_before_convergence: {0}. Must be at least 1")]
    InvalidConvergenceWindow(u32),

    #[error("Invalid loop.convergence_threshold: {0}. Must be finite and non-negative")]
    InvalidConvergenceThreshold(f64),

    #[error("Invalid scoring weight {name}: {value}. Must be finite and non-negative")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("Scoring weights must have a positive sum")]
    ZeroWeightSum,

    #[error("Invalid scoring.coverage_high_shortfall: {0}. Must be finite and non-negative")]
    InvalidSeverityCutoff(f64),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .kaizen/config.yaml (project config)
    /// 3. .kaizen/local.yaml (project local overrides, optional)
    /// 4. Environment variables (KAIZEN_* prefix, `__` separates nested keys)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".kaizen/config.yaml"))
            .merge(Yaml::file(".kaizen/local.yaml"))
            .merge(Env::prefixed("KAIZEN_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring environment overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("KAIZEN_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let loop_settings = &config.loop_settings;
        if loop_settings.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations(loop_settings.max_iterations));
        }
        if loop_settings.min_iterations_before_convergence == 0 {
            return Err(ConfigError::InvalidConvergenceWindow(
                loop_settings.min_iterations_before_convergence,
            ));
        }
        let threshold = loop_settings.convergence_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidConvergenceThreshold(threshold));
        }

        let weights = &config.scoring.weights;
        for (name, value) in [
            ("quality_score", weights.quality_score),
            ("test_coverage", weights.test_coverage),
            ("tests_passed", weights.tests_passed),
            ("lint_errors", weights.lint_errors),
            ("type_errors", weights.type_errors),
            ("security_issues", weights.security_issues),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        if weights.sum() <= 0.0 {
            return Err(ConfigError::ZeroWeightSum);
        }
        let cutoff = config.scoring.coverage_high_shortfall;
        if !cutoff.is_finite() || cutoff < 0.0 {
            return Err(ConfigError::InvalidSeverityCutoff(cutoff));
        }

        if config.persistence.backend == PersistenceBackend::Sqlite {
            if config.persistence.path.trim().is_empty() {
                return Err(ConfigError::EmptyDatabasePath);
            }
            if config.persistence.max_connections == 0 {
                return Err(ConfigError::InvalidMaxConnections(
                    config.persistence.max_connections,
                ));
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
