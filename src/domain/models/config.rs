use serde::{Deserialize, Serialize};

use super::Criterion;

/// Main configuration structure for kaizen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Feedback loop control settings
    #[serde(default, rename = "loop")]
    pub loop_settings: LoopConfig,

    /// Consumption validator scoring constants
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Durable snapshot storage
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Loop orchestrator configuration. Fixed for the lifetime of an orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoopConfig {
    /// Iteration cap per loop
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Score-point delta below which an iteration counts as stalled
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,

    /// Trailing window (in iterations) used for convergence detection
    #[serde(default = "default_min_iterations_before_convergence")]
    pub min_iterations_before_convergence: u32,

    /// Whether iterations carry refinement feedback
    #[serde(default = "default_true")]
    pub auto_refinement_enabled: bool,
}

const fn default_max_iterations() -> u32 {
    10
}

const fn default_convergence_threshold() -> f64 {
    1.0
}

const fn default_min_iterations_before_convergence() -> u32 {
    3
}

const fn default_true() -> bool {
    true
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            convergence_threshold: default_convergence_threshold(),
            min_iterations_before_convergence: default_min_iterations_before_convergence(),
            auto_refinement_enabled: default_true(),
        }
    }
}

/// Weights combining the six sub-scores into the overall score.
///
/// They need not sum to exactly 1.0; the overall score is divided by the sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScoringWeights {
    #[serde(default = "default_w_quality")]
    pub quality_score: f64,
    #[serde(default = "default_w_coverage")]
    pub test_coverage: f64,
    #[serde(default = "default_w_tests")]
    pub tests_passed: f64,
    #[serde(default = "default_w_count")]
    pub lint_errors: f64,
    #[serde(default = "default_w_count")]
    pub type_errors: f64,
    #[serde(default = "default_w_count")]
    pub security_issues: f64,
}

const fn default_w_quality() -> f64 {
    0.30
}

const fn default_w_coverage() -> f64 {
    0.20
}

const fn default_w_tests() -> f64 {
    0.20
}

const fn default_w_count() -> f64 {
    0.10
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            quality_score: default_w_quality(),
            test_coverage: default_w_coverage(),
            tests_passed: default_w_tests(),
            lint_errors: default_w_count(),
            type_errors: default_w_count(),
            security_issues: default_w_count(),
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.quality_score
            + self.test_coverage
            + self.tests_passed
            + self.lint_errors
            + self.type_errors
            + self.security_issues
    }

    pub fn weight_for(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::QualityScore => self.quality_score,
            Criterion::TestCoverage => self.test_coverage,
            Criterion::TestsPassed => self.tests_passed,
            Criterion::LintErrors => self.lint_errors,
            Criterion::TypeErrors => self.type_errors,
            Criterion::SecurityIssues => self.security_issues,
        }
    }
}

/// Scoring constants for the consumption validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoringWeights,

    /// Extra headroom (in counts) over which a maximum-type sub-score decays
    /// when the allowed maximum is small.
    #[serde(default = "default_zero_tolerance_span")]
    pub zero_tolerance_span: u32,

    /// Shortfall in percentage points above which coverage and quality gaps are high severity
    #[serde(default = "default_coverage_high_shortfall")]
    pub coverage_high_shortfall: f64,

    /// Passing-test shortfall (or failing-test count) above which test gaps are high severity
    #[serde(default = "default_tests_high_shortfall")]
    pub tests_high_shortfall: u32,
}

const fn default_zero_tolerance_span() -> u32 {
    10
}

const fn default_coverage_high_shortfall() -> f64 {
    20.0
}

const fn default_tests_high_shortfall() -> u32 {
    3
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            zero_tolerance_span: default_zero_tolerance_span(),
            coverage_high_shortfall: default_coverage_high_shortfall(),
            tests_high_shortfall: default_tests_high_shortfall(),
        }
    }
}

/// Where snapshots are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceBackend {
    Sqlite,
    Memory,
}

impl Default for PersistenceBackend {
    fn default() -> Self {
        Self::Sqlite
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PersistenceConfig {
    #[serde(default)]
    pub backend: PersistenceBackend,

    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".kaizen/kaizen.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: PersistenceBackend::default(),
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Log file rotation: daily, hourly or never
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_log_rotation(),
        }
    }
}
