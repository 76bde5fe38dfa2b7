//! Reported quality metrics and the criteria they are judged on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ValidationError;
use crate::domain::models::SuccessCriteria;

/// One snapshot of objective quality measurements from a single attempt.
///
/// Counts are signed on the wire so that a misbehaving scanner reporting a
/// negative value is rejected by name instead of failing deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActualMetrics {
    /// Scanner quality score, 0-100.
    pub quality_score: f64,
    pub lint_errors: i64,
    pub type_errors: i64,
    pub security_issues: i64,
    /// Line coverage percentage, 0-100.
    pub test_coverage: f64,
    pub tests_passed: i64,
    #[serde(default)]
    pub tests_failed: i64,
    #[serde(default)]
    pub build_duration_ms: i64,
    #[serde(default)]
    pub lines_of_code: i64,
    #[serde(default)]
    pub cyclomatic_complexity: f64,
}

impl ActualMetrics {
    /// Reject negative counts, non-finite numbers and out-of-range percentages.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_percentage("metrics.quality_score", self.quality_score)?;
        check_count("metrics.lint_errors", self.lint_errors)?;
        check_count("metrics.type_errors", self.type_errors)?;
        check_count("metrics.security_issues", self.security_issues)?;
        check_percentage("metrics.test_coverage", self.test_coverage)?;
        check_count("metrics.tests_passed", self.tests_passed)?;
        check_count("metrics.tests_failed", self.tests_failed)?;
        check_count("metrics.build_duration_ms", self.build_duration_ms)?;
        check_count("metrics.lines_of_code", self.lines_of_code)?;

        if !self.cyclomatic_complexity.is_finite() {
            return Err(ValidationError::new(
                "metrics.cyclomatic_complexity",
                "must be a finite number",
            ));
        }
        if self.cyclomatic_complexity < 0.0 {
            return Err(ValidationError::negative("metrics.cyclomatic_complexity"));
        }
        Ok(())
    }

    /// The reported value for one criterion, in that criterion's native unit.
    pub fn value_of(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::QualityScore => self.quality_score,
            Criterion::LintErrors => self.lint_errors as f64,
            Criterion::TypeErrors => self.type_errors as f64,
            Criterion::SecurityIssues => self.security_issues as f64,
            Criterion::TestCoverage => self.test_coverage,
            Criterion::TestsPassed => self.tests_passed as f64,
        }
    }
}

fn check_percentage(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(ValidationError::negative(field));
    }
    if value > 100.0 {
        return Err(ValidationError::new(field, "must not exceed 100"));
    }
    Ok(())
}

fn check_count(field: &str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::negative(field));
    }
    Ok(())
}

/// Whether a criterion is satisfied from below or from above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// `actual >= threshold`
    Minimum,
    /// `actual <= threshold`
    Maximum,
}

/// The six success-criteria dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    QualityScore,
    LintErrors,
    TypeErrors,
    SecurityIssues,
    TestCoverage,
    TestsPassed,
}

impl Criterion {
    pub const ALL: [Self; 6] = [
        Self::QualityScore,
        Self::LintErrors,
        Self::TypeErrors,
        Self::SecurityIssues,
        Self::TestCoverage,
        Self::TestsPassed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QualityScore => "quality_score",
            Self::LintErrors => "lint_errors",
            Self::TypeErrors => "type_errors",
            Self::SecurityIssues => "security_issues",
            Self::TestCoverage => "test_coverage",
            Self::TestsPassed => "tests_passed",
        }
    }

    pub fn bound(&self) -> Bound {
        match self {
            Self::QualityScore | Self::TestCoverage | Self::TestsPassed => Bound::Minimum,
            Self::LintErrors | Self::TypeErrors | Self::SecurityIssues => Bound::Maximum,
        }
    }

    /// The goal's threshold for this criterion, in its native unit.
    pub fn threshold(&self, criteria: &SuccessCriteria) -> f64 {
        match self {
            Self::QualityScore => criteria.min_quality_score,
            Self::LintErrors => f64::from(criteria.max_lint_errors),
            Self::TypeErrors => f64::from(criteria.max_type_errors),
            Self::SecurityIssues => f64::from(criteria.max_security_issues),
            Self::TestCoverage => criteria.min_test_coverage,
            Self::TestsPassed => f64::from(criteria.min_tests_passed),
        }
    }

    /// Whether `actual` meets `threshold` for this criterion.
    pub fn is_met(&self, actual: f64, threshold: f64) -> bool {
        match self.bound() {
            Bound::Minimum => actual >= threshold,
            Bound::Maximum => actual <= threshold,
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
