//! Goal domain model.
//!
//! A goal is the target state a feedback loop drives toward: six numeric
//! success criteria plus an acceptance checklist and the test specs that
//! should exist once the work is done. Goals are immutable once created;
//! re-goaling means creating a new goal.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::ValidationError;

/// Maximum length of a goal title.
pub const MAX_TITLE_LEN: usize = 255;

/// Priority level for goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalPriority {
    Low = 1,
    Normal = 2,
    High = 3,
    Critical = 4,
}

impl Default for GoalPriority {
    fn default() -> Self {
        Self::Normal
    }
}

impl GoalPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Metadata associated with a goal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalMetadata {
    /// Tags for categorization
    #[serde(default)]
    pub tags: Vec<String>,
    /// Custom key-value pairs
    #[serde(default)]
    pub custom: HashMap<String, serde_json::Value>,
}

// ============================================================================
// Success Criteria
// ============================================================================

/// The six validated thresholds a goal is judged against.
///
/// Scores and percentages are in `[0, 100]`; counts are plain `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuccessCriteria {
    /// Minimum overall quality score reported by the scanner.
    pub min_quality_score: f64,
    /// Maximum number of linter issues.
    pub max_lint_errors: u32,
    /// Maximum number of type-checker errors.
    pub max_type_errors: u32,
    /// Maximum number of security-scanner findings.
    pub max_security_issues: u32,
    /// Minimum test coverage percentage.
    pub min_test_coverage: f64,
    /// Minimum number of passing tests.
    pub min_tests_passed: u32,
}

/// Unvalidated success criteria as supplied by a caller.
///
/// Every field is optional so a missing criterion can be reported by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessCriteriaSpec {
    #[serde(default)]
    pub min_quality_score: Option<f64>,
    #[serde(default)]
    pub max_lint_errors: Option<i64>,
    #[serde(default)]
    pub max_type_errors: Option<i64>,
    #[serde(default)]
    pub max_security_issues: Option<i64>,
    #[serde(default)]
    pub min_test_coverage: Option<f64>,
    #[serde(default)]
    pub min_tests_passed: Option<i64>,
}

impl From<SuccessCriteria> for SuccessCriteriaSpec {
    fn from(c: SuccessCriteria) -> Self {
        Self {
            min_quality_score: Some(c.min_quality_score),
            max_lint_errors: Some(i64::from(c.max_lint_errors)),
            max_type_errors: Some(i64::from(c.max_type_errors)),
            max_security_issues: Some(i64::from(c.max_security_issues)),
            min_test_coverage: Some(c.min_test_coverage),
            min_tests_passed: Some(i64::from(c.min_tests_passed)),
        }
    }
}

impl SuccessCriteriaSpec {
    /// Validate every field is present, finite and non-negative.
    pub fn validate(&self) -> Result<SuccessCriteria, ValidationError> {
        Ok(SuccessCriteria {
            min_quality_score: percentage(
                "success_criteria.min_quality_score",
                self.min_quality_score,
            )?,
            max_lint_errors: count("success_criteria.max_lint_errors", self.max_lint_errors)?,
            max_type_errors: count("success_criteria.max_type_errors", self.max_type_errors)?,
            max_security_issues: count(
                "success_criteria.max_security_issues",
                self.max_security_issues,
            )?,
            min_test_coverage: percentage(
                "success_criteria.min_test_coverage",
                self.min_test_coverage,
            )?,
            min_tests_passed: count("success_criteria.min_tests_passed", self.min_tests_passed)?,
        })
    }
}

fn percentage(field: &str, value: Option<f64>) -> Result<f64, ValidationError> {
    let value = value.ok_or_else(|| ValidationError::missing(field))?;
    if !value.is_finite() {
        return Err(ValidationError::new(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(ValidationError::negative(field));
    }
    if value > 100.0 {
        return Err(ValidationError::new(field, "must not exceed 100"));
    }
    Ok(value)
}

fn count(field: &str, value: Option<i64>) -> Result<u32, ValidationError> {
    let value = value.ok_or_else(|| ValidationError::missing(field))?;
    if value < 0 {
        return Err(ValidationError::negative(field));
    }
    u32::try_from(value).map_err(|_| ValidationError::new(field, "is out of range"))
}

// ============================================================================
// Test Specs
// ============================================================================

/// Kind of test a spec describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Unit,
    Integration,
    E2e,
}

impl Default for TestKind {
    fn default() -> Self {
        Self::Unit
    }
}

/// Last known state of a test spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestSpecStatus {
    Pending,
    Passing,
    Failing,
    Skipped,
}

impl Default for TestSpecStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// A test that should exist (and pass) once the goal is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: TestKind,
    /// Artifact under test (file, module, endpoint).
    pub target: String,
    pub expected_behavior: String,
    /// Ids of specs declared earlier in the same goal.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub status: TestSpecStatus,
}

impl TestSpec {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        target: impl Into<String>,
        expected_behavior: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: TestKind::default(),
            target: target.into(),
            expected_behavior: expected_behavior.into(),
            dependencies: Vec::new(),
            status: TestSpecStatus::default(),
        }
    }

    pub fn with_kind(mut self, kind: TestKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }
}

/// Check that test spec ids are unique and only reference earlier specs.
///
/// Forward and self references are rejected; this is an ordering check, not
/// general cycle detection.
pub fn validate_test_specs(specs: &[TestSpec]) -> Result<(), ValidationError> {
    let mut declared: HashSet<&str> = HashSet::with_capacity(specs.len());

    for (index, spec) in specs.iter().enumerate() {
        let field = format!("test_specs[{index}]");
        if spec.id.trim().is_empty() {
            return Err(ValidationError::new(format!("{field}.id"), "must not be empty"));
        }
        for dep in &spec.dependencies {
            if dep == &spec.id {
                return Err(ValidationError::new(
                    format!("{field}.dependencies"),
                    format!("'{}' depends on itself", spec.id),
                ));
            }
            if !declared.contains(dep.as_str()) {
                return Err(ValidationError::new(
                    format!("{field}.dependencies"),
                    format!("'{dep}' is not declared before '{}'", spec.id),
                ));
            }
        }
        if !declared.insert(spec.id.as_str()) {
            return Err(ValidationError::new(
                format!("{field}.id"),
                format!("duplicate id '{}'", spec.id),
            ));
        }
    }

    Ok(())
}

// ============================================================================
// Goal
// ============================================================================

/// A validated, immutable goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub success_criteria: SuccessCriteria,
    pub test_specs: Vec<TestSpec>,
    /// Free-text acceptance checklist
    pub acceptance_criteria: Vec<String>,
    pub priority: GoalPriority,
    /// External issue-tracker reference, opaque to the loop
    pub issue_number: Option<u64>,
    pub metadata: GoalMetadata,
    /// When this goal was created
    pub created_at: DateTime<Utc>,
}

/// Everything a caller supplies to create a goal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub success_criteria: SuccessCriteriaSpec,
    #[serde(default)]
    pub test_specs: Vec<TestSpec>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub priority: GoalPriority,
    #[serde(default)]
    pub issue_number: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl GoalSpec {
    pub fn new(title: impl Into<String>, criteria: SuccessCriteria) -> Self {
        Self {
            title: title.into(),
            success_criteria: criteria.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_test_spec(mut self, spec: TestSpec) -> Self {
        self.test_specs.push(spec);
        self
    }

    pub fn with_acceptance(mut self, item: impl Into<String>) -> Self {
        self.acceptance_criteria.push(item.into());
        self
    }

    pub fn with_priority(mut self, priority: GoalPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_issue(mut self, issue_number: u64) -> Self {
        self.issue_number = Some(issue_number);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Validate the spec and produce a goal with a fresh id.
    pub fn into_goal(self) -> Result<Goal, ValidationError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::new("title", "must not be empty"));
        }
        if title.len() > MAX_TITLE_LEN {
            return Err(ValidationError::new(
                "title",
                format!("must not exceed {MAX_TITLE_LEN} characters"),
            ));
        }

        let success_criteria = self.success_criteria.validate()?;
        validate_test_specs(&self.test_specs)?;

        Ok(Goal {
            id: Uuid::new_v4(),
            title,
            description: self.description,
            success_criteria,
            test_specs: self.test_specs,
            acceptance_criteria: self.acceptance_criteria,
            priority: self.priority,
            issue_number: self.issue_number,
            metadata: GoalMetadata {
                tags: self.tags,
                custom: HashMap::new(),
            },
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria() -> SuccessCriteria {
        SuccessCriteria {
            min_quality_score: 85.0,
            max_lint_errors: 0,
            max_type_errors: 0,
            max_security_issues: 0,
            min_test_coverage: 80.0,
            min_tests_passed: 6,
        }
    }

    #[test]
    fn test_goal_creation() {
        let goal = GoalSpec::new("Harden parser", criteria())
            .with_description("Bring the parser up to standard")
            .with_acceptance("No panics on malformed input")
            .with_priority(GoalPriority::High)
            .with_issue(42)
            .with_tag("parser")
            .into_goal()
            .unwrap();

        assert_eq!(goal.title, "Harden parser");
        assert_eq!(goal.priority, GoalPriority::High);
        assert_eq!(goal.issue_number, Some(42));
        assert_eq!(goal.success_criteria, criteria());
        assert_eq!(goal.metadata.tags, vec!["parser".to_string()]);
    }

    #[test]
    fn test_missing_criterion_is_named() {
        let mut spec = GoalSpec::new("Goal", criteria());
        spec.success_criteria.min_tests_passed = None;

        let err = spec.into_goal().unwrap_err();
        assert_eq!(err.field, "success_criteria.min_tests_passed");
    }

    #[test]
    fn test_negative_criterion_is_rejected() {
        let mut spec = GoalSpec::new("Goal", criteria());
        spec.success_criteria.max_lint_errors = Some(-1);

        let err = spec.into_goal().unwrap_err();
        assert_eq!(err.field, "success_criteria.max_lint_errors");
        assert_eq!(err.reason, "must not be negative");

        let mut spec = GoalSpec::new("Goal", criteria());
        spec.success_criteria.min_test_coverage = Some(-0.5);
        assert!(spec.into_goal().is_err());
    }

    #[test]
    fn test_nan_and_over_hundred_percentages() {
        let mut spec = GoalSpec::new("Goal", criteria());
        spec.success_criteria.min_quality_score = Some(f64::NAN);
        assert!(spec.into_goal().is_err());

        let mut spec = GoalSpec::new("Goal", criteria());
        spec.success_criteria.min_test_coverage = Some(120.0);
        assert!(spec.into_goal().is_err());
    }

    #[test]
    fn test_empty_and_long_titles() {
        assert!(GoalSpec::new("   ", criteria()).into_goal().is_err());
        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(GoalSpec::new(long, criteria()).into_goal().is_err());
    }

    #[test]
    fn test_backward_dependencies_allowed() {
        let specs = vec![
            TestSpec::new("t1", "parses", "src/parser.rs", "accepts valid input"),
            TestSpec::new("t2", "rejects", "src/parser.rs", "rejects bad input").depends_on("t1"),
            TestSpec::new("t3", "e2e", "bin", "round trips")
                .with_kind(TestKind::E2e)
                .depends_on("t1")
                .depends_on("t2"),
        ];
        assert!(validate_test_specs(&specs).is_ok());
    }

    #[test]
    fn test_forward_dependency_rejected() {
        let specs = vec![
            TestSpec::new("t1", "a", "x", "y").depends_on("t2"),
            TestSpec::new("t2", "b", "x", "y"),
        ];
        let err = validate_test_specs(&specs).unwrap_err();
        assert_eq!(err.field, "test_specs[0].dependencies");
    }

    #[test]
    fn test_self_dependency_rejected() {
        let specs = vec![TestSpec::new("t1", "a", "x", "y").depends_on("t1")];
        let err = validate_test_specs(&specs).unwrap_err();
        assert!(err.reason.contains("itself"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let specs = vec![
            TestSpec::new("t1", "a", "x", "y"),
            TestSpec::new("t1", "b", "x", "y"),
        ];
        let err = validate_test_specs(&specs).unwrap_err();
        assert_eq!(err.field, "test_specs[1].id");
    }

    #[test]
    fn test_spec_deserializes_from_yaml() {
        let yaml = r"
title: Improve coverage
success_criteria:
  min_quality_score: 85
  max_lint_errors: 0
  max_type_errors: 0
  max_security_issues: 0
  min_test_coverage: 80
  min_tests_passed: 6
test_specs:
  - id: t1
    name: happy path
    kind: integration
    target: src/api.rs
    expected_behavior: returns 200
acceptance_criteria:
  - README updated
priority: high
";
        let spec: GoalSpec = serde_yaml::from_str(yaml).unwrap();
        let goal = spec.into_goal().unwrap();
        assert_eq!(goal.test_specs[0].kind, TestKind::Integration);
        assert_eq!(goal.success_criteria.min_tests_passed, 6);
    }
}
