//! Consumption validator.
//!
//! A pure scoring layer: given a goal and a freshly reported metrics
//! snapshot it computes a single overall score, the goal-achieved flag and a
//! ranked list of gaps. It keeps no memory between calls.
//!
//! # Scoring
//!
//! Each criterion yields a sub-score in `[0, 100]`:
//!
//! ```text
//! minimum-type   sub = min(100, actual / threshold * 100)         (100 if threshold == 0)
//! maximum-type   sub = 100                                         if actual <= allowed
//!                sub = 100 * (1 - (actual - allowed) / (ceiling - allowed))
//!                ceiling = max(2 * allowed, allowed + zero_tolerance_span)
//! ```
//!
//! The overall score is the weighted mean of the sub-scores, clamped to
//! `[0, 100]` and rounded to two decimals. `goal_achieved` is decided per
//! criterion, never from the overall score, since weighting can hide a
//! single failing dimension.

use std::cmp::Ordering;

use tracing::debug;

use crate::domain::errors::ValidationError;
use crate::domain::models::{
    ActualMetrics, Bound, ConsumptionReport, Criterion, Gap, GapSeverity, Goal, ScoringConfig,
};

/// Scores metrics snapshots against goals.
#[derive(Debug, Clone, Default)]
pub struct ConsumptionValidator {
    config: ScoringConfig,
}

impl ConsumptionValidator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score `metrics` against `goal`.
    ///
    /// Fails fast with a field-named [`ValidationError`] on negative, NaN or
    /// out-of-range input; no report is produced in that case.
    pub fn score(
        &self,
        goal: &Goal,
        metrics: &ActualMetrics,
    ) -> Result<ConsumptionReport, ValidationError> {
        metrics.validate()?;

        let criteria = &goal.success_criteria;
        let weights = &self.config.weights;

        let mut weighted = 0.0;
        let mut gaps = Vec::new();

        for criterion in Criterion::ALL {
            let actual = metrics.value_of(criterion);
            let threshold = criterion.threshold(criteria);

            weighted += weights.weight_for(criterion) * self.sub_score(criterion, actual, threshold);

            if !criterion.is_met(actual, threshold) {
                let gap = (actual - threshold).abs();
                gaps.push(Gap {
                    metric: criterion,
                    gap,
                    severity: self.classify(criterion, gap, metrics),
                    actual,
                    threshold,
                });
            }
        }

        let total_weight = weights.sum();
        let overall = if total_weight > 0.0 {
            weighted / total_weight
        } else {
            0.0
        };
        let overall_score = round2(overall.clamp(0.0, 100.0));

        rank_gaps(&mut gaps);
        let goal_achieved = gaps.is_empty();

        debug!(
            goal_id = %goal.id,
            overall_score,
            goal_achieved,
            gap_count = gaps.len(),
            "scored metrics snapshot"
        );

        Ok(ConsumptionReport {
            overall_score,
            goal_achieved,
            gaps,
            actual_metrics: *metrics,
        })
    }

    /// Normalized sub-score for one criterion, in `[0, 100]`.
    pub fn sub_score(&self, criterion: Criterion, actual: f64, threshold: f64) -> f64 {
        let score = match criterion.bound() {
            Bound::Minimum => {
                if threshold <= 0.0 {
                    100.0
                } else {
                    actual / threshold * 100.0
                }
            }
            Bound::Maximum => {
                if actual <= threshold {
                    100.0
                } else {
                    let span = f64::from(self.config.zero_tolerance_span);
                    let ceiling = (2.0 * threshold).max(threshold + span);
                    if ceiling <= threshold {
                        0.0
                    } else {
                        100.0 * (1.0 - (actual - threshold) / (ceiling - threshold))
                    }
                }
            }
        };
        score.clamp(0.0, 100.0)
    }

    /// Severity of an unmet criterion.
    ///
    /// Security findings and type-checker errors are always critical; quality,
    /// coverage and test shortfalls are high past the configured cutoffs and
    /// medium otherwise; lint issues are low.
    pub fn classify(&self, criterion: Criterion, gap: f64, metrics: &ActualMetrics) -> GapSeverity {
        match criterion {
            Criterion::SecurityIssues | Criterion::TypeErrors => GapSeverity::Critical,
            Criterion::QualityScore | Criterion::TestCoverage => {
                if gap > self.config.coverage_high_shortfall {
                    GapSeverity::High
                } else {
                    GapSeverity::Medium
                }
            }
            Criterion::TestsPassed => {
                let cutoff = i64::from(self.config.tests_high_shortfall);
                if gap > cutoff as f64 || metrics.tests_failed > cutoff {
                    GapSeverity::High
                } else {
                    GapSeverity::Medium
                }
            }
            Criterion::LintErrors => GapSeverity::Low,
        }
    }
}

/// Worst severity first, ties broken by larger raw gap.
fn rank_gaps(gaps: &mut [Gap]) {
    gaps.sort_by(|a, b| match b.severity.cmp(&a.severity) {
        Ordering::Equal => b.gap.total_cmp(&a.gap),
        other => other,
    });
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{GoalSpec, SuccessCriteria};

    fn goal() -> Goal {
        GoalSpec::new(
            "Quality bar",
            SuccessCriteria {
                min_quality_score: 85.0,
                max_lint_errors: 0,
                max_type_errors: 0,
                max_security_issues: 0,
                min_test_coverage: 80.0,
                min_tests_passed: 6,
            },
        )
        .into_goal()
        .unwrap()
    }

    fn passing() -> ActualMetrics {
        ActualMetrics {
            quality_score: 92.0,
            test_coverage: 88.0,
            tests_passed: 8,
            ..ActualMetrics::default()
        }
    }

    #[test]
    fn test_all_criteria_met() {
        let report = ConsumptionValidator::default().score(&goal(), &passing()).unwrap();
        assert!(report.goal_achieved);
        assert!(report.gaps.is_empty());
        assert!((report.overall_score - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_single_failure_blocks_goal() {
        let metrics = ActualMetrics {
            lint_errors: 1,
            ..passing()
        };
        let report = ConsumptionValidator::default().score(&goal(), &metrics).unwrap();
        assert!(!report.goal_achieved);
        assert!(report.overall_score > 95.0);
        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].metric, Criterion::LintErrors);
        assert_eq!(report.gaps[0].severity, GapSeverity::Low);
    }

    #[test]
    fn test_early_iteration_gaps() {
        let metrics = ActualMetrics {
            quality_score: 55.0,
            lint_errors: 8,
            type_errors: 3,
            security_issues: 0,
            test_coverage: 45.0,
            tests_passed: 2,
            tests_failed: 4,
            ..ActualMetrics::default()
        };
        let report = ConsumptionValidator::default().score(&goal(), &metrics).unwrap();

        assert!(!report.goal_achieved);
        let metrics: Vec<Criterion> = report.gaps.iter().map(|g| g.metric).collect();
        assert_eq!(
            metrics,
            vec![
                Criterion::TypeErrors,
                Criterion::TestCoverage,
                Criterion::QualityScore,
                Criterion::TestsPassed,
                Criterion::LintErrors,
            ]
        );
        assert_eq!(report.gap_for(Criterion::TestCoverage).unwrap().severity, GapSeverity::High);
        assert_eq!(report.gap_for(Criterion::TestsPassed).unwrap().severity, GapSeverity::High);
        assert!((report.gap_for(Criterion::LintErrors).unwrap().gap - 8.0).abs() < f64::EPSILON);
        assert!(report.gap_for(Criterion::SecurityIssues).is_none());
    }

    #[test]
    fn test_security_is_always_critical() {
        let metrics = ActualMetrics {
            security_issues: 1,
            ..passing()
        };
        let report = ConsumptionValidator::default().score(&goal(), &metrics).unwrap();
        assert_eq!(report.worst_gap().unwrap().severity, GapSeverity::Critical);
    }

    #[test]
    fn test_small_shortfalls_are_medium() {
        let metrics = ActualMetrics {
            test_coverage: 70.0,
            tests_passed: 5,
            tests_failed: 1,
            ..passing()
        };
        let report = ConsumptionValidator::default().score(&goal(), &metrics).unwrap();
        assert!(report.gaps.iter().all(|g| g.severity == GapSeverity::Medium));
        // Larger raw gap first within the same severity.
        assert_eq!(report.gaps[0].metric, Criterion::TestCoverage);
    }

    #[test]
    fn test_many_failing_tests_raise_severity() {
        let metrics = ActualMetrics {
            tests_passed: 5,
            tests_failed: 4,
            ..passing()
        };
        let report = ConsumptionValidator::default().score(&goal(), &metrics).unwrap();
        assert_eq!(report.gaps[0].severity, GapSeverity::High);
    }

    #[test]
    fn test_maximum_sub_score_decay() {
        let validator = ConsumptionValidator::default();
        // Zero tolerance: decays over the 10-count span.
        assert!((validator.sub_score(Criterion::LintErrors, 0.0, 0.0) - 100.0).abs() < 1e-9);
        assert!((validator.sub_score(Criterion::LintErrors, 5.0, 0.0) - 50.0).abs() < 1e-9);
        assert!((validator.sub_score(Criterion::LintErrors, 25.0, 0.0)).abs() < 1e-9);
        // Large allowance: reaches zero at twice the maximum.
        assert!((validator.sub_score(Criterion::LintErrors, 20.0, 20.0) - 100.0).abs() < 1e-9);
        assert!((validator.sub_score(Criterion::LintErrors, 30.0, 20.0) - 50.0).abs() < 1e-9);
        assert!((validator.sub_score(Criterion::LintErrors, 40.0, 20.0)).abs() < 1e-9);
    }

    #[test]
    fn test_minimum_sub_score_caps_at_hundred() {
        let validator = ConsumptionValidator::default();
        assert!((validator.sub_score(Criterion::TestCoverage, 40.0, 80.0) - 50.0).abs() < 1e-9);
        assert!((validator.sub_score(Criterion::TestCoverage, 95.0, 80.0) - 100.0).abs() < 1e-9);
        assert!((validator.sub_score(Criterion::TestsPassed, 0.0, 0.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_metrics_produce_no_report() {
        let metrics = ActualMetrics {
            lint_errors: -1,
            ..passing()
        };
        let err = ConsumptionValidator::default().score(&goal(), &metrics).unwrap_err();
        assert_eq!(err.field, "metrics.lint_errors");
    }

    #[test]
    fn test_zero_weights_score_zero() {
        let mut config = ScoringConfig::default();
        config.weights.quality_score = 0.0;
        config.weights.test_coverage = 0.0;
        config.weights.tests_passed = 0.0;
        config.weights.lint_errors = 0.0;
        config.weights.type_errors = 0.0;
        config.weights.security_issues = 0.0;
        let report = ConsumptionValidator::new(config).score(&goal(), &passing()).unwrap();
        assert!(report.overall_score.abs() < f64::EPSILON);
        assert!(report.goal_achieved);
    }
}
