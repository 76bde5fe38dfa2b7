//! Refinement feedback text for the next attempt.
//!
//! The text is opaque to the loop itself; it is handed back to the session
//! runner, which may seed its next attempt with it.

use crate::domain::models::{ConsumptionReport, Criterion, Feedback, Gap, GapCallout};

/// Build the feedback for one scored iteration.
pub fn build_feedback(
    report: &ConsumptionReport,
    improvement: f64,
    iteration: u32,
    max_iterations: u32,
) -> Feedback {
    Feedback {
        summary: summarize(report, improvement, iteration, max_iterations),
        callouts: report
            .gaps
            .iter()
            .map(|gap| GapCallout {
                criterion: gap.metric,
                severity: gap.severity,
                message: next_action(gap, report),
            })
            .collect(),
    }
}

/// One line naming the score, the delta and the worst remaining gap.
pub fn summarize(
    report: &ConsumptionReport,
    improvement: f64,
    iteration: u32,
    max_iterations: u32,
) -> String {
    let head = format!(
        "Iteration {iteration}/{max_iterations}: score {:.2}/100 ({improvement:+.2}).",
        report.overall_score
    );

    match report.worst_gap() {
        None => format!("{head} All success criteria met."),
        Some(gap) => format!(
            "{head} Worst gap: {} at {} vs target {} ({} severity, {} remaining).",
            gap.metric,
            amount(gap.metric, gap.actual),
            amount(gap.metric, gap.threshold),
            gap.severity,
            report.gaps.len()
        ),
    }
}

fn next_action(gap: &Gap, report: &ConsumptionReport) -> String {
    let n = amount(gap.metric, gap.gap);
    match gap.metric {
        Criterion::QualityScore => format!(
            "Raise the quality score by {n} points to at least {}",
            amount(gap.metric, gap.threshold)
        ),
        Criterion::LintErrors => format!("Fix {n} lint issue(s) over the allowed maximum"),
        Criterion::TypeErrors => format!("Resolve {n} type error(s) over the allowed maximum"),
        Criterion::SecurityIssues => format!("Remediate {n} security finding(s)"),
        Criterion::TestCoverage => format!(
            "Raise test coverage by {n} points to {}%",
            amount(gap.metric, gap.threshold)
        ),
        Criterion::TestsPassed => {
            let failing = report.actual_metrics.tests_failed;
            if failing > 0 {
                format!("Get {n} more test(s) passing; {failing} currently failing")
            } else {
                format!("Add or fix {n} test(s) so that they pass")
            }
        }
    }
}

fn amount(criterion: Criterion, value: f64) -> String {
    match criterion {
        Criterion::QualityScore | Criterion::TestCoverage => format!("{value:.1}"),
        _ => format!("{value:.0}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ActualMetrics, GapSeverity};

    fn report_with_gaps() -> ConsumptionReport {
        ConsumptionReport {
            overall_score: 61.25,
            goal_achieved: false,
            gaps: vec![
                Gap {
                    metric: Criterion::TestCoverage,
                    gap: 35.0,
                    severity: GapSeverity::High,
                    actual: 45.0,
                    threshold: 80.0,
                },
                Gap {
                    metric: Criterion::TestsPassed,
                    gap: 4.0,
                    severity: GapSeverity::High,
                    actual: 2.0,
                    threshold: 6.0,
                },
                Gap {
                    metric: Criterion::LintErrors,
                    gap: 8.0,
                    severity: GapSeverity::Low,
                    actual: 8.0,
                    threshold: 0.0,
                },
            ],
            actual_metrics: ActualMetrics {
                tests_failed: 4,
                ..ActualMetrics::default()
            },
        }
    }

    #[test]
    fn test_summary_names_score_delta_and_worst_gap() {
        let summary = summarize(&report_with_gaps(), 6.5, 2, 10);
        assert_eq!(
            summary,
            "Iteration 2/10: score 61.25/100 (+6.50). Worst gap: test_coverage at 45.0 vs target 80.0 (high severity, 3 remaining)."
        );
    }

    #[test]
    fn test_summary_when_goal_met() {
        let report = ConsumptionReport {
            overall_score: 100.0,
            goal_achieved: true,
            gaps: vec![],
            actual_metrics: ActualMetrics::default(),
        };
        let summary = summarize(&report, -0.5, 5, 10);
        assert!(summary.ends_with("All success criteria met."));
        assert!(summary.contains("(-0.50)"));
    }

    #[test]
    fn test_callouts_follow_gap_order() {
        let feedback = build_feedback(&report_with_gaps(), 0.0, 1, 10);
        assert_eq!(feedback.callouts.len(), 3);
        assert_eq!(feedback.callouts[0].criterion, Criterion::TestCoverage);
        assert_eq!(feedback.callouts[0].message, "Raise test coverage by 35.0 points to 80.0%");
        assert_eq!(
            feedback.callouts[1].message,
            "Get 4 more test(s) passing; 4 currently failing"
        );
        assert_eq!(
            feedback.callouts[2].message,
            "Fix 8 lint issue(s) over the allowed maximum"
        );
    }
}
