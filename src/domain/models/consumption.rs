//! Scored evaluation of one metrics snapshot against a goal.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ActualMetrics, Criterion};

/// How urgently an unmet criterion needs attention.
///
/// Ordered so that `Critical > High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl GapSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for GapSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single unmet criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub metric: Criterion,
    /// `|actual - threshold|` in the criterion's native unit.
    pub gap: f64,
    pub severity: GapSeverity,
    pub actual: f64,
    pub threshold: f64,
}

/// Output of one scoring call. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionReport {
    /// Weighted score in `[0, 100]`.
    pub overall_score: f64,
    /// True iff every criterion is individually met.
    pub goal_achieved: bool,
    /// Unmet criteria, worst first.
    pub gaps: Vec<Gap>,
    pub actual_metrics: ActualMetrics,
}

impl ConsumptionReport {
    /// The single worst remaining gap, if any.
    pub fn worst_gap(&self) -> Option<&Gap> {
        self.gaps.first()
    }

    pub fn gap_for(&self, criterion: Criterion) -> Option<&Gap> {
        self.gaps.iter().find(|g| g.metric == criterion)
    }
}
