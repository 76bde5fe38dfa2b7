//! Convergence math over a loop's score history.
//!
//! Two quantities drive the plateau decision:
//!
//! - **`improvement_rate`** -- the trailing mean of the last `window` score
//!   deltas (all available deltas if fewer exist). Measured in score points.
//! - **`is_converging`** -- true once the improvement rate has stayed below
//!   the convergence threshold for `window` consecutive iterations.
//!
//! A delta is `score[i] - score[i - 1]`; the first iteration contributes no
//! delta and no rate. Deltas are signed, so regressions and oscillation with
//! no net progress count as stalled.

use super::ConvergenceMetrics;

/// Successive differences of a score history.
pub fn score_deltas(history: &[f64]) -> Vec<f64> {
    history.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// Trailing mean of the last `window` deltas. 0.0 when no delta exists.
pub fn improvement_rate(history: &[f64], window: usize) -> f64 {
    let deltas = score_deltas(history);
    let trailing = trailing(&deltas, window);
    if trailing.is_empty() {
        return 0.0;
    }
    trailing.iter().sum::<f64>() / trailing.len() as f64
}

/// Number of most recent iterations, counted backwards, whose improvement
/// rate stayed below `threshold`. Iterations without a delta never count.
pub fn stalled_streak(history: &[f64], window: usize, threshold: f64) -> usize {
    (2..=history.len())
        .rev()
        .take_while(|&end| improvement_rate(&history[..end], window) < threshold)
        .count()
}

/// True when the improvement rate has stayed below `threshold` for the last
/// `window` iterations.
pub fn is_converging(history: &[f64], window: usize, threshold: f64) -> bool {
    stalled_streak(history, window, threshold) >= window.max(1)
}

/// Append `score` and recompute the running statistics.
///
/// Returns the score improvement over the previous entry (0.0 for the first).
/// Once set, `is_converging` stays set.
pub fn record_score(
    metrics: &mut ConvergenceMetrics,
    score: f64,
    window: usize,
    threshold: f64,
) -> f64 {
    let improvement = metrics
        .score_history
        .last()
        .map_or(0.0, |previous| score - previous);

    metrics.score_history.push(score);
    metrics.improvement_rate = improvement_rate(&metrics.score_history, window);
    metrics.is_converging =
        metrics.is_converging || is_converging(&metrics.score_history, window, threshold);

    improvement
}

fn trailing(deltas: &[f64], window: usize) -> &[f64] {
    let start = deltas.len().saturating_sub(window.max(1));
    &deltas[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deltas() {
        assert!(score_deltas(&[]).is_empty());
        assert!(score_deltas(&[50.0]).is_empty());
        assert_eq!(score_deltas(&[50.0, 55.0, 54.0]), vec![5.0, -1.0]);
    }

    #[test]
    fn test_improvement_rate_uses_available_deltas() {
        assert!((improvement_rate(&[40.0], 3) - 0.0).abs() < f64::EPSILON);
        // Only one delta available.
        assert!((improvement_rate(&[40.0, 50.0], 3) - 10.0).abs() < 1e-9);
        // Trailing window of 3 ignores the first delta.
        let history = [10.0, 40.0, 42.0, 44.0, 46.0];
        assert!((improvement_rate(&history, 3) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_convergence_requires_full_window() {
        // Two small deltas are not enough for a window of 3.
        assert!(!is_converging(&[50.0, 50.2, 50.4], 3, 1.0));
        assert!(is_converging(&[50.0, 50.2, 50.4, 50.5], 3, 1.0));
    }

    #[test]
    fn test_large_jump_keeps_rate_above_threshold() {
        let history = [50.0, 50.2, 55.0, 55.1];
        assert_eq!(stalled_streak(&history, 3, 1.0), 0);
        assert!(!is_converging(&history, 3, 1.0));
    }

    #[test]
    fn test_oscillation_without_net_progress_converges() {
        // Every delta is 2 points, but the trailing mean hovers near zero.
        let history = [60.0, 62.0, 60.0, 62.0, 60.0];
        assert_eq!(stalled_streak(&history, 3, 1.0), 3);
        assert!(is_converging(&history, 3, 1.0));
        assert!(!is_converging(&history[..4], 3, 1.0));
    }

    #[test]
    fn test_regressions_count_as_stalled() {
        let history = [60.0, 58.0, 57.0, 57.5];
        assert!(is_converging(&history, 3, 1.0));
    }

    #[test]
    fn test_record_score_tracks_improvement() {
        let mut metrics = ConvergenceMetrics::default();
        assert!((record_score(&mut metrics, 40.0, 3, 1.0) - 0.0).abs() < f64::EPSILON);
        assert!((record_score(&mut metrics, 55.0, 3, 1.0) - 15.0).abs() < 1e-9);
        assert_eq!(metrics.score_history, vec![40.0, 55.0]);
        assert!(!metrics.is_converging);

        record_score(&mut metrics, 55.5, 3, 1.0);
        record_score(&mut metrics, 55.6, 3, 1.0);
        assert!(!metrics.is_converging, "15-point jump still in window");
        record_score(&mut metrics, 55.7, 3, 1.0);
        record_score(&mut metrics, 55.8, 3, 1.0);
        assert!(!metrics.is_converging, "rate has been low for two iterations only");
        record_score(&mut metrics, 55.9, 3, 1.0);
        assert!(metrics.is_converging);

        // Sticky once set.
        record_score(&mut metrics, 70.0, 3, 1.0);
        assert!(metrics.is_converging);
    }
}
