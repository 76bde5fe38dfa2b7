use criterion::{criterion_group, criterion_main, Criterion};
use kaizen::domain::models::{record_score, ActualMetrics, ConvergenceMetrics, GoalSpec, SuccessCriteria};
use kaizen::ConsumptionValidator;

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

fn bench_score(c: &mut Criterion) {
    let goal = GoalSpec::new("bench", criteria()).into_goal().unwrap();
    let validator = ConsumptionValidator::default();
    let metrics = ActualMetrics {
        quality_score: 55.0,
        lint_errors: 8,
        type_errors: 3,
        test_coverage: 45.0,
        tests_passed: 2,
        tests_failed: 4,
        ..ActualMetrics::default()
    };

    c.bench_function("validator.score.all_gaps", |b| {
        b.iter(|| validator.score(&goal, &metrics).unwrap());
    });
}

fn bench_record_score(c: &mut Criterion) {
    c.bench_function("convergence.record_score.100", |b| {
        b.iter(|| {
            let mut metrics = ConvergenceMetrics::default();
            for step in 0..100 {
                record_score(&mut metrics, f64::from(step % 100), 3, 1.0);
            }
            metrics
        });
    });
}

criterion_group!(benches, bench_score, bench_record_score);
criterion_main!(benches);
