//! Durable snapshots survive a restart and are re-validated on load.

mod common;

use kaizen::adapters::sqlite::{initialize_database, SqliteLoopRepository};
use kaizen::domain::models::{FeedbackLoop, LoopStatus};
use kaizen::domain::ports::LoopRepository;
use kaizen::{DomainError, Kaizen};

#[tokio::test]
async fn test_loop_resumes_after_restart() {
    common::setup_test_logging();
    let (_dir, db_path) = common::temp_db_path();
    let config = common::sqlite_config(&db_path);

    let (goal_id, loop_id) = {
        let kaizen = Kaizen::open(&config).await.unwrap();
        let goal = kaizen
            .goals()
            .create_goal(common::goal_spec("Durable goal"))
            .await
            .unwrap();
        let started = kaizen.loops().start_loop(goal.id).await.unwrap();
        kaizen
            .loops()
            .execute_iteration(started.id, "s1", common::early_metrics())
            .await
            .unwrap();
        assert_eq!(kaizen.flush().await, 0);
        (goal.id, started.id)
    };

    let kaizen = Kaizen::open(&config).await.unwrap();

    let goal = kaizen.goals().get_goal(goal_id).await.unwrap();
    assert_eq!(goal.title, "Durable goal");
    assert_eq!(goal.test_specs.len(), 2);

    let resumed = kaizen.loops().get_loop(loop_id).await.unwrap();
    assert_eq!(resumed.status, LoopStatus::Running);
    assert_eq!(resumed.iteration, 1);
    assert_eq!(resumed.convergence_metrics.score_history.len(), 1);

    let iteration = kaizen
        .loops()
        .execute_iteration(loop_id, "s2", common::passing_metrics())
        .await
        .unwrap();
    assert!(iteration.consumption_report.goal_achieved);
    assert!(iteration.score_improvement > 0.0);

    let finished = kaizen.loops().get_loop(loop_id).await.unwrap();
    assert_eq!(finished.status, LoopStatus::GoalAchieved);
    assert_eq!(finished.iteration, 2);

    let listed = kaizen.loops().list_loops(Some(goal_id)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, loop_id);
    assert_eq!(kaizen.goals().list_goals().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_corrupted_loop_is_failed_on_load() {
    let (_dir, db_path) = common::temp_db_path();
    let config = common::sqlite_config(&db_path);

    let goal_id = {
        let kaizen = Kaizen::open(&config).await.unwrap();
        let goal = kaizen
            .goals()
            .create_goal(common::goal_spec("Corruption"))
            .await
            .unwrap();
        kaizen.flush().await;
        goal.id
    };

    // Claims two iterations but carries no history.
    let mut corrupted = FeedbackLoop::new(goal_id, 10);
    corrupted.transition_to(LoopStatus::Running).unwrap();
    corrupted.iteration = 2;
    let pool = initialize_database(&config.persistence).await.unwrap();
    SqliteLoopRepository::new(pool.clone()).save(&corrupted).await.unwrap();

    let kaizen = Kaizen::open(&config).await.unwrap();
    let loaded = kaizen.loops().get_loop(corrupted.id).await.unwrap();
    assert_eq!(loaded.status, LoopStatus::Failed);
    assert!(loaded
        .stop_reason
        .as_deref()
        .is_some_and(|reason| reason.starts_with("corrupted on load")));

    let err = kaizen
        .loops()
        .execute_iteration(corrupted.id, "s1", common::early_metrics())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidState { status: LoopStatus::Failed, .. }));

    // The failure itself is persisted.
    kaizen.flush().await;
    let stored = SqliteLoopRepository::new(pool).get(corrupted.id).await.unwrap().unwrap();
    assert_eq!(stored.status, LoopStatus::Failed);
}

#[tokio::test]
async fn test_unknown_ids_after_restart() {
    let (_dir, db_path) = common::temp_db_path();
    let kaizen = Kaizen::open(&common::sqlite_config(&db_path)).await.unwrap();
    let id = uuid::Uuid::new_v4();

    assert!(matches!(kaizen.goals().get_goal(id).await, Err(DomainError::GoalNotFound(_))));
    assert!(matches!(kaizen.loops().get_loop(id).await, Err(DomainError::LoopNotFound(_))));
    assert!(kaizen.loops().list_loops(None).await.unwrap().is_empty());
}
