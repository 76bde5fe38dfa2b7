//! Command handlers against a SQLite store, as the binary runs them.

mod common;

use kaizen::adapters::sqlite::{initialize_database, SqliteLoopRepository};
use kaizen::cli::commands::loop_cmd::{self, LoopArgs, LoopCommands};
use kaizen::domain::models::{FeedbackLoop, LoopStatus};
use kaizen::domain::ports::LoopRepository;
use kaizen::Kaizen;

#[tokio::test]
async fn test_rejected_iteration_still_persists_failed_loop() {
    let (dir, db_path) = common::temp_db_path();
    let config = common::sqlite_config(&db_path);

    let goal_id = {
        let kaizen = Kaizen::open(&config).await.unwrap();
        let goal = kaizen
            .goals()
            .create_goal(common::goal_spec("Corrupted via CLI"))
            .await
            .unwrap();
        kaizen.flush().await;
        goal.id
    };

    // Claims two iterations but carries no history.
    let mut corrupted = FeedbackLoop::new(goal_id, 10);
    corrupted.transition_to(LoopStatus::Running).unwrap();
    corrupted.iteration = 2;
    let repository = SqliteLoopRepository::new(initialize_database(&config.persistence).await.unwrap());
    repository.save(&corrupted).await.unwrap();

    let metrics_path = dir.path().join("metrics.json");
    std::fs::write(&metrics_path, serde_json::to_string(&common::early_metrics()).unwrap()).unwrap();

    let args = LoopArgs {
        command: LoopCommands::Iterate {
            loop_id: corrupted.id.to_string(),
            session: "s1".to_string(),
            metrics: metrics_path,
        },
    };
    let err = loop_cmd::execute(args, &config, true).await.unwrap_err();
    assert!(err.to_string().contains("Iteration rejected"));

    let stored = repository.get(corrupted.id).await.unwrap().unwrap();
    assert_eq!(stored.status, LoopStatus::Failed);
    assert!(stored
        .stop_reason
        .as_deref()
        .is_some_and(|reason| reason.starts_with("corrupted on load")));
}

#[tokio::test]
async fn test_stop_command_persists_cancellation() {
    let (_dir, db_path) = common::temp_db_path();
    let config = common::sqlite_config(&db_path);

    let loop_id = {
        let kaizen = Kaizen::open(&config).await.unwrap();
        let goal = kaizen
            .goals()
            .create_goal(common::goal_spec("Stopped via CLI"))
            .await
            .unwrap();
        let started = kaizen.loops().start_loop(goal.id).await.unwrap();
        kaizen.flush().await;
        started.id
    };

    let args = LoopArgs {
        command: LoopCommands::Stop {
            id: loop_id.to_string(),
            reason: "superseded".to_string(),
        },
    };
    loop_cmd::execute(args, &config, true).await.unwrap();

    let kaizen = Kaizen::open(&config).await.unwrap();
    let stored = kaizen.loops().get_loop(loop_id).await.unwrap();
    assert_eq!(stored.status, LoopStatus::Cancelled);
    assert_eq!(stored.stop_reason.as_deref(), Some("superseded"));
}
