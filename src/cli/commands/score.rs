//! One-off scoring of a metrics snapshot against a goal.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use uuid::Uuid;

use crate::application::Kaizen;
use crate::cli::output::{gap_table, output, CommandOutput};
use crate::cli::{open, parse_id, read_document};
use crate::domain::models::{ActualMetrics, Config, ConsumptionReport};
use crate::services::ConsumptionValidator;

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Goal ID
    #[arg(short, long)]
    pub goal: String,
    /// Path to a YAML or JSON metrics snapshot
    #[arg(short, long)]
    pub metrics: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct ScoreOutput {
    pub goal_id: String,
    pub report: ConsumptionReport,
}

impl CommandOutput for ScoreOutput {
    fn to_human(&self) -> String {
        let verdict = if self.report.goal_achieved {
            "goal achieved"
        } else {
            "goal not yet achieved"
        };
        let mut text = format!(
            "Score: {:.2}/100 ({verdict}, {} gap(s))",
            self.report.overall_score,
            self.report.gaps.len()
        );
        let gaps = gap_table(&self.report.gaps);
        if !gaps.is_empty() {
            text.push('\n');
            text.push_str(&gaps);
        }
        text
    }
}

pub async fn execute(args: ScoreArgs, config: &Config, json_mode: bool) -> Result<()> {
    let goal_id = parse_id(&args.goal, "goal")?;
    let metrics: ActualMetrics = read_document(&args.metrics)?;

    let kaizen = open(config).await?;
    let result = score(&kaizen, config, goal_id, &metrics, json_mode).await;
    kaizen.flush().await;
    result
}

async fn score(
    kaizen: &Kaizen,
    config: &Config,
    goal_id: Uuid,
    metrics: &ActualMetrics,
    json_mode: bool,
) -> Result<()> {
    let goal = kaizen.goals().get_goal(goal_id).await?;
    let report = ConsumptionValidator::new(config.scoring.clone())
        .score(&goal, metrics)
        .context("Metrics rejected")?;

    output(
        &ScoreOutput {
            goal_id: goal_id.to_string(),
            report,
        },
        json_mode,
    );
    Ok(())
}
