//! Feedback loop CLI commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::Cell;

use crate::application::Kaizen;
use crate::cli::output::{gap_table, output, status_cell, table, CommandOutput};
use crate::cli::{open, parse_id, read_document};
use crate::domain::models::{ActualMetrics, Config, FeedbackLoop, Iteration, LoopStatus};

#[derive(Args, Debug)]
pub struct LoopArgs {
    #[command(subcommand)]
    pub command: LoopCommands,
}

#[derive(Subcommand, Debug)]
pub enum LoopCommands {
    /// Start a feedback loop for a goal
    Start {
        /// Goal ID
        goal_id: String,
    },
    /// Report one attempt's metrics and advance the loop
    Iterate {
        /// Loop ID
        loop_id: String,
        /// Opaque identifier of the session that produced the attempt
        #[arg(short, long)]
        session: String,
        /// Path to a YAML or JSON metrics snapshot
        #[arg(short, long)]
        metrics: PathBuf,
    },
    /// Show a loop with its score history
    Show {
        /// Loop ID
        id: String,
    },
    /// List loops
    List {
        /// Only loops for this goal
        #[arg(short, long)]
        goal: Option<String>,
    },
    /// Cancel a loop
    Stop {
        /// Loop ID
        id: String,
        /// Why the loop is being stopped
        #[arg(short, long, default_value = "stopped by operator")]
        reason: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct LoopOutput {
    pub id: String,
    pub goal_id: String,
    pub status: LoopStatus,
    pub iteration: u32,
    pub max_iterations: u32,
    pub latest_score: Option<f64>,
    pub improvement_rate: f64,
    pub is_converging: bool,
    pub stop_reason: Option<String>,
}

impl From<&FeedbackLoop> for LoopOutput {
    fn from(feedback_loop: &FeedbackLoop) -> Self {
        Self {
            id: feedback_loop.id.to_string(),
            goal_id: feedback_loop.goal_id.to_string(),
            status: feedback_loop.status,
            iteration: feedback_loop.iteration,
            max_iterations: feedback_loop.max_iterations,
            latest_score: feedback_loop.latest_score(),
            improvement_rate: feedback_loop.convergence_metrics.improvement_rate,
            is_converging: feedback_loop.convergence_metrics.is_converging,
            stop_reason: feedback_loop.stop_reason.clone(),
        }
    }
}

impl CommandOutput for LoopOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Loop: {}", self.id),
            format!("Goal: {}", self.goal_id),
            format!("Status: {}", self.status),
            format!("Iteration: {}/{}", self.iteration, self.max_iterations),
        ];
        if let Some(score) = self.latest_score {
            lines.push(format!("Latest score: {score:.2}"));
        }
        lines.push(format!("Improvement rate: {:+.2}", self.improvement_rate));
        if let Some(reason) = &self.stop_reason {
            lines.push(format!("Stop reason: {reason}"));
        }
        lines.join("\n")
    }
}

#[derive(Debug, serde::Serialize)]
pub struct LoopDetailOutput {
    #[serde(flatten)]
    pub summary: LoopOutput,
    pub iterations: Vec<Iteration>,
}

impl CommandOutput for LoopDetailOutput {
    fn to_human(&self) -> String {
        let mut text = self.summary.to_human();
        if self.iterations.is_empty() {
            return text;
        }

        let mut history = table(&["#", "Session", "Score", "Change", "Gaps", "Worst gap"]);
        for (index, iteration) in self.iterations.iter().enumerate() {
            let report = &iteration.consumption_report;
            history.add_row(vec![
                Cell::new(index + 1),
                Cell::new(&iteration.session_id),
                Cell::new(format!("{:.2}", report.overall_score)),
                Cell::new(format!("{:+.2}", iteration.score_improvement)),
                Cell::new(report.gaps.len()),
                Cell::new(
                    report
                        .worst_gap()
                        .map_or_else(|| "-".to_string(), |g| format!("{} ({})", g.metric, g.severity)),
                ),
            ]);
        }
        text.push_str(&format!("\n\nHistory:\n{history}"));
        text
    }
}

#[derive(Debug, serde::Serialize)]
pub struct IterationOutput {
    pub loop_id: String,
    pub iteration: u32,
    pub status: LoopStatus,
    #[serde(flatten)]
    pub record: Iteration,
}

impl CommandOutput for IterationOutput {
    fn to_human(&self) -> String {
        let report = &self.record.consumption_report;
        let mut lines = vec![format!(
            "Iteration {} recorded: score {:.2} ({:+.2}), loop is {}",
            self.iteration, report.overall_score, self.record.score_improvement, self.status
        )];
        let gaps = gap_table(&report.gaps);
        if !gaps.is_empty() {
            lines.push(gaps);
        }
        if let Some(feedback) = &self.record.feedback {
            lines.push(feedback.summary.clone());
            for callout in &feedback.callouts {
                lines.push(format!("  - {}", callout.message));
            }
        }
        lines.join("\n")
    }
}

#[derive(Debug, serde::Serialize)]
pub struct LoopListOutput {
    pub loops: Vec<LoopOutput>,
    pub total: usize,
}

impl CommandOutput for LoopListOutput {
    fn to_human(&self) -> String {
        if self.loops.is_empty() {
            return "No loops found.".to_string();
        }

        let mut loops = table(&["ID", "Goal", "Status", "Iteration", "Score"]);
        for feedback_loop in &self.loops {
            loops.add_row(vec![
                Cell::new(&feedback_loop.id),
                Cell::new(&feedback_loop.goal_id),
                status_cell(feedback_loop.status),
                Cell::new(format!(
                    "{}/{}",
                    feedback_loop.iteration, feedback_loop.max_iterations
                )),
                Cell::new(
                    feedback_loop
                        .latest_score
                        .map_or_else(|| "-".to_string(), |s| format!("{s:.2}")),
                ),
            ]);
        }
        format!("Found {} loop(s):\n{loops}", self.total)
    }
}

/// Run a loop command. Queued snapshots are flushed whether or not it
/// succeeds, so a loop failed while handling a rejected call stays failed.
pub async fn execute(args: LoopArgs, config: &Config, json_mode: bool) -> Result<()> {
    let kaizen = open(config).await?;
    let result = run(args.command, &kaizen, json_mode).await;
    kaizen.flush().await;
    result
}

async fn run(command: LoopCommands, kaizen: &Kaizen, json_mode: bool) -> Result<()> {
    let loops = kaizen.loops();

    match command {
        LoopCommands::Start { goal_id } => {
            let started = loops.start_loop(parse_id(&goal_id, "goal")?).await?;
            output(&LoopOutput::from(&started), json_mode);
        }
        LoopCommands::Iterate {
            loop_id,
            session,
            metrics,
        } => {
            let loop_id = parse_id(&loop_id, "loop")?;
            let metrics: ActualMetrics = read_document(&metrics)?;
            let record = loops
                .execute_iteration(loop_id, session, metrics)
                .await
                .context("Iteration rejected")?;
            let current = loops.get_loop(loop_id).await?;
            output(
                &IterationOutput {
                    loop_id: loop_id.to_string(),
                    iteration: current.iteration,
                    status: current.status,
                    record,
                },
                json_mode,
            );
        }
        LoopCommands::Show { id } => {
            let feedback_loop = loops.get_loop(parse_id(&id, "loop")?).await?;
            output(
                &LoopDetailOutput {
                    summary: LoopOutput::from(&feedback_loop),
                    iterations: feedback_loop.iterations,
                },
                json_mode,
            );
        }
        LoopCommands::List { goal } => {
            let goal_id = goal.as_deref().map(|g| parse_id(g, "goal")).transpose()?;
            let all = loops.list_loops(goal_id).await?;
            let loops: Vec<LoopOutput> = all.iter().map(LoopOutput::from).collect();
            let total = loops.len();
            output(&LoopListOutput { loops, total }, json_mode);
        }
        LoopCommands::Stop { id, reason } => {
            let stopped = loops.stop_loop(parse_id(&id, "loop")?, reason).await?;
            output(&LoopOutput::from(&stopped), json_mode);
        }
    }

    Ok(())
}
