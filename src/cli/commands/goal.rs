//! Goal CLI commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::Cell;

use crate::application::Kaizen;
use crate::cli::output::{output, table, truncate, CommandOutput};
use crate::cli::{open, parse_id, read_document};
use crate::domain::models::{Config, Goal, GoalSpec};

#[derive(Args, Debug)]
pub struct GoalArgs {
    #[command(subcommand)]
    pub command: GoalCommands,
}

#[derive(Subcommand, Debug)]
pub enum GoalCommands {
    /// Create a goal from a YAML or JSON specification
    Create {
        /// Path to the goal specification
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Show goal details
    Show {
        /// Goal ID
        id: String,
    },
    /// List goals
    List,
}

#[derive(Debug, serde::Serialize)]
pub struct GoalOutput {
    pub id: String,
    pub title: String,
    pub priority: String,
    pub test_specs: usize,
    pub created_at: String,
}

impl From<&Goal> for GoalOutput {
    fn from(goal: &Goal) -> Self {
        Self {
            id: goal.id.to_string(),
            title: goal.title.clone(),
            priority: goal.priority.as_str().to_string(),
            test_specs: goal.test_specs.len(),
            created_at: goal.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct GoalListOutput {
    pub goals: Vec<GoalOutput>,
    pub total: usize,
}

impl CommandOutput for GoalListOutput {
    fn to_human(&self) -> String {
        if self.goals.is_empty() {
            return "No goals found.".to_string();
        }

        let mut goals = table(&["ID", "Title", "Priority", "Tests", "Created"]);
        for goal in &self.goals {
            goals.add_row(vec![
                Cell::new(&goal.id),
                Cell::new(truncate(&goal.title, 40)),
                Cell::new(&goal.priority),
                Cell::new(goal.test_specs),
                Cell::new(&goal.created_at),
            ]);
        }
        format!("Found {} goal(s):\n{goals}", self.total)
    }
}

#[derive(Debug, serde::Serialize)]
pub struct GoalDetailOutput {
    pub goal: Goal,
}

impl CommandOutput for GoalDetailOutput {
    fn to_human(&self) -> String {
        let goal = &self.goal;
        let criteria = &goal.success_criteria;
        let mut lines = vec![
            format!("Goal: {}", goal.title),
            format!("ID: {}", goal.id),
            format!("Priority: {}", goal.priority.as_str()),
        ];
        if !goal.description.is_empty() {
            lines.push(format!("Description: {}", goal.description));
        }
        if let Some(issue) = goal.issue_number {
            lines.push(format!("Issue: #{issue}"));
        }

        lines.push("\nSuccess criteria:".to_string());
        lines.push(format!("  quality score     >= {:.1}", criteria.min_quality_score));
        lines.push(format!("  test coverage     >= {:.1}%", criteria.min_test_coverage));
        lines.push(format!("  tests passed      >= {}", criteria.min_tests_passed));
        lines.push(format!("  lint errors       <= {}", criteria.max_lint_errors));
        lines.push(format!("  type errors       <= {}", criteria.max_type_errors));
        lines.push(format!("  security issues   <= {}", criteria.max_security_issues));

        if !goal.test_specs.is_empty() {
            let mut specs = table(&["ID", "Name", "Kind", "Target", "Depends on"]);
            for spec in &goal.test_specs {
                specs.add_row(vec![
                    Cell::new(&spec.id),
                    Cell::new(truncate(&spec.name, 30)),
                    Cell::new(format!("{:?}", spec.kind).to_lowercase()),
                    Cell::new(truncate(&spec.target, 30)),
                    Cell::new(spec.dependencies.join(", ")),
                ]);
            }
            lines.push(format!("\nTest specs:\n{specs}"));
        }

        if !goal.acceptance_criteria.is_empty() {
            lines.push("\nAcceptance criteria:".to_string());
            for item in &goal.acceptance_criteria {
                lines.push(format!("  - {item}"));
            }
        }

        lines.join("\n")
    }
}

#[derive(Debug, serde::Serialize)]
pub struct GoalCreatedOutput {
    pub message: String,
    pub goal: GoalOutput,
}

impl CommandOutput for GoalCreatedOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }
}

/// Run a goal command. Queued snapshots are flushed whether or not it succeeds.
pub async fn execute(args: GoalArgs, config: &Config, json_mode: bool) -> Result<()> {
    let kaizen = open(config).await?;
    let result = run(args.command, &kaizen, json_mode).await;
    kaizen.flush().await;
    result
}

async fn run(command: GoalCommands, kaizen: &Kaizen, json_mode: bool) -> Result<()> {
    let goals = kaizen.goals();

    match command {
        GoalCommands::Create { file } => {
            let spec: GoalSpec = read_document(&file)?;
            let goal = goals.create_goal(spec).await.context("Goal rejected")?;
            output(
                &GoalCreatedOutput {
                    message: format!("Created goal {} ({})", goal.id, goal.title),
                    goal: GoalOutput::from(&goal),
                },
                json_mode,
            );
        }
        GoalCommands::Show { id } => {
            let goal = goals.get_goal(parse_id(&id, "goal")?).await?;
            output(&GoalDetailOutput { goal }, json_mode);
        }
        GoalCommands::List => {
            let all = goals.list_goals().await?;
            let goals: Vec<GoalOutput> = all.iter().map(GoalOutput::from).collect();
            let total = goals.len();
            output(&GoalListOutput { goals, total }, json_mode);
        }
    }

    Ok(())
}
