//! Command-line interface.
//!
//! Every invocation is a fresh process, so the CLI always runs over the
//! configured durable backend and flushes pending snapshots before exiting.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::application::Kaizen;
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

#[derive(Parser)]
#[command(name = "kaizen", version, about = "Drive goals to completion through scored feedback loops")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .kaizen/config.yaml and .kaizen/local.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create and inspect goals
    Goal(commands::goal::GoalArgs),
    /// Start, iterate, inspect and stop feedback loops
    Loop(commands::loop_cmd::LoopArgs),
    /// Score a metrics snapshot against a goal without recording it
    Score(commands::score::ScoreArgs),
}

/// Load configuration from an explicit file or the project hierarchy.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Open the goal store and orchestrator over the configured backend.
pub async fn open(config: &Config) -> Result<Kaizen> {
    Kaizen::open(config)
        .await
        .context("Failed to open kaizen state store")
}

/// Read a YAML or JSON document.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).with_context(|| format!("Invalid {what} id: {raw}"))
}

/// Print an error in the selected output mode and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
