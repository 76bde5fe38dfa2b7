//! Output formatting utilities for the CLI.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use crate::domain::models::{Gap, GapSeverity, LoopStatus};

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to at most `max_len` characters, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// A table with bold headers that wraps to the terminal width.
pub fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

pub fn status_cell(status: LoopStatus) -> Cell {
    let color = match status {
        LoopStatus::Pending => Color::Grey,
        LoopStatus::Running => Color::Cyan,
        LoopStatus::GoalAchieved => Color::Green,
        LoopStatus::MaxIterationsReached | LoopStatus::Converged => Color::Yellow,
        LoopStatus::Cancelled => Color::DarkGrey,
        LoopStatus::Failed => Color::Red,
    };
    Cell::new(status.as_str()).fg(color)
}

fn severity_cell(severity: GapSeverity) -> Cell {
    let color = match severity {
        GapSeverity::Critical => Color::Red,
        GapSeverity::High => Color::Magenta,
        GapSeverity::Medium => Color::Yellow,
        GapSeverity::Low => Color::Grey,
    };
    Cell::new(severity.as_str()).fg(color)
}

/// Ranked gaps as a table; empty string when there are none.
pub fn gap_table(gaps: &[Gap]) -> String {
    if gaps.is_empty() {
        return String::new();
    }
    let mut gap_table = table(&["Criterion", "Severity", "Actual", "Target", "Gap"]);
    for gap in gaps {
        gap_table.add_row(vec![
            Cell::new(gap.metric.as_str()),
            severity_cell(gap.severity),
            Cell::new(format!("{:.1}", gap.actual)),
            Cell::new(format!("{:.1}", gap.threshold)),
            Cell::new(format!("{:.1}", gap.gap)),
        ]);
    }
    gap_table.to_string()
}
