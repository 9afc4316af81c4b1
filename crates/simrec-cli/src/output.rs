//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use simrec_domain::{ItemRef, Score, SimilarItems, SimilarityPair};
use simrec_engine::RecomputeReport;
use std::collections::HashMap;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a list of catalog items.
    pub fn format_items(&self, items: &[ItemRef]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = items
                    .iter()
                    .map(|item| serde_json::json!({ "kind": item.kind, "id": item.id }))
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(join_lines(items.iter().map(ToString::to_string))),
            OutputFormat::Table => {
                if items.is_empty() {
                    return Ok(self.colorize("No items found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Kind", "ID"]);
                for item in items {
                    builder.push_record([item.kind.clone(), item.id.to_string()]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format a recorded score.
    pub fn format_score(&self, score: &Score) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "id": score.id,
                "actor": score.actor_key.as_str(),
                "item": score.item.to_string(),
                "value": score.value,
            }))?),
            OutputFormat::Quiet => Ok(score.value.to_string()),
            OutputFormat::Table => Ok(self.success(&format!(
                "Score recorded: {} rated {} {}",
                score.actor_key, score.item, score.value
            ))),
        }
    }

    /// Format a single score value.
    pub fn format_value(&self, value: f64) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string(&serde_json::json!({ "value": value }))?),
            _ => Ok(value.to_string()),
        }
    }

    /// Format all scores of an item, ordered by actor key.
    pub fn format_scores(&self, scores: &HashMap<String, f64>) -> Result<String> {
        let mut rows: Vec<(&String, &f64)> = scores.iter().collect();
        rows.sort_by(|l, r| l.0.cmp(r.0));

        match self.format {
            OutputFormat::Json => {
                let json: serde_json::Map<String, serde_json::Value> = rows
                    .iter()
                    .map(|(actor, value)| ((*actor).clone(), serde_json::json!(value)))
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(join_lines(
                rows.iter().map(|(actor, value)| format!("{}\t{}", actor, value)),
            )),
            OutputFormat::Table => {
                if rows.is_empty() {
                    return Ok(self.colorize("No scores found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Actor", "Score"]);
                for (actor, value) in rows {
                    builder.push_record([actor.clone(), value.to_string()]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format similar items, keeping only those in `live`.
    pub fn format_similar(&self, similar: &SimilarItems, live: &[ItemRef]) -> Result<String> {
        let rows: Vec<(&ItemRef, f64)> = similar
            .scored()
            .filter(|(item, _)| live.contains(item))
            .collect();

        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = rows
                    .iter()
                    .map(|(item, score)| {
                        serde_json::json!({ "item": item.to_string(), "score": score })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(join_lines(rows.iter().map(|(item, _)| item.to_string()))),
            OutputFormat::Table => {
                if rows.is_empty() {
                    return Ok(self.colorize(
                        &format!("No items similar to {}.", similar.target()),
                        "yellow",
                    ));
                }
                let mut builder = Builder::default();
                builder.push_record(["#", "Item", "Similarity"]);
                for (rank, (item, score)) in rows.iter().enumerate() {
                    builder.push_record([(rank + 1).to_string(), item.to_string(), score.to_string()]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format similarity pairs.
    pub fn format_pairs(&self, pairs: &[SimilarityPair]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = pairs
                    .iter()
                    .map(|p| {
                        serde_json::json!({
                            "id": p.id,
                            "item_a": p.item_a.to_string(),
                            "item_b": p.item_b.to_string(),
                            "score": p.score,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(join_lines(
                pairs.iter().map(|p| format!("{}\t{}\t{}", p.item_a, p.item_b, p.score)),
            )),
            OutputFormat::Table => {
                if pairs.is_empty() {
                    return Ok(self.colorize("No pairs found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["ID", "Item A", "Item B", "Score"]);
                for p in pairs {
                    builder.push_record([
                        p.id.to_string(),
                        p.item_a.to_string(),
                        p.item_b.to_string(),
                        p.score.to_string(),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format the outcome of a recompute.
    pub fn format_report(&self, report: &RecomputeReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "target": report.target.to_string(),
                "neighborhood": report.neighborhood.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "pairs_written": report.pairs_written,
                "pairs_deleted": report.pairs_zeroed,
                "items_purged": report.items_purged,
            }))?),
            OutputFormat::Quiet => Ok(report.pairs_written.to_string()),
            OutputFormat::Table => Ok(self.success(&format!(
                "Recomputed {} over {} item(s): {} written, {} deleted, {} purged",
                report.target,
                report.neighborhood.len(),
                report.pairs_written,
                report.pairs_zeroed,
                report.items_purged
            ))),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Format bulk operation result.
    pub fn bulk_result(&self, operation: &str, count: usize) -> String {
        self.success(&format!("{} {} item(s)", operation, count))
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn join_lines(lines: impl Iterator<Item = String>) -> String {
    lines.collect::<Vec<_>>().join("\n")
}
