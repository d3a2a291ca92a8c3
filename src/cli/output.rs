//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! plans, parsed changes and dependency paths in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::ValidationResult;
use crate::planner::{ChangeSet, Plan, PlanAction, PlanItem};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan item row for table display.
#[derive(Tabled)]
struct PlanItemRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a change plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &Plan) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&PlanJson::from(plan)).unwrap_or_default()
            }
            OutputFormat::Table => Self::format_plan_table(plan),
            OutputFormat::Text => {
                let mut out = Vec::new();
                if plan.report(&mut out).is_err() {
                    return String::new();
                }
                String::from_utf8_lossy(&out).into_owned()
            }
        }
    }

    /// Formats a plan as a table.
    fn format_plan_table(plan: &Plan) -> String {
        if plan.is_empty() {
            return format!("{} No changes in plan.\n", "✓".green());
        }

        let rows: Vec<PlanItemRow> = plan
            .items()
            .iter()
            .enumerate()
            .map(|(i, item)| PlanItemRow {
                index: i + 1,
                action: Self::format_action(item.action()),
                resource: item.address().to_string(),
                group: item.target_group().unwrap_or("-").to_string(),
                reason: Self::truncate(&item.reason().to_string(), 60),
            })
            .collect();

        let mut output = Table::new(rows).to_string();
        output.push('\n');

        if plan.has_unpicked_resources() {
            let _ = write!(
                output,
                "\n{} {} changes deferred. Run the planner again after this apply.\n",
                "⚠".yellow(),
                plan.count(PlanAction::NotPicked)
            );
        }

        output
    }

    /// Formats the `-target` flags, space separated.
    #[must_use]
    pub fn format_targets(&self, plan: &Plan) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&plan.resources_to_apply()).unwrap_or_default()
            }
            OutputFormat::Text | OutputFormat::Table => plan.target_flags().join(" "),
        }
    }

    /// Formats a parsed change set.
    #[must_use]
    pub fn format_changes(&self, changes: &ChangeSet) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(changes).unwrap_or_default(),
            OutputFormat::Text | OutputFormat::Table => {
                if changes.is_empty() {
                    return String::from("No changes found in plan output.\n");
                }

                let mut output = String::new();
                for address in &changes.new {
                    let _ = writeln!(output, "{}", format!("+ {address}").green());
                }
                for address in &changes.changed {
                    let _ = writeln!(output, "{}", format!("~ {address}").yellow());
                }
                for address in &changes.relaunch {
                    let _ = writeln!(output, "{}", format!("- {address}").red());
                }
                let _ = write!(
                    output,
                    "\n{} new, {} changed, {} relaunch\n",
                    changes.new.len(),
                    changes.changed.len(),
                    changes.relaunch.len()
                );
                output
            }
        }
    }

    /// Formats a dependency path.
    #[must_use]
    pub fn format_path(&self, path: &[String]) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(path).unwrap_or_default(),
            OutputFormat::Text | OutputFormat::Table => {
                format!("{} ({} hops)\n", path.join(" -> "), path.len().saturating_sub(1))
            }
        }
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "valid": result.is_valid(),
                "errors": result
                    .errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>(),
                "warnings": result.warnings,
            }))
            .unwrap_or_default(),
            OutputFormat::Text | OutputFormat::Table => {
                let mut output = if result.is_valid() {
                    format!("{} Deployment declaration is valid.\n", "✓".green())
                } else {
                    format!("{} Deployment declaration is invalid:\n", "✗".red())
                };
                for error in &result.errors {
                    let _ = writeln!(output, "   - {}: {}", error.field, error.message);
                }
                if show_warnings && !result.warnings.is_empty() {
                    let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }
                output
            }
        }
    }

    /// Formats an action with color.
    fn format_action(action: PlanAction) -> String {
        let label = format!("{} {action}", action.symbol());
        match action {
            PlanAction::Create => label.green().to_string(),
            PlanAction::Change => label.yellow().to_string(),
            PlanAction::Relaunch | PlanAction::Destroy => label.red().to_string(),
            PlanAction::NotPicked => label.dimmed().to_string(),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

// JSON serialization helpers

#[derive(serde::Serialize)]
struct PlanJson<'a> {
    created_at: String,
    item_count: usize,
    has_unpicked_resources: bool,
    targets: Vec<&'a str>,
    items: &'a [PlanItem],
}

impl<'a> From<&'a Plan> for PlanJson<'a> {
    fn from(plan: &'a Plan) -> Self {
        Self {
            created_at: plan.created_at.to_rfc3339(),
            item_count: plan.len(),
            has_unpicked_resources: plan.has_unpicked_resources(),
            targets: plan.resources_to_apply(),
            items: plan.items(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::PlanReason;

    fn plan() -> Plan {
        Plan::from_items(vec![
            PlanItem::new(
                "aws_instance.a",
                Some(String::from("pool")),
                PlanAction::Relaunch,
                PlanReason::PickedFirst { total: 2 },
            ),
            PlanItem::new(
                "aws_instance.b",
                Some(String::from("pool")),
                PlanAction::NotPicked,
                PlanReason::NotSelectedFromGroup,
            ),
        ])
    }

    #[test]
    fn test_json_plan() {
        let output = OutputFormatter::new(OutputFormat::Json).format_plan(&plan());
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["item_count"], 2);
        assert_eq!(json["has_unpicked_resources"], true);
        assert_eq!(json["targets"], serde_json::json!(["aws_instance.a"]));
        assert_eq!(json["items"][1]["action"], "not_picked");
    }

    #[test]
    fn test_targets_text() {
        let output = OutputFormatter::new(OutputFormat::Text).format_targets(&plan());
        assert_eq!(output, "-target=aws_instance.a");
    }

    #[test]
    fn test_table_lists_every_item() {
        let output = OutputFormatter::new(OutputFormat::Table).format_plan(&plan());
        assert!(output.contains("aws_instance.a"));
        assert!(output.contains("aws_instance.b"));
        assert!(output.contains("deferred"));
    }

    #[test]
    fn test_path_text() {
        let path = vec![String::from("root"), String::from("a"), String::from("b")];
        let output = OutputFormatter::new(OutputFormat::Text).format_path(&path);
        assert_eq!(output, "root -> a -> b (2 hops)\n");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(OutputFormatter::truncate("short", 10), "short");
        assert_eq!(OutputFormatter::truncate("abcdefghijkl", 8), "abcde...");
    }
}
