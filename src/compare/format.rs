//! Rendering of comparison results for the terminal and for files.
//!
//! Renderers only read the result; nothing here feeds back into the
//! comparison.

use clap::ValueEnum;
use serde_json::json;

use super::cumulative::CumulativeComparisonResult;
use super::model::{ComparisonMode, ComparisonResult};
use super::stats::ComparisonStatistics;
use crate::inventory::ModuleRecord;

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Aligned plain-text tables.
    #[default]
    Table,
    /// GitHub-flavoured markdown.
    Markdown,
    /// One row per module difference.
    Csv,
    /// Pretty-printed JSON.
    Json,
}

/// Render a comparison in `format`. `show_unchanged` includes unchanged
/// (or in-both) modules in the module listings.
#[must_use]
pub fn render_comparison(result: &ComparisonResult, format: Format, show_unchanged: bool) -> String {
    match format {
        Format::Table => comparison_table(result, show_unchanged),
        Format::Markdown => comparison_markdown(result, show_unchanged),
        Format::Csv => comparison_csv(result, show_unchanged),
        Format::Json => comparison_json(result, show_unchanged),
    }
}

/// Render a cumulative comparison. Markdown and CSV fall back to the table.
#[must_use]
pub fn render_cumulative(result: &CumulativeComparisonResult, format: Format) -> String {
    match format {
        Format::Json => to_pretty_json(&json!({
            "repo": result.repo,
            "source_version": result.source_version,
            "target_version": result.target_version,
            "versions_analyzed": result.versions_analyzed,
            "summary": {
                "total_added": result.all_added().len(),
                "still_present": result.permanently_added().len(),
                "transient": result.transient().len(),
                "removed": result.removed().len(),
            },
            "changes": result.changes.iter().map(|(category, list)| json!({
                "category": category,
                "modules": list,
            })).collect::<Vec<_>>(),
        })),
        _ => cumulative_table(result),
    }
}

fn header(result: &ComparisonResult) -> String {
    format!(
        "Module comparison: {}@{} -> {}@{}",
        result.source_repo, result.source_version, result.target_repo, result.target_version
    )
}

fn mode_label(mode: ComparisonMode) -> &'static str {
    match mode {
        ComparisonMode::Version => "Version",
        ComparisonMode::Repository => "Repository",
    }
}

fn sorted_names(list: &[ModuleRecord]) -> Vec<&str> {
    let mut out: Vec<&str> = list.iter().map(|r| r.name.as_str()).collect();
    out.sort_unstable();
    out
}

fn add_group<'r>(groups: &mut Vec<(String, Vec<&'r str>)>, category: &str, label: &str, modules: Vec<&'r str>) {
    if !modules.is_empty() {
        groups.push((format!("{category} - {label}"), modules));
    }
}

/// Module listing groups as `(title, names)`, in category order.
fn listing(result: &ComparisonResult, show_unchanged: bool) -> Vec<(String, Vec<&str>)> {
    let mut groups = Vec::new();
    for c in &result.categories {
        let category = c.category.as_str();
        match result.mode {
            ComparisonMode::Version => {
                add_group(&mut groups, category, "Added", sorted_names(&c.added));
                add_group(&mut groups, category, "Removed", sorted_names(&c.removed));
                if show_unchanged {
                    add_group(&mut groups, category, "Unchanged", sorted_names(&c.unchanged));
                }
            }
            ComparisonMode::Repository => {
                let only_source = format!("Only in {}", result.source_repo);
                let only_target = format!("Only in {}", result.target_repo);
                add_group(&mut groups, category, &only_source, sorted_names(&c.only_in_source));
                add_group(&mut groups, category, &only_target, sorted_names(&c.only_in_target));
                if show_unchanged {
                    add_group(&mut groups, category, "In both", sorted_names(&c.in_both));
                }
            }
        }
    }
    groups
}

fn summary_lines(result: &ComparisonResult, stats: &ComparisonStatistics) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Source modules", stats.source_total.to_string()),
        ("Target modules", stats.target_total.to_string()),
        ("Categories", stats.categories_count.to_string()),
    ];
    match stats.mode {
        ComparisonMode::Version => {
            rows.push(("Added", stats.total_added.to_string()));
            rows.push(("Removed", stats.total_removed.to_string()));
            rows.push(("Renamed", stats.total_renamed.to_string()));
            rows.push(("Unchanged", stats.total_unchanged.to_string()));
            rows.push(("Net change", format!("{:+}", stats.net_change)));
            rows.push(("Change", format!("{:.1}%", stats.overall_change_percentage)));
            let changed: Vec<String> = result.categories_with_changes().into_iter().map(String::from).collect();
            rows.push(("Changed categories", joined(&changed)));
        }
        ComparisonMode::Repository => {
            rows.push(("Only in source", stats.total_only_in_source.to_string()));
            rows.push(("Only in target", stats.total_only_in_target.to_string()));
            rows.push(("In both", stats.total_in_both.to_string()));
            rows.push(("Overlap", format!("{:.1}%", stats.overall_overlap_percentage)));
        }
    }
    rows
}

fn comparison_table(result: &ComparisonResult, show_unchanged: bool) -> String {
    let stats = result.get_statistics();
    let title = header(result);
    let mut lines = vec![title.clone(), "=".repeat(title.len()), String::new()];
    lines.push(format!("Comparison Type: {}", mode_label(result.mode)));
    lines.push(String::new());

    lines.push("SUMMARY".into());
    lines.push("-".repeat(40));
    for (label, value) in summary_lines(result, &stats) {
        lines.push(format!("{label}: {value}"));
    }
    lines.push(String::new());

    lines.push("BY CATEGORY".into());
    lines.push("-".repeat(40));
    match result.mode {
        ComparisonMode::Version => {
            lines.push(format!("{:<30} {:>8} {:>8} {:>8} {:>8}", "Category", "Added", "Removed", "Renamed", "Net"));
            lines.push("-".repeat(66));
            for c in &stats.category_stats {
                lines.push(format!(
                    "{:<30} {:>8} {:>8} {:>8} {:>8}",
                    c.category,
                    c.added,
                    c.removed,
                    c.renamed,
                    format!("{:+}", c.net_change)
                ));
            }
        }
        ComparisonMode::Repository => {
            lines.push(format!("{:<30} {:>12} {:>12} {:>8}", "Category", "Source Only", "Target Only", "Both"));
            lines.push("-".repeat(64));
            for c in &stats.category_stats {
                lines.push(format!(
                    "{:<30} {:>12} {:>12} {:>8}",
                    c.category, c.only_in_source, c.only_in_target, c.in_both
                ));
            }
            lines.push(String::new());
            lines.push(format!("Unique to {}: {}", result.source_repo, joined(&stats.unique_categories_source)));
            lines.push(format!("Unique to {}: {}", result.target_repo, joined(&stats.unique_categories_target)));
            lines.push(format!("Common categories: {}", joined(&stats.common_categories)));
        }
    }

    let top: Vec<&(String, usize)> =
        stats.categories_with_most_changes.iter().filter(|(_, n)| *n > 0).take(5).collect();
    if !top.is_empty() {
        lines.push(String::new());
        lines.push("Categories with most changes:".into());
        for (i, (category, changes)) in top.iter().enumerate() {
            lines.push(format!("{}. {category}: {changes} changes", i + 1));
        }
    }

    let renames: Vec<String> = result
        .categories
        .iter()
        .flat_map(|c| &c.renamed)
        .map(|r| {
            format!(
                "  {} -> {} ({}, {:.2})",
                r.old_module.name, r.new_module.name, r.detection_method, r.similarity_score
            )
        })
        .collect();
    if !renames.is_empty() {
        lines.push(String::new());
        lines.push("RENAMES".into());
        lines.push("-".repeat(40));
        lines.extend(renames);
    }

    let groups = listing(result, show_unchanged);
    if !groups.is_empty() {
        lines.push(String::new());
        lines.push("MODULE CHANGES".into());
        lines.push("-".repeat(40));
        for (title, modules) in groups {
            lines.push(format!("\n{title} ({} modules):", modules.len()));
            for pair in modules.chunks(2) {
                match pair {
                    [left, right] => lines.push(format!("  {left:<40} {right}")),
                    [only] => lines.push(format!("  {only}")),
                    _ => {}
                }
            }
        }
    }
    lines.join("\n")
}

fn comparison_markdown(result: &ComparisonResult, show_unchanged: bool) -> String {
    let stats = result.get_statistics();
    let mut lines = vec![format!("# {}", header(result)), String::new()];
    lines.push(format!("- **Comparison Type**: {}", mode_label(result.mode)));
    lines.push(String::new());

    lines.push("## Summary".into());
    for (label, value) in summary_lines(result, &stats) {
        lines.push(format!("- **{label}**: {value}"));
    }
    lines.push(String::new());

    lines.push("## By Category".into());
    lines.push(String::new());
    match result.mode {
        ComparisonMode::Version => {
            lines.push("| Category | Added | Removed | Renamed | Net Change |".into());
            lines.push("|----------|-------|---------|---------|------------|".into());
            for c in &stats.category_stats {
                lines.push(format!(
                    "| {} | {} | {} | {} | {:+} |",
                    c.category, c.added, c.removed, c.renamed, c.net_change
                ));
            }
        }
        ComparisonMode::Repository => {
            lines.push("| Category | Source Only | Target Only | In Both |".into());
            lines.push("|----------|-------------|-------------|---------|".into());
            for c in &stats.category_stats {
                lines.push(format!(
                    "| {} | {} | {} | {} |",
                    c.category, c.only_in_source, c.only_in_target, c.in_both
                ));
            }
        }
    }
    lines.push(String::new());

    let renamed: Vec<_> = result.categories.iter().flat_map(|c| &c.renamed).collect();
    if !renamed.is_empty() {
        lines.push("## Renames".into());
        lines.push(String::new());
        for r in renamed {
            lines.push(format!(
                "- `{}` → `{}` ({}, {:.2})",
                r.old_module.name, r.new_module.name, r.detection_method, r.similarity_score
            ));
        }
        lines.push(String::new());
    }

    for (title, modules) in listing(result, show_unchanged) {
        lines.push(format!("### {title} ({} modules)", modules.len()));
        lines.push(String::new());
        lines.extend(modules.iter().map(|m| format!("- {m}")));
        lines.push(String::new());
    }
    lines.join("\n")
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn comparison_csv(result: &ComparisonResult, show_unchanged: bool) -> String {
    let mut lines = vec!["category,module,change_type".to_string()];
    for diff in result.differences(show_unchanged) {
        lines.push(format!(
            "{},{},{}",
            csv_field(&diff.module.category),
            csv_field(&diff.module.name),
            diff.change_type.as_str()
        ));
    }
    for rename in result.categories.iter().flat_map(|c| &c.renamed) {
        lines.push(format!(
            "{},{},renamed",
            csv_field(&rename.new_module.category),
            csv_field(&format!("{} -> {}", rename.old_module.name, rename.new_module.name))
        ));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn comparison_json(result: &ComparisonResult, show_unchanged: bool) -> String {
    let stats = result.get_statistics();
    let items: Vec<_> = listing(result, show_unchanged)
        .into_iter()
        .map(|(category, modules)| json!({ "category": category, "count": modules.len(), "modules": modules }))
        .collect();
    let renames: Vec<_> = result.categories.iter().flat_map(|c| &c.renamed).collect();
    to_pretty_json(&json!({
        "metadata": {
            "source_repo": result.source_repo,
            "source_version": result.source_version,
            "target_repo": result.target_repo,
            "target_version": result.target_version,
            "comparison_type": result.mode,
        },
        "statistics": stats,
        "renames": renames,
        "items": items,
    }))
}

fn cumulative_table(result: &CumulativeComparisonResult) -> String {
    let title = format!(
        "Cumulative module changes: {} {} -> {}",
        result.repo, result.source_version, result.target_version
    );
    let mut lines = vec![title.clone(), "=".repeat(title.len()), String::new()];

    lines.push("SUMMARY".into());
    lines.push("-".repeat(40));
    lines.push(format!("Versions analyzed: {}", result.versions_analyzed.len()));
    lines.push(format!("Total added: {}", result.all_added().len()));
    lines.push(format!("Still present: {}", result.permanently_added().len()));
    lines.push(format!("Transient: {}", result.transient().len()));
    lines.push(String::new());

    lines.push(format!("{:<30} {:>12} {:>14} {:>8}", "Category", "Total Added", "Still Present", "Removed"));
    lines.push("-".repeat(66));
    for (category, list) in &result.changes {
        let present = list.iter().filter(|c| c.present_in_target).count();
        let removed = list.iter().filter(|c| c.was_removed()).count();
        lines.push(format!("{category:<30} {:>12} {present:>14} {removed:>8}", list.len()));
    }

    if result.versions_analyzed.len() <= 10 {
        lines.push(String::new());
        lines.push(format!("Versions: {}", result.versions_analyzed.join(", ")));
    }

    for (category, list) in &result.changes {
        lines.push(String::new());
        lines.push(format!("{category}:"));
        for change in list {
            let lifetime = match &change.removed_in {
                Some(removed) if change.present_in_target => {
                    format!("added in {}, removed in {removed}, back by target", change.added_in)
                }
                Some(removed) => format!("added in {}, removed in {removed}", change.added_in),
                None => format!("added in {}", change.added_in),
            };
            lines.push(format!("  {:<40} {lifetime}", change.module.name));
        }
    }
    lines.join("\n")
}

fn joined(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// Pretty-print a JSON value. `Value` serialisation cannot fail.
pub(crate) fn to_pretty_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
