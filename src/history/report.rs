//! Rendering of module history results.

use serde_json::json;

use super::ModuleHistoryResult;
use crate::compare::format::to_pretty_json;
use crate::compare::Format;

/// Render a history result. Markdown falls back to the table layout.
#[must_use]
pub fn render_history(result: &ModuleHistoryResult, format: Format) -> String {
    match format {
        Format::Json => history_json(result),
        Format::Csv => history_csv(result),
        Format::Table | Format::Markdown => history_table(result),
    }
}

fn history_table(result: &ModuleHistoryResult) -> String {
    let title = format!("Module history: {} at {}", result.repo, result.target_version);
    let source = if result.from_cache { "cache" } else { "fresh analysis" };
    let mut lines = vec![
        title.clone(),
        "=".repeat(title.len()),
        String::new(),
        format!("Modules: {}", result.total_modules()),
        format!("Analyzed: {} ({source})", result.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")),
    ];

    let name_width = result.entries.iter().map(|e| e.name.len()).max().unwrap_or(6).max(6);
    for (category, entries) in result.by_category() {
        lines.push(String::new());
        lines.push(format!("{category} ({})", entries.len()));
        lines.push(format!("  {:<name_width$}  {:<12}  {:>5}  {}", "MODULE", "FIRST", "MAJOR", "FIRST COMMIT"));
        for entry in entries {
            let commit = entry.first_commit_date.as_deref().unwrap_or("-");
            lines.push(format!(
                "  {:<name_width$}  {:<12}  {:>5}  {commit}",
                entry.name, entry.first_version, entry.first_major
            ));
        }
    }

    lines.push(String::new());
    lines.push("By major version:".to_string());
    for (major, entries) in result.by_major() {
        lines.push(format!("  {major:>3}: {} modules", entries.len()));
    }
    lines.join("\n")
}

fn history_csv(result: &ModuleHistoryResult) -> String {
    let mut lines = vec!["category,module,first_version,first_major,path".to_string()];
    for (category, entries) in result.by_category() {
        for e in entries {
            lines.push(format!("{category},{},{},{},{}", e.name, e.first_version, e.first_major, e.path));
        }
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn history_json(result: &ModuleHistoryResult) -> String {
    let by_category: serde_json::Map<String, serde_json::Value> = result
        .by_category()
        .into_iter()
        .map(|(category, entries)| (category.to_string(), json!(entries)))
        .collect();
    let by_major: serde_json::Map<String, serde_json::Value> = result
        .by_major()
        .into_iter()
        .map(|(major, entries)| (major.to_string(), json!(entries)))
        .collect();
    to_pretty_json(&json!({
        "repo": result.repo,
        "target_version": result.target_version,
        "from_cache": result.from_cache,
        "analyzed_at": result.analyzed_at,
        "total_modules": result.total_modules(),
        "modules_by_category": by_category,
        "modules_by_major_version": by_major,
    }))
}
