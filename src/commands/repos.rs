//! `modcompare repos` command.

use crate::config::{RepoKind, RepoRegistry};

fn kind_label(kind: RepoKind) -> &'static str {
    match kind {
        RepoKind::PrebidJs => "prebid_js",
        RepoKind::PrebidServerGo => "prebid_server_go",
        RepoKind::PrebidServerJava => "prebid_server_java",
        RepoKind::PrebidDocs => "prebid_docs",
        RepoKind::Default => "default",
    }
}

/// Render the configured repositories as an aligned table.
#[must_use]
pub fn run(registry: &RepoRegistry) -> String {
    let rows: Vec<(&str, &str, &str, String)> = registry
        .iter()
        .map(|c| (c.key.as_str(), c.repo.as_str(), kind_label(c.kind), c.category_names().collect::<Vec<_>>().join(", ")))
        .collect();
    if rows.is_empty() {
        return "No repositories configured.".to_string();
    }

    let key_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(3).max(3);
    let repo_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(4).max(4);
    let kind_width = rows.iter().map(|r| r.2.len()).max().unwrap_or(4).max(4);

    let mut lines = vec![
        format!("{:<key_width$}  {:<repo_width$}  {:<kind_width$}  CATEGORIES", "KEY", "REPO", "KIND"),
        format!("{:-<key_width$}  {:-<repo_width$}  {:-<kind_width$}  ----------", "", "", ""),
    ];
    for (key, repo, kind, categories) in &rows {
        lines.push(format!("{key:<key_width$}  {repo:<repo_width$}  {kind:<kind_width$}  {categories}"));
    }
    lines.push(format!("\n{} repositories configured.", rows.len()));
    lines.join("\n")
}
