//! Filename → module name rules for each repository family.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::RepoKind;
use crate::ports::{EntryKind, TreeEntry};

use super::ModuleRecord;

/// Bid adapter category name.
pub const BID_ADAPTERS: &str = "Bid Adapters";
/// Analytics adapter category name.
pub const ANALYTICS_ADAPTERS: &str = "Analytics Adapters";
/// Real-time data provider category name.
pub const RTD_MODULES: &str = "RTD Modules";
/// User ID submodule category name.
pub const USER_ID_MODULES: &str = "User ID Modules";
/// Catch-all category for Prebid.js modules without a known suffix.
pub const OTHER_MODULES: &str = "Other Modules";
/// Prebid Server general (hook) modules.
pub const GENERAL_MODULES: &str = "General Modules";

const SUFFIX_RULES: [(&str, &str); 4] = [
    ("BidAdapter", BID_ADAPTERS),
    ("AnalyticsAdapter", ANALYTICS_ADAPTERS),
    ("RtdProvider", RTD_MODULES),
    ("IdSystem", USER_ID_MODULES),
];

const GO_ANALYTICS_EXCLUDED: [&str; 3] = ["build", "clients", "filesystem"];
const JAVA_ANALYTICS_EXCLUDED: [&str; 1] = ["log"];
const DEFAULT_EXTENSIONS: [&str; 6] = [".js", ".ts", ".go", ".java", ".py", ".md"];

/// Split a Prebid.js base filename (no extension) into `(name, category)`.
///
/// Returns `None` when stripping the suffix leaves an empty name.
#[must_use]
pub fn classify_module_name(base: &str) -> Option<(String, &'static str)> {
    let (name, category) = SUFFIX_RULES
        .iter()
        .find_map(|(suffix, category)| base.strip_suffix(suffix).map(|n| (n, *category)))
        .unwrap_or((base, OTHER_MODULES));
    (!name.is_empty()).then(|| (name.to_string(), category))
}

/// Classify a Prebid.js source filename such as `fooBidAdapter.ts`.
///
/// Only `.js` and `.ts` files qualify; `.d.ts` declarations are skipped.
#[must_use]
pub fn classify_filename(filename: &str) -> Option<(String, &'static str)> {
    if filename.ends_with(".d.ts") {
        return None;
    }
    let base = filename.strip_suffix(".ts").or_else(|| filename.strip_suffix(".js"))?;
    classify_module_name(base)
}

/// Turn listed entries below `base_path` into records for `category`.
///
/// `entries` hold paths relative to `base_path` and have already been
/// narrowed by the repository's fetch strategy. Output is sorted by name.
#[must_use]
pub fn extract_modules(
    kind: RepoKind,
    category: &str,
    base_path: &str,
    entries: &[TreeEntry],
    repo_key: &str,
) -> Vec<ModuleRecord> {
    let record = |name: &str, relative: &str| {
        ModuleRecord::new(name, category, join(base_path, relative), repo_key)
    };

    match kind {
        RepoKind::PrebidJs => prebid_js(category, base_path, entries, repo_key),
        RepoKind::PrebidServerGo => match category {
            GENERAL_MODULES => second_level_dirs(entries)
                .into_iter()
                .map(|(vendor, module)| {
                    record(&format!("{vendor}_{module}"), &format!("{vendor}/{module}"))
                })
                .collect(),
            ANALYTICS_ADAPTERS => top_level_dirs(entries)
                .into_iter()
                .filter(|name| !GO_ANALYTICS_EXCLUDED.contains(&name.as_str()))
                .map(|name| record(&name, &name))
                .collect(),
            _ => top_level_dirs(entries).into_iter().map(|name| record(&name, &name)).collect(),
        },
        RepoKind::PrebidServerJava => {
            let names = top_level_dirs(entries).into_iter().filter(|name| {
                category != ANALYTICS_ADAPTERS || !JAVA_ANALYTICS_EXCLUDED.contains(&name.as_str())
            });
            let mut out: BTreeMap<String, ModuleRecord> = BTreeMap::new();
            for dir in names {
                let name = if category == GENERAL_MODULES {
                    dir.strip_prefix("pb-").unwrap_or(&dir).to_string()
                } else {
                    dir.clone()
                };
                if !name.is_empty() {
                    out.entry(name.clone()).or_insert_with(|| record(&name, &dir));
                }
            }
            out.into_values().collect()
        }
        RepoKind::PrebidDocs => prebid_docs(category, entries)
            .into_iter()
            .map(|(name, relative)| record(&name, relative))
            .collect(),
        RepoKind::Default => {
            let mut out: BTreeMap<String, ModuleRecord> = BTreeMap::new();
            for entry in entries.iter().filter(|e| e.kind == EntryKind::File) {
                let filename = file_name(&entry.path);
                let stem = DEFAULT_EXTENSIONS
                    .iter()
                    .find_map(|ext| filename.strip_suffix(ext))
                    .unwrap_or(filename);
                if !stem.is_empty() {
                    out.entry(stem.to_string()).or_insert_with(|| record(stem, &entry.path));
                }
            }
            out.into_values().collect()
        }
    }
}

fn prebid_js(
    category: &str,
    base_path: &str,
    entries: &[TreeEntry],
    repo_key: &str,
) -> Vec<ModuleRecord> {
    let mut seen: BTreeMap<String, ModuleRecord> = BTreeMap::new();
    for entry in entries {
        if entry.kind != EntryKind::File || entry.path.contains('/') {
            continue;
        }
        let Some((name, found)) = classify_filename(&entry.path) else {
            continue;
        };
        if found != category {
            continue;
        }
        let is_ts = entry.path.ends_with(".ts");
        if is_ts || !seen.contains_key(&name) {
            let record = ModuleRecord::new(&name, found, join(base_path, &entry.path), repo_key);
            seen.insert(name, record);
        }
    }
    seen.into_values().collect()
}

fn prebid_docs<'a>(category: &str, entries: &'a [TreeEntry]) -> Vec<(String, &'a str)> {
    let mixed = category == RTD_MODULES || category == OTHER_MODULES;
    let mut out: BTreeMap<String, &str> = BTreeMap::new();
    for entry in entries {
        if entry.kind != EntryKind::File || entry.path.contains('/') {
            continue;
        }
        let Some(base) = entry.path.strip_suffix(".md") else {
            continue;
        };
        let name = if mixed {
            if base.ends_with("AnalyticsAdapter") {
                continue;
            }
            match (base.strip_suffix("RtdProvider"), category) {
                (Some(rtd), RTD_MODULES) => rtd,
                (None, OTHER_MODULES) => base,
                _ => continue,
            }
        } else {
            base
        };
        if !name.is_empty() {
            out.entry(name.to_string()).or_insert(entry.path.as_str());
        }
    }
    out.into_iter().collect()
}

/// Distinct first path segments that denote a directory.
fn top_level_dirs(entries: &[TreeEntry]) -> BTreeSet<String> {
    entries
        .iter()
        .filter_map(|entry| match entry.path.split_once('/') {
            Some((first, _)) => Some(first),
            None if entry.kind == EntryKind::Dir => Some(entry.path.as_str()),
            None => None,
        })
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Distinct `(first, second)` segment pairs where the second is a directory.
fn second_level_dirs(entries: &[TreeEntry]) -> BTreeSet<(String, String)> {
    entries
        .iter()
        .filter_map(|entry| {
            let mut parts = entry.path.split('/');
            let first = parts.next()?;
            let second = parts.next()?;
            let is_dir = parts.next().is_some() || entry.kind == EntryKind::Dir;
            (is_dir && !first.is_empty() && !second.is_empty())
                .then(|| (first.to_string(), second.to_string()))
        })
        .collect()
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn join(base: &str, relative: &str) -> String {
    if base.is_empty() {
        relative.to_string()
    } else {
        format!("{}/{relative}", base.trim_end_matches('/'))
    }
}
