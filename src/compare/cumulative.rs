//! Cumulative comparison: walk every release between two versions of one
//! repository and track each module introduced along the way.

use std::collections::{HashMap, HashSet};

use log::info;
use serde::Serialize;

use super::comparator::{report, Comparator, Progress, ProgressFn};
use crate::error::Result;
use crate::inventory::{Inventory, ModuleRecord};
use crate::versions::{semantic_versions, versions_between};

/// Lifecycle of one module introduced after the source version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CumulativeModuleChange {
    /// The module as first observed.
    pub module: ModuleRecord,
    /// Version in which it first appeared.
    pub added_in: String,
    /// Version right after its first disappearance, if it ever disappeared.
    pub removed_in: Option<String>,
    /// Whether it exists in the target snapshot.
    pub present_in_target: bool,
}

impl CumulativeModuleChange {
    /// A removal was recorded, regardless of current presence.
    #[must_use]
    pub fn was_removed(&self) -> bool {
        self.removed_in.is_some()
    }

    /// Added and removed again within the range, and absent at the end.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.was_removed() && !self.present_in_target
    }
}

/// Outcome of a cumulative comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CumulativeComparisonResult {
    /// Repository identifier (`owner/name`).
    pub repo: String,
    /// Starting version.
    pub source_version: String,
    /// Ending version.
    pub target_version: String,
    /// Every version fetched, oldest first.
    pub versions_analyzed: Vec<String>,
    /// Changes per category, each list sorted by module name.
    pub changes: Vec<(String, Vec<CumulativeModuleChange>)>,
}

impl CumulativeComparisonResult {
    fn filtered(&self, keep: impl Fn(&CumulativeModuleChange) -> bool) -> Vec<&CumulativeModuleChange> {
        self.changes.iter().flat_map(|(_, list)| list).filter(|c| keep(c)).collect()
    }

    /// Every module introduced after the source version.
    #[must_use]
    pub fn all_added(&self) -> Vec<&CumulativeModuleChange> {
        self.filtered(|_| true)
    }

    /// Introduced and still present in the target.
    #[must_use]
    pub fn permanently_added(&self) -> Vec<&CumulativeModuleChange> {
        self.filtered(|c| c.present_in_target)
    }

    /// Introduced and gone again by the target.
    #[must_use]
    pub fn transient(&self) -> Vec<&CumulativeModuleChange> {
        self.filtered(CumulativeModuleChange::is_transient)
    }

    /// Introduced and removed at some point, even if re-added later.
    #[must_use]
    pub fn removed(&self) -> Vec<&CumulativeModuleChange> {
        self.filtered(CumulativeModuleChange::was_removed)
    }

    /// Changes for one category.
    #[must_use]
    pub fn category(&self, name: &str) -> &[CumulativeModuleChange] {
        self.changes.iter().find(|(c, _)| c == name).map_or(&[], |(_, list)| list.as_slice())
    }
}

type ModuleKey = (String, String);

fn keys(inventory: &Inventory) -> HashSet<ModuleKey> {
    inventory.records().map(|r| (r.name.clone(), r.category.clone())).collect()
}

impl Comparator<'_> {
    /// Fetch every release between `source_version` and `target_version`
    /// (both included) and report modules introduced in that range.
    ///
    /// # Errors
    ///
    /// Fails on an unknown repository key or when the tag list or any
    /// snapshot cannot be fetched.
    pub fn compare_cumulative(
        &self,
        repo_key: &str,
        source_version: &str,
        target_version: &str,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<CumulativeComparisonResult> {
        let config = self.registry.resolve(repo_key)?;
        let tags = semantic_versions(&self.fetcher.list_versions(config)?);
        let versions = versions_between(&tags, source_version, target_version);
        info!(
            "Cumulative comparison of {} from {source_version} to {target_version} over {} versions",
            config.repo,
            versions.len()
        );

        let mut snapshots = Vec::with_capacity(versions.len());
        for (index, version) in versions.iter().enumerate() {
            if index == 0 {
                report(progress, &Progress::FetchingSource);
            }
            if index + 1 == versions.len() {
                report(progress, &Progress::FetchingTarget);
            }
            report(
                progress,
                &Progress::AnalyzingVersion {
                    version: version.clone(),
                    index: index + 1,
                    total: versions.len(),
                },
            );
            snapshots.push(self.fetcher.fetch_inventory(config, version)?);
        }
        report(progress, &Progress::Comparing);

        let changes = track_changes(&versions, &snapshots);
        let introduced: usize = changes.iter().map(|(_, list)| list.len()).sum();
        info!("Cumulative comparison found {introduced} introduced modules");

        Ok(CumulativeComparisonResult {
            repo: config.repo.clone(),
            source_version: source_version.to_string(),
            target_version: target_version.to_string(),
            versions_analyzed: versions,
            changes,
        })
    }
}

/// Walk `snapshots` (aligned with `versions`) and record the lifecycle of
/// every module absent from the first snapshot.
fn track_changes(
    versions: &[String],
    snapshots: &[Inventory],
) -> Vec<(String, Vec<CumulativeModuleChange>)> {
    let (Some(first), Some(last)) = (snapshots.first(), snapshots.last()) else {
        return Vec::new();
    };
    let at_source = keys(first);
    let at_target = keys(last);

    let mut order: Vec<ModuleKey> = Vec::new();
    let mut tracked: HashMap<ModuleKey, CumulativeModuleChange> = HashMap::new();

    for (version, snapshot) in versions.iter().zip(snapshots) {
        let current = keys(snapshot);
        for record in snapshot.records() {
            let key = (record.name.clone(), record.category.clone());
            if at_source.contains(&key) || tracked.contains_key(&key) {
                continue;
            }
            order.push(key.clone());
            tracked.insert(
                key.clone(),
                CumulativeModuleChange {
                    module: record.clone(),
                    added_in: version.clone(),
                    removed_in: None,
                    present_in_target: at_target.contains(&key),
                },
            );
        }
        for (key, change) in &mut tracked {
            if change.removed_in.is_none() && !current.contains(key) {
                change.removed_in = Some(version.clone());
            }
        }
    }

    let mut grouped: Vec<(String, Vec<CumulativeModuleChange>)> = Vec::new();
    for key in order {
        let Some(change) = tracked.remove(&key) else { continue };
        match grouped.iter_mut().find(|(category, _)| *category == key.1) {
            Some((_, list)) => list.push(change),
            None => grouped.push((key.1, vec![change])),
        }
    }
    for (_, list) in &mut grouped {
        list.sort_by(|a, b| a.module.name.cmp(&b.module.name));
    }
    grouped
}
