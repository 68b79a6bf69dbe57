//! Comparison orchestrator: fetch both sides, diff each category, detect
//! renames, assemble the result.

use std::fmt;

use log::{debug, info};

use super::differ::{diff_repositories, diff_versions};
use super::model::{CategoryComparison, ComparisonMode, ComparisonResult};
use super::rename::detect_renames;
use crate::config::RepoRegistry;
use crate::error::Result;
use crate::inventory::{Inventory, InventoryFetcher};

/// Progress checkpoints reported to callers, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Fetching the source inventory.
    FetchingSource,
    /// Fetching the target inventory.
    FetchingTarget,
    /// Diffing categories and detecting renames.
    Comparing,
    /// Fetching one intermediate version of a cumulative comparison.
    AnalyzingVersion {
        /// Version being fetched.
        version: String,
        /// 1-based position.
        index: usize,
        /// Number of versions in the range.
        total: usize,
    },
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchingSource => f.write_str("Fetching source modules"),
            Self::FetchingTarget => f.write_str("Fetching target modules"),
            Self::Comparing => f.write_str("Comparing modules"),
            Self::AnalyzingVersion { version, index, total } => {
                write!(f, "Analyzing version {version} ({index}/{total})")
            }
        }
    }
}

/// Callback receiving progress checkpoints.
pub type ProgressFn<'p> = &'p dyn Fn(&Progress);

pub(crate) fn report(progress: Option<ProgressFn<'_>>, event: &Progress) {
    debug!("{event}");
    if let Some(callback) = progress {
        callback(event);
    }
}

/// Drives comparisons over a registry and an inventory fetcher.
pub struct Comparator<'a> {
    pub(crate) registry: &'a RepoRegistry,
    pub(crate) fetcher: &'a dyn InventoryFetcher,
}

impl<'a> Comparator<'a> {
    /// Creates a comparator.
    #[must_use]
    pub fn new(registry: &'a RepoRegistry, fetcher: &'a dyn InventoryFetcher) -> Self {
        Self { registry, fetcher }
    }

    /// Compare `source_key@source_version` with `target_key@target_version`.
    ///
    /// Version mode is used when both keys resolve to the same repository
    /// identifier, repository mode otherwise.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown key and a fetch error
    /// when either inventory cannot be fetched. No partial result is
    /// produced.
    pub fn compare(
        &self,
        source_key: &str,
        source_version: &str,
        target_key: &str,
        target_version: &str,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<ComparisonResult> {
        let source_config = self.registry.resolve(source_key)?;
        let target_config = self.registry.resolve(target_key)?;
        let mode = if source_config.repo == target_config.repo {
            ComparisonMode::Version
        } else {
            ComparisonMode::Repository
        };
        info!(
            "Comparing {}@{source_version} with {}@{target_version} ({mode:?})",
            source_config.repo, target_config.repo
        );

        report(progress, &Progress::FetchingSource);
        let source = self.fetcher.fetch_inventory(source_config, source_version)?;
        report(progress, &Progress::FetchingTarget);
        let target = self.fetcher.fetch_inventory(target_config, target_version)?;
        report(progress, &Progress::Comparing);

        let categories = compare_inventories(&source, &target, mode);
        info!("Compared {} categories", categories.len());

        Ok(ComparisonResult {
            source_repo: source_config.repo.clone(),
            source_version: source_version.to_string(),
            target_repo: target_config.repo.clone(),
            target_version: target_version.to_string(),
            mode,
            categories,
        })
    }
}

/// Union of category names: source order first, then target-only ones.
pub(crate) fn category_union<'i>(source: &'i Inventory, target: &'i Inventory) -> Vec<&'i str> {
    let mut names: Vec<&str> = source.category_names().collect();
    for name in target.category_names() {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Diff every category present on either side. A category missing on one
/// side counts as empty there.
#[must_use]
pub fn compare_inventories(
    source: &Inventory,
    target: &Inventory,
    mode: ComparisonMode,
) -> Vec<CategoryComparison> {
    category_union(source, target)
        .into_iter()
        .map(|name| {
            let (from, to) = (source.get(name), target.get(name));
            match mode {
                ComparisonMode::Version => {
                    let delta = diff_versions(from, to);
                    let renames = detect_renames(&delta.removed, &delta.added);
                    CategoryComparison::from_versions(name, delta, renames)
                }
                ComparisonMode::Repository => {
                    CategoryComparison::from_repositories(name, diff_repositories(from, to))
                }
            }
        })
        .collect()
}
