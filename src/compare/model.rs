//! Comparison result model.

use serde::Serialize;

use super::differ::{RepositoryDelta, VersionDelta};
use super::rename::{ModuleRename, RenameDetection};
use super::stats::ComparisonStatistics;
use crate::inventory::ModuleRecord;

/// Whether a comparison spans versions of one repository or two repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonMode {
    /// Same repository, two versions. Added/removed/renamed are populated.
    #[serde(rename = "version_comparison")]
    Version,
    /// Two repositories. Only-in-source/only-in-target/in-both are populated.
    #[serde(rename = "repository_comparison")]
    Repository,
}

/// Delta for one category.
///
/// Only the field group matching `mode` is populated; the other stays
/// empty. Totals and percentages are derived on every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryComparison {
    /// Category name.
    pub category: String,
    /// Mode of the owning comparison.
    pub mode: ComparisonMode,
    /// Added in the target version and not explained by a rename.
    pub added: Vec<ModuleRecord>,
    /// Removed from the source version and not explained by a rename.
    pub removed: Vec<ModuleRecord>,
    /// Present in both versions.
    pub unchanged: Vec<ModuleRecord>,
    /// Probable renames between the versions.
    pub renamed: Vec<ModuleRename>,
    /// Only in the source repository.
    pub only_in_source: Vec<ModuleRecord>,
    /// Only in the target repository.
    pub only_in_target: Vec<ModuleRecord>,
    /// In both repositories.
    pub in_both: Vec<ModuleRecord>,
}

impl CategoryComparison {
    fn empty(category: impl Into<String>, mode: ComparisonMode) -> Self {
        Self {
            category: category.into(),
            mode,
            added: Vec::new(),
            removed: Vec::new(),
            unchanged: Vec::new(),
            renamed: Vec::new(),
            only_in_source: Vec::new(),
            only_in_target: Vec::new(),
            in_both: Vec::new(),
        }
    }

    /// Version-mode comparison, with renames already split out of `delta`.
    #[must_use]
    pub fn from_versions(
        category: impl Into<String>,
        delta: VersionDelta,
        renames: RenameDetection,
    ) -> Self {
        Self {
            added: renames.remaining_added,
            removed: renames.remaining_removed,
            unchanged: delta.unchanged,
            renamed: renames.renames,
            ..Self::empty(category, ComparisonMode::Version)
        }
    }

    /// Repository-mode comparison.
    #[must_use]
    pub fn from_repositories(category: impl Into<String>, delta: RepositoryDelta) -> Self {
        Self {
            only_in_source: delta.only_in_source,
            only_in_target: delta.only_in_target,
            in_both: delta.in_both,
            ..Self::empty(category, ComparisonMode::Repository)
        }
    }

    /// Modules on the source side.
    #[must_use]
    pub fn total_source(&self) -> usize {
        match self.mode {
            ComparisonMode::Version => self.removed.len() + self.unchanged.len() + self.renamed.len(),
            ComparisonMode::Repository => self.only_in_source.len() + self.in_both.len(),
        }
    }

    /// Modules on the target side.
    #[must_use]
    pub fn total_target(&self) -> usize {
        match self.mode {
            ComparisonMode::Version => self.added.len() + self.unchanged.len() + self.renamed.len(),
            ComparisonMode::Repository => self.only_in_target.len() + self.in_both.len(),
        }
    }

    /// Whether anything differs between the two sides.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match self.mode {
            ComparisonMode::Version => {
                !(self.added.is_empty() && self.removed.is_empty() && self.renamed.is_empty())
            }
            ComparisonMode::Repository => {
                !(self.only_in_source.is_empty() && self.only_in_target.is_empty())
            }
        }
    }

    /// Added minus removed. Always zero across repositories.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn net_change(&self) -> i64 {
        match self.mode {
            ComparisonMode::Version => self.added.len() as i64 - self.removed.len() as i64,
            ComparisonMode::Repository => 0,
        }
    }

    /// Modules that appear on only one side: added+removed, or
    /// only-in-source+only-in-target.
    #[must_use]
    pub fn change_count(&self) -> usize {
        match self.mode {
            ComparisonMode::Version => self.added.len() + self.removed.len(),
            ComparisonMode::Repository => self.only_in_source.len() + self.only_in_target.len(),
        }
    }

    /// Size change from source to target in percent. An empty source
    /// counts as 100% growth when the target has anything.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn change_percentage(&self) -> f64 {
        let (source, target) = (self.total_source(), self.total_target());
        if source == 0 {
            return if target > 0 { 100.0 } else { 0.0 };
        }
        (target as f64 - source as f64) / source as f64 * 100.0
    }

    /// Share of modules present in both repositories, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn overlap_percentage(&self) -> f64 {
        if self.mode != ComparisonMode::Repository {
            return 0.0;
        }
        let total = self.only_in_source.len() + self.only_in_target.len() + self.in_both.len();
        if total == 0 {
            return 0.0;
        }
        self.in_both.len() as f64 / total as f64 * 100.0
    }
}

/// Kind of one reported module difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// New in the target version.
    Added,
    /// Gone from the target version.
    Removed,
    /// Present in both versions.
    Unchanged,
    /// Only in the source repository.
    OnlyInSource,
    /// Only in the target repository.
    OnlyInTarget,
    /// In both repositories.
    InBoth,
}

impl ChangeType {
    /// Label used in reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Unchanged => "unchanged",
            Self::OnlyInSource => "only_in_source",
            Self::OnlyInTarget => "only_in_target",
            Self::InBoth => "in_both",
        }
    }
}

/// One module with its change classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleDifference<'a> {
    /// The module.
    pub module: &'a ModuleRecord,
    /// How it changed.
    pub change_type: ChangeType,
}

/// Full outcome of one comparison run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    /// Source repository identifier (`owner/name`).
    pub source_repo: String,
    /// Source version as requested.
    pub source_version: String,
    /// Target repository identifier (`owner/name`).
    pub target_repo: String,
    /// Target version as requested.
    pub target_version: String,
    /// Mode chosen from the repository identifiers.
    pub mode: ComparisonMode,
    /// Per-category deltas in category declaration order.
    pub categories: Vec<CategoryComparison>,
}

impl ComparisonResult {
    /// Whether both sides name the same repository.
    #[must_use]
    pub fn is_same_repo(&self) -> bool {
        self.source_repo == self.target_repo
    }

    /// Comparison for one category, if present.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&CategoryComparison> {
        self.categories.iter().find(|c| c.category == name)
    }

    /// Modules on the source side across all categories.
    #[must_use]
    pub fn total_source_modules(&self) -> usize {
        self.categories.iter().map(CategoryComparison::total_source).sum()
    }

    /// Modules on the target side across all categories.
    #[must_use]
    pub fn total_target_modules(&self) -> usize {
        self.categories.iter().map(CategoryComparison::total_target).sum()
    }

    /// Derive statistics from the current state.
    #[must_use]
    pub fn get_statistics(&self) -> ComparisonStatistics {
        ComparisonStatistics::from_result(self)
    }

    /// Flat list of differences, category by category. Renames are reported
    /// separately through [`CategoryComparison::renamed`].
    #[must_use]
    pub fn differences(&self, include_unchanged: bool) -> Vec<ModuleDifference<'_>> {
        let mut out = Vec::new();
        for category in &self.categories {
            let groups: [(&[ModuleRecord], ChangeType, bool); 3] = match self.mode {
                ComparisonMode::Version => [
                    (category.added.as_slice(), ChangeType::Added, true),
                    (category.removed.as_slice(), ChangeType::Removed, true),
                    (category.unchanged.as_slice(), ChangeType::Unchanged, include_unchanged),
                ],
                ComparisonMode::Repository => [
                    (category.only_in_source.as_slice(), ChangeType::OnlyInSource, true),
                    (category.only_in_target.as_slice(), ChangeType::OnlyInTarget, true),
                    (category.in_both.as_slice(), ChangeType::InBoth, include_unchanged),
                ],
            };
            for (modules, change_type, wanted) in groups {
                if wanted {
                    out.extend(modules.iter().map(|module| ModuleDifference { module, change_type }));
                }
            }
        }
        out
    }

    /// Names of categories with at least one change.
    #[must_use]
    pub fn categories_with_changes(&self) -> Vec<&str> {
        self.categories.iter().filter(|c| c.has_changes()).map(|c| c.category.as_str()).collect()
    }
}
