//! Set differences between two module lists of one category.

use std::collections::HashSet;

use crate::inventory::ModuleRecord;

/// Raw delta between two versions of one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionDelta {
    /// In target, not in source.
    pub added: Vec<ModuleRecord>,
    /// In source, not in target.
    pub removed: Vec<ModuleRecord>,
    /// In both; the source-side record is kept.
    pub unchanged: Vec<ModuleRecord>,
}

/// Raw delta between two different repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryDelta {
    /// Only present in the source repository.
    pub only_in_source: Vec<ModuleRecord>,
    /// Only present in the target repository.
    pub only_in_target: Vec<ModuleRecord>,
    /// Present in both; the source-side record is kept.
    pub in_both: Vec<ModuleRecord>,
}

/// Split `source` and `target` into source-only, target-only and shared,
/// each sorted by name.
fn partition(
    source: &[ModuleRecord],
    target: &[ModuleRecord],
) -> (Vec<ModuleRecord>, Vec<ModuleRecord>, Vec<ModuleRecord>) {
    let source_set: HashSet<&ModuleRecord> = source.iter().collect();
    let target_set: HashSet<&ModuleRecord> = target.iter().collect();

    let mut only_source: Vec<ModuleRecord> =
        source_set.difference(&target_set).map(|r| (*r).clone()).collect();
    let mut only_target: Vec<ModuleRecord> =
        target_set.difference(&source_set).map(|r| (*r).clone()).collect();
    // `HashSet::intersection` yields from the smaller set; walk the source side.
    let mut shared: Vec<ModuleRecord> =
        source_set.iter().filter(|r| target_set.contains(*r)).map(|r| (*r).clone()).collect();

    for list in [&mut only_source, &mut only_target, &mut shared] {
        list.sort_by(|a, b| a.name.cmp(&b.name));
    }
    (only_source, only_target, shared)
}

/// Diff two versions of the same repository.
#[must_use]
pub fn diff_versions(source: &[ModuleRecord], target: &[ModuleRecord]) -> VersionDelta {
    let (removed, added, unchanged) = partition(source, target);
    VersionDelta { added, removed, unchanged }
}

/// Diff two different repositories.
#[must_use]
pub fn diff_repositories(source: &[ModuleRecord], target: &[ModuleRecord]) -> RepositoryDelta {
    let (only_in_source, only_in_target, in_both) = partition(source, target);
    RepositoryDelta { only_in_source, only_in_target, in_both }
}
