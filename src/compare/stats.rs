//! Aggregate statistics derived from a [`ComparisonResult`].

use serde::Serialize;

use super::model::{CategoryComparison, ComparisonMode, ComparisonResult};

/// Per-category figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStatistics {
    /// Category name.
    pub category: String,
    /// Modules on the source side.
    pub source_total: usize,
    /// Modules on the target side.
    pub target_total: usize,
    /// Added (version mode).
    pub added: usize,
    /// Removed (version mode).
    pub removed: usize,
    /// Renamed (version mode).
    pub renamed: usize,
    /// Unchanged (version mode).
    pub unchanged: usize,
    /// Only in source (repository mode).
    pub only_in_source: usize,
    /// Only in target (repository mode).
    pub only_in_target: usize,
    /// In both (repository mode).
    pub in_both: usize,
    /// Added minus removed.
    pub net_change: i64,
    /// Size change in percent.
    pub change_percentage: f64,
    /// Overlap in percent (repository mode).
    pub overlap_percentage: f64,
}

impl From<&CategoryComparison> for CategoryStatistics {
    fn from(c: &CategoryComparison) -> Self {
        Self {
            category: c.category.clone(),
            source_total: c.total_source(),
            target_total: c.total_target(),
            added: c.added.len(),
            removed: c.removed.len(),
            renamed: c.renamed.len(),
            unchanged: c.unchanged.len(),
            only_in_source: c.only_in_source.len(),
            only_in_target: c.only_in_target.len(),
            in_both: c.in_both.len(),
            net_change: c.net_change(),
            change_percentage: c.change_percentage(),
            overlap_percentage: c.overlap_percentage(),
        }
    }
}

/// Totals, percentages and rankings over all categories.
///
/// A pure function of the result it was computed from; computing it twice
/// from the same result yields equal values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonStatistics {
    /// Mode of the underlying comparison.
    pub mode: ComparisonMode,
    /// Modules on the source side.
    pub source_total: usize,
    /// Modules on the target side.
    pub target_total: usize,
    /// Number of categories compared.
    pub categories_count: usize,
    /// Added across categories.
    pub total_added: usize,
    /// Removed across categories.
    pub total_removed: usize,
    /// Renamed across categories.
    pub total_renamed: usize,
    /// Unchanged across categories.
    pub total_unchanged: usize,
    /// `total_added - total_removed`.
    pub net_change: i64,
    /// Overall size change in percent (version mode).
    pub overall_change_percentage: f64,
    /// Only in source across categories.
    pub total_only_in_source: usize,
    /// Only in target across categories.
    pub total_only_in_target: usize,
    /// In both across categories.
    pub total_in_both: usize,
    /// Overall overlap in percent (repository mode).
    pub overall_overlap_percentage: f64,
    /// Per-category figures in declaration order.
    pub category_stats: Vec<CategoryStatistics>,
    /// Categories by descending change count; ties keep declaration order.
    pub categories_with_most_changes: Vec<(String, usize)>,
    /// Categories by descending growth, excluding empty-source categories
    /// (version mode).
    pub categories_by_growth_rate: Vec<(String, f64)>,
    /// Categories populated only on the source side (repository mode).
    pub unique_categories_source: Vec<String>,
    /// Categories populated only on the target side (repository mode).
    pub unique_categories_target: Vec<String>,
    /// Categories populated on both sides (repository mode).
    pub common_categories: Vec<String>,
}

impl ComparisonStatistics {
    /// Compute statistics for `result`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    pub fn from_result(result: &ComparisonResult) -> Self {
        let categories = &result.categories;
        let sum = |f: fn(&CategoryComparison) -> usize| categories.iter().map(f).sum::<usize>();

        let source_total = result.total_source_modules();
        let target_total = result.total_target_modules();
        let total_added = sum(|c| c.added.len());
        let total_removed = sum(|c| c.removed.len());
        let total_only_in_source = sum(|c| c.only_in_source.len());
        let total_only_in_target = sum(|c| c.only_in_target.len());
        let total_in_both = sum(|c| c.in_both.len());

        let mut most_changes: Vec<(String, usize)> =
            categories.iter().map(|c| (c.category.clone(), c.change_count())).collect();
        most_changes.sort_by(|a, b| b.1.cmp(&a.1));

        let mut stats = Self {
            mode: result.mode,
            source_total,
            target_total,
            categories_count: categories.len(),
            total_added,
            total_removed,
            total_renamed: sum(|c| c.renamed.len()),
            total_unchanged: sum(|c| c.unchanged.len()),
            net_change: total_added as i64 - total_removed as i64,
            overall_change_percentage: 0.0,
            total_only_in_source,
            total_only_in_target,
            total_in_both,
            overall_overlap_percentage: 0.0,
            category_stats: categories.iter().map(CategoryStatistics::from).collect(),
            categories_with_most_changes: most_changes,
            categories_by_growth_rate: Vec::new(),
            unique_categories_source: Vec::new(),
            unique_categories_target: Vec::new(),
            common_categories: Vec::new(),
        };

        match result.mode {
            ComparisonMode::Version => {
                if source_total > 0 {
                    stats.overall_change_percentage =
                        (target_total as f64 - source_total as f64) / source_total as f64 * 100.0;
                }
                let mut growth: Vec<(String, f64)> = categories
                    .iter()
                    .filter(|c| c.total_source() > 0)
                    .map(|c| (c.category.clone(), c.change_percentage()))
                    .collect();
                growth.sort_by(|a, b| b.1.total_cmp(&a.1));
                stats.categories_by_growth_rate = growth;
            }
            ComparisonMode::Repository => {
                let unique = total_only_in_source + total_only_in_target + total_in_both;
                if unique > 0 {
                    stats.overall_overlap_percentage = total_in_both as f64 / unique as f64 * 100.0;
                }
                for c in categories {
                    let name = c.category.clone();
                    match (c.total_source() > 0, c.total_target() > 0) {
                        (true, true) => stats.common_categories.push(name),
                        (true, false) => stats.unique_categories_source.push(name),
                        (false, true) => stats.unique_categories_target.push(name),
                        (false, false) => {}
                    }
                }
                stats.common_categories.sort();
                stats.unique_categories_source.sort();
                stats.unique_categories_target.sort();
            }
        }

        stats
    }
}
