//! Module comparison engine: category diffs, rename detection, result
//! model, statistics and rendering.

pub mod comparator;
pub mod cumulative;
pub mod differ;
pub mod format;
pub mod model;
pub mod rename;
pub mod stats;

pub use comparator::{compare_inventories, Comparator, Progress, ProgressFn};
pub use cumulative::{CumulativeComparisonResult, CumulativeModuleChange};
pub use format::{render_comparison, render_cumulative, Format};
pub use model::{CategoryComparison, ChangeType, ComparisonMode, ComparisonResult, ModuleDifference};
pub use rename::{detect_renames, DetectionMethod, ModuleRename, RenameDetection};
pub use stats::{CategoryStatistics, ComparisonStatistics};
