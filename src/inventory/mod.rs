//! Module records, per-version inventories, and the fetcher boundary that
//! produces them.

pub mod extract;
pub mod fetcher;

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::config::RepoConfig;
use crate::error::Result;
use crate::ports::CommitInfo;

pub use fetcher::HostInventoryFetcher;

/// One logical module found in a repository snapshot.
///
/// Equality and hashing use `name` and `category` only. The same module can
/// live at different paths or in different repositories and still compare
/// equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// Logical name with the adapter-type suffix removed, e.g. `appnexus`.
    pub name: String,
    /// Category, e.g. `Bid Adapters`.
    pub category: String,
    /// Source location. Informational only.
    pub path: String,
    /// Registry key of the owning repository.
    pub repo: String,
}

impl ModuleRecord {
    /// Build a record.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        path: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), category: category.into(), path: path.into(), repo: repo.into() }
    }
}

impl PartialEq for ModuleRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.category == other.category
    }
}

impl Eq for ModuleRecord {}

impl Hash for ModuleRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.category.hash(state);
    }
}

/// Categorised module records for one repository at one version.
///
/// Categories keep insertion order, which is the declaration order from
/// the repository configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    categories: Vec<(String, Vec<ModuleRecord>)>,
}

impl Inventory {
    /// An empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the records for `category`, replacing any already present.
    pub fn insert(&mut self, category: impl Into<String>, records: Vec<ModuleRecord>) {
        let category = category.into();
        match self.categories.iter_mut().find(|(name, _)| *name == category) {
            Some((_, existing)) => *existing = records,
            None => self.categories.push((category, records)),
        }
    }

    /// Append one record to its own category, creating the category on first use.
    pub fn push(&mut self, record: ModuleRecord) {
        match self.categories.iter_mut().find(|(name, _)| *name == record.category) {
            Some((_, existing)) => existing.push(record),
            None => self.categories.push((record.category.clone(), vec![record])),
        }
    }

    /// Records in `category`; empty when the category is absent.
    #[must_use]
    pub fn get(&self, category: &str) -> &[ModuleRecord] {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map_or(&[], |(_, records)| records.as_slice())
    }

    /// Category names in insertion order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    /// `(category, records)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ModuleRecord])> {
        self.categories.iter().map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// Every record, category by category.
    pub fn records(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.categories.iter().flat_map(|(_, records)| records)
    }

    /// Whether a module with this name exists in `category`.
    #[must_use]
    pub fn contains(&self, category: &str, name: &str) -> bool {
        self.get(category).iter().any(|r| r.name == name)
    }

    /// Total number of records across all categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.iter().map(|(_, records)| records.len()).sum()
    }

    /// Whether no category holds any record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Produces module inventories for a configured repository.
///
/// Implementations must return one entry per configured category, possibly
/// empty, and fail only when the repository or version itself cannot be
/// read.
pub trait InventoryFetcher {
    /// Fetch every configured category of `config` at `version`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Fetch`] on transport, auth or
    /// not-found failures.
    fn fetch_inventory(&self, config: &RepoConfig, version: &str) -> Result<Inventory>;

    /// Release tags of the repository, in any order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Fetch`] when tags cannot be listed.
    fn list_versions(&self, _config: &RepoConfig) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Oldest commit touching `path`, when the backend can tell.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Fetch`] when the history query fails.
    fn first_commit(&self, _config: &RepoConfig, _path: &str) -> Result<Option<CommitInfo>> {
        Ok(None)
    }
}
