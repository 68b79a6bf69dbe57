//! Module introduction history: for every module in a target snapshot,
//! the earliest release that shipped it.
//!
//! A per-repository JSON cache records the first release of each major
//! version in which every module appeared. Modules the cache does not know
//! are looked up on demand with a binary search over releases.

pub mod report;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{RepoConfig, RepoRegistry};
use crate::error::{Error, Result};
use crate::inventory::{Inventory, InventoryFetcher, ModuleRecord};
use crate::ports::{Clock, FileSystem};
use crate::versions::{compare_tags, first_of_each_major, semantic_versions, SemVer};

pub use report::render_history;

/// Version reported when no release is known to contain a module.
pub const FALLBACK_VERSION: &str = "master";

/// Default cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = ".modcompare/cache";

/// When and where one module first appeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleHistoryEntry {
    /// Module name.
    pub name: String,
    /// Module category.
    pub category: String,
    /// Earliest release found to contain the module, or `master`.
    pub first_version: String,
    /// Major component of `first_version`, `0` for the fallback.
    pub first_major: u64,
    /// Source path of the module.
    pub path: String,
    /// Date of the oldest commit touching `path`, when looked up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_commit_date: Option<String>,
    /// Hash of that commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_commit_sha: Option<String>,
}

impl ModuleHistoryEntry {
    fn from_release(record: &ModuleRecord, version: &str) -> Self {
        Self {
            name: record.name.clone(),
            category: record.category.clone(),
            first_version: version.to_string(),
            first_major: SemVer::parse_lenient(version).major,
            path: record.path.clone(),
            first_commit_date: None,
            first_commit_sha: None,
        }
    }
}

/// On-disk history cache for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryCache {
    /// Repository identifier (`owner/name`).
    pub repo: String,
    /// Newest release known at analysis time.
    pub last_analyzed_version: String,
    /// When the analysis ran.
    pub analyzed_at: DateTime<Utc>,
    /// Releases whose snapshots were fetched, oldest first.
    pub analyzed_versions: Vec<String>,
    /// Earliest sighting of every module seen in those releases.
    pub modules: Vec<ModuleHistoryEntry>,
}

impl HistoryCache {
    fn find(&self, name: &str, category: &str) -> Option<&ModuleHistoryEntry> {
        self.modules.iter().find(|e| e.name == name && e.category == category)
    }
}

/// Outcome of a history analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleHistoryResult {
    /// Repository identifier (`owner/name`).
    pub repo: String,
    /// Snapshot whose modules were traced.
    pub target_version: String,
    /// Whether an existing cache was reused.
    pub from_cache: bool,
    /// Timestamp of the cache analysis.
    pub analyzed_at: DateTime<Utc>,
    /// One entry per module in the target snapshot, in category order.
    pub entries: Vec<ModuleHistoryEntry>,
}

impl ModuleHistoryResult {
    /// Number of traced modules.
    #[must_use]
    pub fn total_modules(&self) -> usize {
        self.entries.len()
    }

    /// Entries grouped by category in declaration order, names sorted.
    #[must_use]
    pub fn by_category(&self) -> Vec<(&str, Vec<&ModuleHistoryEntry>)> {
        let mut groups: Vec<(&str, Vec<&ModuleHistoryEntry>)> = Vec::new();
        for entry in &self.entries {
            match groups.iter_mut().find(|(c, _)| *c == entry.category) {
                Some((_, list)) => list.push(entry),
                None => groups.push((entry.category.as_str(), vec![entry])),
            }
        }
        for (_, list) in &mut groups {
            list.sort_by(|a, b| a.name.cmp(&b.name));
        }
        groups
    }

    /// Entries grouped by first major version, names sorted.
    #[must_use]
    pub fn by_major(&self) -> BTreeMap<u64, Vec<&ModuleHistoryEntry>> {
        let mut groups: BTreeMap<u64, Vec<&ModuleHistoryEntry>> = BTreeMap::new();
        for entry in &self.entries {
            groups.entry(entry.first_major).or_default().push(entry);
        }
        for list in groups.values_mut() {
            list.sort_by(|a, b| a.name.cmp(&b.name));
        }
        groups
    }
}

/// Progress checkpoints of a history analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryProgress {
    /// A valid cache was found.
    UsingCache,
    /// Fetching the first release of a major version.
    AnalyzingMajor {
        /// Major version.
        major: u64,
        /// Release fetched.
        version: String,
        /// 1-based position.
        index: usize,
        /// Number of majors.
        total: usize,
    },
    /// Fetching the target snapshot.
    FetchingTarget(String),
    /// Looking up a module missing from the cache.
    LookingUp(String),
}

impl fmt::Display for HistoryProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsingCache => f.write_str("Using cached history"),
            Self::AnalyzingMajor { major, version, index, total } => {
                write!(f, "Analyzing major version {major} at {version} ({index}/{total})")
            }
            Self::FetchingTarget(version) => write!(f, "Fetching modules at {version}"),
            Self::LookingUp(name) => write!(f, "Looking up history of {name}"),
        }
    }
}

/// Callback receiving history progress checkpoints.
pub type HistoryProgressFn<'p> = &'p dyn Fn(&HistoryProgress);

fn report_progress(progress: Option<HistoryProgressFn<'_>>, event: &HistoryProgress) {
    debug!("{event}");
    if let Some(callback) = progress {
        callback(event);
    }
}

/// Traces module introduction for configured repositories.
pub struct HistoryTracker<'a> {
    registry: &'a RepoRegistry,
    fetcher: &'a dyn InventoryFetcher,
    fs: &'a dyn FileSystem,
    clock: &'a dyn Clock,
    cache_dir: PathBuf,
}

impl<'a> HistoryTracker<'a> {
    /// Creates a tracker that keeps its cache files under `cache_dir`.
    pub fn new(
        registry: &'a RepoRegistry,
        fetcher: &'a dyn InventoryFetcher,
        fs: &'a dyn FileSystem,
        clock: &'a dyn Clock,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self { registry, fetcher, fs, clock, cache_dir: cache_dir.into() }
    }

    /// Cache file for `repo` (`owner/name` becomes `owner_name_history.json`).
    #[must_use]
    pub fn cache_path(&self, repo: &str) -> PathBuf {
        self.cache_dir.join(format!("{}_history.json", repo.replace('/', "_")))
    }

    /// Trace every module of `repo_key` at `target_version` (default: the
    /// newest analysed release) back to its first release.
    ///
    /// # Errors
    ///
    /// Fails on an unknown repository key, when no release snapshot can be
    /// fetched during a full analysis, when the target snapshot cannot be
    /// fetched, or when a fresh cache cannot be written.
    pub fn analyze(
        &self,
        repo_key: &str,
        target_version: Option<&str>,
        force_refresh: bool,
        progress: Option<HistoryProgressFn<'_>>,
    ) -> Result<ModuleHistoryResult> {
        let config = self.registry.resolve(repo_key)?;
        let cached = if force_refresh { None } else { self.load_cache(&config.repo) };
        let from_cache = cached.is_some();
        let mut releases = None;

        let cache = if let Some(cache) = cached {
            info!("Using cached history for {}", config.repo);
            report_progress(progress, &HistoryProgress::UsingCache);
            cache
        } else {
            let ordered = semantic_versions(&self.fetcher.list_versions(config)?);
            let cache = self.rebuild(config, &ordered, progress)?;
            self.save_cache(&cache)?;
            releases = Some(ordered);
            cache
        };

        let target = target_version.unwrap_or(&cache.last_analyzed_version).to_string();
        report_progress(progress, &HistoryProgress::FetchingTarget(target.clone()));
        let snapshot = self.fetcher.fetch_inventory(config, &target)?;

        let mut lookup = OnDemandLookup { fetcher: self.fetcher, config, snapshots: HashMap::new() };
        let mut entries = Vec::with_capacity(snapshot.len());
        for record in snapshot.records() {
            // Cached introductions newer than the target come from a later major scan.
            if let Some(known) = cache.find(&record.name, &record.category) {
                if compare_tags(&known.first_version, &target).is_le() {
                    entries.push(known.clone());
                    continue;
                }
            }
            report_progress(progress, &HistoryProgress::LookingUp(record.name.clone()));
            if releases.is_none() {
                releases = Some(self.release_list(config));
            }
            let candidates = releases_up_to(releases.as_deref().unwrap_or_default(), &target);
            entries.push(lookup.trace(record, &candidates));
        }
        info!("Traced {} modules of {} at {target}", entries.len(), config.repo);

        Ok(ModuleHistoryResult {
            repo: config.repo.clone(),
            target_version: target,
            from_cache,
            analyzed_at: cache.analyzed_at,
            entries,
        })
    }

    /// Releases for on-demand lookups. A tag listing failure leaves only the
    /// fallback available.
    fn release_list(&self, config: &RepoConfig) -> Vec<String> {
        match self.fetcher.list_versions(config) {
            Ok(tags) => semantic_versions(&tags),
            Err(e) => {
                warn!("Cannot list releases of {}: {e}", config.repo);
                Vec::new()
            }
        }
    }

    fn load_cache(&self, repo: &str) -> Option<HistoryCache> {
        let path = self.cache_path(repo);
        if !self.fs.exists(&path) {
            return None;
        }
        let parsed = self
            .fs
            .read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<HistoryCache>(&raw).map_err(|e| e.to_string()));
        match parsed {
            Ok(cache) if cache.repo == repo => Some(cache),
            Ok(cache) => {
                warn!("Ignoring cache {} recorded for {}", path.display(), cache.repo);
                None
            }
            Err(e) => {
                warn!("Ignoring unreadable cache {}: {e}", path.display());
                None
            }
        }
    }

    fn save_cache(&self, cache: &HistoryCache) -> Result<()> {
        let path = self.cache_path(&cache.repo);
        let failed = |message: String| Error::Cache { repo: cache.repo.clone(), message };
        let json = serde_json::to_string_pretty(cache).map_err(|e| failed(e.to_string()))?;
        self.fs.write(&path, &json).map_err(|e| failed(format!("{}: {e}", path.display())))?;
        info!("Saved history cache to {}", path.display());
        Ok(())
    }

    /// Full analysis over the first release of every major version.
    fn rebuild(
        &self,
        config: &RepoConfig,
        ordered: &[String],
        progress: Option<HistoryProgressFn<'_>>,
    ) -> Result<HistoryCache> {
        let majors = first_of_each_major(ordered);
        info!("Analyzing {} major versions of {}", majors.len(), config.repo);

        let mut analyzed_versions = Vec::new();
        let mut modules: Vec<ModuleHistoryEntry> = Vec::new();
        for (index, (major, version)) in majors.iter().enumerate() {
            report_progress(
                progress,
                &HistoryProgress::AnalyzingMajor {
                    major: *major,
                    version: version.clone(),
                    index: index + 1,
                    total: majors.len(),
                },
            );
            let snapshot = match self.fetcher.fetch_inventory(config, version) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Skipping {version}: {e}");
                    continue;
                }
            };
            analyzed_versions.push(version.clone());
            for record in snapshot.records() {
                if !modules.iter().any(|m| m.name == record.name && m.category == record.category) {
                    debug!("{} first seen in {version}", record.name);
                    modules.push(ModuleHistoryEntry::from_release(record, version));
                }
            }
        }

        if analyzed_versions.is_empty() && !majors.is_empty() {
            return Err(Error::Fetch {
                repo: config.repo.clone(),
                version: "releases".to_string(),
                category: None,
                message: "no release snapshot could be fetched".to_string(),
            });
        }

        Ok(HistoryCache {
            repo: config.repo.clone(),
            last_analyzed_version: ordered.last().map_or(FALLBACK_VERSION, String::as_str).to_string(),
            analyzed_at: self.clock.now(),
            analyzed_versions,
            modules,
        })
    }
}

/// Releases not newer than `target`; every release when `target` is not a
/// semantic version.
fn releases_up_to(ordered: &[String], target: &str) -> Vec<String> {
    if SemVer::parse(target).is_none() {
        return ordered.to_vec();
    }
    ordered.iter().filter(|v| compare_tags(v, target).is_le()).cloned().collect()
}

/// Binary search for the earliest release containing a module, with
/// snapshots memoised across lookups of one analysis.
struct OnDemandLookup<'t> {
    fetcher: &'t dyn InventoryFetcher,
    config: &'t RepoConfig,
    snapshots: HashMap<String, Option<Inventory>>,
}

impl OnDemandLookup<'_> {
    fn contains(&mut self, version: &str, record: &ModuleRecord) -> bool {
        let (fetcher, config) = (self.fetcher, self.config);
        let snapshot = self.snapshots.entry(version.to_string()).or_insert_with(|| {
            fetcher
                .fetch_inventory(config, version)
                .map_err(|e| warn!("Lookup fetch failed at {version}: {e}"))
                .ok()
        });
        snapshot.as_ref().is_some_and(|inv| inv.contains(&record.category, &record.name))
    }

    /// Assumes a module stays once added: presence is monotone over releases.
    fn trace(&mut self, record: &ModuleRecord, releases: &[String]) -> ModuleHistoryEntry {
        let found = match releases.last() {
            Some(newest) if self.contains(newest, record) => {
                let (mut lo, mut hi) = (0, releases.len() - 1);
                while lo < hi {
                    let mid = lo + (hi - lo) / 2;
                    if self.contains(&releases[mid], record) {
                        hi = mid;
                    } else {
                        lo = mid + 1;
                    }
                }
                Some(releases[lo].as_str())
            }
            _ => None,
        };

        let mut entry = ModuleHistoryEntry::from_release(record, found.unwrap_or(FALLBACK_VERSION));
        match self.fetcher.first_commit(self.config, &record.path) {
            Ok(Some(commit)) => {
                entry.first_commit_sha = Some(commit.sha);
                entry.first_commit_date = Some(commit.date);
            }
            Ok(None) => {}
            Err(e) => warn!("No commit history for {}: {e}", record.path),
        }
        debug!("{} traced to {}", record.name, entry.first_version);
        entry
    }
}
