//! Inventory fetcher backed by a [`RepoHost`].

use std::collections::HashMap;

use log::debug;

use crate::config::{FetchStrategy, RepoConfig};
use crate::error::{Error, Result};
use crate::ports::{CommitInfo, EntryKind, RepoHost, TreeEntry};

use super::extract::extract_modules;
use super::{Inventory, InventoryFetcher};

/// Fetches inventories by listing configured paths on a source-control host.
pub struct HostInventoryFetcher<'a> {
    host: &'a dyn RepoHost,
}

impl<'a> HostInventoryFetcher<'a> {
    /// Creates a fetcher over the given host.
    #[must_use]
    pub fn new(host: &'a dyn RepoHost) -> Self {
        Self { host }
    }
}

/// Narrow a recursive listing to what `strategy` considers.
fn select_entries(entries: Vec<TreeEntry>, strategy: FetchStrategy) -> Vec<TreeEntry> {
    entries
        .into_iter()
        .filter(|entry| {
            let depth = entry.path.matches('/').count();
            match strategy {
                FetchStrategy::FilenamesOnly => entry.kind == EntryKind::File && depth == 0,
                FetchStrategy::DirectoryNames => entry.kind == EntryKind::Dir && depth <= 1,
                FetchStrategy::FullContent => entry.kind == EntryKind::File,
            }
        })
        .collect()
}

impl InventoryFetcher for HostInventoryFetcher<'_> {
    fn fetch_inventory(&self, config: &RepoConfig, version: &str) -> Result<Inventory> {
        let reference = config.effective_version(version);
        let mut listings: HashMap<&str, Vec<TreeEntry>> = HashMap::new();
        let mut inventory = Inventory::new();

        for entry in &config.paths {
            let path = entry.path.as_str();
            if !listings.contains_key(path) {
                let listed = self.host.list_tree(&config.repo, reference, path).map_err(|e| {
                    Error::Fetch {
                        repo: config.repo.clone(),
                        version: reference.to_string(),
                        category: Some(entry.category.clone()),
                        message: e.to_string(),
                    }
                })?;
                debug!("Listed {} entries under {}:{path} at {reference}", listed.len(), config.repo);
                listings.insert(path, select_entries(listed, config.fetch_strategy));
            }
            let selected = listings.get(path).map_or(&[][..], Vec::as_slice);
            let records = extract_modules(config.kind, &entry.category, path, selected, &config.key);
            debug!("{}: {} modules in '{}'", config.key, records.len(), entry.category);
            inventory.insert(entry.category.clone(), records);
        }

        Ok(inventory)
    }

    fn list_versions(&self, config: &RepoConfig) -> Result<Vec<String>> {
        self.host.list_tags(&config.repo).map_err(|e| Error::Fetch {
            repo: config.repo.clone(),
            version: "tags".to_string(),
            category: None,
            message: e.to_string(),
        })
    }

    fn first_commit(&self, config: &RepoConfig, path: &str) -> Result<Option<CommitInfo>> {
        self.host.first_commit(&config.repo, path).map_err(|e| Error::Fetch {
            repo: config.repo.clone(),
            version: format!("history of {path}"),
            category: None,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::RepoRegistry;
    use std::sync::Mutex;

    /// In-memory host keyed by `(reference, directory)`.
    #[derive(Default)]
    pub(crate) struct FakeHost {
        pub trees: HashMap<(String, String), Vec<TreeEntry>>,
        pub tags: Vec<String>,
        pub commits: HashMap<String, CommitInfo>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeHost {
        pub fn with_tree(mut self, reference: &str, directory: &str, entries: Vec<TreeEntry>) -> Self {
            self.trees.insert((reference.into(), directory.into()), entries);
            self
        }
    }

    impl RepoHost for FakeHost {
        fn list_tree(
            &self,
            _repo: &str,
            reference: &str,
            directory: &str,
        ) -> std::result::Result<Vec<TreeEntry>, Box<dyn std::error::Error + Send + Sync>> {
            self.calls.lock().unwrap().push(format!("{reference}:{directory}"));
            if reference == "missing" {
                return Err("404 Not Found".into());
            }
            Ok(self.trees.get(&(reference.into(), directory.into())).cloned().unwrap_or_default())
        }

        fn list_tags(
            &self,
            _repo: &str,
        ) -> std::result::Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(self.tags.clone())
        }

        fn first_commit(
            &self,
            _repo: &str,
            path: &str,
        ) -> std::result::Result<Option<CommitInfo>, Box<dyn std::error::Error + Send + Sync>>
        {
            Ok(self.commits.get(path).cloned())
        }
    }

    pub(crate) fn file(path: &str) -> TreeEntry {
        TreeEntry { path: path.into(), kind: EntryKind::File }
    }

    #[test]
    fn returns_every_configured_category_and_lists_shared_paths_once() {
        let host = FakeHost::default().with_tree(
            "9.0.0",
            "modules",
            vec![file("appnexusBidAdapter.js"), file("criteoIdSystem.js")],
        );
        let registry = RepoRegistry::builtin();
        let config = registry.resolve("prebid-js").unwrap();

        let inventory = HostInventoryFetcher::new(&host).fetch_inventory(config, "9.0.0").unwrap();

        let categories: Vec<&str> = inventory.category_names().collect();
        assert_eq!(
            categories,
            vec!["Bid Adapters", "Analytics Adapters", "RTD Modules", "User ID Modules", "Other Modules"]
        );
        assert_eq!(inventory.get("Bid Adapters")[0].name, "appnexus");
        assert!(inventory.get("RTD Modules").is_empty());
        assert_eq!(host.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn host_failure_becomes_fetch_error_with_context() {
        let host = FakeHost::default();
        let registry = RepoRegistry::builtin();
        let config = registry.resolve("prebid-js").unwrap();

        let err = HostInventoryFetcher::new(&host).fetch_inventory(config, "missing").unwrap_err();
        match err {
            Error::Fetch { repo, version, category, message } => {
                assert_eq!(repo, "prebid/Prebid.js");
                assert_eq!(version, "missing");
                assert_eq!(category.as_deref(), Some("Bid Adapters"));
                assert!(message.contains("404"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn version_override_is_used_as_reference() {
        let host = FakeHost::default();
        let registry = RepoRegistry::builtin();
        let config = registry.resolve("prebid-docs").unwrap();

        let _ = HostInventoryFetcher::new(&host).fetch_inventory(config, "9.0.0").unwrap();
        assert!(host.calls.lock().unwrap().iter().all(|c| c.starts_with("master:")));
    }

    #[test]
    fn directory_strategy_ignores_files_and_deep_dirs() {
        let entries = vec![
            TreeEntry { path: "a".into(), kind: EntryKind::Dir },
            TreeEntry { path: "a/b".into(), kind: EntryKind::Dir },
            TreeEntry { path: "a/b/c".into(), kind: EntryKind::Dir },
            file("a/x.go"),
        ];
        let selected = select_entries(entries, FetchStrategy::DirectoryNames);
        let paths: Vec<&str> = selected.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "a/b"]);
    }
}
