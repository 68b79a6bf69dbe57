//! Repository registry: which repositories can be compared and how their
//! module inventories are laid out.
//!
//! Built-in entries cover the Prebid repositories. A YAML file can replace
//! or extend them:
//!
//! ```yaml
//! prebid-js:
//!   repo: prebid/Prebid.js
//!   kind: prebid_js
//!   fetch_strategy: filenames_only
//!   paths:
//!     - category: Bid Adapters
//!       path: modules
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ports::FileSystem;

/// Environment variable naming an optional registry file.
pub const CONFIG_ENV: &str = "MODCOMPARE_CONFIG";

/// Repository family; selects the filename → module extraction rule once
/// at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepoKind {
    /// Prebid.js: one file per module, kind encoded in the filename suffix.
    PrebidJs,
    /// Prebid Server (Go): one directory per module.
    PrebidServerGo,
    /// Prebid Server (Java): one directory per module.
    PrebidServerJava,
    /// Prebid documentation site: one markdown page per module.
    PrebidDocs,
    /// Anything else: file stems, category taken from configuration.
    #[default]
    Default,
}

/// How paths below a configured directory are discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Files directly inside the directory.
    FilenamesOnly,
    /// Directories up to two levels below the directory.
    DirectoryNames,
    /// Every file below the directory.
    #[default]
    FullContent,
}

/// One category and the source-tree path its modules live under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPath {
    /// Category name, e.g. `Bid Adapters`.
    pub category: String,
    /// Directory path inside the repository, e.g. `modules`.
    pub path: String,
}

/// Resolved configuration for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Registry key, e.g. `prebid-js`. Filled from the map key on load.
    #[serde(skip)]
    pub key: String,
    /// Full repository name, `owner/name`.
    pub repo: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Extraction rule family.
    #[serde(default)]
    pub kind: RepoKind,
    /// Path discovery hint for the fetcher.
    #[serde(default)]
    pub fetch_strategy: FetchStrategy,
    /// Forces a specific ref regardless of the requested version.
    #[serde(default)]
    pub version_override: Option<String>,
    /// Categories in declaration order.
    #[serde(default)]
    pub paths: Vec<CategoryPath>,
}

impl RepoConfig {
    /// The ref to fetch for a requested version.
    #[must_use]
    pub fn effective_version<'a>(&'a self, requested: &'a str) -> &'a str {
        self.version_override.as_deref().unwrap_or(requested)
    }

    /// Category names in declaration order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(|p| p.category.as_str())
    }

    fn validate(&self) -> Result<()> {
        let fail = |message: String| Error::Configuration { key: self.key.clone(), message };
        if self.repo.trim().is_empty() {
            return Err(fail("missing 'repo'".to_string()));
        }
        if !self.repo.contains('/') {
            return Err(fail(format!("repo '{}' is not in owner/name form", self.repo)));
        }
        for entry in &self.paths {
            if entry.category.trim().is_empty() {
                return Err(fail("category name must not be empty".to_string()));
            }
            if entry.path.trim().is_empty() {
                return Err(fail(format!("category '{}' has an empty path", entry.category)));
            }
        }
        Ok(())
    }
}

/// All known repositories, keyed by short name.
#[derive(Debug, Clone, Default)]
pub struct RepoRegistry {
    repos: BTreeMap<String, RepoConfig>,
}

impl RepoRegistry {
    /// Registry containing only the built-in Prebid repositories.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for config in builtin_configs() {
            registry.repos.insert(config.key.clone(), config);
        }
        registry
    }

    /// Parse registry entries from YAML, validating each one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the YAML is malformed or an entry
    /// fails validation.
    pub fn from_yaml(source: &str, origin: &str) -> Result<Self> {
        let mut repos: BTreeMap<String, RepoConfig> = serde_yaml::from_str(source)
            .map_err(|e| Error::Configuration { key: origin.to_string(), message: e.to_string() })?;
        for (key, config) in &mut repos {
            config.key.clone_from(key);
            config.validate()?;
        }
        Ok(Self { repos })
    }

    /// Built-ins overlaid with entries from `path`, if one is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the file cannot be read or parsed.
    pub fn load(fs: &dyn FileSystem, path: Option<&Path>) -> Result<Self> {
        let mut registry = Self::builtin();
        let Some(path) = path else {
            debug!("No registry file given, using built-in repositories");
            return Ok(registry);
        };
        let origin = path.display().to_string();
        let content = fs
            .read_to_string(path)
            .map_err(|e| Error::Configuration { key: origin.clone(), message: e.to_string() })?;
        let overlay = Self::from_yaml(&content, &origin)?;
        info!("Loaded {} repository entries from {origin}", overlay.repos.len());
        registry.repos.extend(overlay.repos);
        Ok(registry)
    }

    /// Look up a repository by key, then by full `owner/name`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RepoConfig> {
        self.repos.get(key).or_else(|| self.repos.values().find(|c| c.repo == key))
    }

    /// Like [`get`](Self::get) but fails with a configuration error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the key is unknown.
    pub fn resolve(&self, key: &str) -> Result<&RepoConfig> {
        self.get(key).ok_or_else(|| Error::unknown_repository(key))
    }

    /// Iterate configured repositories in key order.
    pub fn iter(&self) -> impl Iterator<Item = &RepoConfig> {
        self.repos.values()
    }
}

fn category_paths(pairs: &[(&str, &str)]) -> Vec<CategoryPath> {
    pairs
        .iter()
        .map(|(category, path)| CategoryPath {
            category: (*category).to_string(),
            path: (*path).to_string(),
        })
        .collect()
}

fn builtin_configs() -> Vec<RepoConfig> {
    vec![
        RepoConfig {
            key: "prebid-js".into(),
            repo: "prebid/Prebid.js".into(),
            description: "Prebid.js header bidding library".into(),
            kind: RepoKind::PrebidJs,
            fetch_strategy: FetchStrategy::FilenamesOnly,
            version_override: None,
            paths: category_paths(&[
                ("Bid Adapters", "modules"),
                ("Analytics Adapters", "modules"),
                ("RTD Modules", "modules"),
                ("User ID Modules", "modules"),
                ("Other Modules", "modules"),
            ]),
        },
        RepoConfig {
            key: "prebid-server".into(),
            repo: "prebid/prebid-server".into(),
            description: "Prebid Server (Go)".into(),
            kind: RepoKind::PrebidServerGo,
            fetch_strategy: FetchStrategy::DirectoryNames,
            version_override: None,
            paths: category_paths(&[
                ("Bid Adapters", "adapters"),
                ("Analytics Adapters", "analytics"),
                ("General Modules", "modules"),
            ]),
        },
        RepoConfig {
            key: "prebid-server-java".into(),
            repo: "prebid/prebid-server-java".into(),
            description: "Prebid Server (Java)".into(),
            kind: RepoKind::PrebidServerJava,
            fetch_strategy: FetchStrategy::DirectoryNames,
            version_override: None,
            paths: category_paths(&[
                ("Bid Adapters", "src/main/java/org/prebid/server/bidder"),
                ("Analytics Adapters", "src/main/java/org/prebid/server/analytics/reporter"),
                ("General Modules", "extra/modules"),
                ("Privacy Modules", "src/main/java/org/prebid/server/activity/infrastructure/privacy"),
            ]),
        },
        RepoConfig {
            key: "prebid-docs".into(),
            repo: "prebid/prebid.github.io".into(),
            description: "Prebid documentation site".into(),
            kind: RepoKind::PrebidDocs,
            fetch_strategy: FetchStrategy::FilenamesOnly,
            version_override: Some("master".into()),
            paths: category_paths(&[
                ("Bid Adapters", "dev-docs/bidders"),
                ("Analytics Adapters", "dev-docs/analytics"),
                ("User ID Modules", "dev-docs/modules/userid-submodules"),
                ("RTD Modules", "dev-docs/modules"),
                ("Other Modules", "dev-docs/modules"),
            ]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_resolves_by_key_and_full_name() {
        let registry = RepoRegistry::builtin();
        assert_eq!(registry.resolve("prebid-js").unwrap().repo, "prebid/Prebid.js");
        assert_eq!(registry.resolve("prebid/prebid-server").unwrap().key, "prebid-server");
    }

    #[test]
    fn unknown_key_fails_with_configuration_error() {
        let registry = RepoRegistry::builtin();
        let err = registry.resolve("not-a-repo").unwrap_err();
        assert!(matches!(err, Error::Configuration { ref key, .. } if key == "not-a-repo"));
    }

    #[test]
    fn yaml_entries_keep_category_declaration_order() {
        let yaml = "\
custom:
  repo: acme/widgets
  kind: prebid_js
  fetch_strategy: filenames_only
  paths:
    - category: Other Modules
      path: modules
    - category: Bid Adapters
      path: modules
";
        let registry = RepoRegistry::from_yaml(yaml, "test.yaml").unwrap();
        let config = registry.resolve("custom").unwrap();
        assert_eq!(config.key, "custom");
        assert_eq!(config.kind, RepoKind::PrebidJs);
        let names: Vec<&str> = config.category_names().collect();
        assert_eq!(names, vec!["Other Modules", "Bid Adapters"]);
    }

    #[test]
    fn yaml_entry_without_owner_is_rejected() {
        let yaml = "bad:\n  repo: widgets\n";
        let err = RepoRegistry::from_yaml(yaml, "test.yaml").unwrap_err();
        assert!(err.to_string().contains("owner/name"));
    }

    #[test]
    fn yaml_entry_with_empty_path_is_rejected() {
        let yaml = "bad:\n  repo: acme/widgets\n  paths:\n    - category: Bid Adapters\n      path: ''\n";
        let err = RepoRegistry::from_yaml(yaml, "test.yaml").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn version_override_wins_over_requested_version() {
        let registry = RepoRegistry::builtin();
        let docs = registry.resolve("prebid-docs").unwrap();
        assert_eq!(docs.effective_version("9.0.0"), "master");
        let js = registry.resolve("prebid-js").unwrap();
        assert_eq!(js.effective_version("9.0.0"), "9.0.0");
    }
}
