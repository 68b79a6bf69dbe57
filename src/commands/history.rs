//! `modcompare history` command.

use std::env;
use std::path::{Path, PathBuf};

use crate::compare::Format;
use crate::config::RepoRegistry;
use crate::context::ServiceContext;
use crate::history::report::render_history;
use crate::history::{HistoryProgress, HistoryProgressFn, HistoryTracker, DEFAULT_CACHE_DIR};
use crate::inventory::fetcher::HostInventoryFetcher;

/// Environment variable overriding the history cache directory.
pub const CACHE_DIR_ENV: &str = "MODCOMPARE_CACHE_DIR";

/// Arguments of the `history` command.
#[derive(Debug, Clone, Copy)]
pub struct HistoryArgs<'a> {
    /// Repository key or `owner/name`.
    pub repo: &'a str,
    /// Snapshot to trace; the newest analysed release when absent.
    pub version: Option<&'a str>,
    /// Recompute instead of reading the cache.
    pub force_refresh: bool,
    /// Report format.
    pub format: Format,
    /// Directory holding cache files.
    pub cache_dir: &'a Path,
}

/// Cache directory from `MODCOMPARE_CACHE_DIR`, or `.modcompare/cache`.
#[must_use]
pub fn cache_dir() -> PathBuf {
    env::var(CACHE_DIR_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR), PathBuf::from)
}

fn print_progress(event: &HistoryProgress) {
    eprintln!("{event}...");
}

/// Execute the `history` command and return the rendered report.
///
/// # Errors
///
/// Returns an error string for an unknown repository, a failed fetch, or
/// a cache that cannot be written.
pub fn run_with_context(
    ctx: &ServiceContext,
    registry: &RepoRegistry,
    args: &HistoryArgs<'_>,
) -> Result<String, String> {
    let fetcher = HostInventoryFetcher::new(ctx.host.as_ref());
    let tracker =
        HistoryTracker::new(registry, &fetcher, ctx.fs.as_ref(), ctx.clock.as_ref(), args.cache_dir);
    let progress: HistoryProgressFn<'_> = &print_progress;
    let result = tracker
        .analyze(args.repo, args.version, args.force_refresh, Some(progress))
        .map_err(|e| e.to_string())?;
    Ok(render_history(&result, args.format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::config::CassetteConfig;
    use crate::cassette::format::{Cassette, Interaction};
    use crate::history::HistoryCache;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn write_cassette(path: &Path, interactions: Vec<Interaction>) {
        let cassette = Cassette { name: "history".into(), recorded_at: Utc::now(), commit: "abc".into(), interactions };
        std::fs::write(path, serde_yaml::to_string(&cassette).unwrap()).unwrap();
    }

    fn call(seq: u64, port: &str, method: &str, output: serde_json::Value) -> Interaction {
        Interaction { seq, port: port.into(), method: method.into(), input: json!({}), output }
    }

    #[test]
    fn cache_dir_defaults_when_unset() {
        if env::var(CACHE_DIR_ENV).is_err() {
            assert_eq!(cache_dir(), PathBuf::from(DEFAULT_CACHE_DIR));
        }
    }

    #[test]
    fn unknown_repository_is_reported() {
        let ctx = ServiceContext::replaying_from(&CassetteConfig::panic_on_unspecified()).unwrap();
        let args = HistoryArgs {
            repo: "nope",
            version: None,
            force_refresh: false,
            format: Format::Table,
            cache_dir: Path::new("/nonexistent"),
        };
        let err = run_with_context(&ctx, &RepoRegistry::builtin(), &args).unwrap_err();
        assert!(err.contains("unknown repository"));
    }

    #[test]
    fn serves_cached_history_for_replayed_snapshot() {
        let dir = std::env::temp_dir().join("modcompare_cmd_history");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let registry = RepoRegistry::from_yaml(
            "go:\n  repo: prebid/prebid-server\n  kind: prebid_server_go\n  fetch_strategy: directory_names\n  paths:\n    - category: Bid Adapters\n      path: adapters\n",
            "test",
        )
        .unwrap();

        let cache = HistoryCache {
            repo: "prebid/prebid-server".into(),
            last_analyzed_version: "v3.0.0".into(),
            analyzed_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            analyzed_versions: vec!["v2.0.0".into(), "v3.0.0".into()],
            modules: vec![crate::history::ModuleHistoryEntry {
                name: "appnexus".into(),
                category: "Bid Adapters".into(),
                first_version: "v2.0.0".into(),
                first_major: 2,
                path: "adapters/appnexus".into(),
                first_commit_date: None,
                first_commit_sha: None,
            }],
        };
        let fs_path = dir.join("fs.cassette.yaml");
        write_cassette(
            &fs_path,
            vec![
                call(0, "fs", "exists", json!(true)),
                call(1, "fs", "read_to_string", json!({"ok": serde_json::to_string(&cache).unwrap()})),
            ],
        );
        let host_path = dir.join("host.cassette.yaml");
        write_cassette(
            &host_path,
            vec![call(0, "host", "list_tree", json!({"ok": [{"path": "appnexus", "kind": "dir"}]}))],
        );
        let ctx = ServiceContext::replaying_from(&CassetteConfig {
            fs: Some(fs_path),
            host: Some(host_path),
            ..CassetteConfig::default()
        })
        .unwrap();

        let args = HistoryArgs {
            repo: "go",
            version: None,
            force_refresh: false,
            format: Format::Json,
            cache_dir: &dir,
        };
        let out = run_with_context(&ctx, &registry, &args).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["from_cache"], true);
        assert_eq!(value["target_version"], "v3.0.0");
        assert_eq!(value["modules_by_major_version"]["2"][0]["name"], "appnexus");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
