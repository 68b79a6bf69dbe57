//! Record-replay round trips over the ports.
//!
//! 1. Drive a comparison through a recording host wrapped around a
//!    scripted host and capture the traffic.
//! 2. Replay the cassette through `ServiceContext` and assert the report is
//!    identical.
//! 3. Replay a hand-built monolithic cassette through a full history
//!    analysis (tags, snapshots, cache write, clock).

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::json;

use modcompare::adapters::recording::RecordingHost;
use modcompare::cassette::config::CassetteConfig;
use modcompare::cassette::recorder::CassetteRecorder;
use modcompare::commands::compare::{run_with_context, CompareArgs};
use modcompare::commands::history::{self, HistoryArgs};
use modcompare::compare::{render_comparison, Comparator, Format};
use modcompare::config::RepoRegistry;
use modcompare::context::ServiceContext;
use modcompare::inventory::HostInventoryFetcher;
use modcompare::ports::{CommitInfo, EntryKind, RepoHost, TreeEntry};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Host serving fixed `modules/` listings per Prebid.js version.
struct ScriptedHost {
    trees: HashMap<&'static str, Vec<&'static str>>,
}

impl ScriptedHost {
    fn new() -> Self {
        let mut trees = HashMap::new();
        trees.insert("8.0.0", vec!["appnexusBidAdapter.js", "rubiconBidAdapter.js", "googleAnalyticsAdapter.js"]);
        trees.insert(
            "9.0.0",
            vec!["appnexusBidAdapter.js", "rubiconBidAdapter.ts", "ixBidAdapter.js", "51DegreesRtdProvider.js"],
        );
        Self { trees }
    }
}

impl RepoHost for ScriptedHost {
    fn list_tree(&self, _repo: &str, reference: &str, _directory: &str) -> Result<Vec<TreeEntry>, BoxError> {
        let files = self.trees.get(reference).ok_or_else(|| format!("not found: {reference}"))?;
        Ok(files.iter().map(|f| TreeEntry { path: (*f).to_string(), kind: EntryKind::File }).collect())
    }

    fn list_tags(&self, _repo: &str) -> Result<Vec<String>, BoxError> {
        Ok(self.trees.keys().map(ToString::to_string).collect())
    }

    fn first_commit(&self, _repo: &str, _path: &str) -> Result<Option<CommitInfo>, BoxError> {
        Ok(None)
    }
}

fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn recorded_comparison_replays_identically() {
    let dir = temp_dir("modcompare_record_replay_compare");
    let cassette_path = dir.join("host.cassette.yaml");
    let registry = RepoRegistry::builtin();

    // --- Phase 1: record ---
    let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&cassette_path, "compare", "abc123")));
    let recorded = {
        let host = RecordingHost::new(Box::new(ScriptedHost::new()), Arc::clone(&recorder));
        let fetcher = HostInventoryFetcher::new(&host);
        let result = Comparator::new(&registry, &fetcher)
            .compare("prebid-js", "8.0.0", "prebid-js", "9.0.0", None)
            .unwrap();
        render_comparison(&result, Format::Json, true)
    };
    Arc::try_unwrap(recorder).unwrap().into_inner().unwrap().finish().unwrap();

    // --- Phase 2: replay twice through the command handler ---
    let config = CassetteConfig { host: Some(cassette_path), ..CassetteConfig::default() };
    let args = CompareArgs {
        source: "prebid-js:8.0.0",
        target: "prebid-js:9.0.0",
        format: Format::Json,
        show_unchanged: true,
        cumulative: false,
    };
    let first = run_with_context(&ServiceContext::replaying_from(&config).unwrap(), &registry, &args).unwrap();
    let second = run_with_context(&ServiceContext::replaying_from(&config).unwrap(), &registry, &args).unwrap();
    assert_eq!(first, recorded, "replay differs from recording");
    assert_eq!(first, second, "replays are not deterministic");

    let report: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(report["metadata"]["comparison_type"], "version_comparison");
    assert_eq!(report["statistics"]["total_added"], 2);
    assert_eq!(report["statistics"]["total_removed"], 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn history_analysis_replays_from_monolithic_cassette() {
    let dir = temp_dir("modcompare_record_replay_history");
    let cassette_path = dir.join("history.cassette.yaml");
    let cache_dir = dir.join("cache");

    let tree = |files: &[&str]| {
        let entries: Vec<_> = files.iter().map(|f| json!({"path": f, "kind": "file"})).collect();
        json!({ "ok": entries })
    };
    let v8 = tree(&["appnexusBidAdapter.js", "rubiconBidAdapter.js"]);
    let v9 = tree(&["appnexusBidAdapter.js", "rubiconBidAdapter.js", "ixBidAdapter.js"]);

    let mut recorder = CassetteRecorder::new(&cassette_path, "history", "abc123");
    recorder.record("fs", "exists", json!({"path": "cache"}), json!(false));
    recorder.record("host", "list_tags", json!({}), json!({"ok": ["9.0.0", "8.0.0", "8.1.0"]}));
    recorder.record("host", "list_tree", json!({"reference": "8.0.0"}), v8);
    recorder.record("host", "list_tree", json!({"reference": "9.0.0"}), v9.clone());
    recorder.record("clock", "now", json!(null), json!("2024-05-01T12:00:00Z"));
    recorder.record("fs", "write", json!({"path": "cache"}), json!({"ok": null}));
    recorder.record("host", "list_tree", json!({"reference": "9.0.0"}), v9);
    recorder.finish().unwrap();

    let ctx = ServiceContext::replaying(&cassette_path).unwrap();
    let args = HistoryArgs {
        repo: "prebid-js",
        version: None,
        force_refresh: false,
        format: Format::Json,
        cache_dir: &cache_dir,
    };
    let out = history::run_with_context(&ctx, &RepoRegistry::builtin(), &args).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(value["from_cache"], false);
    assert_eq!(value["target_version"], "9.0.0");
    assert_eq!(value["total_modules"], 3);
    assert_eq!(value["analyzed_at"], "2024-05-01T12:00:00Z");
    let v8_names: Vec<&str> = value["modules_by_major_version"]["8"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert!(v8_names.contains(&"appnexus") && v8_names.contains(&"rubicon"));
    assert_eq!(value["modules_by_major_version"]["9"][0]["name"], "ix");
    assert!(!Path::new(&cache_dir).exists(), "replayed writes must not touch disk");

    let _ = std::fs::remove_dir_all(&dir);
}
