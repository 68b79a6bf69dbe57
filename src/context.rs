//! Service context bundling the port trait objects.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::live::{GitHubHost, LiveClock, LiveFileSystem};
use crate::adapters::recording::{RecordingClock, RecordingFileSystem, RecordingHost};
use crate::adapters::replaying::{ReplayingClock, ReplayingFileSystem, ReplayingHost};
use crate::cassette::config::CassetteConfig;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::ports::{Clock, CommitInfo, FileSystem, RepoHost, TreeEntry};

/// Bundles every external boundary a command may touch.
///
/// Constructors wire up live, recording or replaying adapters.
pub struct ServiceContext {
    /// Clock for analysis timestamps.
    pub clock: Box<dyn Clock>,
    /// Filesystem for the history cache and registry file.
    pub fs: Box<dyn FileSystem>,
    /// Source-control host serving trees, tags and commit history.
    pub host: Box<dyn RepoHost>,
}

impl ServiceContext {
    /// Live adapters: system clock, local disk, GitHub.
    #[must_use]
    pub fn live() -> Self {
        Self {
            clock: Box::new(LiveClock),
            fs: Box::new(LiveFileSystem),
            host: Box::new(GitHubHost::new()),
        }
    }

    /// Live adapters wrapped in recorders writing per-port cassettes to
    /// `dir`. The session must be finished after the context is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette directory exists or cannot be created.
    pub fn recording_at(dir: PathBuf) -> Result<(Self, RecordingSession), String> {
        let name = dir.file_name().map_or_else(|| "session".to_string(), |n| n.to_string_lossy().into_owned());
        let session = RecordingSession::new_in(&dir, &name)?;
        let ctx = Self {
            clock: Box::new(RecordingClock::new(Box::new(LiveClock), Arc::clone(&session.clock))),
            fs: Box::new(RecordingFileSystem::new(Box::new(LiveFileSystem), Arc::clone(&session.fs))),
            host: Box::new(RecordingHost::new(Box::new(GitHubHost::new()), Arc::clone(&session.host))),
        };
        Ok((ctx, session))
    }

    /// Replay every port from one cassette file. Each port gets its own
    /// cursor over the same interactions.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = CassetteConfig::read_cassette(path)?;
        Ok(Self {
            clock: Box::new(ReplayingClock::new(CassetteReplayer::new(&cassette))),
            fs: Box::new(ReplayingFileSystem::new(CassetteReplayer::new(&cassette))),
            host: Box::new(ReplayingHost::new(CassetteReplayer::new(&cassette))),
        })
    }

    /// Replay from per-port cassette files. Ports without a cassette
    /// panic with a clear message when called.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;
        Ok(Self {
            clock: match replayers.clock {
                Some(r) => Box::new(ReplayingClock::new(r)),
                None => Box::new(PanickingClock),
            },
            fs: match replayers.fs {
                Some(r) => Box::new(ReplayingFileSystem::new(r)),
                None => Box::new(PanickingFileSystem),
            },
            host: match replayers.host {
                Some(r) => Box::new(ReplayingHost::new(r)),
                None => Box::new(PanickingHost),
            },
        })
    }
}

// Stand-ins for ports without a cassette.

struct PanickingClock;
impl Clock for PanickingClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        panic!("Clock port not configured in CassetteConfig: no cassette loaded for clock");
    }
}

struct PanickingFileSystem;
impl FileSystem for PanickingFileSystem {
    fn read_to_string(&self, _path: &Path) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        panic!("FileSystem port not configured in CassetteConfig: no cassette loaded for fs");
    }
    fn write(&self, _path: &Path, _contents: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        panic!("FileSystem port not configured in CassetteConfig: no cassette loaded for fs");
    }
    fn exists(&self, _path: &Path) -> bool {
        panic!("FileSystem port not configured in CassetteConfig: no cassette loaded for fs");
    }
}

struct PanickingHost;
impl RepoHost for PanickingHost {
    fn list_tree(
        &self,
        _repo: &str,
        _reference: &str,
        _directory: &str,
    ) -> Result<Vec<TreeEntry>, Box<dyn std::error::Error + Send + Sync>> {
        panic!("RepoHost port not configured in CassetteConfig: no cassette loaded for host");
    }
    fn list_tags(&self, _repo: &str) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        panic!("RepoHost port not configured in CassetteConfig: no cassette loaded for host");
    }
    fn first_commit(
        &self,
        _repo: &str,
        _path: &str,
    ) -> Result<Option<CommitInfo>, Box<dyn std::error::Error + Send + Sync>> {
        panic!("RepoHost port not configured in CassetteConfig: no cassette loaded for host");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use chrono::Utc;
    use serde_json::json;

    fn write_cassette(path: &Path, interactions: Vec<Interaction>) {
        let cassette = Cassette { name: "test".into(), recorded_at: Utc::now(), commit: "abc".into(), interactions };
        std::fs::write(path, serde_yaml::to_string(&cassette).unwrap()).unwrap();
    }

    fn call(seq: u64, port: &str, method: &str, output: serde_json::Value) -> Interaction {
        Interaction { seq, port: port.into(), method: method.into(), input: json!({}), output }
    }

    #[test]
    fn replaying_context_from_monolithic_cassette() {
        let dir = std::env::temp_dir().join("modcompare_ctx_test_mono");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("full.cassette.yaml");
        write_cassette(
            &path,
            vec![
                call(0, "clock", "now", json!("2024-06-15T10:30:00Z")),
                call(1, "host", "list_tags", json!({"ok": ["v3.0.0", "v2.0.0"]})),
                call(2, "fs", "exists", json!(false)),
            ],
        );

        let ctx = ServiceContext::replaying(&path).unwrap();
        assert_eq!(ctx.clock.now().to_rfc3339(), "2024-06-15T10:30:00+00:00");
        assert_eq!(ctx.host.list_tags("prebid/prebid-server").unwrap(), vec!["v3.0.0", "v2.0.0"]);
        assert!(!ctx.fs.exists(Path::new(".modcompare/cache/x.json")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn replaying_from_per_port_cassettes() {
        let dir = std::env::temp_dir().join("modcompare_ctx_test_ports");
        std::fs::create_dir_all(&dir).unwrap();
        let clock_path = dir.join("clock.cassette.yaml");
        write_cassette(&clock_path, vec![call(0, "clock", "now", json!("2024-01-01T00:00:00Z"))]);

        let config = CassetteConfig { clock: Some(clock_path), ..CassetteConfig::default() };
        let ctx = ServiceContext::replaying_from(&config).unwrap();
        assert_eq!(ctx.clock.now().to_rfc3339(), "2024-01-01T00:00:00+00:00");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[should_panic(expected = "not configured in CassetteConfig")]
    fn unspecified_port_panics_with_clear_message() {
        let ctx = ServiceContext::replaying_from(&CassetteConfig::panic_on_unspecified()).unwrap();
        let _ = ctx.host.list_tags("prebid/Prebid.js");
    }

    #[test]
    fn recording_context_writes_session_cassettes() {
        let dir = std::env::temp_dir().join("modcompare_ctx_test_record");
        let _ = std::fs::remove_dir_all(&dir);

        let (ctx, session) = ServiceContext::recording_at(dir.clone()).unwrap();
        let _ = ctx.clock.now();
        drop(ctx);
        session.finish().unwrap();

        let clock = CassetteConfig::read_cassette(&dir.join("clock.cassette.yaml")).unwrap();
        assert_eq!(clock.interactions.len(), 1);
        assert_eq!(clock.name, "modcompare_ctx_test_record-clock");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
