//! Cassette configuration for composable per-port replay.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Per-port cassette file paths. Ports without a path panic when called
/// during replay.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Filesystem port cassette (history cache, registry file).
    pub fs: Option<PathBuf>,
    /// Clock port cassette.
    pub clock: Option<PathBuf>,
    /// Repository host port cassette.
    pub host: Option<PathBuf>,
}

/// Per-port replayers, each with its own interaction stream.
pub struct PortReplayers {
    /// Replayer for the filesystem port.
    pub fs: Option<CassetteReplayer>,
    /// Replayer for the clock port.
    pub clock: Option<CassetteReplayer>,
    /// Replayer for the host port.
    pub host: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// Returns a config where all port paths are `None`.
    #[must_use]
    pub fn panic_on_unspecified() -> Self {
        Self::default()
    }

    /// Config for a directory written by a recording session: every
    /// `<port>.cassette.yaml` present in `dir` is used, the rest stay unset.
    #[must_use]
    pub fn from_session_dir(dir: &Path) -> Self {
        let port = |name: &str| Some(dir.join(format!("{name}.cassette.yaml"))).filter(|p| p.is_file());
        Self { fs: port("fs"), clock: port("clock"), host: port("host") }
    }

    /// Load a monolithic cassette file and create a single replayer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_monolithic(path: &Path) -> Result<CassetteReplayer, String> {
        Ok(CassetteReplayer::new(&Self::read_cassette(path)?))
    }

    /// Load a single per-port cassette file and create a replayer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_port_cassette(path: &Path) -> Result<CassetteReplayer, String> {
        Self::load_monolithic(path)
    }

    /// Read and parse a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn read_cassette(path: &Path) -> Result<Cassette, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
    }

    /// Load all configured per-port cassette files and create replayers.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        Ok(PortReplayers {
            fs: self.fs.as_deref().map(Self::load_port_cassette).transpose()?,
            clock: self.clock.as_deref().map(Self::load_port_cassette).transpose()?,
            host: self.host.as_deref().map(Self::load_port_cassette).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::Interaction;
    use chrono::Utc;
    use serde_json::json;

    fn write_cassette(path: &Path, interactions: Vec<Interaction>) {
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            commit: "abc".into(),
            interactions,
        };
        std::fs::write(path, serde_yaml::to_string(&cassette).unwrap()).unwrap();
    }

    fn interaction(seq: u64, port: &str, method: &str, output: serde_json::Value) -> Interaction {
        Interaction { seq, port: port.into(), method: method.into(), input: json!({}), output }
    }

    #[test]
    fn panic_on_unspecified_returns_all_none() {
        let config = CassetteConfig::panic_on_unspecified();
        assert!(config.fs.is_none());
        assert!(config.clock.is_none());
        assert!(config.host.is_none());
    }

    #[test]
    fn load_monolithic_cassette() {
        let dir = std::env::temp_dir().join("modcompare_config_test_mono");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("full.cassette.yaml");
        write_cassette(
            &path,
            vec![
                interaction(0, "host", "list_tags", json!({"ok": ["9.0.0"]})),
                interaction(1, "fs", "exists", json!(false)),
            ],
        );

        let mut replayer = CassetteConfig::load_monolithic(&path).unwrap();
        assert_eq!(replayer.next_interaction("fs", "exists").output, json!(false));
        assert_eq!(replayer.next_interaction("host", "list_tags").output, json!({"ok": ["9.0.0"]}));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_per_port_cassettes() {
        let dir = std::env::temp_dir().join("modcompare_config_test_ports");
        std::fs::create_dir_all(&dir).unwrap();
        let host_path = dir.join("host.cassette.yaml");
        write_cassette(&host_path, vec![interaction(0, "host", "list_tags", json!({"ok": []}))]);

        let config = CassetteConfig { host: Some(host_path), ..CassetteConfig::default() };
        let mut replayers = config.load_all().unwrap();
        assert!(replayers.fs.is_none());
        assert!(replayers.clock.is_none());
        let host = replayers.host.as_mut().unwrap();
        assert_eq!(host.next_interaction("host", "list_tags").output, json!({"ok": []}));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn session_dir_picks_up_present_ports() {
        let dir = std::env::temp_dir().join("modcompare_config_test_session");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        write_cassette(&dir.join("clock.cassette.yaml"), vec![]);
        write_cassette(&dir.join("host.cassette.yaml"), vec![]);

        let config = CassetteConfig::from_session_dir(&dir);
        assert!(config.fs.is_none());
        assert_eq!(config.clock, Some(dir.join("clock.cassette.yaml")));
        assert_eq!(config.host, Some(dir.join("host.cassette.yaml")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_an_error() {
        let config =
            CassetteConfig { fs: Some(PathBuf::from("/nonexistent/fs.cassette.yaml")), ..CassetteConfig::default() };
        let err = config.load_all().err().unwrap();
        assert!(err.contains("Failed to read cassette file"));
    }
}
