//! Recording session owning one cassette recorder per port.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use log::{info, warn};

use super::recorder::CassetteRecorder;

/// Root under which timestamped session directories are created.
pub const CASSETTE_ROOT: &str = ".modcompare/cassettes";

/// Per-port recorders writing `<port>.cassette.yaml` files into one
/// session directory.
pub struct RecordingSession {
    /// Recorder for filesystem interactions.
    pub fs: Arc<Mutex<CassetteRecorder>>,
    /// Recorder for clock interactions.
    pub clock: Arc<Mutex<CassetteRecorder>>,
    /// Recorder for host interactions.
    pub host: Arc<Mutex<CassetteRecorder>>,
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Start a session in `.modcompare/cassettes/<timestamp>/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory already exists or cannot be created.
    pub fn new() -> Result<Self, String> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        Self::new_in(&Path::new(CASSETTE_ROOT).join(&timestamp), &timestamp)
    }

    /// Start a session writing into `output_dir`, naming cassettes
    /// `<name>-<port>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory already exists or cannot be created.
    pub fn new_in(output_dir: &Path, name: &str) -> Result<Self, String> {
        if output_dir.exists() {
            return Err(format!("Cassette directory already exists: {}", output_dir.display()));
        }
        std::fs::create_dir_all(output_dir)
            .map_err(|e| format!("Failed to create cassette directory {}: {e}", output_dir.display()))?;

        let commit = commit_hash();
        let recorder = |port: &str| {
            let path = output_dir.join(format!("{port}.cassette.yaml"));
            Arc::new(Mutex::new(CassetteRecorder::new(path, format!("{name}-{port}"), commit.as_str())))
        };

        Ok(Self {
            fs: recorder("fs"),
            clock: recorder("clock"),
            host: recorder("host"),
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Directory the cassettes are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write every port's cassette and return the session directory.
    ///
    /// All adapters holding a recorder must have been dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if a recorder is still shared or a file cannot be
    /// written.
    pub fn finish(self) -> Result<PathBuf, String> {
        fn finish_one(recorder: Arc<Mutex<CassetteRecorder>>, port: &str) -> Result<(), String> {
            let recorder = Arc::try_unwrap(recorder)
                .map_err(|_| format!("Recording adapter for {port} still has references"))?
                .into_inner()
                .map_err(|e| format!("Recorder lock for {port} poisoned: {e}"))?;
            let count = recorder.len();
            let path = recorder.finish().map_err(|e| format!("Failed to write {port} cassette: {e}"))?;
            info!("Wrote {count} {port} interactions to {}", path.display());
            Ok(())
        }

        finish_one(self.fs, "fs")?;
        finish_one(self.clock, "clock")?;
        finish_one(self.host, "host")?;
        Ok(self.output_dir)
    }
}

/// Commit of the working tree, or `"unknown"` outside a git checkout.
fn commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| {
            warn!("Could not determine git commit for cassette metadata; using 'unknown'");
            "unknown".to_string()
        })
}
