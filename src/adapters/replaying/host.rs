//! Replaying adapter for the `RepoHost` port.

use std::sync::Mutex;

use super::{extract_result, next_output};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{CommitInfo, RepoHost, TreeEntry};

/// Serves recorded host API responses in call order.
pub struct ReplayingHost {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingHost {
    /// Creates a replaying host from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl RepoHost for ReplayingHost {
    fn list_tree(
        &self,
        _repo: &str,
        _reference: &str,
        _directory: &str,
    ) -> Result<Vec<TreeEntry>, Box<dyn std::error::Error + Send + Sync>> {
        let output = next_output(&self.replayer, "host", "list_tree");
        extract_result(&output, "host::list_tree")
    }

    fn list_tags(&self, _repo: &str) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let output = next_output(&self.replayer, "host", "list_tags");
        extract_result(&output, "host::list_tags")
    }

    fn first_commit(
        &self,
        _repo: &str,
        _path: &str,
    ) -> Result<Option<CommitInfo>, Box<dyn std::error::Error + Send + Sync>> {
        let output = next_output(&self.replayer, "host", "first_commit");
        extract_result(&output, "host::first_commit")
    }
}
