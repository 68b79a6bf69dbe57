//! Recording adapter for the `RepoHost` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{CommitInfo, RepoHost, TreeEntry};

/// Records host API calls while delegating to an inner host.
pub struct RecordingHost {
    inner: Box<dyn RepoHost>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingHost {
    /// Wraps `inner`, appending every call to `recorder`.
    pub fn new(inner: Box<dyn RepoHost>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct TreeInput<'a> {
    repo: &'a str,
    reference: &'a str,
    directory: &'a str,
}

#[derive(Serialize)]
struct RepoInput<'a> {
    repo: &'a str,
}

#[derive(Serialize)]
struct PathInput<'a> {
    repo: &'a str,
    path: &'a str,
}

impl RepoHost for RecordingHost {
    fn list_tree(
        &self,
        repo: &str,
        reference: &str,
        directory: &str,
    ) -> Result<Vec<TreeEntry>, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.list_tree(repo, reference, directory);
        let input = TreeInput { repo, reference, directory };
        record_result(&self.recorder, "host", "list_tree", &input, &result);
        result
    }

    fn list_tags(&self, repo: &str) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.list_tags(repo);
        record_result(&self.recorder, "host", "list_tags", &RepoInput { repo }, &result);
        result
    }

    fn first_commit(
        &self,
        repo: &str,
        path: &str,
    ) -> Result<Option<CommitInfo>, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.first_commit(repo, path);
        record_result(&self.recorder, "host", "first_commit", &PathInput { repo, path }, &result);
        result
    }
}
