//! Repository hosting port for listing trees, tags and path history.

use serde::{Deserialize, Serialize};

/// Whether a tree entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A regular file (git blob).
    File,
    /// A directory (git tree).
    Dir,
}

/// One path below a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the listed directory, `/`-separated.
    pub path: String,
    /// File or directory.
    pub kind: EntryKind,
}

/// A commit that touched a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Full commit hash.
    pub sha: String,
    /// Commit date as reported by the host (RFC 3339).
    pub date: String,
}

/// Read-only access to a source-control host.
///
/// Abstracting the host allows replaying recorded API traffic in tests
/// instead of calling the network.
pub trait RepoHost: Send + Sync {
    /// Recursively lists everything below `directory` in `repo` at
    /// `reference`. A directory missing at that reference yields an empty
    /// list.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository or reference cannot be read.
    fn list_tree(
        &self,
        repo: &str,
        reference: &str,
        directory: &str,
    ) -> Result<Vec<TreeEntry>, Box<dyn std::error::Error + Send + Sync>>;

    /// Lists all tag names of `repo`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag listing fails.
    fn list_tags(&self, repo: &str) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>>;

    /// Returns the oldest commit touching `path`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the history query fails.
    fn first_commit(
        &self,
        repo: &str,
        path: &str,
    ) -> Result<Option<CommitInfo>, Box<dyn std::error::Error + Send + Sync>>;
}
