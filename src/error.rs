//! Error types for comparison and history runs.

use thiserror::Error;

/// Result type used across the comparison core.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal conditions raised at the configuration and fetch boundaries.
///
/// The differ and the rename detector never produce these; any two sets of
/// module records yield a (possibly empty) result.
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown repository key or malformed repository configuration.
    #[error("configuration error for '{key}': {message}")]
    Configuration {
        /// Repository key (or config file path) the problem belongs to.
        key: String,
        /// What is wrong with it.
        message: String,
    },

    /// The hosting API failed for a repository/version.
    #[error("failed to fetch {repo} at {version}{}: {message}", category_suffix(.category.as_deref()))]
    Fetch {
        /// Full repository name (`owner/name`).
        repo: String,
        /// Version, tag or branch requested.
        version: String,
        /// Category being fetched, when the failure is tied to one.
        category: Option<String>,
        /// Underlying transport or API message.
        message: String,
    },

    /// The history cache could not be written.
    #[error("history cache error for {repo}: {message}")]
    Cache {
        /// Full repository name the cache belongs to.
        repo: String,
        /// Underlying I/O or serialization message.
        message: String,
    },

    /// A command-line value could not be interpreted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Shorthand for an unknown repository key.
    #[must_use]
    pub fn unknown_repository(key: &str) -> Self {
        Self::Configuration { key: key.to_string(), message: "unknown repository".to_string() }
    }
}

fn category_suffix(category: Option<&str>) -> String {
    category.map(|c| format!(" (category '{c}')")).unwrap_or_default()
}
