//! Live adapter for the `RepoHost` port using the GitHub REST API.

use std::env;
use std::future::Future;
use std::sync::Mutex;

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::ports::host::{CommitInfo, EntryKind, RepoHost, TreeEntry};

const GITHUB_API_URL: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: usize = 100;

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type TreeKey = (String, String);

/// Live host adapter backed by `api.github.com`.
///
/// The most recent whole-repository tree is kept and filtered locally for
/// each directory of the same `(repo, ref)`.
pub struct GitHubHost {
    client: Client,
    base_url: String,
    token: Option<String>,
    last_tree: Mutex<Option<(TreeKey, Vec<TreeEntry>)>>,
}

impl GitHubHost {
    /// Creates a host client, reading the token from `GITHUB_TOKEN`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(GITHUB_API_URL, env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()))
    }

    /// Creates a host client against another API root (GitHub Enterprise).
    #[must_use]
    pub fn with_base_url(base_url: &str, token: Option<String>) -> Self {
        if token.is_none() {
            debug!("{TOKEN_ENV} not set; using unauthenticated API access");
        }
        // Each call runs on its own runtime, so pooled connections cannot be reused.
        let client = Client::builder().pool_max_idle_per_host(0).build().unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            last_tree: Mutex::new(None),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("modcompare"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(GITHUB_API_VERSION));
        if let Some(token) = &self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    /// GET `url`, returning the body and the `Link` header on success.
    async fn get(&self, url: &str) -> Result<(String, Option<String>), BoxError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| -> BoxError { format!("GitHub request failed: {e}").into() })?;

        let status = response.status();
        let link = response.headers().get(LINK).and_then(|v| v.to_str().ok()).map(String::from);
        let body = response
            .text()
            .await
            .map_err(|e| -> BoxError { format!("Failed to read GitHub response: {e}").into() })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body).map(|e| e.message).unwrap_or(body);
            return Err(match status {
                StatusCode::NOT_FOUND => format!("not found: {url}").into(),
                StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                    format!("GitHub API refused the request ({}): {message}", status.as_u16()).into()
                }
                _ => format!("GitHub API error ({}): {message}", status.as_u16()).into(),
            });
        }
        Ok((body, link))
    }

    async fn fetch_tree(&self, repo: &str, reference: &str) -> Result<Vec<TreeEntry>, BoxError> {
        let url = format!("{}/repos/{repo}/git/trees/{reference}?recursive=1", self.base_url);
        let (body, _) = self.get(&url).await?;
        let tree: TreeResponse = serde_json::from_str(&body)
            .map_err(|e| -> BoxError { format!("Failed to parse tree of {repo}@{reference}: {e}").into() })?;
        if tree.truncated {
            warn!("Tree of {repo}@{reference} was truncated by the API; listings may be incomplete");
        }
        Ok(tree
            .tree
            .into_iter()
            .filter_map(|item| {
                let kind = match item.kind.as_str() {
                    "blob" => EntryKind::File,
                    "tree" => EntryKind::Dir,
                    _ => return None,
                };
                Some(TreeEntry { path: item.path, kind })
            })
            .collect())
    }

    async fn fetch_tags(&self, repo: &str) -> Result<Vec<String>, BoxError> {
        let mut tags = Vec::new();
        for page in 1.. {
            let url = format!("{}/repos/{repo}/tags?per_page={PAGE_SIZE}&page={page}", self.base_url);
            let (body, _) = self.get(&url).await?;
            let batch: Vec<TagItem> = serde_json::from_str(&body)
                .map_err(|e| -> BoxError { format!("Failed to parse tags of {repo}: {e}").into() })?;
            let count = batch.len();
            tags.extend(batch.into_iter().map(|t| t.name));
            if count < PAGE_SIZE {
                break;
            }
        }
        debug!("{repo}: {} tags", tags.len());
        Ok(tags)
    }

    async fn fetch_first_commit(&self, repo: &str, path: &str) -> Result<Option<CommitInfo>, BoxError> {
        let url = Url::parse_with_params(
            &format!("{}/repos/{repo}/commits", self.base_url),
            &[("path", path), ("per_page", "1")],
        )?;
        let (body, link) = self.get(url.as_str()).await?;
        let body = match link.as_deref().and_then(last_page_url) {
            Some(last) => self.get(&last).await?.0,
            None => body,
        };
        let commits: Vec<CommitItem> = serde_json::from_str(&body)
            .map_err(|e| -> BoxError { format!("Failed to parse commits of {repo}:{path}: {e}").into() })?;
        Ok(commits.into_iter().last().map(|c| CommitInfo { sha: c.sha, date: c.commit.author.date }))
    }
}

impl Default for GitHubHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive `future` on a private current-thread runtime so the port stays
/// synchronous.
fn block_on<F: Future>(future: F) -> Result<F::Output, BoxError> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}

/// Entries of `tree` below `directory`, with paths made relative to it.
fn entries_below(tree: &[TreeEntry], directory: &str) -> Vec<TreeEntry> {
    let directory = directory.trim_matches('/');
    if directory.is_empty() {
        return tree.to_vec();
    }
    let prefix = format!("{directory}/");
    tree.iter()
        .filter_map(|entry| {
            entry.path.strip_prefix(&prefix).map(|rest| TreeEntry { path: rest.to_string(), kind: entry.kind })
        })
        .collect()
}

/// URL tagged `rel="last"` in a `Link` header.
fn last_page_url(link: &str) -> Option<String> {
    link.split(',').find_map(|part| {
        let (url, params) = part.split_once(';')?;
        params
            .split(';')
            .any(|p| p.trim() == r#"rel="last""#)
            .then(|| url.trim().trim_start_matches('<').trim_end_matches('>').to_string())
    })
}

impl RepoHost for GitHubHost {
    fn list_tree(
        &self,
        repo: &str,
        reference: &str,
        directory: &str,
    ) -> Result<Vec<TreeEntry>, Box<dyn std::error::Error + Send + Sync>> {
        let key = (repo.to_string(), reference.to_string());
        let mut last = self.last_tree.lock().map_err(|_| "tree cache lock poisoned")?;
        if let Some((cached_key, tree)) = last.as_ref() {
            if *cached_key == key {
                return Ok(entries_below(tree, directory));
            }
        }
        let tree = block_on(self.fetch_tree(repo, reference))??;
        let entries = entries_below(&tree, directory);
        *last = Some((key, tree));
        Ok(entries)
    }

    fn list_tags(&self, repo: &str) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        block_on(self.fetch_tags(repo))?
    }

    fn first_commit(
        &self,
        repo: &str,
        path: &str,
    ) -> Result<Option<CommitInfo>, Box<dyn std::error::Error + Send + Sync>> {
        block_on(self.fetch_first_commit(repo, path))?
    }
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Deserialize)]
struct TreeResponse {
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct TagItem {
    name: String,
}

#[derive(Deserialize)]
struct CommitItem {
    sha: String,
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    author: CommitAuthor,
}

#[derive(Deserialize)]
struct CommitAuthor {
    date: String,
}
