pub mod github_api;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single read against the hosting platform.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("GitHub API returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl GitHubError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GitHubError::NotFound(_))
    }
}

/// Repository in an organization listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
}

/// Entry of a directory listing from the contents API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ContentEntry {
    pub fn is_file(&self) -> bool {
        self.kind == "file"
    }
}

/// Read-only access to an organization's repositories and their files.
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// One page (1-based) of the organization's repositories.
    async fn list_org_repositories(
        &self,
        org: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Repository>, GitHubError>;

    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<ContentEntry>, GitHubError>;

    /// Raw file content from the default branch.
    async fn get_file(&self, owner: &str, repo: &str, path: &str) -> Result<String, GitHubError>;
}
