use super::{ContentEntry, GitHubError, RepoSource, Repository};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Response, StatusCode};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

/// GitHub REST API client for organization and repository contents.
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a client authenticated with `token` against `base_url`
    /// (`https://api.github.com` or a GitHub Enterprise `/api/v3` root).
    pub fn new(token: &str, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("actionaudit/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).context("Invalid GitHub token")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url,
            owner,
            repo,
            path.trim_start_matches('/')
        )
    }

    async fn get(
        &self,
        url: &str,
        accept: &'static str,
        query: &[(&str, String)],
    ) -> Result<Response, GitHubError> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .query(query)
            .send()
            .await
            .map_err(|source| GitHubError::Transport {
                url: url.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(GitHubError::NotFound(url.to_string())),
            status if !status.is_success() => Err(GitHubError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }),
            _ => Ok(response),
        }
    }
}

#[async_trait]
impl RepoSource for GitHubClient {
    async fn list_org_repositories(
        &self,
        org: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Repository>, GitHubError> {
        let url = format!("{}/orgs/{}/repos", self.base_url, org);
        self.get(
            &url,
            JSON_MEDIA_TYPE,
            &[("per_page", per_page.to_string()), ("page", page.to_string())],
        )
        .await?
        .json()
        .await
        .map_err(|source| GitHubError::Decode { url, source })
    }

    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<ContentEntry>, GitHubError> {
        let url = self.contents_url(owner, repo, path);
        self.get(&url, JSON_MEDIA_TYPE, &[])
            .await?
            .json()
            .await
            .map_err(|source| GitHubError::Decode { url, source })
    }

    async fn get_file(&self, owner: &str, repo: &str, path: &str) -> Result<String, GitHubError> {
        let url = self.contents_url(owner, repo, path);
        self.get(&url, RAW_MEDIA_TYPE, &[])
            .await?
            .text()
            .await
            .map_err(|source| GitHubError::Decode { url, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_url() {
        let client = GitHubClient::new("token", "https://ghe.example.com/api/v3/").unwrap();
        assert_eq!(
            client.contents_url("acme", "api", ".github/workflows"),
            "https://ghe.example.com/api/v3/repos/acme/api/contents/.github/workflows"
        );
        assert_eq!(
            client.contents_url("actor", "action", "/package-lock.json"),
            "https://ghe.example.com/api/v3/repos/actor/action/contents/package-lock.json"
        );
    }

    #[test]
    fn test_rejects_token_with_newline() {
        assert!(GitHubClient::new("bad\ntoken", DEFAULT_API_URL).is_err());
    }
}
