use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, USER_AGENT},
};
use serde::{Deserialize, Serialize};

use crate::config::{GitHubSettings, RepoTarget};

use super::{FileStore, StoreError, StoredFile};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const CLIENT_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// [`FileStore`] over the GitHub repository contents API.
///
/// Every commit lands on the configured branch; the blob `sha` GitHub
/// returns is the concurrency token.
#[derive(Clone)]
pub struct GitHubStore {
    client: Client,
    settings: GitHubSettings,
}

#[derive(Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Deserialize, Default)]
struct UpstreamMessage {
    message: Option<String>,
}

impl GitHubStore {
    pub fn new(client: Client, settings: GitHubSettings) -> Self {
        Self { client, settings }
    }

    fn contents_url(&self, target: &RepoTarget, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.settings.api_url.trim_end_matches('/'),
            target.owner,
            target.repo,
            path.trim_start_matches('/')
        )
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
        fallback: &str,
    ) -> Result<(), StoreError> {
        let target = self.settings.resolve()?;
        let body = PutContents {
            message,
            content: STANDARD.encode(content.as_bytes()),
            branch: &target.branch,
            sha,
        };

        let response = self
            .client
            .put(self.contents_url(&target, path))
            .bearer_auth(&target.token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, CLIENT_AGENT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(response, path, fallback).await);
        }

        tracing::debug!(path, branch = %target.branch, "file committed");
        Ok(())
    }
}

#[async_trait]
impl FileStore for GitHubStore {
    async fn put(&self, path: &str, content: &str, message: &str) -> Result<(), StoreError> {
        self.write(path, content, message, None, "Failed to store order.")
            .await
    }

    async fn get(&self, path: &str) -> Result<StoredFile, StoreError> {
        let target = self.settings.resolve()?;
        let response = self
            .client
            .get(self.contents_url(&target, path))
            .query(&[("ref", target.branch.as_str())])
            .bearer_auth(&target.token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, CLIENT_AGENT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(response, path, "Failed to fetch order.").await);
        }

        let file: ContentsResponse = response.json().await?;
        // GitHub wraps base64 payloads at 60 columns
        let packed: String = file
            .content
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(packed)
            .map_err(|e| StoreError::Malformed(format!("{path}: {e}")))?;
        let content =
            String::from_utf8(bytes).map_err(|e| StoreError::Malformed(format!("{path}: {e}")))?;

        Ok(StoredFile {
            content,
            sha: file.sha,
        })
    }

    async fn update(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: &str,
    ) -> Result<(), StoreError> {
        self.write(path, content, message, Some(sha), "Failed to update order.")
            .await
    }
}

async fn upstream_error(response: Response, path: &str, fallback: &str) -> StoreError {
    let status = response.status();
    let body: UpstreamMessage = response.json().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound {
            path: path.to_string(),
        },
        StatusCode::CONFLICT => StoreError::Conflict {
            path: path.to_string(),
        },
        _ => StoreError::Upstream {
            status: status.as_u16(),
            message: body
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        },
    }
}
