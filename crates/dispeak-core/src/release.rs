use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::UpdateConfig;

/// Metadata describing the latest published release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseMetadata {
    pub tag: String,
    pub display_name: String,
    pub release_page_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("failed to reach the release feed: {0}")]
    Transport(String),
    #[error("release feed responded with HTTP {status}{body_snippet}")]
    HttpStatus { status: u16, body_snippet: String },
    #[error("release feed returned an unexpected payload: {0}")]
    Payload(String),
}

impl FetchError {
    /// Network failures and non-success HTTP statuses.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::HttpStatus { .. })
    }

    /// The feed answered, but not with release data (for example a
    /// rate-limit message).
    #[must_use]
    pub fn is_payload(&self) -> bool {
        matches!(self, Self::Payload(_))
    }
}

/// Source of the latest release metadata.
#[async_trait]
pub trait ReleaseFetcher: Send + Sync {
    async fn fetch_latest(&self) -> Result<ReleaseMetadata, FetchError>;
}

#[derive(Deserialize)]
struct GitHubRelease {
    #[serde(default)]
    tag_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Fetches `releases/latest` from the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubReleaseFetcher {
    client: reqwest::Client,
    feed_url: String,
    user_agent: String,
}

impl GitHubReleaseFetcher {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &UpdateConfig) -> Self {
        Self {
            client,
            feed_url: config.feed_url.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

#[async_trait]
impl ReleaseFetcher for GitHubReleaseFetcher {
    async fn fetch_latest(&self) -> Result<ReleaseMetadata, FetchError> {
        let response = self
            .client
            .get(&self.feed_url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|error| FetchError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_snippet = response
                .text()
                .await
                .ok()
                .map(|body| response_snippet(&body, 160))
                .unwrap_or_default();
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                body_snippet,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|error| FetchError::Transport(error.to_string()))?;
        parse_release_body(&body)
    }
}

/// Map a successful feed response body to release metadata.
///
/// A body carrying an API `message` or lacking `tag_name`/`html_url` is
/// a payload failure even though the request itself succeeded.
pub(crate) fn parse_release_body(body: &str) -> Result<ReleaseMetadata, FetchError> {
    let release: GitHubRelease = serde_json::from_str(body)
        .map_err(|error| FetchError::Payload(format!("invalid JSON: {error}")))?;

    if let Some(message) = release.message {
        return Err(FetchError::Payload(message));
    }

    let tag = release
        .tag_name
        .ok_or_else(|| FetchError::Payload("missing tag_name".to_string()))?;
    let release_page_url = release
        .html_url
        .ok_or_else(|| FetchError::Payload("missing html_url".to_string()))?;
    let display_name = release
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| tag.clone());

    Ok(ReleaseMetadata {
        tag,
        display_name,
        release_page_url,
    })
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}
