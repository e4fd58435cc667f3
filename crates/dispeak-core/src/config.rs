use std::time::Duration;

const GITHUB_REPO: &str = "micelle/dc_DiSpeak";
const DEFAULT_USER_AGENT: &str = "DiSpeak-Update-Check";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Where and how the latest release is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateConfig {
    pub feed_url: String,
    pub user_agent: String,
    pub current_version: String,
    pub http_timeout: Duration,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            feed_url: format!("https://api.github.com/repos/{GITHUB_REPO}/releases/latest"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Build the HTTP client used for release lookups.
///
/// # Errors
/// Returns an error when the TLS backend cannot be initialised.
pub fn build_http_client(config: &UpdateConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.http_timeout)
        .build()
}
