use crate::error::{BoardError, Result};
use std::{path::PathBuf, time::Duration};

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client configuration loaded from environment variables.
///
/// | Env Var                     | Default                 |
/// |-----------------------------|-------------------------|
/// | `GMUD_API_URL`              | `http://localhost:3000` |
/// | `GMUD_REQUEST_TIMEOUT_SECS` | `30`                    |
/// | `GMUD_SNAPSHOT_PATH`        | unset (no snapshot)     |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash
    pub api_url: String,
    pub request_timeout: Duration,
    /// Where the card-list snapshot is mirrored, if anywhere
    pub snapshot_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            snapshot_path: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("GMUD_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        reqwest::Url::parse(&api_url)
            .map_err(|e| BoardError::ConfigError(format!("GMUD_API_URL '{}': {}", api_url, e)))?;

        let timeout_secs = match lookup("GMUD_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                BoardError::ConfigError(format!(
                    "GMUD_REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let snapshot_path = lookup("GMUD_SNAPSHOT_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
            snapshot_path,
        })
    }

    /// Shared HTTP client for all backend calls
    pub fn http_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()?)
    }
}
