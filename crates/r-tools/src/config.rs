//! Backend connection settings.

use crate::error::{BridgeError, Result};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_START_HINT: &str =
    "R API server is not running. Please start it with: Rscript r_api.R";

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: Url,
    /// Total budget for one request, connect included.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Budget for one `/health` probe; shorter than `timeout` so a hung probe fails fast.
    pub probe_timeout: Duration,
    /// Remediation text attached to "backend unreachable" results.
    pub start_hint: String,
}

impl BackendConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            start_hint: DEFAULT_START_HINT.to_string(),
        }
    }

    /// Parse and validate a base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or is not `http`/`https`.
    pub fn parse(base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| BridgeError::Config(format!("invalid backend URL '{base_url}': {e}")))?;
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(BridgeError::Config(format!(
                "unsupported backend URL scheme '{scheme}'"
            )));
        }
        if url.host_str().is_none() {
            return Err(BridgeError::Config(format!(
                "backend URL '{base_url}' has no host"
            )));
        }
        Ok(Self::new(url))
    }

    /// Absolute URL for a backend path; any path prefix on the base URL is kept.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}
