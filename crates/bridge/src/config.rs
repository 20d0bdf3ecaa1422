use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use r_bridge_tools::config::DEFAULT_BASE_URL;
use r_bridge_tools::BackendConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Expose an R statistics HTTP API as MCP tools over stdio.
#[derive(Debug, Clone, Parser)]
#[command(name = "r-mcp-bridge", version, about)]
pub struct Config {
    /// Base URL of the R API server.
    #[arg(long, env = "R_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Port used when the base URL does not name one.
    #[arg(long, env = "R_API_PORT", default_value_t = 8081)]
    pub api_port: u16,

    /// Default log filter; `RUST_LOG` takes precedence.
    #[arg(long, env = "R_BRIDGE_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "R_BRIDGE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    /// Resolve the backend connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn backend_config(&self) -> anyhow::Result<BackendConfig> {
        let mut backend = BackendConfig::parse(&self.api_url)
            .with_context(|| format!("invalid --api-url '{}'", self.api_url))?;
        // `Url::port` hides scheme-default ports, so `http://h:80` must be checked textually.
        if !has_explicit_port(&self.api_url) {
            backend
                .base_url
                .set_port(Some(self.api_port))
                .map_err(|()| anyhow::anyhow!("cannot set port on '{}'", self.api_url))?;
        }
        Ok(backend)
    }
}

/// Whether the URL's authority names a port, including the scheme's default one.
fn has_explicit_port(raw: &str) -> bool {
    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let after_host = match host_port.rfind(']') {
        Some(end) => &host_port[end + 1..],
        None => host_port,
    };
    after_host.contains(':')
}
