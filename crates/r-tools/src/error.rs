//! Error types for the R bridge.
//!
//! Nothing here escapes to the tool host: every [`BridgeError`] is folded into a
//! [`crate::record::ResultRecord`] at the dispatch boundary.

use thiserror::Error;
use url::Url;

/// A tool call whose arguments cannot be turned into a backend request.
///
/// These are contract errors at the host boundary, not backend failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool arguments must be a JSON object")]
    ArgumentsNotObject,

    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("parameter '{param}': expected {expected}, got {got}")]
    WrongType {
        param: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("parameter '{param}': '{value}' is not one of: {allowed}")]
    NotAllowed {
        param: String,
        value: String,
        allowed: String,
    },

    #[error("parameter '{param}': {reason}")]
    Unsupported { param: String, reason: String },
}

/// Failure taxonomy for a single dispatch.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Invalid backend configuration; only raised at startup.
    #[error("config error: {0}")]
    Config(String),

    /// Health probe failed before anything was sent.
    #[error("backend unreachable")]
    BackendUnreachable { hint: String },

    /// Backend answered with a non-2xx status; `body` is its raw text.
    #[error("API error: {body}")]
    BackendRequestFailed { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid arguments: {0}")]
    Translation(#[from] TranslationError),

    #[error("{0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

impl From<reqwest::Error> for BridgeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(describe_transport_error(&value))
    }
}

/// Render a transport error without leaking credentials or query strings from the URL.
#[must_use]
pub fn describe_transport_error(e: &reqwest::Error) -> String {
    let mut msg = if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    };
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}

#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}
