use std::fmt;

use thiserror::Error;

/// Snapshot of a failed HTTP exchange.
///
/// `reqwest::Response` is consumed when its body is read, so the parts a
/// caller needs for diagnostics are copied out before the error is built.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub method: reqwest::Method,
    pub url: String,
    pub status: reqwest::StatusCode,
    pub body: String,
}

impl ErrorResponse {
    pub(crate) async fn capture(method: reqwest::Method, resp: reqwest::Response) -> Self {
        let url = resp.url().to_string();
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Self {
            method,
            url,
            status,
            body,
        }
    }

    /// The canonical reason phrase for the status code (e.g. "Bad Request").
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("Unknown")
    }

    /// The response body parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> HTTP {} {}",
            self.method,
            self.url,
            self.status.as_u16(),
            self.reason()
        )
    }
}

/// Top-level error type for the `aosom-api` crate.
///
/// Variants are grouped the way callers branch on them: connectivity,
/// authentication, failed requests, lookups, item state, and data.
#[derive(Debug, Error)]
pub enum Error {
    // ── Connectivity ────────────────────────────────────────────────
    /// No server name was configured for the session.
    #[error("No AOS server configured -- set AOS_SERVER or pass a server name")]
    NoServer,

    /// The TCP reachability probe never connected.
    #[error("AOS server {server}:{port} is not reachable")]
    ServerUnreachable { server: String, port: u16 },

    /// An API handle was requested before `login()` succeeded.
    #[error("Not logged into server '{server}'")]
    NotLoggedIn { server: String },

    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected, or a resumed token failed validation.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Requests ────────────────────────────────────────────────────
    /// The server answered a resource call with a non-2xx status.
    #[error("{message}: {response}")]
    Request {
        message: String,
        response: Box<ErrorResponse>,
    },

    // ── Lookups ─────────────────────────────────────────────────────
    /// A name or ID reference could not be resolved in a collection index.
    #[error("Unable to find item key={key}, by={method}")]
    Access { key: String, method: String },

    /// `find` was asked to use an index the collection does not keep.
    #[error("Unable to use find method: by_{method}")]
    UnknownIndex { method: String },

    /// The resource registry has no entry under this name.
    #[error("Unknown resource type '{name}'")]
    UnknownResource { name: String },

    // ── Item state ──────────────────────────────────────────────────
    /// Create attempted on an item that already has a server ID.
    #[error("Cannot create '{name}', already exists")]
    AlreadyExists { name: String },

    /// An operation needing the item URL ran on an item without an ID.
    #[error("Item '{name}' does not exist")]
    NotExists { name: String },

    /// The server accepted a create but its response carried no ID. The
    /// record exists remotely; re-digest the collection to pick it up.
    #[error("Created '{name}' but the response has no ID")]
    CreatedWithoutId { name: String, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Response body did not have the expected shape.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The server reported a version string that is not semver-like.
    #[error("Invalid API version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// Local JSON encode/decode failure (item file save/load).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local file I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for failures that happen before any API call lands.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::NoServer | Self::ServerUnreachable { .. } | Self::NotLoggedIn { .. } => true,
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` for non-2xx responses from resource calls.
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request { .. })
    }

    /// Returns `true` for name/ID/index resolution failures.
    pub fn is_access(&self) -> bool {
        matches!(
            self,
            Self::Access { .. } | Self::UnknownIndex { .. } | Self::UnknownResource { .. }
        )
    }

    /// Returns `true` when an item was in the wrong existence state.
    pub fn is_state(&self) -> bool {
        matches!(
            self,
            Self::AlreadyExists { .. } | Self::NotExists { .. } | Self::CreatedWithoutId { .. }
        )
    }

    /// The failing response, for `Request` errors.
    pub fn response(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Request { response, .. } => Some(response),
            _ => None,
        }
    }

    /// The HTTP status of the failing response, if there was one.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Request { response, .. } => Some(response.status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub(crate) fn request(message: impl Into<String>, response: ErrorResponse) -> Self {
        Self::Request {
            message: message.into(),
            response: Box::new(response),
        }
    }

    pub(crate) fn shape(message: impl Into<String>, body: &serde_json::Value) -> Self {
        Self::Deserialization {
            message: message.into(),
            body: body.to_string(),
        }
    }
}
