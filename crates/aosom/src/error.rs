//! CLI error types with miette diagnostics.
//!
//! Maps library and config errors into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use aosom_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("No AOS server configured")]
    #[diagnostic(
        code(aosom::no_server),
        help(
            "Pass --server, set AOS_SERVER, or add `server` to a profile in\n\
             {path}"
        )
    )]
    NoServer { path: String },

    #[error("Could not connect to {target}: {reason}")]
    #[diagnostic(
        code(aosom::connection_failed),
        help("Check that the AOS server is running and its API port is reachable (--port).")
    )]
    ConnectionFailed { target: String, reason: String },

    #[error("Request timed out: {message}")]
    #[diagnostic(
        code(aosom::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    RequestTimeout { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(aosom::auth_failed),
        help(
            "Verify the user name and password.\n\
             Run: aosom config set-password, or set AOS_PASSWD."
        )
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(aosom::not_found),
        help("Run: aosom {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} '{identifier}' already exists")]
    #[diagnostic(code(aosom::conflict))]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    #[error("Reference '{key}' could not be resolved by {method}")]
    #[diagnostic(code(aosom::unresolved))]
    Unresolved { key: String, method: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error ({status}): {message}")]
    #[diagnostic(code(aosom::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(code(aosom::response))]
    Response { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(aosom::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(aosom::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(aosom::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(aosom::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("{what} not ready after {millis}ms")]
    #[diagnostic(
        code(aosom::not_ready),
        help("Raise --timeout-ms, or inspect with: aosom blueprint errors <name>")
    )]
    NotReady { what: String, millis: u64 },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(aosom::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::RequestTimeout { .. } | Self::NotReady { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::Unresolved { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::NoServer { .. }
            | Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::ApiError { status, .. } => match status {
                401 | 403 => exit_code::AUTH,
                404 => exit_code::NOT_FOUND,
                409 => exit_code::CONFLICT,
                _ => exit_code::GENERAL,
            },
            _ => exit_code::GENERAL,
        }
    }

    /// Not-found error for an absent item of a registry resource.
    pub fn item_not_found(resource: &str, name: &str) -> Self {
        Self::NotFound {
            resource_type: resource.into(),
            identifier: name.into(),
            list_command: format!("list {resource}"),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name, available } => Self::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available
                },
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

// ── aosom_api::Error → CliError mapping ──────────────────────────────

impl From<aosom_api::Error> for CliError {
    fn from(err: aosom_api::Error) -> Self {
        use aosom_api::Error;

        match err {
            Error::NoServer => Self::NoServer {
                path: aosom_config::config_path().display().to_string(),
            },

            Error::ServerUnreachable { server, port } => Self::ConnectionFailed {
                target: format!("{server}:{port}"),
                reason: "no answer on the API port".into(),
            },

            Error::NotLoggedIn { server } => Self::AuthFailed {
                message: format!("not logged into server '{server}'"),
            },

            Error::Transport(e) if e.is_timeout() => Self::RequestTimeout {
                message: e.to_string(),
            },

            Error::Transport(e) => Self::ConnectionFailed {
                target: e
                    .url()
                    .map_or_else(|| "(unknown)".into(), ToString::to_string),
                reason: e.to_string(),
            },

            Error::InvalidUrl(e) => Self::Validation {
                field: "server".into(),
                reason: e.to_string(),
            },

            Error::Authentication { message } => Self::AuthFailed { message },

            Error::Request { message, response } => Self::ApiError {
                status: response.status.as_u16(),
                message: format!("{message}: {}", response.body),
            },

            Error::Access { key, method } => Self::Unresolved { key, method },

            Error::UnknownIndex { method } => Self::Validation {
                field: "find method".into(),
                reason: format!("no index by_{method}"),
            },

            Error::UnknownResource { name } => Self::NotFound {
                resource_type: "Resource type".into(),
                identifier: name,
                list_command: "resources".into(),
            },

            Error::AlreadyExists { name } => Self::Conflict {
                resource_type: "Item".into(),
                identifier: name,
            },

            Error::NotExists { name } => Self::NotFound {
                resource_type: "Item".into(),
                identifier: name,
                list_command: "list <resource>".into(),
            },

            Error::Deserialization { message, .. } => Self::Response { message },

            err @ (Error::InvalidVersion { .. } | Error::CreatedWithoutId { .. }) => Self::Response {
                message: err.to_string(),
            },

            Error::Json(e) => Self::Json(e),

            Error::Io(e) => Self::Io(e),
        }
    }
}
