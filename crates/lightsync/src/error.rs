//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use lightsync_config::ConfigError;
use lightsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach lighting server at {url}")]
    #[diagnostic(
        code(lightsync::connection_failed),
        help(
            "Check that the server is running and the URL includes its path prefix.\n\
             URL: {url}\n\
             Try: lightsync groups --server http://host:port/prefix/"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Push channel failed: {reason}")]
    #[diagnostic(code(lightsync::push_channel))]
    PushChannel { reason: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(lightsync::not_found),
        help("Run: lightsync {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Group '{group}' has no '{action}' action")]
    #[diagnostic(
        code(lightsync::action_unavailable),
        help("Group actions are only available for server-defined groups.")
    )]
    ActionUnavailable { group: String, action: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(lightsync::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lightsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(lightsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: lightsync config add {name} --server <URL>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(lightsync::no_config),
        help(
            "Create a profile with: lightsync config add default --server <URL>\n\
             Or pass --server / set LIGHTSYNC_SERVER.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(lightsync::config))]
    Config(Box<ConfigError>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(lightsync::timeout),
        help("Increase timeout with --timeout or check server responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(lightsync::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(lightsync::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::PushChannel { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::ActionUnavailable { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::PushChannel { reason } => CliError::PushChannel { reason },

            CoreError::Stopped => CliError::ApiError {
                code: "stopped".into(),
                message: "store was stopped before the operation finished".into(),
            },

            CoreError::ThingNotFound { name } => CliError::NotFound {
                resource_type: "thing".into(),
                identifier: name,
                list_command: "things".into(),
            },

            CoreError::ButtonNotFound { name } => CliError::NotFound {
                resource_type: "button".into(),
                identifier: name,
                list_command: "config show".into(),
            },

            CoreError::GroupNotFound { name } => CliError::NotFound {
                resource_type: "group".into(),
                identifier: name,
                list_command: "groups".into(),
            },

            CoreError::ActionUnavailable { group, action } => {
                CliError::ActionUnavailable { group, action }
            }

            CoreError::Malformed { message } => CliError::ApiError {
                code: "malformed".into(),
                message,
            },

            CoreError::Api { message, status } => CliError::ApiError {
                code: status.map_or_else(|| "-".into(), |s| s.to_string()),
                message,
            },

            CoreError::Cache { message } => CliError::ApiError {
                code: "cache".into(),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}
