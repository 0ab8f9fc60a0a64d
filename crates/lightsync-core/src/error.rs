// ── Core error types ──
//
// User-facing errors from lightsync-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<lightsync_api::Error>`
// impl translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach lighting server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Push channel error: {reason}")]
    PushChannel { reason: String },

    #[error("Store has been stopped")]
    Stopped,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Thing not found: {name}")]
    ThingNotFound { name: String },

    #[error("Button not found: {name}")]
    ButtonNotFound { name: String },

    #[error("Group not found: {name}")]
    GroupNotFound { name: String },

    #[error("Group {group} has no {action} action")]
    ActionUnavailable { group: String, action: String },

    #[error("Malformed data from server: {message}")]
    Malformed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Cache / configuration ────────────────────────────────────────
    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lightsync_api::Error> for CoreError {
    fn from(err: lightsync_api::Error) -> Self {
        match err {
            lightsync_api::Error::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            lightsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            lightsync_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            lightsync_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            lightsync_api::Error::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            lightsync_api::Error::WebSocketConnect(reason) => CoreError::PushChannel {
                reason: format!("connection failed: {reason}"),
            },
            lightsync_api::Error::WebSocketClosed { code, reason } => CoreError::PushChannel {
                reason: format!("closed (code {code}): {reason}"),
            },
            lightsync_api::Error::Deserialization { message, body: _ } => {
                CoreError::Malformed { message }
            }
        }
    }
}
