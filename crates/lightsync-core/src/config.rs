// ── Runtime store configuration ──
//
// These types describe *how* to reach the lighting server and how the
// store behaves. They never touch disk: the CLI (via lightsync-config)
// constructs a `StoreConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::Button;

/// Fixed delay between a push-channel drop and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed home servers).
    DangerAcceptInvalid,
}

/// What to do when the write behind an optimistic command fails.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OptimisticPolicy {
    /// Keep the optimistic state and only log the failure.
    #[default]
    FailSilent,
    /// Restore the previous field values and return the error.
    RevertOnError,
}

/// Where the local cache lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CacheLocation {
    /// Platform cache directory (`directories::ProjectDirs`).
    #[default]
    Platform,
    /// An explicit directory.
    Dir(PathBuf),
    /// Keep everything in memory; nothing survives the process.
    Memory,
}

/// Configuration for one store instance.
///
/// Built by the CLI, passed to `ThingsStore` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Server base URL, including any path prefix (e.g. `http://home.local:8080/lights/`).
    pub url: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout. Also bounds each push-channel connection attempt.
    pub timeout: Duration,
    /// Delay before reconnecting a dropped push channel.
    pub reconnect_delay: Duration,
    /// Failure policy for optimistic commands.
    pub optimistic_policy: OptimisticPolicy,
    /// Local cache location.
    pub cache: CacheLocation,
    /// Host-supplied buttons, in display order.
    pub buttons: Vec<Button>,
}

impl StoreConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            optimistic_policy: OptimisticPolicy::default(),
            cache: CacheLocation::default(),
            buttons: Vec::new(),
        }
    }
}
