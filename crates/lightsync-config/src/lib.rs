//! Shared configuration for lightsync hosts.
//!
//! TOML profiles merged with `LIGHTSYNC_*` environment variables, and
//! translation to `lightsync_core::StoreConfig`. The CLI adds
//! `GlobalOpts`-aware overrides on top.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lightsync_core::{Button, CacheLocation, OptimisticPolicy, StoreConfig, TlsVerification};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "LIGHTSYNC_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Delay before reconnecting a dropped push channel.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    #[serde(default)]
    pub optimistic_policy: OptimisticPolicy,

    /// Cache directory override. Platform cache dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            optimistic_policy: OptimisticPolicy::default(),
            cache_dir: None,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_reconnect_delay_ms() -> u64 {
    2000
}

/// A named server profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Server base URL, including any path prefix (e.g., "http://pi.local/lights/").
    pub server: String,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Override the optimistic command policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimistic_policy: Option<OptimisticPolicy>,

    /// Buttons as `{ name = "url" }` entries, in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<BTreeMap<String, String>>,
}

impl Profile {
    pub fn buttons(&self) -> Vec<Button> {
        Button::from_entries(self.buttons.iter().cloned())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `LIGHTSYNC_CONFIG`, else XDG / platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("", "", "lightsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lightsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, still merging the environment.
///
/// Nested keys use a double underscore:
/// `LIGHTSYNC_DEFAULTS__TIMEOUT=5`, `LIGHTSYNC_PROFILES__HOME__SERVER=...`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LIGHTSYNC_").split("__").ignore(&["config"]));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to StoreConfig ──────────────────────────────────────

/// Build a `StoreConfig` from a profile and the global defaults, without CLI
/// flag overrides.
pub fn profile_to_store_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<StoreConfig, ConfigError> {
    let url: url::Url = profile
        .server
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {}", profile.server),
        })?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let cache = defaults
        .cache_dir
        .clone()
        .map_or(CacheLocation::Platform, CacheLocation::Dir);

    let mut config = StoreConfig::new(url);
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.reconnect_delay = Duration::from_millis(defaults.reconnect_delay_ms);
    config.optimistic_policy = profile
        .optimistic_policy
        .unwrap_or(defaults.optimistic_policy);
    config.cache = cache;
    config.buttons = profile.buttons();
    Ok(config)
}

// ── Tests ───────────────────────────────────────────────────────────
