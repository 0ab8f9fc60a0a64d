//! CLI-side profile resolution: picks the active profile and layers
//! `GlobalOpts` overrides on top of `lightsync_config`.
//!
//! Core never sees these types -- it receives a pre-built `StoreConfig`.

use std::time::Duration;

use lightsync_config::{self as cfg, Config, Profile};
use lightsync_core::{CacheLocation, StoreConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use lightsync_config::{config_path, load_config_or_default};

// ── Profile resolution ───────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated, sorted profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}

/// Build the `StoreConfig` for this invocation.
///
/// Flag > env > profile > defaults. Without a matching profile the
/// server URL must come from `--server` / `LIGHTSYNC_SERVER`.
pub fn resolve_store_config(global: &GlobalOpts) -> Result<StoreConfig, CliError> {
    let config = cfg::load_config()?;
    let profile_name = active_profile_name(global, &config);

    let mut store_config = match config.profiles.get(&profile_name) {
        Some(profile) => cfg::profile_to_store_config(profile, &config.defaults)?,
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                available: available_profiles(&config),
                name: profile_name,
            });
        }
        None => {
            let server = global.server.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            let bare = Profile {
                server: server.to_owned(),
                ..Profile::default()
            };
            cfg::profile_to_store_config(&bare, &config.defaults)?
        }
    };

    apply_overrides(&mut store_config, global)?;
    Ok(store_config)
}

/// Layer global flags over a profile-derived config.
fn apply_overrides(store_config: &mut StoreConfig, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(ref server) = global.server {
        store_config.url = server.parse().map_err(|_| CliError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {server}"),
        })?;
    }

    if global.insecure {
        store_config.tls = TlsVerification::DangerAcceptInvalid;
    }

    if let Some(secs) = global.timeout {
        store_config.timeout = Duration::from_secs(secs);
    }

    if global.no_cache {
        store_config.cache = CacheLocation::Memory;
    }

    Ok(())
}
