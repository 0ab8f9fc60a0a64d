//! Config subcommand handlers.

use serde::Serialize;
use tabled::Tabled;

use lightsync_config::{self as cfg, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ProfileLine<'a> {
    name: &'a str,
    server: &'a str,
    buttons: usize,
    default: bool,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Server")]
    server: String,
    #[tabled(rename = "Buttons")]
    buttons: usize,
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n({e})")),
                |_| "config".into(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let active = config::active_profile_name(global, &cfg);
            let mut lines: Vec<ProfileLine<'_>> = cfg
                .profiles
                .iter()
                .map(|(name, p)| ProfileLine {
                    name,
                    server: &p.server,
                    buttons: p.buttons.len(),
                    default: *name == active,
                })
                .collect();
            lines.sort_by(|a, b| a.name.cmp(b.name));

            let out = output::render_list(
                &global.output,
                &lines,
                |l| ProfileRow {
                    marker: if l.default { "*" } else { "" },
                    name: l.name.to_owned(),
                    server: l.server.to_owned(),
                    buttons: l.buttons,
                },
                |l| l.name.to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Add <name> --server <url> ───────────────────────────────
        ConfigCommand::Add { name, server } => {
            if server.parse::<url::Url>().is_err() {
                return Err(CliError::Validation {
                    field: "server".into(),
                    reason: format!("invalid URL: {server}"),
                });
            }
            let mut cfg = config::load_config_or_default();
            cfg.profiles.entry(name.clone()).or_insert_with(Profile::default).server = server;
            if !cfg.profiles.contains_key(cfg.default_profile.as_deref().unwrap_or_default()) {
                cfg.default_profile = Some(name.clone());
            }
            cfg::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Profile '{name}' saved to {}", config::config_path().display());
            }
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            cfg::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}
