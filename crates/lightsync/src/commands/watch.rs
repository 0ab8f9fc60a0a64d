//! `watch`: follow the push channel and print things as they change.
//!
//! Runs until Ctrl-C. On Unix, SIGHUP is treated like the host coming
//! back to the foreground: an immediate refresh, and a push reconnect if
//! the channel is down.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Local;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;

use lightsync_core::{ChannelState, HttpThingsStore, StoreState, Thing, ThingFilter};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::util::{self, ThingRow};

pub async fn handle(store: &HttpThingsStore, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let filters = util::filters(&args.filter);
    let color = output::should_color(&global.color);

    let mut stream = store.subscribe();
    let mut notices = store.notices();
    let mut channel = store.channel_state();
    let mut resumed = resume_signal()?;

    let report = store.start().await?;
    util::warn_incomplete(&report, global);

    let mut last = stream.latest();
    print_things(changed_things(None, &last, &filters), &last, global, color)?;

    loop {
        tokio::select! {
            biased;

            _ = tokio::signal::ctrl_c() => break,

            Some(()) = resumed.recv() => {
                tracing::info!("resume requested, refreshing");
                let report = store.on_resume().await?;
                util::warn_incomplete(&report, global);
            }

            changed = stream.changed() => {
                let Some(next) = changed else { break };
                let things = changed_things(Some(&last), &next, &filters);
                print_things(things, &next, global, color)?;
                last = next;
            }

            notice = notices.recv() => match notice {
                Ok(notice) if !global.quiet => eprintln!("warning: {notice}"),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },

            Ok(()) = channel.changed() => {
                let state = *channel.borrow_and_update();
                if !global.quiet {
                    eprintln!("{} push channel {}", timestamp(), describe(state));
                }
            }
        }
    }

    Ok(())
}

fn describe(state: ChannelState) -> &'static str {
    match state {
        ChannelState::Closed => "closed",
        ChannelState::Connecting => "connecting",
        ChannelState::Open => "open",
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Things in `next` that are new or differ from `prev`, filtered.
fn changed_things<'a>(
    prev: Option<&StoreState>,
    next: &'a StoreState,
    filters: &[ThingFilter],
) -> Vec<&'a Thing> {
    let before: HashMap<&str, &Thing> = prev
        .map(|p| {
            p.lights
                .iter()
                .chain(p.switches.iter())
                .map(|t| (t.name.as_str(), t))
                .collect()
        })
        .unwrap_or_default();

    next.lights
        .iter()
        .chain(next.switches.iter())
        .filter(|t| before.get(t.name.as_str()) != Some(t))
        .filter(|t| util::matches_all(filters, t))
        .collect()
}

fn print_things(
    things: Vec<&Thing>,
    state: &Arc<StoreState>,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    if things.is_empty() {
        return Ok(());
    }
    let out = match global.output {
        // Streams read better as one compact line per change.
        OutputFormat::Json | OutputFormat::JsonCompact => things
            .iter()
            .map(|t| output::render_json(t, true))
            .collect::<Result<Vec<_>, _>>()?
            .join("\n"),
        _ => output::render_list(
            &global.output,
            &things,
            |t| ThingRow::new(t, util::group_of(&state.view, &t.name), color),
            |t| format!("{} {}", timestamp(), t.name),
        )?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Resume signal ───────────────────────────────────────────────────

#[cfg(unix)]
fn resume_signal() -> Result<mpsc::Receiver<()>, CliError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            if tx.send(()).await.is_err() {
                break;
            }
        }
    });
    Ok(rx)
}

#[cfg(not(unix))]
fn resume_signal() -> Result<mpsc::Receiver<()>, CliError> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        let _tx = tx;
        std::future::pending::<()>().await;
    });
    Ok(rx)
}
