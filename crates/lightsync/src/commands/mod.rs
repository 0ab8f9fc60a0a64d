//! Command dispatch: bridges CLI args -> store operations -> output formatting.

pub mod cache;
pub mod config_cmd;
pub mod control;
pub mod util;
pub mod view;
pub mod watch;

use lightsync_core::HttpThingsStore;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
///
/// Everything except `watch` runs against a single refresh; `watch`
/// opens the push channel and keeps the store running.
pub async fn dispatch(
    cmd: Command,
    store: &HttpThingsStore,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Watch(args) => watch::handle(store, args, global).await,
        Command::Cache(args) => cache::handle(store, args, global).await,
        cmd => {
            util::refresh(store, global).await?;
            match cmd {
                Command::Groups(args) => view::groups(store, args, global),
                Command::Things(args) => view::things(store, args, global),
                Command::Meta { name } => view::meta(store, &name, global),
                Command::Set(args) => control::set(store, args, global).await,
                Command::Press { name } => control::press(store, &name, global).await,
                Command::Group(args) => control::group(store, args, global).await,
                // Handled above or before dispatch
                Command::Watch(_)
                | Command::Cache(_)
                | Command::Config(_)
                | Command::Completions(_) => unreachable!(),
            }
        }
    }
}
