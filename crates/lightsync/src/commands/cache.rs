//! Cache command handlers.

use lightsync_core::{Collection, HttpThingsStore};

use crate::cli::{CacheArgs, CacheCommand, GlobalOpts};
use crate::error::CliError;

use super::util;

pub async fn handle(store: &HttpThingsStore, args: CacheArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        CacheCommand::Clear => {
            let report = store.clear_cache().await?;
            util::warn_incomplete(&report, global);
            if !global.quiet {
                let fetched: usize = [Collection::Lights, Collection::Switches]
                    .into_iter()
                    .filter_map(|c| report.stats(c))
                    .map(|s| s.metadata_fetched)
                    .sum();
                eprintln!("Cache cleared, refetched metadata for {fetched} things");
            }
            Ok(())
        }
    }
}
