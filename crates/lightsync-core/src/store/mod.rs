// ── Things store ──
//
// Single-owner state with push-based change notification, plus the
// orchestration that keeps it in sync with the server.

mod refresh;
mod state;
mod things_store;

pub use refresh::{CollectionReport, CollectionStats, RefreshReport};
pub use state::StoreState;
pub use things_store::{Notice, ThingsStore};
