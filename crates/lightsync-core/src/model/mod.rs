// ── Domain model ──
//
// Canonical representation of everything the store tracks. Wire records
// from lightsync-api are converted into these types in `convert.rs`; the
// CLI and any other host only ever see what lives here.

pub mod group;
pub mod metadata;
pub mod thing;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use lightsync_core::model::*` gives you everything.

pub use group::{Group, GroupAction, GroupMember, GroupedView, ServerGroup, OTHERS_GROUP};
pub use metadata::{ThingMetadata, ACTION_WHITELIST};
pub use thing::{Button, Collection, StatePatch, Thing, ThingKind};
