// ── Filter predicates for thing snapshots ──
//
// Used by hosts to narrow a snapshot without going back to the server.

use crate::model::{Thing, ThingKind};

/// Filter predicate for lights and switches.
pub enum ThingFilter {
    All,
    ByKind(ThingKind),
    /// Name starts with a group prefix.
    ByPrefix(String),
    On,
    Off,
    Custom(Box<dyn Fn(&Thing) -> bool + Send + Sync>),
}

impl ThingFilter {
    pub fn matches(&self, thing: &Thing) -> bool {
        match self {
            Self::All => true,
            Self::ByKind(kind) => thing.kind == *kind,
            Self::ByPrefix(prefix) => thing.name.starts_with(prefix.as_str()),
            Self::On => thing.is_on() == Some(true),
            Self::Off => thing.is_on() == Some(false),
            Self::Custom(f) => f(thing),
        }
    }
}
