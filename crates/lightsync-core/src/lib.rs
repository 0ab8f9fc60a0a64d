// lightsync-core: Client-side sync engine between lightsync-api and hosts (CLI).

pub mod cache;
pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod fetcher;
pub mod groups;
pub mod live;
pub mod model;
pub mod store;
pub mod stream;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CacheBackend, FileBackend, LocalCache, MemoryBackend};
pub use command::ThingCommand;
pub use config::{CacheLocation, OptimisticPolicy, StoreConfig, TlsVerification};
pub use error::CoreError;
pub use fetcher::{fetch_metadata, MetadataBatch};
pub use groups::build_groups;
pub use live::{ChannelState, LiveUpdateChannel, ThingUpdate};
pub use store::{CollectionStats, Notice, RefreshReport, StoreState, ThingsStore};
pub use stream::{StoreStream, ThingFilter};
pub use transport::{PushStream, PushTransport, RequestLayer, WsTransport};

pub use lightsync_api::ThingsClient;

/// A store over the real HTTP client and WebSocket push channel.
pub type HttpThingsStore = ThingsStore<ThingsClient, WsTransport>;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Button, Collection, Group, GroupAction, GroupMember, GroupedView, ServerGroup, StatePatch,
    Thing, ThingKind, ThingMetadata,
};
