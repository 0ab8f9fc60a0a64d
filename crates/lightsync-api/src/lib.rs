// lightsync-api: Async HTTP + WebSocket transport for the lighting server

pub mod client;
pub mod error;
pub mod models;
pub mod transport;
pub mod websocket;

pub use client::ThingsClient;
pub use error::Error;
pub use models::{GroupRecord, MetadataRecord, ThingRecord};
pub use transport::{TlsMode, TransportConfig};
