// ── Transport seams ──
//
// The store only talks to the outside world through these two traits.
// `ThingsClient` (HTTP) and `WsTransport` (WebSocket) are the production
// implementations; tests substitute in-memory fakes.

use std::future::Future;
use std::pin::Pin;

use futures_core::Stream;
use futures_util::StreamExt;
use url::Url;

use lightsync_api::transport::{TlsMode, TransportConfig};
use lightsync_api::ThingsClient;

use crate::config::{StoreConfig, TlsVerification};
use crate::convert::thing_from_record;
use crate::error::CoreError;
use crate::model::{Collection, GroupAction, ServerGroup, StatePatch, Thing, ThingMetadata};

/// Frames from one open push connection. Ends when the connection drops.
pub type PushStream = Pin<Box<dyn Stream<Item = Result<String, CoreError>> + Send>>;

/// Request/response access to the lighting server.
pub trait RequestLayer: Send + Sync + 'static {
    fn groups(&self) -> impl Future<Output = Result<Vec<ServerGroup>, CoreError>> + Send;

    fn things(
        &self,
        collection: Collection,
    ) -> impl Future<Output = Result<Vec<Thing>, CoreError>> + Send;

    /// Current version token of the server's metadata corpus.
    fn metadata_hash(&self) -> impl Future<Output = Result<String, CoreError>> + Send;

    /// Unfiltered metadata for one thing.
    fn metadata(&self, name: &str)
    -> impl Future<Output = Result<ThingMetadata, CoreError>> + Send;

    fn set(
        &self,
        name: &str,
        patch: &StatePatch,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Address of the live-update channel.
    fn push_endpoint(&self) -> impl Future<Output = Result<String, CoreError>> + Send;

    /// Fire a button's action URL.
    fn trigger(&self, url: &str) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn group_action(
        &self,
        group: &str,
        action: GroupAction,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Opens live-update connections.
pub trait PushTransport: Send + Sync + 'static {
    fn open(&self, endpoint: &str) -> impl Future<Output = Result<PushStream, CoreError>> + Send;
}

// ── HTTP ─────────────────────────────────────────────────────────────

impl RequestLayer for ThingsClient {
    async fn groups(&self) -> Result<Vec<ServerGroup>, CoreError> {
        let records = self.list_groups().await?;
        Ok(records.into_iter().map(ServerGroup::from).collect())
    }

    async fn things(&self, collection: Collection) -> Result<Vec<Thing>, CoreError> {
        let records = match collection {
            Collection::Lights => self.list_lights().await?,
            Collection::Switches => self.list_switches().await?,
        };
        let kind = collection.kind();
        Ok(records
            .into_iter()
            .map(|r| thing_from_record(r, kind))
            .collect())
    }

    async fn metadata_hash(&self) -> Result<String, CoreError> {
        Ok(ThingsClient::metadata_hash(self).await?)
    }

    async fn metadata(&self, name: &str) -> Result<ThingMetadata, CoreError> {
        Ok(ThingsClient::metadata(self, name).await?.into())
    }

    async fn set(&self, name: &str, patch: &StatePatch) -> Result<(), CoreError> {
        Ok(ThingsClient::set(self, name, patch).await?)
    }

    async fn push_endpoint(&self) -> Result<String, CoreError> {
        Ok(ThingsClient::push_endpoint(self).await?)
    }

    async fn trigger(&self, url: &str) -> Result<(), CoreError> {
        Ok(ThingsClient::trigger(self, url).await?)
    }

    async fn group_action(&self, group: &str, action: GroupAction) -> Result<(), CoreError> {
        match action {
            GroupAction::AllOn => self.all_lights_on(group).await?,
            GroupAction::AllOff => self.all_lights_off(group).await?,
        }
        Ok(())
    }
}

/// Build the HTTP client described by `config`.
pub fn http_client(config: &StoreConfig) -> Result<ThingsClient, CoreError> {
    let transport = TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    };
    Ok(ThingsClient::new(base_url(&config.url), &transport)?)
}

/// Relative endpoint paths only resolve under the base if it ends in `/`.
fn base_url(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

// ── WebSocket ────────────────────────────────────────────────────────

/// Push transport over a plain WebSocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl PushTransport for WsTransport {
    async fn open(&self, endpoint: &str) -> Result<PushStream, CoreError> {
        let frames = lightsync_api::websocket::connect(endpoint).await?;
        Ok(Box::pin(frames.map(|frame| frame.map_err(CoreError::from))))
    }
}
