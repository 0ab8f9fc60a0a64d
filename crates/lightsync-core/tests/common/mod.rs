// In-memory stand-ins for the lighting server and its push channel.

#![allow(clippy::unwrap_used, dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::sync::{mpsc, Notify};
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::Url;

use lightsync_core::{
    Collection, CoreError, GroupAction, LocalCache, MemoryBackend, OptimisticPolicy, PushStream,
    PushTransport, RequestLayer, ServerGroup, StatePatch, StoreConfig, Thing, ThingKind,
    ThingMetadata, ThingsStore,
};

// ── Fake request layer ──────────────────────────────────────────────

#[derive(Default)]
pub struct ServerState {
    pub groups: Mutex<Vec<ServerGroup>>,
    pub lights: Mutex<Vec<Thing>>,
    pub switches: Mutex<Vec<Thing>>,
    pub hash: Mutex<String>,

    pub metadata_calls: Mutex<Vec<String>>,
    pub set_calls: Mutex<Vec<(String, StatePatch)>>,
    pub triggers: Mutex<Vec<String>>,
    pub group_actions: Mutex<Vec<(String, GroupAction)>>,
    pub endpoint_calls: AtomicUsize,

    pub fail_groups: AtomicBool,
    pub fail_set: AtomicBool,
    pub failing_metadata: Mutex<Vec<String>>,

    /// When set, `things(Lights)` waits for `lights_gate`.
    pub hold_lights: AtomicBool,
    pub lights_gate: Notify,
    /// When set, `set` waits for `set_gate`.
    pub hold_set: AtomicBool,
    pub set_gate: Notify,
}

#[derive(Clone, Default)]
pub struct FakeServer(pub Arc<ServerState>);

impl FakeServer {
    pub fn new() -> Self {
        let server = Self::default();
        *server.0.hash.lock().unwrap() = "h1".into();
        server
    }

    pub fn with_groups(self, groups: &[(&str, &[&str])]) -> Self {
        *self.0.groups.lock().unwrap() = groups
            .iter()
            .map(|(name, members)| ServerGroup {
                name: (*name).into(),
                members: members.iter().map(|m| (*m).to_owned()).collect(),
            })
            .collect();
        self
    }

    pub fn with_lights(self, names: &[&str]) -> Self {
        *self.0.lights.lock().unwrap() = things(names, ThingKind::Light);
        self
    }

    pub fn with_switches(self, names: &[&str]) -> Self {
        *self.0.switches.lock().unwrap() = things(names, ThingKind::Switch);
        self
    }

    pub fn set_hash(&self, hash: &str) {
        *self.0.hash.lock().unwrap() = hash.into();
    }

    pub fn take_metadata_calls(&self) -> Vec<String> {
        let mut calls = std::mem::take(&mut *self.0.metadata_calls.lock().unwrap());
        calls.sort();
        calls
    }

    pub fn set_calls(&self) -> Vec<(String, StatePatch)> {
        self.0.set_calls.lock().unwrap().clone()
    }
}

pub fn things(names: &[&str], kind: ThingKind) -> Vec<Thing> {
    names
        .iter()
        .map(|n| {
            let mut thing = Thing::new(*n, kind);
            thing.merge_patch(&patch(json!({ "state": false, "brightness": 100 })));
            thing
        })
        .collect()
}

pub fn patch(value: Value) -> StatePatch {
    value.as_object().cloned().unwrap()
}

pub fn metadata(name: &str) -> ThingMetadata {
    serde_json::from_value(json!({
        "name": name,
        "model": "TEST-1",
        "actions": { "brightness": {}, "state": {}, "linkquality": {} }
    }))
    .unwrap()
}

fn unavailable(what: &str) -> CoreError {
    CoreError::Api {
        message: format!("{what} unavailable"),
        status: Some(503),
    }
}

impl RequestLayer for FakeServer {
    async fn groups(&self) -> Result<Vec<ServerGroup>, CoreError> {
        if self.0.fail_groups.load(Ordering::SeqCst) {
            return Err(unavailable("groups"));
        }
        Ok(self.0.groups.lock().unwrap().clone())
    }

    async fn things(&self, collection: Collection) -> Result<Vec<Thing>, CoreError> {
        match collection {
            Collection::Lights => {
                if self.0.hold_lights.load(Ordering::SeqCst) {
                    self.0.lights_gate.notified().await;
                }
                Ok(self.0.lights.lock().unwrap().clone())
            }
            Collection::Switches => Ok(self.0.switches.lock().unwrap().clone()),
        }
    }

    async fn metadata_hash(&self) -> Result<String, CoreError> {
        Ok(self.0.hash.lock().unwrap().clone())
    }

    async fn metadata(&self, name: &str) -> Result<ThingMetadata, CoreError> {
        self.0.metadata_calls.lock().unwrap().push(name.to_owned());
        if self.0.failing_metadata.lock().unwrap().iter().any(|n| n == name) {
            return Err(unavailable("metadata"));
        }
        Ok(metadata(name))
    }

    async fn set(&self, name: &str, patch: &StatePatch) -> Result<(), CoreError> {
        self.0
            .set_calls
            .lock()
            .unwrap()
            .push((name.to_owned(), patch.clone()));
        if self.0.hold_set.load(Ordering::SeqCst) {
            self.0.set_gate.notified().await;
        }
        if self.0.fail_set.load(Ordering::SeqCst) {
            return Err(unavailable("set"));
        }
        Ok(())
    }

    async fn push_endpoint(&self) -> Result<String, CoreError> {
        self.0.endpoint_calls.fetch_add(1, Ordering::SeqCst);
        Ok("ws://fake/ws".into())
    }

    async fn trigger(&self, url: &str) -> Result<(), CoreError> {
        self.0.triggers.lock().unwrap().push(url.to_owned());
        Ok(())
    }

    async fn group_action(&self, group: &str, action: GroupAction) -> Result<(), CoreError> {
        self.0
            .group_actions
            .lock()
            .unwrap()
            .push((group.to_owned(), action));
        Ok(())
    }
}

// ── Fake push transport ─────────────────────────────────────────────

type FrameSender = mpsc::UnboundedSender<Result<String, CoreError>>;

#[derive(Default)]
pub struct PushState {
    pub opens: AtomicUsize,
    pub fail_open: AtomicBool,
    /// When set, `open` never completes.
    pub hang_open: AtomicBool,
    connection: Mutex<Option<FrameSender>>,
}

#[derive(Clone, Default)]
pub struct FakePush(pub Arc<PushState>);

impl FakePush {
    pub fn opens(&self) -> usize {
        self.0.opens.load(Ordering::SeqCst)
    }

    /// Deliver one frame on the open connection.
    pub fn send(&self, frame: &str) {
        let guard = self.0.connection.lock().unwrap();
        guard.as_ref().unwrap().send(Ok(frame.to_owned())).unwrap();
    }

    /// Simulate the server going away.
    pub fn drop_connection(&self) {
        self.0.connection.lock().unwrap().take();
    }
}

impl PushTransport for FakePush {
    async fn open(&self, _endpoint: &str) -> Result<PushStream, CoreError> {
        self.0.opens.fetch_add(1, Ordering::SeqCst);
        if self.0.hang_open.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.0.fail_open.load(Ordering::SeqCst) {
            return Err(CoreError::PushChannel {
                reason: "refused".into(),
            });
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.0.connection.lock().unwrap() = Some(tx);
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}

// ── Store setup ─────────────────────────────────────────────────────

pub struct Harness {
    pub store: ThingsStore<FakeServer, FakePush>,
    pub server: FakeServer,
    pub push: FakePush,
    pub cache: Arc<MemoryBackend>,
}

pub fn config(policy: OptimisticPolicy) -> StoreConfig {
    let mut config = StoreConfig::new(Url::parse("http://fake.local/lights/").unwrap());
    config.optimistic_policy = policy;
    config
}

pub fn harness(server: FakeServer) -> Harness {
    harness_with(server, config(OptimisticPolicy::FailSilent), Arc::new(MemoryBackend::new()))
}

pub fn harness_with(server: FakeServer, config: StoreConfig, cache: Arc<MemoryBackend>) -> Harness {
    let push = FakePush::default();
    let store = ThingsStore::with_transport(
        &config,
        server.clone(),
        push.clone(),
        LocalCache::new(Arc::clone(&cache)),
    );
    Harness {
        store,
        server,
        push,
        cache,
    }
}

pub fn cached_metadata(cache: &Arc<MemoryBackend>) -> Option<HashMap<String, ThingMetadata>> {
    LocalCache::new(Arc::clone(cache)).cache_get(lightsync_core::cache::META_KEY)
}
