// ── ThingsStore ──
//
// Orchestrator over the request layer, the push channel, the cache and
// the shared state. Cheaply cloneable; every clone drives the same store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::refresh::RefreshReport;
use super::state::{SharedState, StoreState};
use crate::cache::{LocalCache, HASH_KEY, META_KEY};
use crate::command::ThingCommand;
use crate::config::{OptimisticPolicy, StoreConfig};
use crate::error::CoreError;
use crate::live::{ChannelState, LiveUpdateChannel, UpdateSink};
use crate::model::{Button, GroupAction, GroupedView, StatePatch};
use crate::stream::StoreStream;
use crate::transport::{http_client, PushTransport, RequestLayer, WsTransport};

use lightsync_api::ThingsClient;

const NOTICE_CHANNEL_SIZE: usize = 32;

// ── Notice ───────────────────────────────────────────────────────────

/// A user-visible report of a failed read. State is left as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub operation: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.message)
    }
}

// ── ThingsStore ──────────────────────────────────────────────────────

/// The main entry point for hosts.
///
/// Does nothing until [`start()`](Self::start). After
/// [`stop()`](Self::stop) every operation returns [`CoreError::Stopped`]
/// and late responses are dropped.
pub struct ThingsStore<R, P> {
    pub(super) inner: Arc<StoreInner<R, P>>,
}

impl<R, P> Clone for ThingsStore<R, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub(super) struct StoreInner<R, P> {
    pub(super) policy: OptimisticPolicy,
    pub(super) requests: Arc<R>,
    pub(super) push: Arc<P>,
    pub(super) cache: LocalCache,
    pub(super) shared: Arc<SharedState>,
    pub(super) notices: broadcast::Sender<Notice>,
    pub(super) channel: LiveUpdateChannel,
    pub(super) cancel: CancellationToken,
}

impl ThingsStore<ThingsClient, WsTransport> {
    /// A store talking HTTP and WebSocket to the server in `config`.
    pub fn new(config: &StoreConfig) -> Result<Self, CoreError> {
        let client = http_client(config)?;
        let cache = LocalCache::open(&config.cache);
        Ok(Self::with_transport(config, client, WsTransport, cache))
    }
}

impl<R: RequestLayer, P: PushTransport> ThingsStore<R, P> {
    /// A store over arbitrary transports.
    pub fn with_transport(config: &StoreConfig, requests: R, push: P, cache: LocalCache) -> Self {
        let cancel = CancellationToken::new();
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        let channel = LiveUpdateChannel::new(
            config.reconnect_delay,
            config.timeout,
            cancel.child_token(),
        );

        Self {
            inner: Arc::new(StoreInner {
                policy: config.optimistic_policy,
                requests: Arc::new(requests),
                push: Arc::new(push),
                cache,
                shared: Arc::new(SharedState::new(config.buttons.clone())),
                notices,
                channel,
                cancel,
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Open the push channel and run the first refresh.
    pub async fn start(&self) -> Result<RefreshReport, CoreError> {
        self.ensure_running()?;
        info!("starting things store");
        self.inner
            .channel
            .connect(
                Arc::clone(&self.inner.requests),
                Arc::clone(&self.inner.push),
                self.update_sink(),
            )
            .await?;
        self.refresh().await
    }

    /// The host came back to the foreground: refetch, and reconnect the
    /// push channel now if it isn't open.
    pub async fn on_resume(&self) -> Result<RefreshReport, CoreError> {
        self.ensure_running()?;
        debug!("resuming things store");
        self.inner
            .channel
            .resume(
                Arc::clone(&self.inner.requests),
                Arc::clone(&self.inner.push),
                self.update_sink(),
            )
            .await?;
        self.refresh().await
    }

    /// Close the push channel for good and drop any in-flight results.
    pub async fn stop(&self) {
        if self.inner.cancel.is_cancelled() {
            return;
        }
        info!("stopping things store");
        self.inner.cancel.cancel();
        self.inner.channel.shutdown().await;
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply `field = value` locally, then write it to the server.
    ///
    /// Setting `brightness` also sets `state` locally (off at zero). Only
    /// the requested field is sent. What a failed write does depends on the
    /// configured [`OptimisticPolicy`].
    pub async fn apply_optimistic_command(
        &self,
        name: &str,
        field: &str,
        value: Value,
    ) -> Result<(), CoreError> {
        self.ensure_running()?;

        let mut request = Map::new();
        request.insert(field.to_owned(), value.clone());

        let mut local = request.clone();
        if field == "brightness" {
            if let Some(level) = value.as_u64() {
                local.insert("state".into(), Value::Bool(level > 0));
            }
        }

        let previous = self
            .inner
            .shared
            .modify(|state| {
                let thing = state.thing(name)?;
                let previous: Vec<(String, Option<Value>)> = local
                    .keys()
                    .map(|k| (k.clone(), thing.field(k).cloned()))
                    .collect();
                state.apply_patch(name, &local);
                state.rebuild_view();
                Some(previous)
            })
            .ok_or_else(|| CoreError::ThingNotFound {
                name: name.to_owned(),
            })?;

        debug!(thing = name, field, "optimistic update applied");

        let Err(e) = self.inner.requests.set(name, &request).await else {
            return Ok(());
        };

        match self.inner.policy {
            OptimisticPolicy::FailSilent => {
                warn!(thing = name, field, error = %e, "write failed, keeping optimistic state");
                Ok(())
            }
            OptimisticPolicy::RevertOnError => {
                if !self.is_stopped() {
                    self.revert(name, &local, previous);
                }
                warn!(thing = name, field, error = %e, "write failed, optimistic state reverted");
                Err(e)
            }
        }
    }

    /// Typed form of [`apply_optimistic_command`](Self::apply_optimistic_command).
    pub async fn execute(&self, name: &str, command: ThingCommand) -> Result<(), CoreError> {
        let (field, value) = command.into_field();
        self.apply_optimistic_command(name, field, value).await
    }

    /// Restore fields we set, unless something newer already replaced them.
    fn revert(&self, name: &str, applied: &StatePatch, previous: Vec<(String, Option<Value>)>) {
        self.inner.shared.modify(|state| {
            let Some(current) = state.thing(name) else {
                return;
            };
            let mut restore = Map::new();
            let mut remove = Vec::new();
            for (key, old) in previous {
                if current.field(&key) != applied.get(&key) {
                    continue;
                }
                match old {
                    Some(value) => {
                        restore.insert(key, value);
                    }
                    None => remove.push(key),
                }
            }
            state.apply_patch(name, &restore);
            for thing in state
                .lights
                .iter_mut()
                .chain(state.switches.iter_mut())
                .filter(|t| t.name == name)
            {
                for key in &remove {
                    thing.state.remove(key);
                }
            }
            state.rebuild_view();
        });
    }

    /// Replace the host-supplied buttons.
    pub fn set_buttons(&self, buttons: Vec<Button>) {
        self.inner.shared.modify(|state| {
            state.buttons = buttons;
            state.rebuild_view();
        });
    }

    /// Fire a host-supplied button.
    pub async fn press_button(&self, name: &str) -> Result<(), CoreError> {
        self.ensure_running()?;
        let button = self
            .inner
            .shared
            .snapshot()
            .button(name)
            .cloned()
            .ok_or_else(|| CoreError::ButtonNotFound {
                name: name.to_owned(),
            })?;
        debug!(button = %button.name, url = %button.action_url, "pressing button");
        self.inner.requests.trigger(&button.action_url).await
    }

    /// Switch every light in a group on or off.
    pub async fn trigger_group_action(
        &self,
        group: &str,
        action: GroupAction,
    ) -> Result<(), CoreError> {
        self.ensure_running()?;
        let view = self.view();
        let found = view.get(group).ok_or_else(|| CoreError::GroupNotFound {
            name: group.to_owned(),
        })?;
        if !found.actions.contains(&action) {
            return Err(CoreError::ActionUnavailable {
                group: group.to_owned(),
                action: action.to_string(),
            });
        }
        debug!(group, %action, "triggering group action");
        self.inner.requests.group_action(group, action).await
    }

    /// Forget the metadata hash and cached metadata, then refresh.
    pub async fn clear_cache(&self) -> Result<RefreshReport, CoreError> {
        self.ensure_running()?;
        info!("clearing metadata cache");
        self.inner.cache.remove(HASH_KEY);
        self.inner.cache.remove(META_KEY);
        self.refresh().await
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<StoreState> {
        self.inner.shared.snapshot()
    }

    pub fn view(&self) -> Arc<GroupedView> {
        Arc::clone(&self.inner.shared.snapshot().view)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.shared.snapshot().loading
    }

    pub fn subscribe(&self) -> StoreStream {
        StoreStream::new(self.inner.shared.subscribe())
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    pub fn channel_state(&self) -> watch::Receiver<ChannelState> {
        self.inner.channel.subscribe()
    }

    // ── Helpers ──────────────────────────────────────────────────────

    pub(super) fn ensure_running(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            Err(CoreError::Stopped)
        } else {
            Ok(())
        }
    }

    pub(super) fn notify_read_failure(&self, operation: &str, error: &CoreError) {
        warn!(operation, error = %error, "read failed, keeping current state");
        // No subscribers is fine.
        let _ = self.inner.notices.send(Notice {
            operation: operation.to_owned(),
            message: error.to_string(),
            at: Utc::now(),
        });
    }

    fn update_sink(&self) -> UpdateSink {
        let shared = Arc::clone(&self.inner.shared);
        let cancel = self.inner.cancel.clone();
        Arc::new(move |updates| {
            if cancel.is_cancelled() {
                return;
            }
            shared.modify(|state| {
                let changed = state.apply_updates(&updates);
                state.last_push = Some(Utc::now());
                debug!(received = updates.len(), changed, "push updates applied");
            });
        })
    }
}
