// ── Live update channel ──
//
// One supervisor task owns the push connection. It resolves the endpoint
// once, opens the connection, feeds every frame to the store, and when
// the connection drops waits a fixed delay before exactly one new
// attempt. A resume kick abandons a pending open or delay and starts over.
// Cancellation ends the loop without a further attempt.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{FutureExt, StreamExt};
use serde_json::Value;
use tokio::sync::{watch, Mutex, Notify, OnceCell};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::StatePatch;
use crate::transport::{PushStream, PushTransport, RequestLayer};

// ── ChannelState ─────────────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChannelState {
    Closed,
    Connecting,
    Open,
}

// ── Frame parsing ────────────────────────────────────────────────────

/// One merge-patch for one thing.
#[derive(Debug, Clone, PartialEq)]
pub struct ThingUpdate {
    pub thing_name: String,
    pub patch: StatePatch,
}

/// Split a push frame into updates.
///
/// A frame is a single update object or an array of them. Elements that
/// aren't objects with a string `thing_name` are skipped; the rest of the
/// frame still applies.
pub fn parse_frame(frame: &str) -> Vec<ThingUpdate> {
    let value: Value = match serde_json::from_str(frame) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "dropping unparseable push frame");
            return Vec::new();
        }
    };

    let elements = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    elements
        .into_iter()
        .filter_map(|element| {
            let Value::Object(patch) = element else {
                warn!("skipping non-object push update");
                return None;
            };
            let Some(name) = patch.get("thing_name").and_then(Value::as_str) else {
                warn!("skipping push update without thing_name");
                return None;
            };
            Some(ThingUpdate {
                thing_name: name.to_owned(),
                patch,
            })
        })
        .collect()
}

// ── LiveUpdateChannel ────────────────────────────────────────────────

/// Receives every batch of updates parsed from one frame.
pub type UpdateSink = Arc<dyn Fn(Vec<ThingUpdate>) + Send + Sync>;

/// Self-healing push connection.
pub struct LiveUpdateChannel {
    state: watch::Sender<ChannelState>,
    endpoint: Arc<OnceCell<String>>,
    kick: Arc<Notify>,
    cancel: CancellationToken,
    reconnect_delay: Duration,
    open_timeout: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LiveUpdateChannel {
    /// `open_timeout` bounds each connection attempt; an attempt that runs
    /// out counts as a drop.
    pub fn new(reconnect_delay: Duration, open_timeout: Duration, cancel: CancellationToken) -> Self {
        let (state, _) = watch::channel(ChannelState::Closed);
        Self {
            state,
            endpoint: Arc::new(OnceCell::new()),
            kick: Arc::new(Notify::new()),
            cancel,
            reconnect_delay,
            open_timeout,
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChannelState> {
        self.state.subscribe()
    }

    /// The resolved endpoint, once the first lookup succeeded.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.get().map(String::as_str)
    }

    /// Start the supervisor if it isn't already running.
    pub async fn connect<R, P>(
        &self,
        requests: Arc<R>,
        push: Arc<P>,
        sink: UpdateSink,
    ) -> Result<(), CoreError>
    where
        R: RequestLayer,
        P: PushTransport,
    {
        if self.cancel.is_cancelled() {
            return Err(CoreError::Stopped);
        }

        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("push channel already running");
            return Ok(());
        }

        let supervisor = Supervisor {
            requests,
            push,
            sink,
            state: self.state.clone(),
            endpoint: Arc::clone(&self.endpoint),
            kick: Arc::clone(&self.kick),
            cancel: self.cancel.clone(),
            reconnect_delay: self.reconnect_delay,
            open_timeout: self.open_timeout,
        };
        *task = Some(tokio::spawn(supervisor.run()));
        Ok(())
    }

    /// Reconnect now if the channel isn't open.
    ///
    /// Cuts a pending reconnect delay short, or abandons an attempt still
    /// in flight and starts a fresh one. The supervisor owns the only
    /// connection, so this never opens a second one.
    pub async fn resume<R, P>(
        &self,
        requests: Arc<R>,
        push: Arc<P>,
        sink: UpdateSink,
    ) -> Result<(), CoreError>
    where
        R: RequestLayer,
        P: PushTransport,
    {
        let running = self
            .task
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.is_finished());
        if !running {
            return self.connect(requests, push, sink).await;
        }
        if self.state() != ChannelState::Open {
            debug!("forcing push channel reconnect");
            self.kick.notify_one();
        }
        Ok(())
    }

    /// Stop for good. No reconnect follows.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.task.lock().await.take() {
            let _ = handle.await;
        }
        self.state.send_replace(ChannelState::Closed);
    }
}

// ── Supervisor task ──────────────────────────────────────────────────

struct Supervisor<R, P> {
    requests: Arc<R>,
    push: Arc<P>,
    sink: UpdateSink,
    state: watch::Sender<ChannelState>,
    endpoint: Arc<OnceCell<String>>,
    kick: Arc<Notify>,
    cancel: CancellationToken,
    reconnect_delay: Duration,
    open_timeout: Duration,
}

impl<R: RequestLayer, P: PushTransport> Supervisor<R, P> {
    async fn run(self) {
        loop {
            self.state.send_replace(ChannelState::Connecting);

            let opened = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                () = self.kick.notified() => {
                    debug!("abandoning pending push channel open");
                    continue;
                }
                result = self.open() => result,
            };

            match opened {
                Ok(frames) => {
                    // A kick that raced this open is moot now.
                    let _ = self.kick.notified().now_or_never();
                    self.state.send_replace(ChannelState::Open);
                    info!("push channel open");
                    if self.pump(frames).await.is_break() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "push channel open failed"),
            }

            self.state.send_replace(ChannelState::Closed);
            let delay_ms = u64::try_from(self.reconnect_delay.as_millis()).unwrap_or(u64::MAX);
            debug!(delay_ms, "push channel reconnect scheduled");

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                () = self.kick.notified() => debug!("reconnect delay cut short"),
                () = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        self.state.send_replace(ChannelState::Closed);
        debug!("push channel supervisor stopped");
    }

    async fn open(&self) -> Result<PushStream, CoreError> {
        let endpoint = self
            .endpoint
            .get_or_try_init(|| self.requests.push_endpoint())
            .await?;
        debug!(endpoint = %endpoint, "opening push channel");
        tokio::time::timeout(self.open_timeout, self.push.open(endpoint))
            .await
            .map_err(|_| CoreError::Timeout {
                timeout_secs: self.open_timeout.as_secs(),
            })?
    }

    /// Feed frames to the sink until the connection drops (`Continue`) or
    /// the channel is cancelled (`Break`).
    async fn pump(&self, mut frames: PushStream) -> std::ops::ControlFlow<()> {
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return std::ops::ControlFlow::Break(()),
                frame = frames.next() => match frame {
                    Some(Ok(text)) => {
                        let updates = parse_frame(&text);
                        if !updates.is_empty() {
                            (self.sink)(updates);
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "push channel dropped");
                        return std::ops::ControlFlow::Continue(());
                    }
                    None => {
                        info!("push channel closed by server");
                        return std::ops::ControlFlow::Continue(());
                    }
                }
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
