//! Push-channel WebSocket connection.
//!
//! Opens a single connection to the server's live-update endpoint and
//! exposes its text frames as a [`Stream`]. Reconnection is *not* handled
//! here: the stream simply ends when the connection drops, and the caller
//! (the core's live update channel) decides when to open a new one.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//!
//! let mut frames = lightsync_api::websocket::connect("ws://home.local:8080/ws").await?;
//! while let Some(frame) = frames.next().await {
//!     println!("{}", frame?);
//! }
//! ```

use std::pin::Pin;

use futures_core::Stream;
use futures_util::StreamExt;
use tokio_tungstenite::tungstenite;

use crate::error::Error;

/// Text frames from one push connection. Ends when the connection closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>;

/// Establish a WebSocket connection and return its text-frame stream.
///
/// Dropping the stream closes the connection.
pub async fn connect(endpoint: &str) -> Result<FrameStream, Error> {
    tracing::info!(endpoint, "Connecting to push channel");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(endpoint)
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("Push channel connected");

    let (_write, mut read) = ws_stream.split();

    let frames = async_stream::stream! {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(tungstenite::Message::Text(text)) => {
                    yield Ok(text.as_str().to_owned());
                }
                Ok(tungstenite::Message::Ping(_)) => {
                    // tungstenite handles pong replies automatically
                    tracing::trace!("Push channel ping");
                }
                Ok(tungstenite::Message::Close(frame)) => {
                    if let Some(ref cf) = frame {
                        tracing::info!(
                            code = %cf.code,
                            reason = %cf.reason,
                            "Push channel close frame received"
                        );
                    } else {
                        tracing::info!("Push channel close frame received (no payload)");
                    }
                    break;
                }
                Err(e) => {
                    yield Err(Error::WebSocketClosed {
                        code: 1006,
                        reason: e.to_string(),
                    });
                    break;
                }
                Ok(_) => {
                    // Binary, Pong, Frame -- ignore
                }
            }
        }
        tracing::debug!("Push channel stream ended");
    };

    Ok(Box::pin(frames))
}

// ── Tests ────────────────────────────────────────────────────────────
