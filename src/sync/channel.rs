//! WebSocket channels for the countdown client.
//!
//! This module provides:
//! - Channel URL resolution from the hosting page origin
//! - Read-only WebSocket connections exposed as text streams
//! - Subscriber-count payload parsing
//!
//! The client never writes to either channel.

use std::fmt;

use futures_util::future;
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio_tungstenite::tungstenite::{self, Message};
use url::Url;

use crate::types::SyncConfig;

use super::error::SyncError;

/// Inbound text frames of one channel.
pub type MessageStream = BoxStream<'static, Result<String, SyncError>>;

// ============================================================================
// ChannelKind
// ============================================================================

/// The two channels a countdown client listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Timer snapshots
    State,
    /// Subscriber counts
    Subscribers,
}

impl ChannelKind {
    /// Returns the configured path of this channel.
    pub fn path<'a>(&self, config: &'a SyncConfig) -> &'a str {
        match self {
            ChannelKind::State => &config.state_path,
            ChannelKind::Subscribers => &config.subscribers_path,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::State => write!(f, "state"),
            ChannelKind::Subscribers => write!(f, "subscribers"),
        }
    }
}

// ============================================================================
// URL Resolution
// ============================================================================

/// Resolves a channel path against the page origin.
///
/// The WebSocket scheme follows the page: `https` pages get `wss`,
/// `http` pages get `ws`.
///
/// # Errors
///
/// Returns `InvalidOrigin` if the origin does not parse or uses an
/// unsupported scheme.
pub fn channel_url(origin: &str, path: &str) -> Result<Url, SyncError> {
    let origin = Url::parse(origin).map_err(|e| SyncError::InvalidOrigin(e.to_string()))?;

    let scheme = match origin.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(SyncError::InvalidOrigin(format!("unsupported scheme: {}", other))),
    };

    let mut url = origin
        .join(path)
        .map_err(|e| SyncError::InvalidOrigin(e.to_string()))?;
    url.set_scheme(scheme)
        .map_err(|()| SyncError::InvalidOrigin(format!("cannot switch to {}", scheme)))?;
    Ok(url)
}

// ============================================================================
// Connections
// ============================================================================

/// Opens a channel and returns its inbound text frames.
///
/// Binary frames are decoded as UTF-8. Control frames are handled by the
/// transport. The stream ends when the server closes the connection.
///
/// # Errors
///
/// Returns `Connect` if the WebSocket handshake fails.
pub async fn connect(url: &Url) -> Result<MessageStream, SyncError> {
    tracing::debug!("connecting to {}", url);

    let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| SyncError::Connect {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    Ok(socket
        .filter_map(|frame| future::ready(decode_frame(frame)))
        .boxed())
}

/// Opens both channels for a configuration.
///
/// A failing subscriber channel is logged and replaced by a silent stream;
/// only the state channel is required.
///
/// # Errors
///
/// Returns an error if the origin is invalid or the state channel cannot
/// be opened.
pub async fn connect_channels(
    config: &SyncConfig,
) -> Result<(MessageStream, MessageStream), SyncError> {
    let state_url = channel_url(&config.origin, ChannelKind::State.path(config))?;
    let subscribers_url = channel_url(&config.origin, ChannelKind::Subscribers.path(config))?;

    let state = connect(&state_url).await?;
    let subscribers = match connect(&subscribers_url).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!("{} channel unavailable: {}", ChannelKind::Subscribers, e);
            stream::pending().boxed()
        }
    };

    Ok((state, subscribers))
}

/// Maps a WebSocket frame to a text payload.
fn decode_frame(
    frame: Result<Message, tungstenite::Error>,
) -> Option<Result<String, SyncError>> {
    match frame {
        Ok(Message::Text(text)) => Some(Ok(text)),
        Ok(Message::Binary(bytes)) => Some(
            String::from_utf8(bytes).map_err(|e| SyncError::Connection(e.to_string())),
        ),
        Ok(Message::Close(frame)) => {
            tracing::debug!("close frame received: {:?}", frame);
            None
        }
        Ok(_) => None,
        Err(e) => Some(Err(SyncError::Connection(e.to_string()))),
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Parses a subscriber-count payload (a plain integer).
///
/// # Errors
///
/// Returns `MalformedSubscriberCount` if the payload is not a
/// non-negative integer.
pub fn parse_subscriber_count(payload: &str) -> Result<u64, SyncError> {
    payload
        .trim()
        .parse::<u64>()
        .map_err(|_| SyncError::MalformedSubscriberCount(payload.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
