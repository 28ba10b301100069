//! Error types for the countdown synchronization client.
//!
//! Parse failures are recoverable: the engine logs them and keeps the
//! previous state. Connection failures end the current session.

use thiserror::Error;

/// Errors that can occur while receiving timer updates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The origin cannot be turned into a channel URL.
    #[error("オリジンが不正です: {0}")]
    InvalidOrigin(String),

    /// Opening a channel failed.
    #[error("チャンネルに接続できません ({url}): {reason}")]
    Connect {
        /// Channel URL
        url: String,
        /// Underlying transport error
        reason: String,
    },

    /// An open channel failed while reading.
    #[error("チャンネルの受信に失敗しました: {0}")]
    Connection(String),

    /// Snapshot payload is not valid JSON for a snapshot.
    #[error("スナップショットのパースに失敗しました: {0}")]
    MalformedSnapshot(String),

    /// Snapshot decoded but violates an invariant.
    #[error("スナップショットが不正です: {0}")]
    InvalidSnapshot(String),

    /// Subscriber payload is not an integer.
    #[error("購読者数のパースに失敗しました: {0:?}")]
    MalformedSubscriberCount(String),
}

impl SyncError {
    /// Returns true if the error only affects a single message.
    ///
    /// Recoverable errors are logged and the message is dropped; the
    /// channel stays open and prior state is kept.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedSnapshot(_)
                | Self::InvalidSnapshot(_)
                | Self::MalformedSubscriberCount(_)
        )
    }

    /// Returns true if the error means the channel is gone.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Connection(_))
    }
}
