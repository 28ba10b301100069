//! Watch client for the countdown CLI.
//!
//! This module provides:
//! - Channel connection for a [`CountdownSync`] session
//! - Optional reconnection with linear backoff
//! - Shutdown handling
//!
//! Reconnection lives here rather than in the sync engine: the engine
//! reports a closed connection and this layer decides what to do.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::sync::{channel, CountdownListener, CountdownSync, Termination};
use crate::types::SyncConfig;

// ============================================================================
// Constants
// ============================================================================

/// Maximum consecutive failed connection attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// WatchClient
// ============================================================================

/// Connects a countdown listener to a server.
#[derive(Debug, Clone)]
pub struct WatchClient {
    /// Channel configuration
    config: SyncConfig,
    /// Reopen the channels after they close
    reconnect: bool,
    /// Consecutive failed attempts before giving up. Both refused
    /// connections and sessions closed before any snapshot count.
    max_retries: u32,
    /// Base retry delay
    retry_delay: Duration,
}

impl WatchClient {
    /// Creates a client that connects once.
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            reconnect: false,
            max_retries: MAX_RETRIES,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    /// Enables reconnection with the given retry budget.
    pub fn with_reconnect(mut self, max_retries: u32) -> Self {
        self.reconnect = true;
        self.max_retries = max_retries;
        self
    }

    /// Overrides the base retry delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Returns the channel configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Mirrors the server countdown into `listener` until `shutdown`
    /// completes or the connection is lost for good.
    ///
    /// Local state carries over between reconnects, so a snapshot received
    /// after reconnecting reports running/paused changes rather than a new
    /// initialization.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, or if the retry
    /// budget runs out on connections that fail or close before delivering
    /// a snapshot.
    pub async fn watch<L, F>(&self, listener: L, shutdown: F) -> Result<CountdownSync<L>>
    where
        L: CountdownListener,
        F: Future,
    {
        self.config
            .validate()
            .map_err(|e| anyhow::anyhow!(e))
            .context("設定が不正です")?;

        tokio::pin!(shutdown);
        let mut sync = CountdownSync::new(self.config.clone(), listener);
        let mut failures = 0u32;

        loop {
            let connected = tokio::select! {
                _ = &mut shutdown => return Ok(sync),
                connected = channel::connect_channels(&self.config) => connected,
            };

            let (state_stream, subscribers_stream) = match connected {
                Ok(streams) => streams,
                Err(e) => {
                    failures += 1;
                    if !self.reconnect || !e.is_connection_error() || failures >= self.max_retries {
                        return Err(e).context("サーバーに接続できません");
                    }
                    tracing::warn!("接続失敗 (試行 {}/{}): {}", failures, self.max_retries, e);
                    if self.backoff(failures, &mut shutdown).await {
                        return Ok(sync);
                    }
                    continue;
                }
            };

            tracing::info!("{} に接続しました", self.config.origin);
            let received_before = sync.snapshot_count();
            match sync
                .run(state_stream, subscribers_stream, &mut shutdown)
                .await
            {
                Termination::Disposed => return Ok(sync),
                Termination::ConnectionClosed if self.reconnect => {
                    // A session without any snapshot counts as a failed attempt
                    if sync.snapshot_count() > received_before {
                        failures = 0;
                    } else {
                        failures += 1;
                        if failures >= self.max_retries {
                            anyhow::bail!(
                                "サーバーが状態を送信せずに切断しました (試行 {}/{})",
                                failures,
                                self.max_retries
                            );
                        }
                    }
                    tracing::info!("再接続します");
                    if self.backoff(failures.max(1), &mut shutdown).await {
                        return Ok(sync);
                    }
                }
                Termination::ConnectionClosed => return Ok(sync),
            }
        }
    }

    /// Sleeps before the next attempt. Returns true if shutdown fired.
    async fn backoff<F>(&self, attempt: u32, shutdown: &mut F) -> bool
    where
        F: Future + Unpin,
    {
        let delay = self.retry_delay * attempt;
        tokio::select! {
            _ = shutdown => true,
            _ = tokio::time::sleep(delay) => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::ChannelListener;

    // ------------------------------------------------------------------------
    // WatchClient Tests
    // ------------------------------------------------------------------------

    mod client_tests {
        use super::*;

        /// An origin with nothing listening.
        fn unreachable_config() -> SyncConfig {
            SyncConfig::default().with_origin("http://127.0.0.1:1")
        }

        #[test]
        fn test_defaults() {
            let client = WatchClient::new(SyncConfig::default());
            assert!(!client.reconnect);
            assert_eq!(client.max_retries, 3);
            assert_eq!(client.retry_delay, Duration::from_millis(500));
        }

        #[test]
        fn test_with_reconnect() {
            let client = WatchClient::new(SyncConfig::default())
                .with_reconnect(7)
                .with_retry_delay(Duration::from_millis(10));
            assert!(client.reconnect);
            assert_eq!(client.max_retries, 7);
            assert_eq!(client.retry_delay, Duration::from_millis(10));
        }

        #[tokio::test]
        async fn test_invalid_config() {
            let client = WatchClient::new(SyncConfig::default().with_origin("ftp://x"));
            let (listener, _rx) = ChannelListener::channel();

            let result = client.watch(listener, std::future::pending::<()>()).await;

            assert!(result.is_err());
        }

        #[tokio::test]
        async fn test_connection_refused_without_reconnect() {
            let client = WatchClient::new(unreachable_config());
            let (listener, _rx) = ChannelListener::channel();

            let result = client.watch(listener, std::future::pending::<()>()).await;

            let err = result.err().expect("connection should fail");
            assert!(err.to_string().contains("接続できません"));
        }

        #[tokio::test]
        async fn test_connection_refused_gives_up_after_retries() {
            let client = WatchClient::new(unreachable_config())
                .with_reconnect(3)
                .with_retry_delay(Duration::from_millis(10));
            let (listener, mut rx) = ChannelListener::channel();

            let started = tokio::time::Instant::now();
            let result = client.watch(listener, std::future::pending::<()>()).await;

            assert!(result.is_err());
            // Two backoffs: 10ms + 20ms
            assert!(started.elapsed() >= Duration::from_millis(30));
            assert!(rx.try_recv().is_err());
        }

        #[tokio::test]
        async fn test_shutdown_during_backoff() {
            let client = WatchClient::new(unreachable_config())
                .with_reconnect(100)
                .with_retry_delay(Duration::from_secs(60));
            let (listener, _rx) = ChannelListener::channel();

            let shutdown = tokio::time::sleep(Duration::from_millis(200));
            let result = tokio::time::timeout(
                Duration::from_secs(5),
                client.watch(listener, shutdown),
            )
            .await;

            let sync = result.expect("watch should stop on shutdown").unwrap();
            assert!(!sync.state().is_initialized());
        }
    }
}
