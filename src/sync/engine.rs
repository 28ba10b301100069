//! Countdown synchronization engine.
//!
//! This module runs the client event loop:
//! - Server snapshots overwrite the local mirror and restart the ticker
//! - A one-second ticker, phase-aligned to the server clock, advances it
//! - Subscriber counts are forwarded to the listener
//! - Closing the state channel ends the session
//!
//! Everything runs in one task, so the ticker and snapshot handling never
//! interleave.

use std::future::Future;

use anyhow::{Context, Result};
use futures_util::{Stream, StreamExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};

use crate::types::{SyncConfig, TimerSnapshot};

use super::channel::{self, parse_subscriber_count};
use super::error::SyncError;
use super::listener::CountdownListener;
use super::state::{CountdownState, TickOutcome};

// ============================================================================
// Constants
// ============================================================================

/// Tick period in milliseconds
const TICK_MILLIS: i64 = 1000;

// ============================================================================
// Termination
// ============================================================================

/// Why a sync session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The state channel closed or failed
    ConnectionClosed,
    /// The owner disposed the session
    Disposed,
}

// ============================================================================
// Phase Alignment
// ============================================================================

/// Returns the delay until the next whole second of the server clock.
///
/// `server_timestamp_ms` is when the snapshot was taken; the snapshot's
/// `seconds` value holds until one full second after it. The result is
/// in `(0, 1000]` milliseconds.
pub fn phase_delay(server_timestamp_ms: i64, now_ms: i64) -> Duration {
    // Widened so that any server timestamp is accepted
    let elapsed = i128::from(now_ms) - i128::from(server_timestamp_ms);
    let into_second = elapsed.rem_euclid(i128::from(TICK_MILLIS));
    Duration::from_millis((i128::from(TICK_MILLIS) - into_second) as u64)
}

/// Current wall clock in milliseconds.
fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Waits for the next tick, or forever when no ticker is active.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

// ============================================================================
// CountdownSync
// ============================================================================

/// Client that mirrors a server countdown and reports to a listener.
pub struct CountdownSync<L> {
    /// Channel configuration
    config: SyncConfig,
    /// Local mirror
    state: CountdownState,
    /// UI callbacks
    listener: L,
    /// Timestamp of the last applied snapshot
    last_timestamp: Option<i64>,
    /// Snapshots applied since creation
    snapshot_count: u64,
}

impl<L: CountdownListener> CountdownSync<L> {
    /// Creates a new, unconnected client.
    pub fn new(config: SyncConfig, listener: L) -> Self {
        Self {
            config,
            state: CountdownState::new(),
            listener,
            last_timestamp: None,
            snapshot_count: 0,
        }
    }

    /// Returns the channel configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the local mirror.
    pub fn state(&self) -> &CountdownState {
        &self.state
    }

    /// Returns how many snapshots have been applied, across sessions.
    pub fn snapshot_count(&self) -> u64 {
        self.snapshot_count
    }

    /// Returns the listener.
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Consumes the client and returns its listener.
    pub fn into_listener(self) -> L {
        self.listener
    }

    /// Opens both channels and starts the event loop on a new task.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the state
    /// channel cannot be opened.
    pub async fn initialize(self) -> Result<SyncHandle<L>>
    where
        L: Send + 'static,
    {
        self.config
            .validate()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Invalid sync configuration")?;

        let (state_stream, subscribers_stream) = channel::connect_channels(&self.config)
            .await
            .context("Failed to open countdown channels")?;

        tracing::info!("connected to {}", self.config.origin);
        Ok(self.spawn(state_stream, subscribers_stream))
    }

    /// Starts the event loop over the given streams on a new task.
    pub fn spawn<S, T>(mut self, state_stream: S, subscribers_stream: T) -> SyncHandle<L>
    where
        L: Send + 'static,
        S: Stream<Item = Result<String, SyncError>> + Send + Unpin + 'static,
        T: Stream<Item = Result<String, SyncError>> + Send + Unpin + 'static,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let termination = self
                .run(state_stream, subscribers_stream, shutdown_rx)
                .await;
            (self, termination)
        });

        SyncHandle {
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }

    /// Runs the event loop until the state channel ends or `shutdown`
    /// completes.
    pub async fn run<S, T, F>(
        &mut self,
        mut state_stream: S,
        mut subscribers_stream: T,
        shutdown: F,
    ) -> Termination
    where
        S: Stream<Item = Result<String, SyncError>> + Unpin,
        T: Stream<Item = Result<String, SyncError>> + Unpin,
        F: Future,
    {
        tokio::pin!(shutdown);
        let mut ticker: Option<Interval> = None;
        let mut subscribers_open = true;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::debug!("sync disposed");
                    return Termination::Disposed;
                }
                message = state_stream.next() => {
                    let result = match message {
                        Some(Ok(text)) => self.handle_state_message(&text, &mut ticker),
                        Some(Err(e)) => Err(e),
                        None => {
                            tracing::info!("state channel closed");
                            self.listener.on_connection_close();
                            return Termination::ConnectionClosed;
                        }
                    };
                    match result {
                        Ok(()) => {}
                        Err(e) if e.is_recoverable() => {
                            tracing::warn!("ignoring snapshot: {}", e);
                        }
                        Err(e) => {
                            tracing::warn!("state channel failed: {}", e);
                            self.listener.on_connection_close();
                            return Termination::ConnectionClosed;
                        }
                    }
                },
                message = subscribers_stream.next(), if subscribers_open => {
                    let result = match message {
                        Some(Ok(text)) => self.handle_subscribers_message(&text),
                        Some(Err(e)) => Err(e),
                        None => {
                            tracing::debug!("subscribers channel closed");
                            subscribers_open = false;
                            Ok(())
                        }
                    };
                    match result {
                        Ok(()) => {}
                        Err(e) if e.is_recoverable() => {
                            tracing::warn!("ignoring subscriber count: {}", e);
                        }
                        Err(e) => {
                            tracing::warn!("subscribers channel failed: {}", e);
                            subscribers_open = false;
                        }
                    }
                },
                _ = next_tick(&mut ticker) => {
                    if self.state.tick(&mut self.listener) == TickOutcome::Finished {
                        tracing::info!("countdown finished, ticker stopped");
                        ticker = None;
                    }
                }
            }
        }
    }

    /// Applies one state-channel payload.
    ///
    /// A payload that fails to parse leaves the previous state and ticker
    /// as they were.
    fn handle_state_message(
        &mut self,
        text: &str,
        ticker: &mut Option<Interval>,
    ) -> Result<(), SyncError> {
        let snapshot = TimerSnapshot::from_json(text)?;

        if self.config.reject_stale_snapshots {
            if let Some(last) = self.last_timestamp {
                if snapshot.timestamp < last {
                    tracing::warn!(
                        "ignoring stale snapshot (timestamp {} < {})",
                        snapshot.timestamp,
                        last
                    );
                    return Ok(());
                }
            }
        }

        *ticker = None;
        self.last_timestamp = Some(snapshot.timestamp);
        self.snapshot_count += 1;
        let timestamp = snapshot.timestamp;

        if self.state.apply_snapshot(snapshot, &mut self.listener) {
            let delay = phase_delay(timestamp, now_millis());
            tracing::debug!("ticker starts in {:?}", delay);
            let mut interval = interval_at(Instant::now() + delay, Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            *ticker = Some(interval);
        }
        Ok(())
    }

    /// Applies one subscriber-channel payload.
    fn handle_subscribers_message(&mut self, text: &str) -> Result<(), SyncError> {
        let count = parse_subscriber_count(text)?;
        self.listener.on_subscribers_change(count);
        Ok(())
    }
}

// ============================================================================
// SyncHandle
// ============================================================================

/// Handle to a running sync session.
pub struct SyncHandle<L> {
    /// Stops the event loop
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Event loop task
    task: JoinHandle<(CountdownSync<L>, Termination)>,
}

impl<L> SyncHandle<L> {
    /// Stops the event loop and returns the client with its state.
    ///
    /// # Errors
    ///
    /// Returns an error if the event loop task panicked.
    pub async fn dispose(mut self) -> Result<CountdownSync<L>> {
        if let Some(tx) = self.shutdown_tx.take() {
            // The loop may already have ended on its own
            let _ = tx.send(());
        }
        let (sync, _termination) = self.task.await.context("Sync task failed")?;
        Ok(sync)
    }

    /// Waits until the session ends on its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the event loop task panicked.
    pub async fn closed(self) -> Result<(CountdownSync<L>, Termination)> {
        // Keep the sender alive so the loop is not disposed
        let _shutdown_tx = self.shutdown_tx;
        self.task.await.context("Sync task failed")
    }

    /// Returns true if the event loop has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

// ============================================================================
// Tests
// ============================================================================
