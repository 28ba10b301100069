//! Listener interface for countdown updates.
//!
//! Every callback has a default implementation that only logs, so an
//! implementation overrides just what it renders.

use tokio::sync::mpsc;

use crate::types::BreakType;

// ============================================================================
// CountdownListener
// ============================================================================

/// Receives UI updates from the countdown mirror.
pub trait CountdownListener {
    /// Fired on every local tick and on every resync.
    ///
    /// `until_break` is `None` when no big break is left.
    fn update_seconds(&mut self, seconds: u32, seconds_passed: u32, until_break: Option<u32>) {
        tracing::debug!(seconds, seconds_passed, ?until_break, "update_seconds");
    }

    /// Fired when the repeat counter changes.
    fn update_repeat(&mut self, repeat: u32) {
        tracing::debug!(repeat, "update_repeat");
    }

    /// Fired when the nominal repeat duration changes.
    fn update_total_seconds(&mut self, total_seconds: u32) {
        tracing::debug!(total_seconds, "update_total_seconds");
    }

    /// Fired when a break starts or ends.
    fn update_break_status(&mut self, is_break: bool, break_type: BreakType) {
        tracing::debug!(is_break, break_type = break_type.as_str(), "update_break_status");
    }

    /// Fired once, for the first snapshot.
    fn on_initialization_state(&mut self, is_running: bool, is_paused: bool) {
        tracing::info!(is_running, is_paused, "countdown initialized");
    }

    /// Fired when a later snapshot flips `is_running`.
    fn on_running_state_change(&mut self, previous: bool, current: bool) {
        tracing::info!(previous, current, "running state changed");
    }

    /// Fired when a later snapshot flips `is_paused`.
    fn on_pause_state_change(&mut self, previous: bool, current: bool) {
        tracing::info!(previous, current, "pause state changed");
    }

    /// Fired when the final repeat completes.
    fn on_finish(&mut self) {
        tracing::info!("countdown finished");
    }

    /// Fired when the state channel closes.
    fn on_connection_close(&mut self) {
        tracing::info!("state channel closed");
    }

    /// Fired on each subscriber-count push.
    fn on_subscribers_change(&mut self, count: u64) {
        tracing::debug!(count, "subscribers changed");
    }
}

impl<L: CountdownListener + ?Sized> CountdownListener for Box<L> {
    fn update_seconds(&mut self, seconds: u32, seconds_passed: u32, until_break: Option<u32>) {
        (**self).update_seconds(seconds, seconds_passed, until_break)
    }

    fn update_repeat(&mut self, repeat: u32) {
        (**self).update_repeat(repeat)
    }

    fn update_total_seconds(&mut self, total_seconds: u32) {
        (**self).update_total_seconds(total_seconds)
    }

    fn update_break_status(&mut self, is_break: bool, break_type: BreakType) {
        (**self).update_break_status(is_break, break_type)
    }

    fn on_initialization_state(&mut self, is_running: bool, is_paused: bool) {
        (**self).on_initialization_state(is_running, is_paused)
    }

    fn on_running_state_change(&mut self, previous: bool, current: bool) {
        (**self).on_running_state_change(previous, current)
    }

    fn on_pause_state_change(&mut self, previous: bool, current: bool) {
        (**self).on_pause_state_change(previous, current)
    }

    fn on_finish(&mut self) {
        (**self).on_finish()
    }

    fn on_connection_close(&mut self) {
        (**self).on_connection_close()
    }

    fn on_subscribers_change(&mut self, count: u64) {
        (**self).on_subscribers_change(count)
    }
}

/// Listener that keeps every default (log-only) callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl CountdownListener for LoggingListener {}

// ============================================================================
// SyncEvent
// ============================================================================

/// Listener callbacks as values, for channel-based consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Seconds changed (tick or resync)
    SecondsUpdated {
        /// Seconds left in the current repeat or break
        seconds: u32,
        /// Elapsed seconds
        seconds_passed: u32,
        /// Seconds until the next big break, if any
        until_break: Option<u32>,
    },
    /// Repeat counter changed
    RepeatUpdated {
        /// Current repeat
        repeat: u32,
    },
    /// Nominal repeat duration changed
    TotalSecondsUpdated {
        /// New duration
        total_seconds: u32,
    },
    /// Break started or ended
    BreakStatusChanged {
        /// Whether a break is in progress
        is_break: bool,
        /// Kind of break
        break_type: BreakType,
    },
    /// First snapshot applied
    Initialized {
        /// Server running flag
        is_running: bool,
        /// Server paused flag
        is_paused: bool,
    },
    /// Running flag flipped
    RunningStateChanged {
        /// Value before the snapshot
        previous: bool,
        /// Value from the snapshot
        current: bool,
    },
    /// Paused flag flipped
    PauseStateChanged {
        /// Value before the snapshot
        previous: bool,
        /// Value from the snapshot
        current: bool,
    },
    /// Last repeat completed
    Finished,
    /// State channel closed
    ConnectionClosed,
    /// Subscriber count pushed
    SubscribersChanged {
        /// Number of subscribers
        count: u64,
    },
}

// ============================================================================
// ChannelListener
// ============================================================================

/// Forwards every callback as a [`SyncEvent`] over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    event_tx: mpsc::UnboundedSender<SyncEvent>,
}

impl ChannelListener {
    /// Creates a listener that sends into `event_tx`.
    pub fn new(event_tx: mpsc::UnboundedSender<SyncEvent>) -> Self {
        Self { event_tx }
    }

    /// Creates a listener together with the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, event: SyncEvent) {
        if let Err(e) = self.event_tx.send(event) {
            tracing::debug!("event receiver dropped: {:?}", e.0);
        }
    }
}

impl CountdownListener for ChannelListener {
    fn update_seconds(&mut self, seconds: u32, seconds_passed: u32, until_break: Option<u32>) {
        self.send(SyncEvent::SecondsUpdated {
            seconds,
            seconds_passed,
            until_break,
        });
    }

    fn update_repeat(&mut self, repeat: u32) {
        self.send(SyncEvent::RepeatUpdated { repeat });
    }

    fn update_total_seconds(&mut self, total_seconds: u32) {
        self.send(SyncEvent::TotalSecondsUpdated { total_seconds });
    }

    fn update_break_status(&mut self, is_break: bool, break_type: BreakType) {
        self.send(SyncEvent::BreakStatusChanged {
            is_break,
            break_type,
        });
    }

    fn on_initialization_state(&mut self, is_running: bool, is_paused: bool) {
        self.send(SyncEvent::Initialized {
            is_running,
            is_paused,
        });
    }

    fn on_running_state_change(&mut self, previous: bool, current: bool) {
        self.send(SyncEvent::RunningStateChanged { previous, current });
    }

    fn on_pause_state_change(&mut self, previous: bool, current: bool) {
        self.send(SyncEvent::PauseStateChanged { previous, current });
    }

    fn on_finish(&mut self) {
        self.send(SyncEvent::Finished);
    }

    fn on_connection_close(&mut self) {
        self.send(SyncEvent::ConnectionClosed);
    }

    fn on_subscribers_change(&mut self, count: u64) {
        self.send(SyncEvent::SubscribersChanged { count });
    }
}

// ============================================================================
// Tests
// ============================================================================
