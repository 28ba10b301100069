//! Countdown Client Library
//!
//! This library mirrors a countdown timer pushed by a server over
//! WebSocket channels and ticks it locally between snapshots.
//! It includes:
//! - Local countdown state with break scheduling
//! - Event loop that aligns local ticks to server timestamps
//! - Listener interface for UI updates
//! - CLI command parsing and display utilities
//! - Type definitions for snapshots and configuration

pub mod cli;
pub mod sync;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{BreakType, SyncConfig, TimerSnapshot};

pub use sync::{
    ChannelListener, CountdownListener, CountdownState, CountdownSync, LoggingListener,
    SyncError, SyncEvent, SyncHandle, Termination, TickOutcome,
};
