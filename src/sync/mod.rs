//! Countdown synchronization module.
//!
//! This module contains the client that mirrors a server countdown:
//! - `state`: Local mirror with tick and resync logic
//! - `listener`: Callback interface for UI updates
//! - `engine`: Event loop driving ticks and snapshots
//! - `channel`: WebSocket channels for state and subscriber updates
//! - `error`: Error types

pub mod channel;
pub mod engine;
pub mod error;
pub mod listener;
pub mod state;

pub use channel::{channel_url, connect, connect_channels, parse_subscriber_count, ChannelKind};
pub use engine::{phase_delay, CountdownSync, SyncHandle, Termination};
pub use error::SyncError;
pub use listener::{ChannelListener, CountdownListener, LoggingListener, SyncEvent};
pub use state::{seconds_until_break, CountdownState, TickOutcome};
