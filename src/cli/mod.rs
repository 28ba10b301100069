//! CLI module for the countdown client.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `client`: Server connection with optional reconnection
//! - `display`: Output formatting and the terminal listener
//! - `simulate`: Offline countdown runs from a snapshot file

pub mod client;
pub mod commands;
pub mod display;
pub mod simulate;

pub use client::WatchClient;
pub use commands::{Cli, Commands, SimulateArgs, WatchArgs};
pub use display::{Display, TerminalListener};
pub use simulate::{load_snapshot, simulate, SimulationSummary};
