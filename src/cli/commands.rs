//! Command definitions for the countdown CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::{SyncConfig, DEFAULT_ORIGIN, DEFAULT_STATE_PATH, DEFAULT_SUBSCRIBERS_PATH};

// ============================================================================
// CLI Structure
// ============================================================================

/// Countdown CLI - mirrors a server-synchronized countdown timer
#[derive(Parser, Debug)]
#[command(
    name = "countdown",
    version,
    about = "サーバー同期カウントダウンタイマーのCLIクライアント",
    long_about = "サーバーから配信されるカウントダウンの状態を受信し、\n\
                  ローカルで1秒ごとに刻みながらターミナルに表示します。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Connect to a countdown server and mirror its timer
    Watch(WatchArgs),

    /// Run the local countdown from a snapshot file without a server
    Simulate(SimulateArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Watch Command Arguments
// ============================================================================

/// Arguments for the watch command
#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Origin of the page hosting the timer (http/https/ws/wss)
    #[arg(short, long, default_value = DEFAULT_ORIGIN, value_parser = validate_origin)]
    pub origin: String,

    /// Path of the state channel
    #[arg(long, default_value = DEFAULT_STATE_PATH, value_parser = validate_path)]
    pub state_path: String,

    /// Path of the subscriber-count channel
    #[arg(long, default_value = DEFAULT_SUBSCRIBERS_PATH, value_parser = validate_path)]
    pub subscribers_path: String,

    /// Ignore snapshots older than the last applied one
    #[arg(long)]
    pub reject_stale: bool,

    /// Reconnect after the connection closes
    #[arg(short, long)]
    pub reconnect: bool,

    /// Consecutive failed connections before giving up (1-100).
    /// A session that closes before sending any state also counts.
    #[arg(
        long,
        default_value = "3",
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    pub max_retries: u32,
}

impl Default for WatchArgs {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            state_path: DEFAULT_STATE_PATH.to_string(),
            subscribers_path: DEFAULT_SUBSCRIBERS_PATH.to_string(),
            reject_stale: false,
            reconnect: false,
            max_retries: 3,
        }
    }
}

impl WatchArgs {
    /// Builds the sync configuration from the arguments.
    pub fn to_config(&self) -> SyncConfig {
        SyncConfig::default()
            .with_origin(self.origin.clone())
            .with_state_path(self.state_path.clone())
            .with_subscribers_path(self.subscribers_path.clone())
            .with_reject_stale_snapshots(self.reject_stale)
    }
}

// ============================================================================
// Simulate Command Arguments
// ============================================================================

/// Arguments for the simulate command
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Snapshot JSON file
    pub file: PathBuf,

    /// Number of ticks to run (default: until the countdown stops)
    #[arg(short, long)]
    pub ticks: Option<u32>,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates the origin URL.
fn validate_origin(s: &str) -> Result<String, String> {
    let config = SyncConfig::default().with_origin(s);
    config.validate()?;
    Ok(s.to_string())
}

/// Validates a channel path.
///
/// - Must start with '/'
fn validate_path(s: &str) -> Result<String, String> {
    if !s.starts_with('/') {
        return Err("パスは '/' で始めてください".to_string());
    }
    Ok(s.to_string())
}

// ============================================================================
// Tests
// ============================================================================
