//! Core data types for the countdown client.
//!
//! This module defines the data structures used for:
//! - Server-pushed timer snapshots (wire format)
//! - Break classification
//! - Channel configuration with validation

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::sync::error::SyncError;

// ============================================================================
// BreakType
// ============================================================================

/// Kind of break the timer is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BreakType {
    /// Counting down a regular repeat
    #[default]
    NoBreak,
    /// Long pause after selected repeats
    BigBreak,
    /// Short pause after selected repeats
    MiniBreak,
}

impl BreakType {
    /// Returns the string representation of the break type.
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakType::NoBreak => "no_break",
            BreakType::BigBreak => "big_break",
            BreakType::MiniBreak => "mini_break",
        }
    }

    /// Returns true for either kind of break.
    pub fn is_break(&self) -> bool {
        !matches!(self, BreakType::NoBreak)
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Authoritative timer state pushed by the server on the state channel.
///
/// A snapshot replaces the local mirror wholesale; nothing is merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TimerSnapshot {
    /// Seconds remaining in the current repeat or break
    pub seconds: u32,
    /// Nominal duration of one repeat
    pub total_seconds: u32,
    /// Elapsed seconds
    pub seconds_passed: u32,
    /// Repeats after which `total_seconds` shrinks by one
    #[serde(default)]
    pub seconds_decrements: Vec<u32>,
    /// Current repeat index
    pub repeat: u32,
    /// Number of repeats in the whole countdown
    pub total_repeats: u32,
    /// Repeats followed by a big break
    #[serde(default)]
    pub breaks: BTreeSet<u32>,
    /// Big break duration in seconds
    #[serde(default)]
    pub break_duration: u32,
    /// Repeats followed by a mini-break
    #[serde(default)]
    pub mini_breaks: BTreeSet<u32>,
    /// Mini-break duration in seconds
    #[serde(default)]
    pub mini_break_duration: u32,
    /// Whether the countdown has been started
    pub is_running: bool,
    /// Whether the countdown is inside a break
    #[serde(default)]
    pub is_break: bool,
    /// Whether the countdown is paused
    #[serde(default)]
    pub is_paused: bool,
    /// Server clock when the snapshot was taken (milliseconds)
    #[serde(default)]
    pub timestamp: i64,
}

impl TimerSnapshot {
    /// Parses and validates a snapshot from its JSON encoding.
    ///
    /// # Errors
    ///
    /// Returns `MalformedSnapshot` for undecodable JSON and
    /// `InvalidSnapshot` when the decoded values break an invariant.
    pub fn from_json(text: &str) -> Result<Self, SyncError> {
        let snapshot: TimerSnapshot = serde_json::from_str(text)
            .map_err(|e| SyncError::MalformedSnapshot(e.to_string()))?;
        snapshot.validate().map_err(SyncError::InvalidSnapshot)?;
        Ok(snapshot)
    }

    /// Validates the snapshot invariants.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.repeat > self.total_repeats {
            return Err(format!(
                "repeat {} exceeds total_repeats {}",
                self.repeat, self.total_repeats
            ));
        }
        if let Some(index) = self.breaks.intersection(&self.mini_breaks).next() {
            return Err(format!("repeat {} is both a break and a mini-break", index));
        }
        if let Some(index) = self
            .breaks
            .iter()
            .chain(self.mini_breaks.iter())
            .find(|&&index| index >= self.total_repeats)
        {
            return Err(format!(
                "break index {} is outside 0..{}",
                index, self.total_repeats
            ));
        }
        Ok(())
    }

    /// Derives the break kind from `is_break` and the current repeat.
    pub fn break_type(&self) -> BreakType {
        if !self.is_break {
            BreakType::NoBreak
        } else if self.mini_breaks.contains(&self.repeat) {
            BreakType::MiniBreak
        } else {
            BreakType::BigBreak
        }
    }

    /// Returns true if the current repeat index is scheduled for any break.
    pub fn is_break_index(&self) -> bool {
        self.breaks.contains(&self.repeat) || self.mini_breaks.contains(&self.repeat)
    }

    /// Returns true once every repeat has been counted down.
    pub fn is_finished(&self) -> bool {
        self.repeat >= self.total_repeats
    }

    /// Returns true if the local tick loop should run for this state.
    ///
    /// A finished countdown never ticks, even if the server still reports
    /// it as running.
    pub fn is_ticking(&self) -> bool {
        self.is_running && !self.is_paused && !self.is_finished()
    }
}

// ============================================================================
// SyncConfig
// ============================================================================

/// Default origin of the hosting page.
pub const DEFAULT_ORIGIN: &str = "http://localhost:8000";

/// Default path of the state channel.
pub const DEFAULT_STATE_PATH: &str = "/ws/countdown/state/";

/// Default path of the subscriber-count channel.
pub const DEFAULT_SUBSCRIBERS_PATH: &str = "/ws/countdown/subscribers/";

/// Where the two channels live and how snapshots are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Origin of the hosting page (scheme decides ws vs wss)
    pub origin: String,
    /// Path of the state channel, relative to the origin
    pub state_path: String,
    /// Path of the subscriber-count channel, relative to the origin
    pub subscribers_path: String,
    /// Drop snapshots whose timestamp is older than the last applied one
    pub reject_stale_snapshots: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            state_path: DEFAULT_STATE_PATH.to_string(),
            subscribers_path: DEFAULT_SUBSCRIBERS_PATH.to_string(),
            reject_stale_snapshots: false,
        }
    }
}

impl SyncConfig {
    /// Creates a new configuration with the specified origin.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Creates a new configuration with the specified state channel path.
    pub fn with_state_path(mut self, path: impl Into<String>) -> Self {
        self.state_path = path.into();
        self
    }

    /// Creates a new configuration with the specified subscriber channel path.
    pub fn with_subscribers_path(mut self, path: impl Into<String>) -> Self {
        self.subscribers_path = path.into();
        self
    }

    /// Creates a new configuration with stale snapshot rejection toggled.
    pub fn with_reject_stale_snapshots(mut self, reject: bool) -> Self {
        self.reject_stale_snapshots = reject;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        let origin = Url::parse(&self.origin)
            .map_err(|e| format!("オリジンのURLが不正です: {} ({})", self.origin, e))?;
        if !matches!(origin.scheme(), "http" | "https" | "ws" | "wss") {
            return Err(format!(
                "オリジンのスキームは http/https/ws/wss のいずれかを指定してください: {}",
                origin.scheme()
            ));
        }
        if !self.state_path.starts_with('/') {
            return Err("stateチャンネルのパスは '/' で始めてください".to_string());
        }
        if !self.subscribers_path.starts_with('/') {
            return Err("subscribersチャンネルのパスは '/' で始めてください".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
