//! Local mirror of the server countdown.
//!
//! This module provides the synchronous state machine:
//! - Snapshot application (resync) with change detection
//! - The one-second countdown step with repeat/break transitions
//! - Seconds-until-break calculation
//!
//! Nothing here knows about time or channels; the engine decides when
//! to call [`CountdownState::tick`].

use std::collections::BTreeSet;

use crate::types::{BreakType, TimerSnapshot};

use super::listener::CountdownListener;

// ============================================================================
// seconds_until_break
// ============================================================================

/// Computes the seconds left until the next big break.
///
/// Looks for the smallest break index greater than `repeat`. Returns
/// `None` when no big break remains.
pub fn seconds_until_break(
    seconds: u32,
    repeat: u32,
    total_seconds: u32,
    breaks: &BTreeSet<u32>,
    mini_breaks: &BTreeSet<u32>,
    mini_break_duration: u32,
) -> Option<u32> {
    let next_break = *breaks.range(repeat.checked_add(1)?..).next()?;

    let mut until = seconds.saturating_sub(1);
    if mini_breaks.range(repeat + 1..next_break).next().is_some() {
        until = until.saturating_add(mini_break_duration);
    }
    let full_repeats = next_break - repeat - 1;
    Some(until.saturating_add(full_repeats.saturating_mul(total_seconds)))
}

// ============================================================================
// TickOutcome
// ============================================================================

/// What a single countdown step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running or paused; nothing changed
    Idle,
    /// One second elapsed inside the current repeat or break
    Counting,
    /// A break ran out and the repeat countdown restarted
    BreakEnded,
    /// A repeat completed and the next one started without a break
    RepeatCompleted,
    /// A repeat completed and a break started
    BreakStarted(BreakType),
    /// The final repeat completed
    Finished,
}

// ============================================================================
// CountdownState
// ============================================================================

/// Locally ticking copy of the last server snapshot.
#[derive(Debug, Clone, Default)]
pub struct CountdownState {
    /// Last snapshot, advanced by local ticks
    timer: TimerSnapshot,
    /// Kind of break in progress
    break_type: BreakType,
    /// Seconds until the next big break (`None` when none is left)
    until_break: Option<u32>,
    /// Whether a snapshot has been applied yet
    initialized: bool,
}

impl CountdownState {
    /// Creates an empty, uninitialized state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current mirrored timer values.
    pub fn timer(&self) -> &TimerSnapshot {
        &self.timer
    }

    /// Returns the kind of break in progress.
    pub fn break_type(&self) -> BreakType {
        self.break_type
    }

    /// Returns the seconds until the next big break.
    pub fn until_break(&self) -> Option<u32> {
        self.until_break
    }

    /// Returns true once the first snapshot has been applied.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns true if the tick loop should run.
    pub fn is_ticking(&self) -> bool {
        self.timer.is_ticking()
    }

    /// Overwrites local state with a server snapshot.
    ///
    /// Emits the full set of UI updates, then either the one-time
    /// initialization callback or the running/paused change callbacks.
    /// Returns true if the tick loop should be (re)started.
    pub fn apply_snapshot<L>(&mut self, snapshot: TimerSnapshot, listener: &mut L) -> bool
    where
        L: CountdownListener + ?Sized,
    {
        let previous_running = self.timer.is_running;
        let previous_paused = self.timer.is_paused;

        self.break_type = snapshot.break_type();
        self.timer = snapshot;
        self.recalculate_until_break();

        listener.update_seconds(
            self.timer.seconds,
            self.timer.seconds_passed,
            self.until_break,
        );
        listener.update_repeat(self.timer.repeat);
        listener.update_total_seconds(self.timer.total_seconds);
        if self.timer.is_break_index() {
            listener.update_break_status(self.timer.is_break, self.break_type);
        }

        if !self.initialized {
            self.initialized = true;
            listener.on_initialization_state(self.timer.is_running, self.timer.is_paused);
        } else {
            if previous_running != self.timer.is_running {
                listener.on_running_state_change(previous_running, self.timer.is_running);
            }
            if previous_paused != self.timer.is_paused {
                listener.on_pause_state_change(previous_paused, self.timer.is_paused);
            }
        }

        self.is_ticking()
    }

    /// Advances the countdown by one second.
    pub fn tick<L>(&mut self, listener: &mut L) -> TickOutcome
    where
        L: CountdownListener + ?Sized,
    {
        if !self.is_ticking() {
            return TickOutcome::Idle;
        }

        self.timer.seconds = self.timer.seconds.saturating_sub(1);
        self.timer.seconds_passed = self.timer.seconds_passed.saturating_add(1);
        if self.break_type != BreakType::BigBreak {
            self.until_break = self.until_break.map(|seconds| seconds.saturating_sub(1));
        }

        if self.timer.seconds > 0 {
            self.emit_seconds(listener);
            return TickOutcome::Counting;
        }

        if self.timer.is_break {
            return self.end_break(listener);
        }

        self.complete_repeat(listener)
    }

    /// Ends the current break. The break does not count as a repeat.
    fn end_break<L>(&mut self, listener: &mut L) -> TickOutcome
    where
        L: CountdownListener + ?Sized,
    {
        self.timer.seconds = self.timer.total_seconds;
        self.timer.is_break = false;
        self.break_type = BreakType::NoBreak;
        self.recalculate_until_break();

        self.emit_seconds(listener);
        listener.update_break_status(false, BreakType::NoBreak);
        TickOutcome::BreakEnded
    }

    /// Moves to the next repeat, starting a break or finishing as scheduled.
    fn complete_repeat<L>(&mut self, listener: &mut L) -> TickOutcome
    where
        L: CountdownListener + ?Sized,
    {
        self.timer.repeat = self.timer.repeat.saturating_add(1);

        if self.timer.is_finished() {
            self.timer.is_running = false;
            self.emit_seconds(listener);
            listener.update_repeat(self.timer.repeat);
            listener.on_finish();
            return TickOutcome::Finished;
        }

        if self.timer.seconds_decrements.contains(&self.timer.repeat) {
            self.timer.total_seconds = self.timer.total_seconds.saturating_sub(1);
            listener.update_total_seconds(self.timer.total_seconds);
        }

        self.timer.seconds = self.timer.total_seconds;
        if self.timer.breaks.contains(&self.timer.repeat) {
            self.timer.is_break = true;
            self.break_type = BreakType::BigBreak;
            self.timer.seconds = self.timer.break_duration;
        } else if self.timer.mini_breaks.contains(&self.timer.repeat) {
            self.timer.is_break = true;
            self.break_type = BreakType::MiniBreak;
            self.timer.seconds = self.timer.mini_break_duration;
        }
        self.recalculate_until_break();

        self.emit_seconds(listener);
        listener.update_repeat(self.timer.repeat);

        if self.break_type.is_break() {
            listener.update_break_status(true, self.break_type);
            TickOutcome::BreakStarted(self.break_type)
        } else {
            TickOutcome::RepeatCompleted
        }
    }

    fn recalculate_until_break(&mut self) {
        self.until_break = seconds_until_break(
            self.timer.seconds,
            self.timer.repeat,
            self.timer.total_seconds,
            &self.timer.breaks,
            &self.timer.mini_breaks,
            self.timer.mini_break_duration,
        );
    }

    fn emit_seconds<L>(&self, listener: &mut L)
    where
        L: CountdownListener + ?Sized,
    {
        listener.update_seconds(
            self.timer.seconds,
            self.timer.seconds_passed,
            self.until_break,
        );
    }

    /// Returns a mutable reference to the mirrored timer (for testing).
    #[cfg(test)]
    pub fn timer_mut(&mut self) -> &mut TimerSnapshot {
        &mut self.timer
    }
}

// ============================================================================
// Tests
// ============================================================================
