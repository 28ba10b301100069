//! Offline countdown simulation.
//!
//! Applies a snapshot from a file and runs local ticks back to back,
//! without any server or wall clock.

use std::path::Path;

use anyhow::{Context, Result};

use crate::sync::{CountdownListener, CountdownState, TickOutcome};
use crate::types::TimerSnapshot;

/// Result of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSummary {
    /// Ticks that changed state
    pub ticks: u32,
    /// Repeat after the last tick
    pub final_repeat: u32,
    /// Total repeats of the countdown
    pub total_repeats: u32,
    /// Seconds left after the last tick
    pub final_seconds: u32,
    /// Whether the final repeat completed
    pub finished: bool,
}

/// Loads a snapshot from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid snapshot.
pub fn load_snapshot(path: &Path) -> Result<TimerSnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("スナップショットを読み込めません: {:?}", path))?;
    let snapshot = TimerSnapshot::from_json(&text)?;
    Ok(snapshot)
}

/// Applies `snapshot` and ticks until `max_ticks` or until the countdown
/// stops ticking.
pub fn simulate<L>(snapshot: TimerSnapshot, max_ticks: Option<u32>, listener: &mut L) -> SimulationSummary
where
    L: CountdownListener + ?Sized,
{
    let mut state = CountdownState::new();
    state.apply_snapshot(snapshot, listener);

    let mut ticks = 0;
    let mut finished = false;
    while max_ticks.map_or(true, |max| ticks < max) {
        match state.tick(listener) {
            TickOutcome::Idle => break,
            TickOutcome::Finished => {
                ticks += 1;
                finished = true;
                break;
            }
            _ => ticks += 1,
        }
    }

    let timer = state.timer();
    SimulationSummary {
        ticks,
        final_repeat: timer.repeat,
        total_repeats: timer.total_repeats,
        final_seconds: timer.seconds,
        finished,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{ChannelListener, LoggingListener, SyncEvent};
    use std::collections::BTreeSet;
    use std::io::Write;

    fn snapshot(total_seconds: u32, total_repeats: u32) -> TimerSnapshot {
        TimerSnapshot {
            seconds: total_seconds,
            total_seconds,
            total_repeats,
            is_running: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_runs_until_finished() {
        let (mut listener, mut rx) = ChannelListener::channel();

        let summary = simulate(snapshot(2, 3), None, &mut listener);

        assert_eq!(
            summary,
            SimulationSummary {
                ticks: 6,
                final_repeat: 3,
                total_repeats: 3,
                final_seconds: 0,
                finished: true,
            }
        );
        let mut finished = 0;
        while let Ok(event) = rx.try_recv() {
            if event == SyncEvent::Finished {
                finished += 1;
            }
        }
        assert_eq!(finished, 1);
    }

    #[test]
    fn test_tick_limit() {
        let summary = simulate(snapshot(10, 2), Some(4), &mut LoggingListener);
        assert_eq!(summary.ticks, 4);
        assert_eq!(summary.final_seconds, 6);
        assert!(!summary.finished);
    }

    #[test]
    fn test_paused_snapshot_does_not_tick() {
        let paused = TimerSnapshot {
            is_paused: true,
            ..snapshot(10, 2)
        };
        let summary = simulate(paused, None, &mut LoggingListener);
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.final_seconds, 10);
    }

    #[test]
    fn test_breaks_add_ticks() {
        let with_break = TimerSnapshot {
            breaks: BTreeSet::from([1]),
            break_duration: 5,
            ..snapshot(3, 3)
        };
        let summary = simulate(with_break, None, &mut LoggingListener);
        assert_eq!(summary.ticks, 3 * 3 + 5);
        assert!(summary.finished);
    }

    #[test]
    fn test_load_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"seconds":5,"total_seconds":5,"seconds_passed":0,"repeat":0,"total_repeats":1,"is_running":true}}"#
        )
        .unwrap();

        let snapshot = load_snapshot(file.path()).unwrap();
        assert_eq!(snapshot.seconds, 5);
    }

    #[test]
    fn test_load_snapshot_missing_file() {
        let result = load_snapshot(Path::new("/nonexistent/snapshot.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_snapshot_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let result = load_snapshot(file.path());
        assert!(result.is_err());
    }
}
