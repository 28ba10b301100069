//! Display utilities for the countdown CLI.
//!
//! This module provides formatted output for:
//! - Live countdown updates (via [`TerminalListener`])
//! - Simulation summaries
//! - Error messages

use std::io::{self, Write};

use crate::sync::CountdownListener;
use crate::types::BreakType;

use super::simulate::SimulationSummary;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows a summary after a simulation run.
    pub fn show_simulation_summary(summary: &SimulationSummary) {
        println!("─────────────────────────────");
        println!("ティック数: {}", summary.ticks);
        println!(
            "リピート: {}/{}",
            summary.final_repeat, summary.total_repeats
        );
        println!("残り時間: {}", Self::format_clock(summary.final_seconds));
        if summary.finished {
            println!("状態: 終了");
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    /// Formats seconds as (minutes, seconds).
    fn format_time(total_seconds: u32) -> (u32, u32) {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        (minutes, seconds)
    }

    /// Formats seconds as `m:ss`.
    pub fn format_clock(total_seconds: u32) -> String {
        let (minutes, seconds) = Self::format_time(total_seconds);
        format!("{}:{:02}", minutes, seconds)
    }

    /// Returns the label shown for a break kind.
    pub fn break_label(break_type: BreakType) -> &'static str {
        match break_type {
            BreakType::NoBreak => "休憩なし",
            BreakType::BigBreak => "長い休憩",
            BreakType::MiniBreak => "短い休憩",
        }
    }
}

// ============================================================================
// TerminalListener
// ============================================================================

/// Renders countdown updates as lines of text.
pub struct TerminalListener<W: Write> {
    out: W,
}

impl TerminalListener<io::Stdout> {
    /// Creates a listener writing to stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalListener<W> {
    /// Creates a listener writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|()| self.out.flush()) {
            tracing::debug!("failed to write output: {}", e);
        }
    }
}

impl<W: Write> CountdownListener for TerminalListener<W> {
    fn update_seconds(&mut self, seconds: u32, seconds_passed: u32, until_break: Option<u32>) {
        let until = match until_break {
            Some(until) => Display::format_clock(until),
            None => "なし".to_string(),
        };
        self.line(&format!(
            "残り時間: {}  経過: {}  次の長い休憩まで: {}",
            Display::format_clock(seconds),
            Display::format_clock(seconds_passed),
            until
        ));
    }

    fn update_repeat(&mut self, repeat: u32) {
        self.line(&format!("リピート: #{}", repeat));
    }

    fn update_total_seconds(&mut self, total_seconds: u32) {
        self.line(&format!(
            "1回の時間: {}",
            Display::format_clock(total_seconds)
        ));
    }

    fn update_break_status(&mut self, is_break: bool, break_type: BreakType) {
        if is_break {
            self.line(&format!("|| {}に入りました", Display::break_label(break_type)));
        } else {
            self.line("> 休憩が終わりました");
        }
    }

    fn on_initialization_state(&mut self, is_running: bool, is_paused: bool) {
        let state = match (is_running, is_paused) {
            (true, false) => "実行中",
            (true, true) => "一時停止中",
            (false, _) => "停止中",
        };
        self.line(&format!("* タイマーに接続しました (状態: {})", state));
    }

    fn on_running_state_change(&mut self, _previous: bool, current: bool) {
        if current {
            self.line("> タイマーが開始されました");
        } else {
            self.line("[] タイマーが停止されました");
        }
    }

    fn on_pause_state_change(&mut self, _previous: bool, current: bool) {
        if current {
            self.line("|| タイマーが一時停止されました");
        } else {
            self.line("> タイマーが再開されました");
        }
    }

    fn on_finish(&mut self) {
        self.line("* カウントダウンが終了しました");
    }

    fn on_connection_close(&mut self) {
        self.line("接続が切断されました");
    }

    fn on_subscribers_change(&mut self, count: u64) {
        self.line(&format!("視聴者数: {}", count));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // Format Time Tests
    // ------------------------------------------------------------------------

    mod format_time_tests {
        use super::*;

        #[test]
        fn test_format_time_zero() {
            let (minutes, seconds) = Display::format_time(0);
            assert_eq!(minutes, 0);
            assert_eq!(seconds, 0);
        }

        #[test]
        fn test_format_time_mixed() {
            let (minutes, seconds) = Display::format_time(90);
            assert_eq!(minutes, 1);
            assert_eq!(seconds, 30);
        }

        #[test]
        fn test_format_clock() {
            assert_eq!(Display::format_clock(0), "0:00");
            assert_eq!(Display::format_clock(9), "0:09");
            assert_eq!(Display::format_clock(25 * 60), "25:00");
            assert_eq!(Display::format_clock(120 * 60 + 59), "120:59");
        }

        #[test]
        fn test_break_label() {
            assert_eq!(Display::break_label(BreakType::BigBreak), "長い休憩");
            assert_eq!(Display::break_label(BreakType::MiniBreak), "短い休憩");
            assert_eq!(Display::break_label(BreakType::NoBreak), "休憩なし");
        }
    }

    // ------------------------------------------------------------------------
    // TerminalListener Tests
    // ------------------------------------------------------------------------

    mod terminal_listener_tests {
        use super::*;

        fn rendered(render: impl FnOnce(&mut TerminalListener<Vec<u8>>)) -> String {
            let mut listener = TerminalListener::new(Vec::new());
            render(&mut listener);
            String::from_utf8(listener.into_inner()).unwrap()
        }

        #[test]
        fn test_update_seconds() {
            let out = rendered(|l| l.update_seconds(75, 5, Some(600)));
            assert_eq!(out, "残り時間: 1:15  経過: 0:05  次の長い休憩まで: 10:00\n");
        }

        #[test]
        fn test_update_seconds_without_break() {
            let out = rendered(|l| l.update_seconds(3, 0, None));
            assert!(out.contains("次の長い休憩まで: なし"));
        }

        #[test]
        fn test_break_status() {
            let out = rendered(|l| {
                l.update_break_status(true, BreakType::MiniBreak);
                l.update_break_status(false, BreakType::NoBreak);
            });
            assert_eq!(out, "|| 短い休憩に入りました\n> 休憩が終わりました\n");
        }

        #[test]
        fn test_initialization_state() {
            assert!(rendered(|l| l.on_initialization_state(true, false)).contains("実行中"));
            assert!(rendered(|l| l.on_initialization_state(true, true)).contains("一時停止中"));
            assert!(rendered(|l| l.on_initialization_state(false, false)).contains("停止中"));
        }

        #[test]
        fn test_state_changes() {
            let out = rendered(|l| {
                l.on_pause_state_change(false, true);
                l.on_running_state_change(true, false);
            });
            assert!(out.contains("一時停止されました"));
            assert!(out.contains("停止されました"));
        }

        #[test]
        fn test_finish_close_subscribers() {
            let out = rendered(|l| {
                l.on_subscribers_change(12);
                l.on_finish();
                l.on_connection_close();
            });
            assert_eq!(
                out,
                "視聴者数: 12\n* カウントダウンが終了しました\n接続が切断されました\n"
            );
        }

        #[test]
        fn test_show_error() {
            Display::show_error("Test error message");
        }
    }
}
