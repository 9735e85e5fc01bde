//! Progress reporting for long running installer operations

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Severity of a progress message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLevel {
    Normal,
    Warning,
    Error,
}

/// Sink for progress updates
///
/// `percent` is in `0..=100`.
pub trait Progress {
    fn update(&mut self, message: &str, percent: u8, level: ProgressLevel);
}

/// Progress sink that drops every update
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Quiet;

#[cfg(test)]
impl Progress for Quiet {
    fn update(&mut self, _message: &str, _percent: u8, _level: ProgressLevel) {}
}

/// Percentage of `done` out of `total`, 100 for an empty total
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from(done.min(total) * 100 / total).unwrap_or(100)
}

/// Terminal progress bar
pub struct ProgressDisplay {
    bar: ProgressBar,
}

impl ProgressDisplay {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        if let Ok(bar_style) = ProgressStyle::default_bar().template("[{bar:40.cyan/blue}] {pos:>3}% {msg}") {
            bar.set_style(bar_style.progress_chars("#>-"));
        }
        Self { bar }
    }

    /// Hidden bar, for non-interactive output
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Finish and clear the bar
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Leave the bar where it stopped
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for ProgressDisplay {
    fn update(&mut self, message: &str, percent: u8, level: ProgressLevel) {
        self.bar.set_position(u64::from(percent.min(100)));
        match level {
            ProgressLevel::Normal => self.bar.set_message(message.to_string()),
            ProgressLevel::Warning => self
                .bar
                .println(format!("{} {message}", style("warning:").yellow().bold())),
            ProgressLevel::Error => self
                .bar
                .println(format!("{} {message}", style("error:").red().bold())),
        }
    }
}

/// Progress sink that keeps every update, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Recorder {
    pub updates: Vec<(String, u8, ProgressLevel)>,
}

#[cfg(test)]
impl Recorder {
    pub fn errors(&self) -> Vec<&str> {
        self.updates
            .iter()
            .filter(|(_, _, level)| *level == ProgressLevel::Error)
            .map(|(message, _, _)| message.as_str())
            .collect()
    }
}

#[cfg(test)]
impl Progress for Recorder {
    fn update(&mut self, message: &str, percent: u8, level: ProgressLevel) {
        self.updates.push((message.to_string(), percent, level));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 4), 0);
        assert_eq!(percent(1, 4), 25);
        assert_eq!(percent(4, 4), 100);
        assert_eq!(percent(5, 4), 100);
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn test_recorder_filters_errors() {
        let mut recorder = Recorder::default();
        recorder.update("copying", 10, ProgressLevel::Normal);
        recorder.update("disk full", 10, ProgressLevel::Error);
        assert_eq!(recorder.errors(), vec!["disk full"]);
    }

    #[test]
    fn test_hidden_display_accepts_updates() {
        let mut display = ProgressDisplay::hidden();
        display.update("Installing", 50, ProgressLevel::Normal);
        display.update("careful", 60, ProgressLevel::Warning);
        display.finish();
    }
}
