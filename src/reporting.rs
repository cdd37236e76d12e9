//! Diagnostics sink passed explicitly into every component that needs to emit messages.
//!
//! Production code uses [`LogReporter`], which forwards to the `log` facade. Tests use
//! [`MemoryReporter`] to capture messages and assert on them deterministically.

use crate::pipeline::RunSummary;
use chrono::Local;
use log::Level;
use std::cell::RefCell;

const RULE: &str = "==================================================";

/// Receives diagnostic messages from pipeline components.
pub trait Reporter {
    fn report(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.report(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.report(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.report(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.report(Level::Error, message);
    }
}

/// Forwards every message to the `log` facade under a fixed target.
#[derive(Debug, Clone, Copy)]
pub struct LogReporter {
    target: &'static str,
}

impl LogReporter {
    pub fn new(target: &'static str) -> Self {
        Self { target }
    }
}

impl Default for LogReporter {
    fn default() -> Self {
        Self::new("pipeline")
    }
}

impl Reporter for LogReporter {
    fn report(&self, level: Level, message: &str) {
        log::log!(target: self.target, level, "{}", message);
    }
}

/// Keeps every message in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: RefCell<Vec<(Level, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    /// Messages emitted at exactly `level`.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(entry_level, _)| *entry_level == level)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// `true` if any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|(_, message)| message.contains(needle))
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}

/// Emits the framed end-of-run report. Every run, successful or not, ends with exactly one.
pub fn log_execution_summary(reporter: &dyn Reporter, summary: &RunSummary) {
    reporter.info(RULE);
    reporter.info("EXECUTION SUMMARY");
    reporter.info(RULE);
    reporter.info(&format!("Status: {}", summary.status));
    reporter.info(&format!("Records processed: {}", summary.records_processed));
    reporter.info(&format!("Alerts triggered: {}", summary.alerts_triggered));
    reporter.info(&format!(
        "Duration: {:.2}s",
        summary.duration.as_secs_f64()
    ));
    reporter.info(&format!(
        "Timestamp: {}",
        Local::now().format("%Y-%m-%d %H:%M")
    ));
    reporter.info(RULE);
}
