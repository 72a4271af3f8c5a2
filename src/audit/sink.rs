//! Log sinks the auditor writes through.

use std::fmt;

/// Log level of a sink line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        })
    }
}

/// Leveled output channel for audit results.
pub trait LogSink {
    fn log(&mut self, level: Level, message: &str);

    fn info(&mut self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&mut self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn error(&mut self, message: &str) {
        self.log(Level::Error, message);
    }
}

/// Forwards audit output to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&mut self, level: Level, message: &str) {
        match level {
            Level::Info => tracing::info!(target: "roosevelt::audit", "{message}"),
            Level::Warn => tracing::warn!(target: "roosevelt::audit", "{message}"),
            Level::Error => tracing::error!(target: "roosevelt::audit", "{message}"),
        }
    }
}

/// Keeps every line in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub lines: Vec<(Level, String)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages logged at `level`, in order.
    pub fn messages(&self, level: Level) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    /// All lines as `level: message`, one per line.
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|(level, message)| format!("{level}: {message}\n"))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl LogSink for RecordingSink {
    fn log(&mut self, level: Level, message: &str) {
        self.lines.push((level, message.to_string()));
    }
}
