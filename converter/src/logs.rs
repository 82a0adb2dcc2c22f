//! Leveled conversion logs.
//!
//! Every step of the pipeline reports through the helpers at the bottom of
//! this module. Entries go to stderr, either as human-readable lines or as
//! JSON lines for tooling, and are kept in memory so a caller can collect
//! the warnings of a run with [`take_history`].

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Log level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Indentation level (for nested logs)
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Human-readable line for terminal output.
    pub fn render(&self) -> String {
        let prefix = match self.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(self.indent as usize);
        format!("{}{} {}", indent, prefix, self.message)
    }
}

/// Output format for log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Global logger
pub static LOGGER: Lazy<Logger> = Lazy::new(Logger::new);

/// Writes log entries to stderr and keeps them for later inspection.
pub struct Logger {
    quiet: AtomicBool,
    json: AtomicBool,
    history: Mutex<Vec<LogEntry>>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            quiet: AtomicBool::new(false),
            json: AtomicBool::new(false),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Set output format and whether terminal output is suppressed.
    pub fn configure(&self, format: LogFormat, quiet: bool) {
        self.json.store(format == LogFormat::Json, Ordering::Relaxed);
        self.quiet.store(quiet, Ordering::Relaxed);
    }

    pub fn log(&self, entry: LogEntry) {
        if !self.quiet.load(Ordering::Relaxed) {
            if self.json.load(Ordering::Relaxed) {
                if let Ok(line) = serde_json::to_string(&entry) {
                    eprintln!("{}", line);
                }
            } else {
                eprintln!("{}", entry.render());
            }
        }

        if let Ok(mut history) = self.history.lock() {
            history.push(entry);
        }
    }

    /// Remove and return every entry logged so far.
    pub fn take_history(&self) -> Vec<LogEntry> {
        self.history
            .lock()
            .map(|mut h| std::mem::take(&mut *h))
            .unwrap_or_default()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LOGGER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOGGER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOGGER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOGGER.log(LogEntry::error(msg));
}

pub fn log_warning_indent(msg: impl Into<String>, indent: u8) {
    LOGGER.log(LogEntry::warning(msg).with_indent(indent));
}

/// Remove and return the entries logged so far by the global logger.
pub fn take_history() -> Vec<LogEntry> {
    LOGGER.take_history()
}

/// Number of entries at the given level.
pub fn count_level(entries: &[LogEntry], level: LogLevel) -> usize {
    entries.iter().filter(|e| e.level == level).count()
}
