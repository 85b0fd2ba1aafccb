use chrono::Local;
use serde::Serialize;

use crate::api::LogEntry;

const MISSING_TIMESTAMP: &str = "--:--:--";
const DEFAULT_SOURCE: &str = "SYSTEM";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

/// One rendered log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub timestamp: String,
    pub source: String,
    pub message: String,
    pub level: String,
}

impl From<&LogEntry> for LogLine {
    fn from(entry: &LogEntry) -> Self {
        Self {
            timestamp: entry
                .timestamp
                .clone()
                .unwrap_or_else(|| MISSING_TIMESTAMP.to_string()),
            source: entry
                .source
                .clone()
                .filter(|source| !source.is_empty())
                .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            message: entry.message.clone().unwrap_or_default(),
            level: entry
                .level
                .clone()
                .filter(|level| !level.is_empty())
                .unwrap_or_else(|| LogLevel::Info.as_str().to_string()),
        }
    }
}

/// The most recent `window` log rows, oldest first.
///
/// Each poll replaces the whole window. Expanding the panel only turns on
/// auto-scroll; it never changes what is rendered.
#[derive(Debug, Clone)]
pub struct LogView {
    window: usize,
    lines: Vec<LogLine>,
    expanded: bool,
}

impl LogView {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            lines: Vec::new(),
            expanded: false,
        }
    }

    /// Replace the window with the tail of `entries`. An empty list leaves the
    /// current rows in place.
    pub fn replace(&mut self, entries: &[LogEntry]) -> bool {
        if entries.is_empty() {
            return false;
        }
        let start = entries.len().saturating_sub(self.window);
        let lines: Vec<LogLine> = entries[start..].iter().map(LogLine::from).collect();
        if lines == self.lines {
            return false;
        }
        self.lines = lines;
        true
    }

    /// Append a client-side entry; the next poll overwrites it.
    pub fn push_local(&mut self, source: &str, message: impl Into<String>, level: LogLevel) {
        self.lines.push(LogLine {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            source: source.to_string(),
            message: message.into(),
            level: level.as_str().to_string(),
        });
        if self.lines.len() > self.window {
            let excess = self.lines.len() - self.window;
            self.lines.drain(..excess);
        }
    }

    pub fn toggle(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }

    pub fn auto_scroll(&self) -> bool {
        self.expanded
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }
}
