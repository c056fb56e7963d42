//! Diagnostics produced while tokenizing, parsing and reducing a template.

use crate::location::Range;
use std::fmt;

/// Severity of a [`LogEntry`].
///
/// Only two kinds exist at the language level: a `Warning` never aborts a
/// run, an `Error` marks the subtree it points at as having failed (the
/// reducer still finishes the run, but a run that produced any `Error`
/// entry returns an empty sequence from `run_once`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogKind {
    Warning,
    Error,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogKind::Warning => f.write_str("warning"),
            LogKind::Error => f.write_str("error"),
        }
    }
}

/// A single diagnostic, tied to the source range it concerns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub kind: LogKind,
    pub description: String,
    pub range: Range,
}

impl LogEntry {
    pub fn warning(description: impl Into<String>, range: Range) -> Self {
        Self { kind: LogKind::Warning, description: description.into(), range }
    }

    pub fn error(description: impl Into<String>, range: Range) -> Self {
        Self { kind: LogKind::Error, description: description.into(), range }
    }

    pub fn is_error(&self) -> bool {
        self.kind == LogKind::Error
    }

    /// Render as `path:line:column: kind: description` for a zero-width
    /// range, or `path:line1:col1:line2:col2: kind: description` when the
    /// range spans more than one point (§6.4).
    pub fn format(&self, path: &str) -> String {
        let location = if self.range.is_empty() {
            self.range.start.to_string()
        } else {
            format!(
                "{}:{}:{}:{}",
                self.range.start.line, self.range.start.column, self.range.end.line, self.range.end.column
            )
        };
        format!("{}:{}: {}: {}", path, location, self.kind, self.description)
    }
}

/// Destination for diagnostics emitted during a run.
///
/// Grounded on the teacher's `diagnostic::Handler`, trimmed to the two
/// sinks the language defines; a run's own diagnostic log is a plain
/// `Vec<LogEntry>` and does not need a trait, but callers that want to
/// route warnings and errors to different streams (e.g. stderr vs. a UI
/// panel) implement this.
pub trait DiagnosticSink {
    fn warning(&mut self, entry: &LogEntry);
    fn error(&mut self, entry: &LogEntry);

    /// Feed every entry in `log` to this sink, returning whether any entry
    /// was an error.
    fn write_all(&mut self, log: &[LogEntry]) -> bool {
        let mut had_error = false;
        for entry in log {
            match entry.kind {
                LogKind::Warning => self.warning(entry),
                LogKind::Error => {
                    had_error = true;
                    self.error(entry);
                }
            }
        }
        had_error
    }
}
