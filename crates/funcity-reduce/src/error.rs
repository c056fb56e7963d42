//! Reduce-time failure: the typed exceptional path described in §7 of the
//! error taxonomy, distinct from the plain `LogEntry` diagnostics that
//! tokenizing and parsing only ever append to a log buffer.

use funcity_util::LogEntry;

/// A failure that aborts a run. Tokenizing and parsing never raise this;
/// only the reducer does, and only for fatal errors and cancellation.
#[derive(Debug, thiserror::Error)]
pub enum ReduceFailure {
    /// A recoverable-at-the-log-level error that the reducer has decided
    /// should actually terminate the run (an unbound variable with no
    /// conditional combine, applying a non-callable, an iterable-less
    /// `for` target, and so on).
    #[error("{}", .0.description)]
    Fatal(LogEntry),

    /// The cancel signal tripped at a cooperative check point. Carries no
    /// `LogEntry` by default — per §7, the host opts in to logging it.
    #[error("reduction cancelled")]
    Cancelled,
}

impl ReduceFailure {
    pub fn log_entry(&self) -> Option<&LogEntry> {
        match self {
            ReduceFailure::Fatal(entry) => Some(entry),
            ReduceFailure::Cancelled => None,
        }
    }
}

pub type ReduceResult<T> = Result<T, ReduceFailure>;
