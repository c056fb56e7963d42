//! Error handling for the `funcity` CLI.

use thiserror::Error;

/// Errors the CLI binary itself can raise, as distinct from the typed
/// diagnostics the interpreter produces (those are reported, not
/// returned as an `Err`).
#[derive(Error, Debug)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not read input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("the run was cancelled")]
    Cancelled,

    #[error("the run reported one or more errors")]
    RunFailed,
}

impl From<funcity::ReduceFailure> for CliError {
    fn from(failure: funcity::ReduceFailure) -> Self {
        match failure {
            funcity::ReduceFailure::Cancelled => CliError::Cancelled,
            funcity::ReduceFailure::Fatal(_) => CliError::RunFailed,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = CliError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "configuration error: missing field");
    }

    #[test]
    fn cancelled_conversion() {
        let err: CliError = funcity::ReduceFailure::Cancelled.into();
        assert!(matches!(err, CliError::Cancelled));
    }
}
