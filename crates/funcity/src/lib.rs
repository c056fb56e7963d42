//! Embeddable interpreter for the FunCity template language.
//!
//! Wires the three core stages — [`funcity_lex`], [`funcity_par`], and
//! [`funcity_reduce`] — behind the two run entry points named in the
//! external interface: [`run_once`] and [`run_once_to_text`].

use funcity_par::{parse_code, parse_template};
use funcity_util::LogEntry;
pub use funcity_reduce::{Callable, FunctionContext, OpaqueHost, OrdinaryFn, ReduceFailure, SpecialFn, Value, VariableMap};
pub use tokio_util::sync::CancellationToken;

/// Which tokenizer/parser entry point a source string is run through
/// (§4.1, §4.2): template mode splices `{{ … }}` code regions into
/// literal text, code mode treats the whole input as one code region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Template,
    Code,
}

/// The outcome of a run: a result sequence (empty if a fatal error was
/// recorded) plus the full diagnostic log accumulated across tokenizing,
/// parsing, and reducing, in that order.
#[derive(Debug)]
pub struct RunOutcome {
    pub values: Vec<Value>,
    pub log: Vec<LogEntry>,
}

/// Cancellation is the one failure mode that is not caught and folded
/// into a `RunOutcome` (§7: "Cancellation propagates out unaltered").
pub type RunResult = Result<RunOutcome, ReduceFailure>;

/// `runOnce` (§6.2): evaluate `source` against `variables`, returning the
/// ordered value sequence.
pub async fn run_once(source: &str, mode: Mode, variables: VariableMap, cancel: Option<CancellationToken>) -> RunResult {
    let parsed = match mode {
        Mode::Template => parse_template(source),
        Mode::Code => parse_code(source),
    };
    let (values, reduce_log) = funcity_reduce::reduce_program(&parsed.blocks, variables, cancel).await?;
    let mut log = parsed.log;
    log.extend(reduce_log);
    Ok(RunOutcome { values, log })
}

/// `runOnceToText` (§6.2): same run as [`run_once`], joined into a single
/// string via §4.3's value-to-text rendering.
pub async fn run_once_to_text(
    source: &str,
    mode: Mode,
    variables: VariableMap,
    cancel: Option<CancellationToken>,
) -> Result<(String, Vec<LogEntry>), ReduceFailure> {
    let parsed = match mode {
        Mode::Template => parse_template(source),
        Mode::Code => parse_code(source),
    };
    let (text, reduce_log) = funcity_reduce::reduce_program_to_text(&parsed.blocks, variables, cancel).await?;
    let mut log = parsed.log;
    log.extend(reduce_log);
    Ok((text, log))
}
