//! `funcity` CLI — a minimal command-line runner that reads a template (or
//! code-mode) file, injects a small demonstration standard library, and
//! prints the rendered text or a diagnostic report (§2 "Workspace framing").
//!
//! Not part of the interpreter's core contract: a different embedder is
//! free to wire up its own host library, logging, and configuration.

mod config;
mod error;
mod stdlib;

use std::io::Read as _;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::{Config, ModeSetting, OutputSetting};
use error::{CliError, Result};
use funcity::Mode;
use funcity_util::LogEntry;

/// FunCity — evaluate a template/code file and print its result.
#[derive(Parser, Debug)]
#[command(name = "funcity")]
#[command(author = "Fax Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run a FunCity template or code file", long_about = None)]
struct Cli {
    /// File to evaluate. Reads from stdin if omitted.
    file: Option<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true, env = "FUNCITY_VERBOSE")]
    verbose: bool,

    /// Path to a configuration file (default: search funcity.toml).
    #[arg(short, long, global = true, env = "FUNCITY_CONFIG")]
    config: Option<PathBuf>,

    /// Disable colored log output.
    #[arg(long, global = true, env = "FUNCITY_NO_COLOR")]
    no_color: bool,

    /// Parse the input in template or code mode, overriding the config.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Print the raw value sequence instead of joined text, overriding
    /// the config.
    #[arg(long)]
    sequence: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Template,
    Code,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.no_color)?;

    let config = load_config(cli.config.as_deref())?;
    let mode = resolve_mode(cli.mode, config.mode);
    let want_sequence = cli.sequence || config.output == OutputSetting::Sequence;

    let source = read_source(cli.file.as_deref())?;
    let path_label = cli.file.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| "<stdin>".to_string());

    let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build()?;
    let local = tokio::task::LocalSet::new();
    let outcome = local.block_on(&runtime, run(&source, mode, want_sequence, &path_label));

    match outcome {
        Ok(had_errors) => {
            if had_errors {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(CliError::Cancelled) => {
            eprintln!("run cancelled");
            std::process::exit(130);
        }
        Err(other) => Err(other.into()),
    }
}

/// Runs the interpreter once and prints its result. Returns whether the
/// diagnostic log contained an error-kind entry (§7: such a run's value
/// sequence is empty, but the log still explains why).
async fn run(source: &str, mode: Mode, want_sequence: bool, path_label: &str) -> Result<bool> {
    let variables = stdlib::demo_variables();
    if want_sequence {
        let outcome = funcity::run_once(source, mode, variables, None).await?;
        for value in &outcome.values {
            println!("{value:?}");
        }
        Ok(report_log(&outcome.log, path_label))
    } else {
        let (text, log) = funcity::run_once_to_text(source, mode, variables, None).await?;
        print!("{text}");
        Ok(report_log(&log, path_label))
    }
}

fn report_log(log: &[LogEntry], path_label: &str) -> bool {
    let mut had_error = false;
    for entry in log {
        had_error |= entry.is_error();
        eprintln!("{}", entry.format(path_label));
    }
    had_error
}

fn read_source(path: Option<&std::path::Path>) -> Result<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn resolve_mode(arg: Option<ModeArg>, configured: ModeSetting) -> Mode {
    let setting = match arg {
        Some(ModeArg::Template) => ModeSetting::Template,
        Some(ModeArg::Code) => ModeSetting::Code,
        None => configured,
    };
    match setting {
        ModeSetting::Template => Mode::Template,
        ModeSetting::Code => Mode::Code,
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

fn init_logging(verbose: bool, no_color: bool) -> Result<()> {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") };
    let subscriber = fmt::layer().with_ansi(!no_color).with_target(false).with_thread_ids(false).with_thread_names(false);
    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| CliError::Config(format!("failed to initialize logging: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_mode_flag() {
        let cli = Cli::parse_from(["funcity", "--mode", "code", "file.fc"]);
        assert!(matches!(cli.mode, Some(ModeArg::Code)));
        assert_eq!(cli.file, Some(PathBuf::from("file.fc")));
    }

    #[test]
    fn cli_defaults_to_no_mode_override() {
        let cli = Cli::parse_from(["funcity", "file.fc"]);
        assert!(cli.mode.is_none());
        assert!(!cli.sequence);
    }

    #[test]
    fn resolve_mode_prefers_explicit_flag_over_config() {
        assert_eq!(resolve_mode(Some(ModeArg::Code), ModeSetting::Template), Mode::Code);
        assert_eq!(resolve_mode(None, ModeSetting::Code), Mode::Code);
    }
}
