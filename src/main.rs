//! oebuild: dispatch BitBake builds for openEuler Embedded compile workspaces.
//!
//! This is the main entry point for the `oebuild` CLI. It parses arguments,
//! sets up logging, dispatches to the command handler, and turns the result
//! into an exit code.

mod cli;
mod commands;
pub mod compile;
pub mod dispatch;
pub mod env_file;
pub mod error;
pub mod executor;
pub mod exit_codes;
pub mod git;
pub mod workspace;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    match commands::dispatch(cli.command) {
        Ok(outcome) => ExitCode::from(outcome.exit_code(cli.fail_on_abort) as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            ExitCode::from(err.exit_code() as u8)
        }
    }
}
