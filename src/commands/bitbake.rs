//! Implementation of the `oebuild bitbake` command.

use crate::cli::{BitbakeArgs, print_subcommand_help};
use crate::dispatch::{BuildDispatcher, DispatchOutcome};
use crate::error::{OebuildError, Result};
use std::env;

/// Execute the `oebuild bitbake` command in the current working directory.
///
/// Prints the subcommand help when a help flag is among the arguments.
pub fn cmd_bitbake(args: BitbakeArgs) -> Result<DispatchOutcome> {
    let cwd = env::current_dir().map_err(|e| {
        OebuildError::UserError(format!("failed to get current working directory: {}", e))
    })?;

    let outcome = BuildDispatcher::default().execute(&cwd, &args.args)?;
    if outcome == DispatchOutcome::Help {
        print_subcommand_help("bitbake")?;
    }
    Ok(outcome)
}
