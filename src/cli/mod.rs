//! CLI argument parsing for oebuild.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::error::{OebuildError, Result};
use clap::{CommandFactory, Parser, Subcommand};

/// oebuild: run BitBake builds for openEuler Embedded compile workspaces.
///
/// A compile workspace is a directory holding `compile.yaml`. Builds run
/// either on the host or inside a build container, as `compile.yaml` says.
#[derive(Parser, Debug)]
#[command(name = "oebuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long)]
    pub verbose: bool,

    /// Exit non-zero when a build is skipped (no compile.yaml, bad config,
    /// container runtime unavailable).
    #[arg(long)]
    pub fail_on_abort: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for oebuild.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a bitbake command in the build environment.
    ///
    /// With arguments, runs `bitbake <ARGS>` (for example `oebuild bitbake
    /// busybox`). Without arguments, opens an interactive build shell.
    #[command(disable_help_flag = true)]
    #[command(override_usage = "oebuild bitbake [BITBAKE ARGS]...")]
    Bitbake(BitbakeArgs),
}

/// Arguments for the `bitbake` command.
#[derive(Parser, Debug)]
pub struct BitbakeArgs {
    /// Arguments passed through to bitbake verbatim.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Print the long help of subcommand `name` to stdout.
pub fn print_subcommand_help(name: &str) -> Result<()> {
    let mut command = Cli::command();
    let sub = command
        .find_subcommand_mut(name)
        .ok_or_else(|| OebuildError::UserError(format!("unknown command '{}'", name)))?;
    sub.print_long_help()
        .map_err(|e| OebuildError::UserError(format!("failed to print help: {}", e)))
}
