//! Command implementations for oebuild.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod bitbake;

use crate::cli::Command;
use crate::dispatch::DispatchOutcome;
use crate::error::Result;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<DispatchOutcome> {
    match command {
        Command::Bitbake(args) => bitbake::cmd_bitbake(args),
    }
}
