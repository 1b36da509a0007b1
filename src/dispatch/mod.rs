//! Build dispatch for `oebuild bitbake`.
//!
//! The dispatcher turns the trailing command-line tokens into a bitbake
//! command, checks that the working directory is a compile workspace, syncs
//! the configured repositories, and hands the build to the host or the
//! container executor depending on `build_in` in `compile.yaml`.
//!
//! Anticipated problems are soft: they are logged and reported as
//! [`DispatchOutcome::Aborted`] so the CLI can decide the exit status.
//! Anything else propagates as an [`crate::error::OebuildError`].


use crate::compile::{BuildIn, COMPILE_CONFIG_FILE, CompileConfig};
use crate::env_file::{ENV_FILE, EnvFile};
use crate::error::{OebuildError, Result};
use crate::executor::{BuildContext, Executors};
use crate::exit_codes;
use crate::workspace::Workspace;
use std::path::Path;
use thiserror::Error;

/// Tokens that request the subcommand help instead of a build.
pub const HELP_FLAGS: [&str; 2] = ["-h", "--help"];

/// Program every dispatched command starts with.
pub const BITBAKE: &str = "bitbake";

/// Why a dispatch stopped before reaching an executor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    #[error("please run inside a compile workspace containing compile.yaml")]
    MissingCompileConfig,

    #[error("{0}")]
    MalformedCompileConfig(String),

    #[error("{0}")]
    RuntimeUnavailable(String),
}

impl AbortReason {
    /// Exit code used when soft aborts are reported as failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            AbortReason::MissingCompileConfig => exit_codes::USER_ERROR,
            AbortReason::MalformedCompileConfig(_) => exit_codes::CONFIG_FAILURE,
            AbortReason::RuntimeUnavailable(_) => exit_codes::RUNTIME_FAILURE,
        }
    }
}

/// Result of a dispatch that did not fail hard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A help flag was present; nothing was read or run.
    Help,
    /// The executor for the given target ran to completion.
    Completed(BuildIn),
    /// A precondition failed; the reason has already been logged.
    Aborted(AbortReason),
}

impl DispatchOutcome {
    /// Process exit code for this outcome.
    ///
    /// Aborts exit successfully unless `fail_on_abort` is set.
    pub fn exit_code(&self, fail_on_abort: bool) -> i32 {
        match self {
            DispatchOutcome::Aborted(reason) if fail_on_abort => reason.exit_code(),
            _ => exit_codes::SUCCESS,
        }
    }
}

/// Returns true if any token asks for help.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| HELP_FLAGS.contains(&a.as_str()))
}

/// The bitbake command line for `args`, or `None` when there are no tokens.
///
/// Tokens are joined verbatim with single spaces.
pub fn command_string(args: &[String]) -> Option<String> {
    if args.is_empty() {
        None
    } else {
        Some(format!("{} {}", BITBAKE, args.join(" ")))
    }
}

/// Selects an executor for a compile workspace and runs the build.
#[derive(Default)]
pub struct BuildDispatcher {
    executors: Executors,
}

impl BuildDispatcher {
    pub fn new(executors: Executors) -> Self {
        Self { executors }
    }

    /// Dispatch one bitbake invocation for the compile workspace at `working_dir`.
    ///
    /// `args` are the tokens following `bitbake` on the command line.
    pub fn execute(&self, working_dir: &Path, args: &[String]) -> Result<DispatchOutcome> {
        if wants_help(args) {
            return Ok(DispatchOutcome::Help);
        }

        let command = command_string(args);

        let compile_path = working_dir.join(COMPILE_CONFIG_FILE);
        if !compile_path.exists() {
            let reason = AbortReason::MissingCompileConfig;
            tracing::warn!("{}", reason);
            return Ok(DispatchOutcome::Aborted(reason));
        }

        let env_path = working_dir.join(ENV_FILE);
        EnvFile::ensure(&env_path)?;

        let compile = match CompileConfig::load(&compile_path) {
            Ok(compile) => compile,
            Err(e @ OebuildError::ConfigError(_)) => {
                tracing::error!("{}", e);
                return Ok(DispatchOutcome::Aborted(
                    AbortReason::MalformedCompileConfig(e.to_string()),
                ));
            }
            Err(e) => return Err(e),
        };

        let workspace = Workspace::discover(working_dir)?;
        compile.pull_repos(&workspace.source_dir())?;

        let mut env = EnvFile::load(&env_path)?;

        let ctx = BuildContext {
            working_dir: working_dir.to_path_buf(),
            build_dir: compile.resolve_build_dir(working_dir),
            source_dir: workspace.source_dir(),
            runtime: workspace.config.container_runtime.clone(),
        };

        let executor = match self.executors.select(compile.build_in, &ctx) {
            Ok(executor) => executor,
            Err(e) => {
                tracing::error!("{}", e);
                return Ok(DispatchOutcome::Aborted(AbortReason::RuntimeUnavailable(
                    e.to_string(),
                )));
            }
        };

        tracing::debug!(build_in = %compile.build_in, "dispatching build");
        executor.exec(&ctx, &mut env, &compile, command.as_deref())?;
        Ok(DispatchOutcome::Completed(compile.build_in))
    }
}
