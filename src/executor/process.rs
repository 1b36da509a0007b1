//! Subprocess specification shared by the executors.
//!
//! Executors build a [`ProcessSpec`] first and run it second, so the exact
//! argv can be inspected in tests and logged before execution.

use crate::error::{OebuildError, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;

/// A program invocation that has not been started yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub success: bool,
    pub exit_code: i32,
    /// Standard output (trimmed).
    pub stdout: String,
    /// Standard error (trimmed).
    pub stderr: String,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Shell-quoted rendering of the command line, for logs and error messages.
    pub fn display(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).envs(&self.env);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command
    }

    /// Run with inherited stdio and wait. A non-zero exit is `BuildFailed`.
    pub fn run(&self) -> Result<()> {
        tracing::debug!("running {}", self.display());

        let status = self.command().status().map_err(|e| {
            OebuildError::UserError(format!(
                "failed to execute '{}': {}\n\
                 Fix: ensure the command is installed and in PATH.",
                self.program, e
            ))
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(OebuildError::BuildFailed {
                code: status.code().unwrap_or(-1),
            })
        }
    }

    /// Run with captured stdout/stderr and wait. Non-zero exits are returned, not raised.
    pub fn capture(&self) -> Result<CapturedOutput> {
        tracing::debug!("running {}", self.display());

        let output = self.command().output().map_err(|e| {
            OebuildError::UserError(format!(
                "failed to execute '{}': {}\n\
                 Fix: ensure the command is installed and in PATH.",
                self.program, e
            ))
        })?;

        Ok(CapturedOutput {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
