//! Error types for the oebuild CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for oebuild operations.
///
/// These are the hard failures. Anticipated problems in a dispatch
/// (missing compile.yaml, malformed config, unreachable runtime) are
/// reported as [`crate::dispatch::AbortReason`] instead.
#[derive(Error, Debug)]
pub enum OebuildError {
    /// User provided invalid arguments or the workspace is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// A configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Git operation failed.
    #[error("Git operation failed: {0}")]
    GitError(String),

    /// The container runtime is unreachable or rejected a command.
    #[error("Container runtime error: {0}")]
    RuntimeError(String),

    /// The build process exited unsuccessfully.
    #[error("Build command exited with status {code}")]
    BuildFailed { code: i32 },

    /// Filesystem error outside the anticipated paths.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl OebuildError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            OebuildError::UserError(_) => exit_codes::USER_ERROR,
            OebuildError::ConfigError(_) => exit_codes::CONFIG_FAILURE,
            OebuildError::GitError(_) => exit_codes::GIT_FAILURE,
            OebuildError::RuntimeError(_) => exit_codes::RUNTIME_FAILURE,
            OebuildError::BuildFailed { .. } => exit_codes::BUILD_FAILURE,
            OebuildError::Io { .. } => exit_codes::USER_ERROR,
        }
    }

    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        OebuildError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Result type alias for oebuild operations.
pub type Result<T> = std::result::Result<T, OebuildError>;
