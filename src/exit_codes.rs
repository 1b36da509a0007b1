//! Exit code constants for the oebuild CLI.
//!
//! - 0: Success (also used for soft aborts unless `--fail-on-abort` is given)
//! - 1: User error (bad args, not a compile workspace, missing init script)
//! - 2: Configuration failure (malformed compile.yaml or .env)
//! - 3: Git operation failure while syncing repositories
//! - 4: Container runtime failure
//! - 5: The build process itself failed

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or the directory is not a compile workspace.
pub const USER_ERROR: i32 = 1;

/// Configuration failure: compile.yaml or .env could not be parsed.
pub const CONFIG_FAILURE: i32 = 2;

/// Git operation failure: clone, fetch or checkout of a source repository.
pub const GIT_FAILURE: i32 = 3;

/// Container runtime failure: runtime unreachable or a container command failed.
pub const RUNTIME_FAILURE: i32 = 4;

/// Build failure: bitbake (or the interactive shell) exited non-zero.
pub const BUILD_FAILURE: i32 = 5;
