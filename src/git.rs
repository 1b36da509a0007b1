//! Git command runner for oebuild.
//!
//! Provides a wrapper around git commands with captured stdout/stderr and
//! structured error handling. Repository sync goes through this module.

use crate::error::{OebuildError, Result};
use std::path::Path;
use std::process::{Command, Output};

/// Result of a successful git command execution.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Standard output from the command (trimmed).
    pub stdout: String,
    /// Standard error from the command (trimmed).
    pub stderr: String,
}

impl GitOutput {
    fn from_output(output: &Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

/// Run a git command with the specified working directory.
///
/// # Returns
///
/// * `Ok(GitOutput)` - On successful execution (exit code 0)
/// * `Err(OebuildError::GitError)` - On spawn failure or non-zero exit code
pub fn run_git<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Result<GitOutput> {
    let cwd = cwd.as_ref();

    tracing::debug!(cwd = %cwd.display(), "git {}", args.join(" "));

    let output = Command::new("git")
        .current_dir(cwd)
        .args(args)
        .output()
        .map_err(|e| {
            OebuildError::GitError(format!(
                "failed to execute git {}: {} (is git installed?)",
                args.first().unwrap_or(&""),
                e
            ))
        })?;

    let git_output = GitOutput::from_output(&output);

    if output.status.success() {
        Ok(git_output)
    } else {
        let exit_code = output.status.code().unwrap_or(-1);
        let error_msg = if git_output.stderr.is_empty() {
            git_output.stdout.clone()
        } else {
            git_output.stderr.clone()
        };

        Err(OebuildError::GitError(format!(
            "git {} failed (exit code {}): {}",
            args.first().unwrap_or(&""),
            exit_code,
            error_msg
        )))
    }
}

/// Returns true if `dir` looks like the top of a git checkout.
pub fn is_checkout(dir: &Path) -> bool {
    dir.join(".git").exists()
}

/// Clone `url` into `dest`. The parent of `dest` is created if needed.
pub fn clone(url: &str, dest: &Path) -> Result<()> {
    let parent = dest.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| OebuildError::io(parent, e))?;

    let dest_str = dest.to_string_lossy();
    run_git(parent, &["clone", "--", url, &dest_str])?;
    Ok(())
}

/// Fetch from `origin` in an existing checkout.
pub fn fetch(repo_dir: &Path) -> Result<()> {
    run_git(repo_dir, &["fetch", "origin"])?;
    Ok(())
}

/// Check out `refspec` in an existing checkout.
pub fn checkout(repo_dir: &Path, refspec: &str) -> Result<()> {
    run_git(repo_dir, &["checkout", refspec])?;
    Ok(())
}

/// Returns true if `origin/<branch>` exists after the last fetch.
pub fn has_remote_branch(repo_dir: &Path, branch: &str) -> bool {
    let remote_ref = format!("refs/remotes/origin/{}", branch);
    run_git(repo_dir, &["rev-parse", "--verify", "--quiet", &remote_ref]).is_ok()
}

/// Point local `branch` at `origin/<branch>` and check it out.
///
/// Local commits on `branch` that are not upstream are discarded.
pub fn checkout_remote_branch(repo_dir: &Path, branch: &str) -> Result<()> {
    let remote_branch = format!("origin/{}", branch);
    run_git(repo_dir, &["checkout", "-B", branch, &remote_branch])?;
    Ok(())
}

/// Fast-forward the current branch to its upstream.
///
/// Returns false without touching the checkout when HEAD is detached or the
/// branch tracks nothing.
pub fn fast_forward(repo_dir: &Path) -> Result<bool> {
    let upstream = run_git(
        repo_dir,
        &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{upstream}"],
    );
    if upstream.is_err() {
        return Ok(false);
    }
    run_git(repo_dir, &["merge", "--ff-only", "@{upstream}"])?;
    Ok(true)
}

/// Full commit id of HEAD.
pub fn head_commit(repo_dir: &Path) -> Result<String> {
    Ok(run_git(repo_dir, &["rev-parse", "HEAD"])?.stdout)
}
