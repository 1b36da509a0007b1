//! Container runtime availability check.

use super::process::ProcessSpec;
use thiserror::Error;

/// The container runtime cannot be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("container runtime '{runtime}' is not available: {reason}")]
pub struct RuntimeUnavailable {
    pub runtime: String,
    pub reason: String,
}

/// Checks that a container runtime is installed and its daemon answers.
pub trait RuntimeProbe {
    fn check(&self, runtime: &str) -> Result<(), RuntimeUnavailable>;
}

/// Probe that runs `<runtime> info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliRuntimeProbe;

impl RuntimeProbe for CliRuntimeProbe {
    fn check(&self, runtime: &str) -> Result<(), RuntimeUnavailable> {
        let unavailable = |reason: String| RuntimeUnavailable {
            runtime: runtime.to_string(),
            reason,
        };

        let output = ProcessSpec::new(runtime)
            .arg("info")
            .capture()
            .map_err(|e| unavailable(e.to_string()))?;

        if output.success {
            Ok(())
        } else if output.stderr.is_empty() {
            Err(unavailable(format!(
                "'{} info' exited with status {}",
                runtime, output.exit_code
            )))
        } else {
            Err(unavailable(output.stderr))
        }
    }
}
