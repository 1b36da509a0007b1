//! Workspace resolution for oebuild.
//!
//! A compile workspace (the directory holding `compile.yaml`) normally lives
//! inside an oebuild workspace: a directory tree whose root contains an
//! `.oebuild/` directory. The root carries shared settings in
//! `.oebuild/config` and the shared source directory that repositories are
//! synced into.

use crate::error::{OebuildError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Marker directory at the root of an oebuild workspace.
pub const WORKSPACE_MARKER: &str = ".oebuild";

/// Settings file inside the marker directory.
pub const WORKSPACE_CONFIG_FILE: &str = "config";

/// Settings shared by every compile workspace under one oebuild workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Source directory relative to the workspace root.
    #[serde(default = "default_src_dir")]
    pub src_dir: String,

    /// Container runtime program (`docker`, `podman`, ...).
    #[serde(default = "default_container_runtime")]
    pub container_runtime: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            container_runtime: default_container_runtime(),
        }
    }
}

fn default_src_dir() -> String {
    "src".to_string()
}

fn default_container_runtime() -> String {
    "docker".to_string()
}

impl WorkspaceConfig {
    /// Load `.oebuild/config`. A missing or blank file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            OebuildError::ConfigError(format!(
                "failed to read workspace config '{}': {}",
                path.display(),
                e
            ))
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| {
            OebuildError::ConfigError(format!(
                "failed to parse workspace config '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

/// Resolved oebuild workspace.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Absolute path of the workspace root.
    pub root: PathBuf,

    /// Settings from `.oebuild/config`.
    pub config: WorkspaceConfig,
}

impl Workspace {
    /// Find the workspace enclosing `start`.
    ///
    /// Walks up from `start` looking for a `.oebuild/` directory. When none is
    /// found, `start` itself is used as the root with default settings.
    pub fn discover(start: &Path) -> Result<Self> {
        match find_root(start) {
            Some(root) => {
                let config = WorkspaceConfig::load(
                    root.join(WORKSPACE_MARKER).join(WORKSPACE_CONFIG_FILE),
                )?;
                tracing::debug!(root = %root.display(), "found oebuild workspace");
                Ok(Self { root, config })
            }
            None => {
                tracing::debug!(
                    "no {} directory above {}; using it as workspace root",
                    WORKSPACE_MARKER,
                    start.display()
                );
                Ok(Self {
                    root: start.to_path_buf(),
                    config: WorkspaceConfig::default(),
                })
            }
        }
    }

    /// Directory repositories are synced into.
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.config.src_dir)
    }
}

fn find_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(WORKSPACE_MARKER).is_dir())
        .map(Path::to_path_buf)
}
