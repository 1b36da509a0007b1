//! The `.env` file of a compile workspace.
//!
//! `.env` is a small YAML document owned by oebuild. It remembers the build
//! container created for the workspace so later runs reuse it, and carries
//! extra environment variables for the build process. The file is created
//! empty on first use; an empty file parses to the defaults.
//!
//! ```yaml
//! container:
//!   short_id: 3f2a9c1b7d4e
//!   image: openeuler-container:latest
//! env:
//!   BB_NUMBER_THREADS: "8"
//! ```

use crate::error::{OebuildError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the environment file inside a compile workspace.
pub const ENV_FILE: &str = ".env";

/// The build container recorded for a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerEnv {
    /// Short container id as printed by the runtime.
    pub short_id: String,

    /// Image the container was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Parsed contents of `.env`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerEnv>,

    /// Extra variables exported to the build process.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Where this file was loaded from; not serialized.
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl EnvFile {
    /// Create `path` as an empty file if it does not exist.
    ///
    /// Returns true if the file was created.
    pub fn ensure(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        std::fs::File::create(path).map_err(|e| OebuildError::io(path, e))?;
        tracing::debug!("created empty {}", path.display());
        Ok(true)
    }

    /// Load and parse `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            OebuildError::ConfigError(format!(
                "failed to read env file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut env = Self::from_yaml(&content)?;
        env.path = Some(path.to_path_buf());
        Ok(env)
    }

    /// Parse from a YAML string. Blank content yields the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| {
            OebuildError::ConfigError(format!("failed to parse {}: {}", ENV_FILE, e))
        })
    }

    /// Record the build container and write the file back to where it was loaded from.
    pub fn set_container(&mut self, container: ContainerEnv) -> Result<()> {
        self.container = Some(container);
        self.save()
    }

    /// Write the file back to where it was loaded from. No-op for unloaded values.
    pub fn save(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let yaml = serde_yaml::to_string(self).map_err(|e| {
            OebuildError::ConfigError(format!("failed to serialize {}: {}", ENV_FILE, e))
        })?;
        std::fs::write(path, yaml).map_err(|e| OebuildError::io(path, e))
    }

    /// The recorded container id, if any.
    pub fn container_id(&self) -> Option<&str> {
        self.container.as_ref().map(|c| c.short_id.as_str())
    }
}
