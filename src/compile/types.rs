//! Compile configuration types and defaults.
//!
//! Enums, nested sections and default value functions used by `CompileConfig`.

use serde::{Deserialize, Serialize};

/// Where a build runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuildIn {
    /// Run bitbake directly on the host.
    Host,
    /// Run bitbake inside a build container (default).
    #[default]
    #[serde(alias = "container")]
    Docker,
}

impl std::fmt::Display for BuildIn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildIn::Host => write!(f, "host"),
            BuildIn::Docker => write!(f, "docker"),
        }
    }
}

/// A source repository synced into the workspace source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSpec {
    /// Clone URL.
    pub url: String,

    /// Destination relative to the source directory (default: the repo's key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Branch, tag or commit to check out after syncing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refspec: Option<String>,
}

/// Container settings used when `build_in` is `docker`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerParam {
    /// Image the build container is created from.
    pub image: String,

    /// Extra arguments passed to `run` (split with shell-words).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,

    /// Extra `host:container` volume mappings. The spelling matches existing
    /// compile.yaml files.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumns: Vec<String>,

    /// Process the container runs as PID 1.
    #[serde(default = "default_container_command")]
    pub command: String,
}

impl Default for DockerParam {
    fn default() -> Self {
        Self {
            image: String::new(),
            parameters: None,
            volumns: Vec::new(),
            command: default_container_command(),
        }
    }
}

pub fn default_platform() -> String {
    "aarch64-std".to_string()
}

pub fn default_machine() -> String {
    "qemu-aarch64".to_string()
}

pub fn default_container_command() -> String {
    "bash".to_string()
}
