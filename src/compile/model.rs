//! CompileConfig struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for one compile workspace.
///
/// This struct represents the contents of `compile.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    // =========================================================================
    // Dispatch
    // =========================================================================
    /// Whether bitbake runs on the host or in a container.
    pub build_in: BuildIn,

    /// Container settings, required when `build_in` is `docker`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_param: Option<DockerParam>,

    // =========================================================================
    // Target
    // =========================================================================
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Value written to `MACHINE` in local.conf.
    #[serde(default = "default_machine")]
    pub machine: String,

    // =========================================================================
    // Paths
    // =========================================================================
    /// Build directory (default: the directory holding compile.yaml).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain_dir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nativesdk_dir: Option<String>,

    /// Mirror location for shared state (`SSTATE_MIRRORS`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sstate_cache: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sstate_dir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmp_dir: Option<String>,

    // =========================================================================
    // Sources
    // =========================================================================
    /// Repositories synced into the workspace source directory, keyed by name.
    pub repos: BTreeMap<String, RepoSpec>,

    /// Free-form lines appended to the managed local.conf block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_conf: Option<String>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            build_in: BuildIn::default(),
            docker_param: None,
            platform: default_platform(),
            machine: default_machine(),
            build_dir: None,
            toolchain_dir: None,
            nativesdk_dir: None,
            sstate_cache: None,
            sstate_dir: None,
            tmp_dir: None,
            repos: BTreeMap::new(),
            local_conf: None,
        }
    }
}
