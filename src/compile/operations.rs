//! CompileConfig loading, validation, and path helpers.

use super::model::CompileConfig;
use super::types::{BuildIn, DockerParam};
use crate::error::{OebuildError, Result};
use std::path::{Component, Path, PathBuf};

impl CompileConfig {
    /// Load a compile config from a YAML file.
    ///
    /// * `Ok(CompileConfig)` - Successfully loaded and validated config
    /// * `Err(OebuildError::Io)` - The file could not be read
    /// * `Err(OebuildError::ConfigError)` - Parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| OebuildError::io(path, e))?;

        Self::from_yaml(&content)
    }

    /// Parse a compile config from a YAML string.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: CompileConfig = if yaml.trim().is_empty() {
            CompileConfig::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| {
                OebuildError::ConfigError(format!("failed to parse compile.yaml: {}", e))
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - every repo has a non-empty `url`
    /// - repo paths are relative and never climb out with `..`
    /// - container builds carry `docker_param` with a non-empty `image`
    pub fn validate(&self) -> Result<()> {
        for (name, repo) in &self.repos {
            if repo.url.trim().is_empty() {
                return Err(OebuildError::ConfigError(format!(
                    "compile.yaml validation failed: repo '{}' has an empty url",
                    name
                )));
            }

            let dest = repo.path.as_deref().unwrap_or(name);
            if !is_safe_relative(dest) {
                return Err(OebuildError::ConfigError(format!(
                    "compile.yaml validation failed: repo '{}' path '{}' must be relative \
                     and must not contain '..'",
                    name, dest
                )));
            }
        }

        if self.build_in == BuildIn::Docker {
            match &self.docker_param {
                Some(param) if !param.image.trim().is_empty() => {}
                _ => {
                    return Err(OebuildError::ConfigError(
                        "compile.yaml validation failed: build_in is docker but \
                         docker_param.image is not set.\n\n\
                         Fix: add a docker_param section with an image, or set build_in: host."
                            .to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Container settings. Only valid after `validate` for docker builds.
    pub fn docker_param(&self) -> Result<&DockerParam> {
        self.docker_param.as_ref().ok_or_else(|| {
            OebuildError::ConfigError("compile.yaml has no docker_param section".to_string())
        })
    }

    /// Resolve the build directory against the compile workspace directory.
    pub fn resolve_build_dir(&self, working_dir: &Path) -> PathBuf {
        match self.build_dir.as_deref() {
            Some(dir) => working_dir.join(dir),
            None => working_dir.to_path_buf(),
        }
    }

    /// Serialize config to a YAML string.
    #[cfg(test)]
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            OebuildError::ConfigError(format!("failed to serialize compile config: {}", e))
        })
    }
}

fn is_safe_relative(path: &str) -> bool {
    let path = Path::new(path);
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
