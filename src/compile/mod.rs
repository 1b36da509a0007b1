//! Compile configuration for oebuild.
//!
//! This module defines the `CompileConfig` struct that represents the
//! `compile.yaml` file at the root of a compile workspace. Parsing is
//! forward-compatible (unknown fields are ignored), optional fields have
//! defaults, and values are validated after parsing.

mod model;
mod operations;
mod repos;
pub mod types;


pub use model::CompileConfig;
pub use types::{BuildIn, DockerParam};

/// File name of the compile configuration inside a compile workspace.
pub const COMPILE_CONFIG_FILE: &str = "compile.yaml";
