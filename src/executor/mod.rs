//! Build executors.
//!
//! An [`Executor`] runs one bitbake invocation for a compile workspace. The
//! host executor runs it directly on this machine, the container executor
//! inside the workspace's build container. [`Executors`] picks one from the
//! `build_in` value of `compile.yaml`, probing the container runtime first
//! when a container is needed.

mod container;
mod host;
pub mod local_conf;
mod process;
mod runtime;

pub use container::ContainerExecutor;
pub use host::HostExecutor;
pub use process::ProcessSpec;
pub use runtime::{CliRuntimeProbe, RuntimeProbe, RuntimeUnavailable};

use crate::compile::{BuildIn, CompileConfig};
use crate::env_file::EnvFile;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Directory of the poky checkout inside the source directory.
pub const POKY_DIR: &str = "yocto-poky";

/// Build environment init script inside the poky checkout.
pub const INIT_SCRIPT: &str = "oe-init-build-env";

/// Paths and settings an executor needs besides the parsed config files.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Directory holding compile.yaml and .env.
    pub working_dir: PathBuf,
    /// Resolved bitbake build directory.
    pub build_dir: PathBuf,
    /// Workspace source directory repositories are synced into.
    pub source_dir: PathBuf,
    /// Container runtime program.
    pub runtime: String,
}

impl BuildContext {
    /// Path of `conf/local.conf` in the build directory.
    pub fn local_conf_path(&self) -> PathBuf {
        self.build_dir.join("conf").join("local.conf")
    }
}

/// Runs a bitbake command (or an interactive build shell) for a compile workspace.
pub trait Executor {
    /// Execute `command` with the parsed `.env` and `compile.yaml`.
    ///
    /// `command` is `None` when the user asked for an interactive shell.
    fn exec(
        &self,
        ctx: &BuildContext,
        env: &mut EnvFile,
        compile: &CompileConfig,
        command: Option<&str>,
    ) -> Result<()>;
}

/// Executor factory keyed on [`BuildIn`].
pub struct Executors {
    host: Box<dyn Executor>,
    container: Box<dyn Executor>,
    probe: Box<dyn RuntimeProbe>,
}

impl Default for Executors {
    fn default() -> Self {
        Self::new(
            Box::new(HostExecutor),
            Box::new(ContainerExecutor),
            Box::new(CliRuntimeProbe),
        )
    }
}

impl Executors {
    pub fn new(
        host: Box<dyn Executor>,
        container: Box<dyn Executor>,
        probe: Box<dyn RuntimeProbe>,
    ) -> Self {
        Self {
            host,
            container,
            probe,
        }
    }

    /// Executor for `build_in`.
    ///
    /// Host builds never touch the container runtime. Container builds are
    /// only handed out after the runtime answered the probe.
    pub fn select(
        &self,
        build_in: BuildIn,
        ctx: &BuildContext,
    ) -> std::result::Result<&dyn Executor, RuntimeUnavailable> {
        match build_in {
            BuildIn::Host => Ok(self.host.as_ref()),
            BuildIn::Docker => {
                self.probe.check(&ctx.runtime)?;
                Ok(self.container.as_ref())
            }
        }
    }
}

/// Shell snippet that enters the build environment and then runs `command`,
/// or replaces itself with an interactive shell when there is no command.
pub(crate) fn build_shell_script(
    init_script: &str,
    build_dir: &str,
    command: Option<&str>,
) -> String {
    let enter = format!(
        "source {} {}",
        shell_words::quote(init_script),
        shell_words::quote(build_dir)
    );
    match command {
        Some(command) => format!("{} && {}", enter, command),
        None => format!("{} && exec bash", enter),
    }
}

/// Make sure `local.conf` carries the managed block.
///
/// A fresh build directory has no `conf/` yet; `bootstrap` is run first so
/// the init script can lay down its templates before the block is merged in.
pub(crate) fn prepare_build_dir(
    ctx: &BuildContext,
    compile: &CompileConfig,
    bootstrap: impl FnOnce() -> Result<()>,
) -> Result<()> {
    let conf_path = ctx.local_conf_path();
    if !conf_path.exists() {
        tracing::info!("initializing build directory {}", ctx.build_dir.display());
        bootstrap()?;
    }
    local_conf::apply(&conf_path, compile)?;
    Ok(())
}

pub(crate) fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
