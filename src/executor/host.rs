//! Host executor: runs bitbake directly on this machine.

use super::{
    BuildContext, Executor, INIT_SCRIPT, POKY_DIR, ProcessSpec, build_shell_script, path_str,
    prepare_build_dir,
};
use crate::compile::CompileConfig;
use crate::env_file::EnvFile;
use crate::error::{OebuildError, Result};
use std::path::{Path, PathBuf};

/// Runs builds through `bash` on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostExecutor;

impl HostExecutor {
    fn init_script(ctx: &BuildContext) -> Result<PathBuf> {
        let init = ctx.source_dir.join(POKY_DIR).join(INIT_SCRIPT);
        if init.is_file() {
            Ok(init)
        } else {
            Err(OebuildError::UserError(format!(
                "build environment script not found at '{}'.\n\n\
                 Fix: list {} under repos in compile.yaml so it is synced into '{}'.",
                init.display(),
                POKY_DIR,
                ctx.source_dir.display()
            )))
        }
    }

    /// The `bash -c` invocation for `command`.
    pub(crate) fn process(
        ctx: &BuildContext,
        env: &EnvFile,
        init: &Path,
        command: Option<&str>,
    ) -> ProcessSpec {
        let script = build_shell_script(&path_str(init), &path_str(&ctx.build_dir), command);
        ProcessSpec::new("bash")
            .args(["-c", script.as_str()])
            .current_dir(&ctx.build_dir)
            .envs(&env.env)
    }
}

impl Executor for HostExecutor {
    fn exec(
        &self,
        ctx: &BuildContext,
        env: &mut EnvFile,
        compile: &CompileConfig,
        command: Option<&str>,
    ) -> Result<()> {
        let init = Self::init_script(ctx)?;
        std::fs::create_dir_all(&ctx.build_dir)
            .map_err(|e| OebuildError::io(&ctx.build_dir, e))?;

        prepare_build_dir(ctx, compile, || {
            let bootstrap = Self::process(ctx, env, &init, Some("true"));
            let output = bootstrap.capture()?;
            if output.success {
                Ok(())
            } else {
                Err(OebuildError::UserError(format!(
                    "failed to initialize build directory '{}': {}",
                    ctx.build_dir.display(),
                    output.stderr
                )))
            }
        })?;

        let process = Self::process(ctx, env, &init, command);
        match command {
            Some(command) => {
                tracing::info!(machine = %compile.machine, "running `{}` on host", command)
            }
            None => tracing::info!("entering host build shell in {}", ctx.build_dir.display()),
        }
        process.run()
    }
}
