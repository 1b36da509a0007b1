//! Container executor: runs bitbake inside the workspace's build container.
//!
//! The source directory and the build directory are bind-mounted into the
//! container at fixed paths. The container is created once per compile
//! workspace and its id is remembered in `.env`; later runs start and reuse
//! it as long as it still exists and was created from the configured image.

use super::{
    BuildContext, Executor, INIT_SCRIPT, POKY_DIR, ProcessSpec, build_shell_script, path_str,
    prepare_build_dir,
};
use crate::compile::{CompileConfig, DockerParam};
use crate::env_file::{ContainerEnv, EnvFile};
use crate::error::{OebuildError, Result};
use serde::Deserialize;

/// Mount point of the workspace source directory.
pub const CONTAINER_SRC_DIR: &str = "/usr1/openeuler/src";

/// Parent of the mounted build directory.
pub const CONTAINER_BUILD_ROOT: &str = "/usr1/openeuler/build";

/// Unprivileged user builds run as.
pub const CONTAINER_USER: &str = "openeuler";

const SHORT_ID_LEN: usize = 12;

/// `.State` of `<runtime> inspect`.
#[derive(Debug, Deserialize)]
struct ContainerState {
    #[serde(rename = "Running")]
    running: bool,
    #[serde(rename = "Status", default)]
    status: String,
}

/// Runs builds with `<runtime> exec` in a long-lived build container.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerExecutor;

impl ContainerExecutor {
    /// Build directory as seen from inside the container.
    pub(crate) fn container_build_dir(ctx: &BuildContext) -> String {
        let name = ctx
            .build_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "build".to_string());
        format!("{}/{}", CONTAINER_BUILD_ROOT, name)
    }

    fn container_init_script() -> String {
        format!("{}/{}/{}", CONTAINER_SRC_DIR, POKY_DIR, INIT_SCRIPT)
    }

    /// The `<runtime> run` invocation that creates the build container.
    pub(crate) fn run_process(ctx: &BuildContext, param: &DockerParam) -> Result<ProcessSpec> {
        let mut spec = ProcessSpec::new(&ctx.runtime)
            .args(["run", "-dit"])
            .arg("-v")
            .arg(format!("{}:{}", path_str(&ctx.source_dir), CONTAINER_SRC_DIR))
            .arg("-v")
            .arg(format!(
                "{}:{}",
                path_str(&ctx.build_dir),
                Self::container_build_dir(ctx)
            ));

        for volume in &param.volumns {
            spec = spec.arg("-v").arg(volume);
        }

        if let Some(parameters) = param.parameters.as_deref() {
            spec = spec.args(split_words("docker_param.parameters", parameters)?);
        }

        Ok(spec
            .arg(&param.image)
            .args(split_words("docker_param.command", &param.command)?))
    }

    /// The `<runtime> exec` invocation for `command`.
    ///
    /// Without a command the exec is interactive (`-it`) and ends in a shell.
    pub(crate) fn exec_process(
        ctx: &BuildContext,
        env: &EnvFile,
        container_id: &str,
        command: Option<&str>,
    ) -> ProcessSpec {
        let build_dir = Self::container_build_dir(ctx);
        let script = build_shell_script(&Self::container_init_script(), &build_dir, command);

        let mut spec = ProcessSpec::new(&ctx.runtime).arg("exec");
        if command.is_none() {
            spec = spec.arg("-it");
        }
        spec = spec.args(["-u", CONTAINER_USER, "-w", build_dir.as_str()]);
        for (key, value) in &env.env {
            spec = spec.arg("-e").arg(format!("{}={}", key, value));
        }
        spec.arg(container_id).args(["bash", "-c", script.as_str()])
    }

    fn inspect(runtime: &str, container_id: &str) -> Result<Option<ContainerState>> {
        let output = ProcessSpec::new(runtime)
            .args(["inspect", "--format", "{{json .State}}", container_id])
            .capture()?;

        if !output.success {
            tracing::debug!(container = %container_id, "inspect failed: {}", output.stderr);
            return Ok(None);
        }

        serde_json::from_str(&output.stdout).map(Some).map_err(|e| {
            OebuildError::RuntimeError(format!(
                "unexpected inspect output for container {}: {}",
                container_id, e
            ))
        })
    }

    fn runtime_call(spec: &ProcessSpec, what: &str) -> Result<String> {
        let output = spec.capture()?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(OebuildError::RuntimeError(format!(
                "failed to {} (exit code {}): {}",
                what, output.exit_code, output.stderr
            )))
        }
    }

    /// Force-remove `container_id`. A container that is already gone is not an error.
    fn remove_container(runtime: &str, container_id: &str) -> Result<()> {
        let output = ProcessSpec::new(runtime)
            .args(["rm", "-f", container_id])
            .capture()?;
        if !output.success {
            tracing::warn!(
                container = %container_id,
                "could not remove old build container: {}",
                output.stderr
            );
        }
        Ok(())
    }

    /// Id of a running build container for this workspace, creating one if needed.
    fn ensure_container(
        ctx: &BuildContext,
        env: &mut EnvFile,
        param: &DockerParam,
    ) -> Result<String> {
        if let Some(recorded) = env.container.clone() {
            let same_image = recorded.image.as_deref().is_none_or(|img| img == param.image);
            if !same_image {
                tracing::info!(
                    container = %recorded.short_id,
                    "image changed to {}; replacing the build container",
                    param.image
                );
                Self::remove_container(&ctx.runtime, &recorded.short_id)?;
            } else if let Some(state) = Self::inspect(&ctx.runtime, &recorded.short_id)? {
                if !state.running {
                    tracing::info!(
                        container = %recorded.short_id,
                        status = %state.status,
                        "starting build container"
                    );
                    let start = ProcessSpec::new(&ctx.runtime)
                        .args(["start", recorded.short_id.as_str()]);
                    Self::runtime_call(&start, "start build container")?;
                }
                return Ok(recorded.short_id);
            } else {
                tracing::info!(
                    container = %recorded.short_id,
                    "recorded build container is gone; creating a new one"
                );
            }
        }

        tracing::info!("creating build container from {}", param.image);
        let run = Self::run_process(ctx, param)?;
        let full_id = Self::runtime_call(&run, "create build container")?;
        let short_id: String = full_id.chars().take(SHORT_ID_LEN).collect();
        if short_id.is_empty() {
            return Err(OebuildError::RuntimeError(format!(
                "'{}' printed no container id",
                run.display()
            )));
        }

        env.set_container(ContainerEnv {
            short_id: short_id.clone(),
            image: Some(param.image.clone()),
        })?;
        Ok(short_id)
    }
}

impl Executor for ContainerExecutor {
    fn exec(
        &self,
        ctx: &BuildContext,
        env: &mut EnvFile,
        compile: &CompileConfig,
        command: Option<&str>,
    ) -> Result<()> {
        let param = compile.docker_param()?;
        for dir in [&ctx.source_dir, &ctx.build_dir] {
            std::fs::create_dir_all(dir).map_err(|e| OebuildError::io(dir, e))?;
        }

        let container_id = Self::ensure_container(ctx, env, param)?;

        prepare_build_dir(ctx, compile, || {
            let bootstrap = Self::exec_process(ctx, env, &container_id, Some("true"));
            Self::runtime_call(&bootstrap, "initialize build directory").map(|_| ())
        })?;

        let process = Self::exec_process(ctx, env, &container_id, command);
        match command {
            Some(command) => tracing::info!(
                container = %container_id,
                machine = %compile.machine,
                "running `{}` in container",
                command
            ),
            None => tracing::info!(container = %container_id, "entering container build shell"),
        }
        process.run()
    }
}

fn split_words(field: &str, value: &str) -> Result<Vec<String>> {
    shell_words::split(value).map_err(|e| {
        OebuildError::ConfigError(format!(
            "failed to parse {} '{}': {}\n\n\
             Fix: check for unmatched quotes or invalid escape sequences in compile.yaml.",
            field, value, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_ctx(temp_dir: &TempDir, runtime: &str) -> BuildContext {
        BuildContext {
            working_dir: temp_dir.path().join("build").join("qemu-arm"),
            build_dir: temp_dir.path().join("build").join("qemu-arm"),
            source_dir: temp_dir.path().join("src"),
            runtime: runtime.to_string(),
        }
    }

    fn make_param() -> DockerParam {
        DockerParam {
            image: "openeuler-container:latest".to_string(),
            parameters: Some("--privileged -e \"A=b c\"".to_string()),
            volumns: vec!["/srv/dl:/usr1/openeuler/dl".to_string()],
            ..Default::default()
        }
    }

    /// Writes an executable fake runtime that logs its argv to `calls.log`.
    #[cfg(unix)]
    fn install_fake_runtime(temp_dir: &TempDir, inspect_json: Option<&str>) -> String {
        use std::os::unix::fs::PermissionsExt;

        let bin = temp_dir.path().join("fake-runtime");
        let log = temp_dir.path().join("calls.log");
        let (inspect, rm) = match inspect_json {
            Some(json) => (format!("echo '{}'", json), "true"),
            None => (
                "echo 'Error: No such object' >&2; exit 1".to_string(),
                "echo 'Error: No such container' >&2; exit 1",
            ),
        };
        let script = format!(
            "#!/bin/sh\n\
             echo \"$*\" >> '{}'\n\
             case \"$1\" in\n\
               run) echo 0123456789abcdef0123456789abcdef ;;\n\
               inspect) {inspect} ;;\n\
               rm) {rm} ;;\n\
             esac\n",
            log.display(),
        );
        std::fs::write(&bin, script).unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
        bin.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    fn read_calls(temp_dir: &TempDir) -> Vec<String> {
        std::fs::read_to_string(temp_dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_container_build_dir_uses_dir_name() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = make_ctx(&temp_dir, "docker");
        assert_eq!(
            ContainerExecutor::container_build_dir(&ctx),
            "/usr1/openeuler/build/qemu-arm"
        );
    }

    #[test]
    fn test_run_process_shape() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = make_ctx(&temp_dir, "podman");

        let spec = ContainerExecutor::run_process(&ctx, &make_param()).unwrap();
        assert_eq!(spec.program, "podman");
        assert_eq!(&spec.args[..2], &["run", "-dit"]);
        assert_eq!(
            spec.args[3],
            format!("{}:{}", ctx.source_dir.display(), CONTAINER_SRC_DIR)
        );
        assert_eq!(
            spec.args[5],
            format!("{}:/usr1/openeuler/build/qemu-arm", ctx.build_dir.display())
        );
        assert_eq!(&spec.args[6..8], &["-v", "/srv/dl:/usr1/openeuler/dl"]);
        assert_eq!(&spec.args[8..11], &["--privileged", "-e", "A=b c"]);
        assert_eq!(&spec.args[11..], &["openeuler-container:latest", "bash"]);
    }

    #[test]
    fn test_run_process_rejects_bad_parameters() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = make_ctx(&temp_dir, "docker");
        let param = DockerParam {
            parameters: Some("--env \"unterminated".to_string()),
            ..make_param()
        };

        let err = ContainerExecutor::run_process(&ctx, &param).unwrap_err();
        assert!(matches!(err, OebuildError::ConfigError(_)));
        assert!(err.to_string().contains("docker_param.parameters"));
    }

    #[test]
    fn test_exec_process_with_command() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = make_ctx(&temp_dir, "docker");
        let mut env = EnvFile::default();
        env.env.insert("BB_NUMBER_THREADS".to_string(), "8".to_string());

        let spec = ContainerExecutor::exec_process(&ctx, &env, "abc123", Some("bitbake busybox"));
        assert_eq!(
            spec.args,
            vec![
                "exec",
                "-u",
                "openeuler",
                "-w",
                "/usr1/openeuler/build/qemu-arm",
                "-e",
                "BB_NUMBER_THREADS=8",
                "abc123",
                "bash",
                "-c",
                "source /usr1/openeuler/src/yocto-poky/oe-init-build-env \
                 /usr1/openeuler/build/qemu-arm && bitbake busybox",
            ]
        );
    }

    #[test]
    fn test_exec_process_interactive() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = make_ctx(&temp_dir, "docker");

        let spec = ContainerExecutor::exec_process(&ctx, &EnvFile::default(), "abc123", None);
        assert_eq!(spec.args[1], "-it");
        assert!(spec.args.last().unwrap().ends_with("&& exec bash"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_creates_and_records_container() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = install_fake_runtime(&temp_dir, None);
        let ctx = make_ctx(&temp_dir, &runtime);
        std::fs::create_dir_all(&ctx.working_dir).unwrap();
        let env_path = ctx.working_dir.join(".env");
        EnvFile::ensure(&env_path).unwrap();
        let mut env = EnvFile::load(&env_path).unwrap();

        let compile = CompileConfig {
            docker_param: Some(make_param()),
            ..Default::default()
        };

        ContainerExecutor
            .exec(&ctx, &mut env, &compile, Some("bitbake busybox"))
            .unwrap();

        let calls = read_calls(&temp_dir);
        assert_eq!(calls.len(), 3, "calls: {:?}", calls);
        assert!(calls[0].starts_with("run -dit"));
        assert!(calls[1].starts_with("exec -u openeuler"));
        assert!(calls[1].ends_with("&& true"));
        assert!(calls[2].ends_with("&& bitbake busybox"));
        assert!(calls[2].contains("0123456789ab bash -c"));

        let saved = EnvFile::load(&env_path).unwrap();
        assert_eq!(saved.container_id(), Some("0123456789ab"));
        assert!(ctx.local_conf_path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_restarts_recorded_container() {
        let temp_dir = TempDir::new().unwrap();
        let runtime =
            install_fake_runtime(&temp_dir, Some(r#"{"Status":"exited","Running":false}"#));
        let ctx = make_ctx(&temp_dir, &runtime);
        std::fs::create_dir_all(ctx.build_dir.join("conf")).unwrap();
        std::fs::write(ctx.local_conf_path(), "").unwrap();

        let mut env = EnvFile::from_yaml(
            "container:\n  short_id: deadbeef0000\n  image: openeuler-container:latest\n",
        )
        .unwrap();
        let compile = CompileConfig {
            docker_param: Some(make_param()),
            ..Default::default()
        };

        ContainerExecutor
            .exec(&ctx, &mut env, &compile, Some("bitbake busybox"))
            .unwrap();

        let calls = read_calls(&temp_dir);
        assert_eq!(calls.len(), 3, "calls: {:?}", calls);
        assert!(calls[0].starts_with("inspect --format"));
        assert_eq!(calls[1], "start deadbeef0000");
        assert!(calls[2].contains("deadbeef0000 bash -c"));
        assert_eq!(env.container_id(), Some("deadbeef0000"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_recreates_container_when_image_changed() {
        let temp_dir = TempDir::new().unwrap();
        let runtime =
            install_fake_runtime(&temp_dir, Some(r#"{"Status":"running","Running":true}"#));
        let ctx = make_ctx(&temp_dir, &runtime);
        std::fs::create_dir_all(ctx.build_dir.join("conf")).unwrap();
        std::fs::write(ctx.local_conf_path(), "").unwrap();

        let mut env =
            EnvFile::from_yaml("container:\n  short_id: deadbeef0000\n  image: old:1\n").unwrap();
        let compile = CompileConfig {
            docker_param: Some(make_param()),
            ..Default::default()
        };

        ContainerExecutor
            .exec(&ctx, &mut env, &compile, Some("bitbake busybox"))
            .unwrap();

        let calls = read_calls(&temp_dir);
        assert_eq!(calls.len(), 3, "calls: {:?}", calls);
        assert_eq!(calls[0], "rm -f deadbeef0000");
        assert!(calls[1].starts_with("run -dit"));
        assert!(calls[1].contains("openeuler-container:latest bash"));
        assert!(calls[2].contains("0123456789ab bash -c"));
        assert!(calls.iter().all(|c| !c.contains("deadbeef0000 bash")));
        assert_eq!(env.container_id(), Some("0123456789ab"));
        assert_eq!(
            env.container.as_ref().and_then(|c| c.image.as_deref()),
            Some("openeuler-container:latest")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_replaces_container_even_if_old_one_is_gone() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = install_fake_runtime(&temp_dir, None);
        let ctx = make_ctx(&temp_dir, &runtime);
        std::fs::create_dir_all(ctx.build_dir.join("conf")).unwrap();
        std::fs::write(ctx.local_conf_path(), "").unwrap();

        let mut env =
            EnvFile::from_yaml("container:\n  short_id: deadbeef0000\n  image: old:1\n").unwrap();
        let compile = CompileConfig {
            docker_param: Some(make_param()),
            ..Default::default()
        };

        ContainerExecutor
            .exec(&ctx, &mut env, &compile, Some("bitbake busybox"))
            .unwrap();

        let calls = read_calls(&temp_dir);
        assert_eq!(calls[0], "rm -f deadbeef0000");
        assert!(calls[1].starts_with("run -dit"));
        assert_eq!(env.container_id(), Some("0123456789ab"));
    }
}
