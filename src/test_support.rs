use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// A minimal host-build compile.yaml with no repositories to sync.
pub(crate) const HOST_COMPILE_YAML: &str = "build_in: host\nmachine: qemu-arm\n";

/// A minimal container-build compile.yaml with no repositories to sync.
pub(crate) const DOCKER_COMPILE_YAML: &str = r#"
build_in: docker
machine: qemu-aarch64
docker_param:
  image: swr.cn-north-4.myhuaweicloud.com/openeuler-embedded/openeuler-container:latest
  parameters: "--privileged"
"#;

/// Creates a compile workspace: `<tmp>/.oebuild/` plus `<tmp>/build/<name>/compile.yaml`.
///
/// Returns the temp dir and the build directory path.
pub(crate) fn create_compile_workspace(compile_yaml: Option<&str>) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(temp_dir.path().join(".oebuild")).unwrap();
    let build_dir = temp_dir.path().join("build").join("qemu-arm");
    std::fs::create_dir_all(&build_dir).unwrap();
    if let Some(yaml) = compile_yaml {
        std::fs::write(build_dir.join("compile.yaml"), yaml).unwrap();
    }
    (temp_dir, build_dir)
}

/// Creates a git repository with one commit on `main`.
pub(crate) fn create_git_repo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path();

    git(path, &["init"]);
    // Deterministic default branch name across environments.
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test User"]);

    std::fs::write(path.join("README.md"), "# Test\n").unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "Initial commit"]);

    temp_dir
}

/// Add `name` to `repo_dir` in a new commit on the current branch.
pub(crate) fn commit_file(repo_dir: &Path, name: &str) {
    std::fs::write(repo_dir.join(name), format!("{}\n", name)).unwrap();
    git(repo_dir, &["add", name]);
    git(repo_dir, &["commit", "-m", &format!("Add {}", name)]);
}

fn git(repo_dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .current_dir(repo_dir)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute git {}: {}", args.join(" "), e));

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "git {} failed (exit code {:?})\nstdout:\n{}\nstderr:\n{}",
            args.join(" "),
            output.status.code(),
            stdout,
            stderr
        );
    }
}
