use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Environment variables the harness controls explicitly; anything the
/// outer test runner exports must not leak into the launcher under test.
const CONTROLLED_ENV: &[&str] = &[
    "RUNFILES_DIR",
    "RUNFILES_MANIFEST_FILE",
    "TEST_SRCDIR",
    "TEST_TMPDIR",
    "XML_OUTPUT_FILE",
    "COVERAGE",
    "COVERAGE_DIR",
    "COVERAGE_MANIFEST",
];

#[derive(Debug)]
pub struct LaunchRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

/// A scratch workspace with its own runfiles tree.
pub struct LaunchWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub runfiles_dir: PathBuf,
}

impl LaunchWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let runfiles_dir = root.join("runfiles");
        fs::create_dir_all(&runfiles_dir).expect("runfiles dir");
        Self {
            temp_dir,
            root,
            runfiles_dir,
        }
    }

    /// Create a plain runfile with the given contents.
    pub fn add_runfile(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.runfiles_dir.join(name);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, contents).expect("write runfile");
        path
    }

    /// Create an executable wrapper script runfile.
    pub fn add_wrapper(&self, name: &str, script: &str) -> PathBuf {
        let path = self.add_runfile(name, script);
        make_executable(&path);
        path
    }

    /// Create an empty directory inside the runfiles tree.
    pub fn add_runfile_dir(&self, name: &str) -> PathBuf {
        let path = self.runfiles_dir.join(name);
        fs::create_dir_all(&path).expect("mkdir");
        path
    }
}

fn make_executable(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = fs::metadata(path).expect("metadata").permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(path, permissions).expect("chmod");
    }
}

pub fn run_elrun<I, S>(workspace: &LaunchWorkspace, args: I) -> LaunchRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_elrun_with_env(
        workspace,
        args,
        std::iter::empty::<(String, String)>(),
    )
}

pub fn run_elrun_with_env<I, S, E, K, V>(
    workspace: &LaunchWorkspace,
    args: I,
    env_vars: E,
) -> LaunchRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let root = workspace.root.clone();
    run_elrun_in(workspace, &root, args, env_vars)
}

/// Like [`run_elrun_with_env`], but with an explicit working directory
/// (argument-file extraction absolutizes relative paths against it).
pub fn run_elrun_in<I, S, E, K, V>(
    workspace: &LaunchWorkspace,
    cwd: &Path,
    args: I,
    env_vars: E,
) -> LaunchRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::cargo_bin("elrun").expect("elrun binary");
    cmd.current_dir(cwd);
    for name in CONTROLLED_ENV {
        cmd.env_remove(name);
    }
    cmd.env("RUNFILES_DIR", &workspace.runfiles_dir);
    for (name, value) in env_vars {
        cmd.env(name, value);
    }
    cmd.args(args);

    let output = cmd.output().expect("run elrun");
    LaunchRun {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        status: output.status,
    }
}

/// Read the newline-separated argv dump a wrapper script wrote.
pub fn read_args_file(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("args file")
        .lines()
        .map(str::to_string)
        .collect()
}

/// A wrapper script that records its argv and exits with `code`.
pub fn recording_wrapper_script(args_file: &Path, code: i32) -> String {
    format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"{}\"\nexit {code}\n",
        args_file.display()
    )
}
