//! Execution core: builds the hermetic argv/env and launches the wrapper.
//!
//! One [`Executor`] per invocation. It owns the original argument list, the
//! environment snapshot, the runfiles view, and the RNG used for temp-file
//! names; nothing in here is shared across invocations. Everything before
//! the spawn is pure construction from declared inputs, so identical logical
//! invocations produce identical command lines and environments.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::Command;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::argfiles::{self, QUOTE_PREFIX};
use crate::env::EnvSnapshot;
use crate::error::{LauncherError, Result};
use crate::install;
use crate::manifest;
use crate::options::{BinaryOptions, CommonOptions, EmacsOptions, Invocation, TestOptions};
use crate::report;
use crate::runfiles::Runfiles;
use crate::util::TempFile;

/// Sentinel exit code for a child killed by a signal.
const SIGNAL_EXIT_CODE: i32 = 0xFF;

/// Companion files and entry functions provided by the accompanying rules.
const RUNNER_RUNFILE: &str = "elrun/ert/runner.elc";
const RUNFILES_HANDLER_RUNFILE: &str = "elrun/runfiles/runfiles.elc";
const INSTALL_HANDLER_FUNCTION: &str = "elrun-runfiles-install-handler";
const TEST_ENTRY_FUNCTION: &str = "elrun-ert-run-batch-and-exit";

/// Prefix marking a load-path directory the runfile handler resolves lazily.
const RUNFILE_DIRECTORY_PREFIX: &str = "/bazel-runfile:";

const REPORT_TEMPLATE: &str = "test-report-*.json";
const COVERAGE_DATA_FILE: &str = "emacs-lisp.dat";

/// The execution state of a single invocation.
pub struct Executor {
    orig_args: Vec<String>,
    env: EnvSnapshot,
    runfiles: Runfiles,
    rng: SmallRng,
}

impl Executor {
    /// Build an executor for a non-test invocation.
    ///
    /// `orig_args` is the full original argv, `argv[0]` first.
    ///
    /// # Errors
    ///
    /// Returns an error if the runfiles tree cannot be located.
    pub fn new(orig_args: Vec<String>, env: EnvSnapshot) -> Result<Self> {
        let argv0 = orig_args.first().map_or("", String::as_str);
        let runfiles = Runfiles::create(argv0, &env)?;
        Ok(Self::with_runfiles(orig_args, env, runfiles))
    }

    /// Build an executor for a test invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the runfiles tree cannot be located.
    pub fn new_for_test(orig_args: Vec<String>, env: EnvSnapshot) -> Result<Self> {
        let runfiles = Runfiles::create_for_test(&env)?;
        Ok(Self::with_runfiles(orig_args, env, runfiles))
    }

    fn with_runfiles(orig_args: Vec<String>, env: EnvSnapshot, runfiles: Runfiles) -> Self {
        Self {
            orig_args,
            env,
            runfiles,
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Dispatch on the invocation mode.
    ///
    /// # Errors
    ///
    /// Propagates the mode handler's error.
    pub fn run_invocation(&mut self, invocation: &Invocation) -> Result<i32> {
        match invocation {
            Invocation::Emacs(options) => self.run_emacs(options),
            Invocation::Binary(options) => self.run_binary(options),
            Invocation::Test(options) => self.run_test(options),
        }
    }

    /// Launch the bundled Emacs directly.
    ///
    /// # Errors
    ///
    /// Returns an error if the installation cannot be resolved or the spawn
    /// fails.
    pub fn run_emacs(&mut self, options: &EmacsOptions) -> Result<i32> {
        let install_dir = self.runfile(&options.install)?;
        let emacs = install_dir.join("bin").join("emacs");
        let shared = install::shared_data_dir(&install_dir)?;
        let etc = shared.join("etc");
        let dump = install::dump_file(&install_dir.join("libexec").join("emacs"))?;

        let mut env = BTreeMap::new();
        env.insert("EMACSDATA".to_string(), etc.display().to_string());
        env.insert("EMACSDOC".to_string(), etc.display().to_string());
        env.insert(
            "EMACSLOADPATH".to_string(),
            shared.join("lisp").display().to_string(),
        );
        env.insert(
            "EMACSPATH".to_string(),
            install_dir.join("libexec").display().to_string(),
        );

        let args = vec![format!("--dump-file={}", dump.display())];
        self.run(&emacs, &args, &env)
    }

    /// Launch an ahead-of-time compiled binary wrapper.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution, manifest writing, or the spawn fails.
    pub fn run_binary(&mut self, options: &BinaryOptions) -> Result<i32> {
        let common = &options.common;
        let emacs = self.runfile(&common.wrapper)?;
        let mut args = Vec::new();
        let mut manifest_file = manifest::add_manifest(common.mode, &mut args, &mut self.rng)?;
        args.push("--quick".to_string());
        args.push("--batch".to_string());
        self.add_load_path(&mut args, &common.load_path)?;
        for file in &common.load_files {
            let abs = self.runfile(file)?;
            args.push(format!("--load={}", abs.display()));
        }
        if let Some(function) = &options.funcall {
            args.push(format!("--funcall={function}"));
        }
        if let Some(file) = manifest_file.as_mut() {
            let input_files =
                self.collect_input_files(&common.load_files, common, &options.input_args, &[])?;
            let output_files = self.arg_files(&options.output_args)?;
            manifest::write(
                &common.load_path,
                &input_files,
                &output_files,
                &common.tags,
                file,
            )?;
        }
        self.run(&emacs, &args, &BTreeMap::new())
    }

    /// Launch a test wrapper and, if requested, convert its JSON report.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution, manifest writing, the spawn, or the
    /// report conversion fails.
    pub fn run_test(&mut self, options: &TestOptions) -> Result<i32> {
        let common = &options.common;
        let emacs = self.runfile(&common.wrapper)?;
        let mut args = Vec::new();
        let mut manifest_file = manifest::add_manifest(common.mode, &mut args, &mut self.rng)?;
        args.push("--quick".to_string());
        args.push("--batch".to_string());
        args.push("--module-assertions".to_string());
        self.add_load_path(&mut args, &common.load_path)?;

        let runner = self.runfile(RUNNER_RUNFILE)?;
        args.push(format!("--load={}", runner.display()));
        for src in &options.srcs {
            let abs = self.runfile(src)?;
            args.push("--test-source".to_string());
            args.push(format!("{QUOTE_PREFIX}{}", abs.display()));
        }
        for name in &options.skip_tests {
            args.push("--skip-test".to_string());
            args.push(name.clone());
        }
        for tag in &options.skip_tags {
            args.push("--skip-tag".to_string());
            args.push(tag.clone());
        }

        let xml_output_file = self.env.var("XML_OUTPUT_FILE").to_string();
        let report_file = if xml_output_file.is_empty() {
            None
        } else {
            let temp_dir = PathBuf::from(self.env.var("TEST_TMPDIR"));
            let file = TempFile::create(&temp_dir, REPORT_TEMPLATE, &mut self.rng)?;
            args.push(format!("--report={QUOTE_PREFIX}{}", file.path().display()));
            Some(file)
        };

        args.push(format!("--funcall={TEST_ENTRY_FUNCTION}"));

        if let Some(file) = manifest_file.as_mut() {
            let mut extra_inputs = Vec::new();
            let coverage_manifest = self.env.var("COVERAGE_MANIFEST");
            if !coverage_manifest.is_empty() {
                extra_inputs.push(argfiles::rewrite_path(
                    coverage_manifest,
                    &self.runfiles_root(),
                )?);
            }
            let input_files = self.collect_input_files(
                &options.srcs,
                common,
                &options.input_args,
                &extra_inputs,
            )?;
            let mut output_files = self.arg_files(&options.output_args)?;
            if let Some(report) = &report_file {
                output_files.push(report.path().display().to_string());
            }
            if self.env.var("COVERAGE") == "1" {
                let coverage_dir = self.env.var("COVERAGE_DIR");
                if !coverage_dir.is_empty() {
                    output_files.push(
                        Path::new(coverage_dir)
                            .join(COVERAGE_DATA_FILE)
                            .display()
                            .to_string(),
                    );
                }
            }
            manifest::write(
                &common.load_path,
                &input_files,
                &output_files,
                &common.tags,
                file,
            )?;
        }

        let code = self.run(&emacs, &args, &BTreeMap::new())?;

        if let Some(file) = &report_file {
            let json = file.read_to_string()?;
            report::convert_report(&json, Path::new(&xml_output_file))?;
            tracing::debug!("wrote XML report to {xml_output_file}");
        }
        Ok(code)
    }

    /// Resolve one logical runfile.
    fn runfile(&self, name: &str) -> Result<PathBuf> {
        self.runfiles.resolve(name)
    }

    /// The runfiles root used for re-expressing extracted argument paths.
    fn runfiles_root(&self) -> PathBuf {
        PathBuf::from(self.env.runfiles_dir())
    }

    /// Append `--directory=` flags for the load path.
    ///
    /// Resolvable entries use their physical path. The first entry the
    /// runfiles mapping does not know switches to the handler scheme: load
    /// the handler once, then name the directory by its logical path so the
    /// handler resolves it inside the child.
    fn add_load_path(&self, args: &mut Vec<String>, load_path: &[String]) -> Result<()> {
        let mut handler_installed = false;
        for dir in load_path {
            match self.runfile(dir) {
                Ok(abs) => args.push(format!("--directory={}", abs.display())),
                Err(err) if err.is_not_found() => {
                    if !std::mem::replace(&mut handler_installed, true) {
                        let handler = self.runfile(RUNFILES_HANDLER_RUNFILE)?;
                        args.push(format!("--load={}", handler.display()));
                        args.push(format!("--funcall={INSTALL_HANDLER_FUNCTION}"));
                    }
                    args.push(format!("--directory={RUNFILE_DIRECTORY_PREFIX}{dir}"));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// The one canonical declare-as-input operation.
    ///
    /// Collects, in order: the declared logical sources (load files or test
    /// sources), the sorted data files, the files extracted from the
    /// original argv at `input_args`, and any extra inputs the caller
    /// supplies.
    fn collect_input_files(
        &self,
        declared: &[String],
        common: &CommonOptions,
        input_args: &BTreeSet<i64>,
        extra: &[String],
    ) -> Result<Vec<String>> {
        let mut files: Vec<String> = declared.to_vec();
        files.extend(common.data_files.iter().cloned());
        files.extend(self.arg_files(input_args)?);
        files.extend(extra.iter().cloned());
        Ok(files)
    }

    fn arg_files(&self, indices: &BTreeSet<i64>) -> Result<Vec<String>> {
        argfiles::extract_arg_files(&self.orig_args, &self.runfiles_root(), indices)
    }

    /// Spawn the wrapper and wait for it.
    ///
    /// Final argv is `[argv[0]] + extra_args + argv[1..]`; the environment
    /// merges (lowest to highest precedence) the original snapshot, the
    /// runfiles variables, and the mode overrides, serialized in sorted
    /// order.
    fn run(
        &self,
        binary: &Path,
        extra_args: &[String],
        env_overrides: &BTreeMap<String, String>,
    ) -> Result<i32> {
        let args = self.build_args(extra_args);
        let env = serialize_env(&self.build_env(env_overrides));
        check_exec_strings("argument", &args);
        check_exec_strings("environment", &env);
        tracing::debug!("running {} with {} arguments", binary.display(), args.len());

        let mut command = Command::new(binary);
        command.args(&args[1..]);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.arg0(&args[0]);
        }
        command.env_clear();
        for entry in &env {
            if let Some((name, value)) = entry.split_once('=') {
                command.env(name, value);
            }
        }
        let status = command.status().map_err(|source| LauncherError::Spawn {
            binary: binary.to_path_buf(),
            source,
        })?;
        Ok(status.code().unwrap_or(SIGNAL_EXIT_CODE))
    }

    /// `[argv[0]] + prefix + argv[1..]`.
    fn build_args(&self, prefix: &[String]) -> Vec<String> {
        let argv0 = self
            .orig_args
            .first()
            .cloned()
            .unwrap_or_else(|| "elrun".to_string());
        let mut args = Vec::with_capacity(1 + prefix.len() + self.orig_args.len());
        args.push(argv0);
        args.extend(prefix.iter().cloned());
        args.extend(self.orig_args.iter().skip(1).cloned());
        args
    }

    /// Merge the child environment map.
    ///
    /// Overrides beat runfiles variables beat the original environment; the
    /// original environment only fills gaps.
    fn build_env(&self, overrides: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut map: BTreeMap<String, String> = self
            .env
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        for (name, value) in self.runfiles.env_vars() {
            map.insert(name, value);
        }
        for (name, value) in overrides {
            map.insert(name.clone(), value.clone());
        }
        map
    }
}

/// Serialize an environment map as `NAME=VALUE` strings, sorted
/// lexicographically over the full string for reproducibility.
fn serialize_env(env: &BTreeMap<String, String>) -> Vec<String> {
    let mut entries: Vec<String> = env
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    entries.sort();
    entries
}

/// Validate strings about to cross the process boundary.
///
/// An empty string or an embedded NUL cannot come from well-formed options;
/// it indicates a construction bug in this crate, so abort rather than
/// hand the OS something it will misparse.
fn check_exec_strings(kind: &str, strings: &[String]) {
    for s in strings {
        assert!(!s.is_empty(), "empty {kind} string");
        assert!(!s.contains('\0'), "{kind} string {s:?} contains NUL");
    }
}
