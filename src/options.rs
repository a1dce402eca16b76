//! Invocation option records for the three launch modes.
//!
//! One record per mode, sharing the common fields by composition; the
//! [`Invocation`] sum type is what callers hand to the executor. Options are
//! constructed once from caller-supplied configuration and read-only
//! afterwards. Unordered collections are `BTreeSet`s so every iteration is
//! already deterministic.

use std::collections::BTreeSet;

/// Whether the child's file access is constrained by the sandbox tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// No manifest; the child runs unconstrained.
    Direct,
    /// A manifest is written and passed to the child for the sandbox tool.
    Wrap,
}

/// Fields shared by the binary and test modes.
#[derive(Debug, Clone)]
pub struct CommonOptions {
    /// Logical runfile of the wrapper executable.
    pub wrapper: String,
    pub mode: Mode,
    /// Ordered logical directories added to the load path.
    pub load_path: Vec<String>,
    /// Ordered logical files loaded before the entry point.
    pub load_files: Vec<String>,
    /// Logical data files declared as sandbox inputs.
    pub data_files: BTreeSet<String>,
    /// Rule tags recorded in the manifest.
    pub tags: BTreeSet<String>,
}

/// Options for launching the bundled Emacs directly.
#[derive(Debug, Clone)]
pub struct EmacsOptions {
    /// Logical runfile of the installation prefix.
    pub install: String,
}

/// Options for launching an ahead-of-time compiled binary wrapper.
#[derive(Debug, Clone)]
pub struct BinaryOptions {
    pub common: CommonOptions,
    /// Entry function invoked after the load files.
    pub funcall: Option<String>,
    /// Indices into the original argv naming input files (may be negative).
    pub input_args: BTreeSet<i64>,
    /// Indices into the original argv naming output files (may be negative).
    pub output_args: BTreeSet<i64>,
}

/// Options for launching a test wrapper.
#[derive(Debug, Clone)]
pub struct TestOptions {
    pub common: CommonOptions,
    /// Ordered logical test source files.
    pub srcs: Vec<String>,
    /// Test names excluded from the run.
    pub skip_tests: BTreeSet<String>,
    /// Test tags excluded from the run.
    pub skip_tags: BTreeSet<String>,
    pub input_args: BTreeSet<i64>,
    pub output_args: BTreeSet<i64>,
}

/// One launcher invocation.
#[derive(Debug, Clone)]
pub enum Invocation {
    Emacs(EmacsOptions),
    Binary(BinaryOptions),
    Test(TestOptions),
}
