//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand};

use crate::options::Mode;

pub mod commands;

/// Hermetic launcher for Emacs Lisp binaries and tests
#[derive(Parser, Debug)]
#[command(name = "elrun", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the bundled Emacs directly
    Emacs(EmacsArgs),

    /// Launch an ahead-of-time compiled binary wrapper
    Binary(BinaryArgs),

    /// Launch a test wrapper and convert its report
    Test(TestArgs),
}

#[derive(Args, Debug)]
pub struct EmacsArgs {
    /// Logical runfile of the Emacs installation prefix
    #[arg(long, value_name = "RUNFILE")]
    pub install: String,

    /// Arguments forwarded to the child process (after --)
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct BinaryArgs {
    /// Logical runfile of the wrapper executable
    #[arg(long, value_name = "RUNFILE")]
    pub wrapper: String,

    /// Sandboxing mode
    #[arg(long, value_enum, default_value = "direct")]
    pub mode: Mode,

    /// Logical directory added to the load path (repeatable, ordered)
    #[arg(long = "directory", value_name = "DIR")]
    pub directories: Vec<String>,

    /// Logical file loaded before the entry point (repeatable, ordered)
    #[arg(long = "load", value_name = "FILE")]
    pub load_files: Vec<String>,

    /// Logical data file declared as a sandbox input (repeatable)
    #[arg(long = "data", value_name = "FILE")]
    pub data_files: Vec<String>,

    /// Rule tag recorded in the manifest (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Entry function invoked after the load files
    #[arg(long, value_name = "SYMBOL")]
    pub funcall: Option<String>,

    /// Original-argv index naming an input file (repeatable, may be negative)
    #[arg(long = "input-arg", value_name = "N", allow_hyphen_values = true)]
    pub input_args: Vec<i64>,

    /// Original-argv index naming an output file (repeatable, may be negative)
    #[arg(long = "output-arg", value_name = "N", allow_hyphen_values = true)]
    pub output_args: Vec<i64>,

    /// Arguments forwarded to the child process (after --)
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct TestArgs {
    /// Logical runfile of the wrapper executable
    #[arg(long, value_name = "RUNFILE")]
    pub wrapper: String,

    /// Sandboxing mode
    #[arg(long, value_enum, default_value = "direct")]
    pub mode: Mode,

    /// Logical directory added to the load path (repeatable, ordered)
    #[arg(long = "directory", value_name = "DIR")]
    pub directories: Vec<String>,

    /// Logical test source file (repeatable, ordered)
    #[arg(long = "src", value_name = "FILE")]
    pub srcs: Vec<String>,

    /// Logical data file declared as a sandbox input (repeatable)
    #[arg(long = "data", value_name = "FILE")]
    pub data_files: Vec<String>,

    /// Rule tag recorded in the manifest (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Test name excluded from the run (repeatable)
    #[arg(long = "skip-test", value_name = "NAME")]
    pub skip_tests: Vec<String>,

    /// Test tag excluded from the run (repeatable)
    #[arg(long = "skip-tag", value_name = "TAG")]
    pub skip_tags: Vec<String>,

    /// Original-argv index naming an input file (repeatable, may be negative)
    #[arg(long = "input-arg", value_name = "N", allow_hyphen_values = true)]
    pub input_args: Vec<i64>,

    /// Original-argv index naming an output file (repeatable, may be negative)
    #[arg(long = "output-arg", value_name = "N", allow_hyphen_values = true)]
    pub output_args: Vec<i64>,

    /// Arguments forwarded to the child process (after --)
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

/// Reconstruct the original argv the core reasons about: the launcher's own
/// argv[0] followed by the forwarded trailing arguments.
#[must_use]
pub(crate) fn original_argv(trailing: Vec<String>) -> Vec<String> {
    let argv0 = std::env::args()
        .next()
        .unwrap_or_else(|| "elrun".to_string());
    let mut argv = Vec::with_capacity(1 + trailing.len());
    argv.push(argv0);
    argv.extend(trailing);
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_binary_invocation() {
        let cli = Cli::parse_from([
            "elrun",
            "binary",
            "--wrapper",
            "tools/wrap",
            "--mode",
            "wrap",
            "--directory",
            "pkg",
            "--load",
            "pkg/main.elc",
            "--input-arg",
            "2",
            "--output-arg",
            "-1",
            "--",
            "--option",
            "file.dat",
        ]);
        let Commands::Binary(args) = cli.command else {
            panic!("expected binary subcommand");
        };
        assert_eq!(args.wrapper, "tools/wrap");
        assert_eq!(args.mode, Mode::Wrap);
        assert_eq!(args.directories, ["pkg"]);
        assert_eq!(args.load_files, ["pkg/main.elc"]);
        assert_eq!(args.input_args, [2]);
        assert_eq!(args.output_args, [-1]);
        assert_eq!(args.args, ["--option", "file.dat"]);
    }

    #[test]
    fn test_parse_test_invocation_defaults_to_direct() {
        let cli = Cli::parse_from([
            "elrun",
            "test",
            "--wrapper",
            "tools/test-wrap",
            "--src",
            "pkg/a-test.el",
            "--skip-test",
            "flaky-test",
            "--skip-tag",
            "slow",
        ]);
        let Commands::Test(args) = cli.command else {
            panic!("expected test subcommand");
        };
        assert_eq!(args.mode, Mode::Direct);
        assert_eq!(args.srcs, ["pkg/a-test.el"]);
        assert_eq!(args.skip_tests, ["flaky-test"]);
        assert_eq!(args.skip_tags, ["slow"]);
        assert!(args.args.is_empty());
    }

    #[test]
    fn test_negative_indices_parse() {
        let cli = Cli::parse_from([
            "elrun",
            "binary",
            "--wrapper",
            "w",
            "--input-arg=-2",
            "--output-arg=-1",
        ]);
        let Commands::Binary(args) = cli.command else {
            panic!("expected binary subcommand");
        };
        assert_eq!(args.input_args, [-2]);
        assert_eq!(args.output_args, [-1]);
    }
}
