//! `elrun test` implementation.

use crate::cli::{self, TestArgs};
use crate::env::EnvSnapshot;
use crate::error::Result;
use crate::exec::Executor;
use crate::options::{CommonOptions, TestOptions};

/// Execute the test command; returns the child's exit code.
///
/// # Errors
///
/// Returns an error if resolution, manifest writing, the spawn, or the
/// report conversion fails.
pub fn execute(args: TestArgs) -> Result<i32> {
    let options = TestOptions {
        common: CommonOptions {
            wrapper: args.wrapper,
            mode: args.mode,
            load_path: args.directories,
            load_files: Vec::new(),
            data_files: args.data_files.into_iter().collect(),
            tags: args.tags.into_iter().collect(),
        },
        srcs: args.srcs,
        skip_tests: args.skip_tests.into_iter().collect(),
        skip_tags: args.skip_tags.into_iter().collect(),
        input_args: args.input_args.into_iter().collect(),
        output_args: args.output_args.into_iter().collect(),
    };
    let mut executor = Executor::new_for_test(cli::original_argv(args.args), EnvSnapshot::capture())?;
    executor.run_test(&options)
}
