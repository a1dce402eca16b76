//! `elrun binary` implementation.

use crate::cli::{self, BinaryArgs};
use crate::env::EnvSnapshot;
use crate::error::Result;
use crate::exec::Executor;
use crate::options::{BinaryOptions, CommonOptions};

/// Execute the binary command; returns the child's exit code.
///
/// # Errors
///
/// Returns an error if resolution, manifest writing, or the spawn fails.
pub fn execute(args: BinaryArgs) -> Result<i32> {
    let options = BinaryOptions {
        common: CommonOptions {
            wrapper: args.wrapper,
            mode: args.mode,
            load_path: args.directories,
            load_files: args.load_files,
            data_files: args.data_files.into_iter().collect(),
            tags: args.tags.into_iter().collect(),
        },
        funcall: args.funcall,
        input_args: args.input_args.into_iter().collect(),
        output_args: args.output_args.into_iter().collect(),
    };
    let mut executor = Executor::new(cli::original_argv(args.args), EnvSnapshot::capture())?;
    executor.run_binary(&options)
}
