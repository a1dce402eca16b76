//! `elrun emacs` implementation.

use crate::cli::{self, EmacsArgs};
use crate::env::EnvSnapshot;
use crate::error::Result;
use crate::exec::Executor;
use crate::options::EmacsOptions;

/// Execute the emacs command; returns the child's exit code.
///
/// # Errors
///
/// Returns an error if the installation cannot be resolved or the spawn
/// fails.
pub fn execute(args: EmacsArgs) -> Result<i32> {
    let options = EmacsOptions {
        install: args.install,
    };
    let mut executor = Executor::new(cli::original_argv(args.args), EnvSnapshot::capture())?;
    executor.run_emacs(&options)
}
