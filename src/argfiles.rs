//! Extracting referenced files from the original argument list.
//!
//! Build rules declare which positions of the final command line name input
//! or output files; the launcher pulls those arguments out so they can be
//! declared in the sandbox manifest. Indices may be negative and then count
//! from the end of the argument list, Python-style.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::Result;

/// Prefix callers use to stop the interpreter from treating an argument as a
/// special filename; stripped before path processing.
pub const QUOTE_PREFIX: &str = "/:";

/// Extract the file names at `indices` within `args`.
///
/// Indices are visited in ascending raw order so the output order is
/// deterministic. Negative indices are normalized by adding the argument
/// count; indices still outside `[0, len)` are silently skipped. Each
/// selected argument is stripped of the `/:` quoting prefix, converted to an
/// absolute path, and re-expressed relative to `runfiles_root` when it lies
/// underneath it.
///
/// # Errors
///
/// Returns an error if a path cannot be made absolute.
pub fn extract_arg_files(
    args: &[String],
    runfiles_root: &Path,
    indices: &BTreeSet<i64>,
) -> Result<Vec<String>> {
    let len = args.len() as i64;
    let mut files = Vec::new();
    for &index in indices {
        let index = if index < 0 { index + len } else { index };
        if index < 0 || index >= len {
            continue;
        }
        #[allow(clippy::cast_sign_loss)]
        let arg = &args[index as usize];
        files.push(rewrite_path(arg, runfiles_root)?);
    }
    Ok(files)
}

/// Strip the quoting prefix, absolutize, and relativize a single file name.
///
/// Relativization is best-effort: paths outside `runfiles_root` (or any path
/// when the root is empty) stay absolute. Absolutization is purely lexical;
/// symlinks are never resolved.
///
/// # Errors
///
/// Returns an error if the current directory needed for absolutization is
/// unavailable.
pub fn rewrite_path(name: &str, runfiles_root: &Path) -> Result<String> {
    let name = name.strip_prefix(QUOTE_PREFIX).unwrap_or(name);
    let absolute = std::path::absolute(Path::new(name))?;
    let rewritten = if runfiles_root.as_os_str().is_empty() {
        absolute.as_path()
    } else {
        absolute.strip_prefix(runfiles_root).unwrap_or(&absolute)
    };
    Ok(rewritten.display().to_string())
}
