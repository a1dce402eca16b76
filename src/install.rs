//! Locating pieces of a bundled Emacs installation.
//!
//! The install prefix is itself a runfile; the version-specific directories
//! below it are only known at run time, so they are found by pattern-matching
//! directory entries. Zero matches is a not-found condition; more than one is
//! an ambiguity the invocation cannot recover from.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{LauncherError, Result};

/// Version directories look like `27.1` or `29.4.50`.
static VERSION_DIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9][.0-9]*$").expect("version pattern"));

const DUMP_FILE_NAME: &str = "emacs.pdmp";

/// Find the single versioned shared-data directory under
/// `<install>/share/emacs`.
///
/// # Errors
///
/// `NotFound` if no version directory matches, `Ambiguous` (naming all
/// candidates) if more than one does; I/O errors propagate.
pub fn shared_data_dir(install: &Path) -> Result<PathBuf> {
    let base = install.join("share").join("emacs");
    let mut versions = Vec::new();
    for entry in fs::read_dir(&base)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if entry.file_type()?.is_dir() && VERSION_DIR.is_match(&name) {
            versions.push(name);
        }
    }
    versions.sort();
    match versions.as_slice() {
        [] => Err(LauncherError::NotFound {
            what: "shared directory",
            dir: base,
        }),
        [version] => Ok(base.join(version)),
        _ => Err(LauncherError::Ambiguous {
            what: "shared directory",
            candidates: versions,
        }),
    }
}

/// Find the single portable dump file under a `libexec/emacs` subtree.
///
/// The layout is `<libexec_root>/<version>/<architecture>/emacs.pdmp`;
/// dotfile entries are skipped at every level.
///
/// # Errors
///
/// `NotFound` if no dump file exists, `Ambiguous` (naming all candidates) if
/// more than one does; I/O errors propagate.
pub fn dump_file(libexec_root: &Path) -> Result<PathBuf> {
    let mut matches = Vec::new();
    for version in visible_dirs(libexec_root)? {
        for arch in visible_dirs(&version)? {
            for entry in fs::read_dir(&arch)? {
                let entry = entry?;
                let name = entry.file_name();
                if name.to_str().is_some_and(|name| name.starts_with('.')) {
                    continue;
                }
                if name == DUMP_FILE_NAME && entry.file_type()?.is_file() {
                    matches.push(entry.path());
                }
            }
        }
    }
    matches.sort();
    match matches.as_slice() {
        [] => Err(LauncherError::NotFound {
            what: "dump file",
            dir: libexec_root.to_path_buf(),
        }),
        [path] => Ok(path.clone()),
        _ => Err(LauncherError::Ambiguous {
            what: "dump file",
            candidates: matches
                .iter()
                .map(|path| path.display().to_string())
                .collect(),
        }),
    }
}

/// Non-dotfile subdirectories of `dir`, unsorted.
fn visible_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
        {
            continue;
        }
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}
