//! Sandbox manifest generation.
//!
//! The manifest declares the full I/O surface of the wrapped process: load
//! path, input files, output files, and rule tags. An external sandbox tool
//! consumes it and trusts the paths absolutely, so a stray absolute path in
//! the load path or input list is a fatal construction bug, not a recoverable
//! error. Serialization is fully deterministic: identical logical inputs
//! produce byte-identical manifests.

use std::collections::BTreeSet;
use std::path::Path;

use rand::Rng;
use serde::Serialize;

use crate::error::Result;
use crate::options::Mode;
use crate::util::TempFile;

/// Marker the sandbox tool substitutes with the actual runfiles root.
pub const RUNFILES_ROOT_MARKER: &str = "RUNFILES_ROOT";

const MANIFEST_TEMPLATE: &str = "manifest-*.json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    root: &'static str,
    load_path: &'a [String],
    input_files: &'a [String],
    output_files: &'a [String],
    tags: Vec<&'a String>,
}

/// If `mode` requests sandboxing, create the manifest temp file and append
/// the `--manifest=<path>` flag plus the `--` separator to `args`.
///
/// Returns the open temp file for the later [`write`] call, or `None` in
/// direct mode.
///
/// # Errors
///
/// Returns an error if the temp file cannot be created.
pub fn add_manifest(
    mode: Mode,
    args: &mut Vec<String>,
    rng: &mut impl Rng,
) -> Result<Option<TempFile>> {
    if mode == Mode::Direct {
        return Ok(None);
    }
    let file = TempFile::create(&std::env::temp_dir(), MANIFEST_TEMPLATE, rng)?;
    args.push(format!("--manifest={}", file.path().display()));
    args.push("--".to_string());
    Ok(Some(file))
}

/// Serialize and write the manifest.
///
/// `input_files` is the already-collected canonical input list (declared
/// sources, sorted data files, extracted argument files); `load_path` and
/// `input_files` entries must be relative, `output_files` may be absolute.
///
/// # Panics
///
/// Panics if a load-path or input entry is absolute; the sandbox layer
/// trusts these paths, so this indicates a bug in the calling code.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub fn write(
    load_path: &[String],
    input_files: &[String],
    output_files: &[String],
    tags: &BTreeSet<String>,
    file: &mut TempFile,
) -> Result<()> {
    check_relative(load_path);
    check_relative(input_files);
    let manifest = Manifest {
        root: RUNFILES_ROOT_MARKER,
        load_path,
        input_files,
        output_files,
        tags: tags.iter().collect(),
    };
    let json = serde_json::to_string(&manifest)?;
    file.write_all(json.as_bytes())
}

fn check_relative(files: &[String]) {
    for file in files {
        assert!(
            !Path::new(file).is_absolute(),
            "filename {file} is absolute"
        );
    }
}
