//! Randomized single-use temporary files.
//!
//! Names come from a pure function of a template and a caller-supplied RNG,
//! so tests can pin the sequence. Creation is exclusive (`O_EXCL`): a
//! collision with a concurrent invocation on the same host is retried with a
//! fresh name up to a bounded attempt count, never silently overwritten.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::error::{LauncherError, Result};

const CREATE_ATTEMPTS: u32 = 10;

/// Produce a candidate file name from a `prefix-*.ext` style template.
///
/// The last `*` is replaced by 16 random hex digits. Templates are
/// compile-time constants; a template without `*` is a programming error.
pub fn temp_name(template: &str, rng: &mut impl Rng) -> String {
    let pos = template
        .rfind('*')
        .unwrap_or_else(|| panic!("no * in template {template}"));
    let (prefix, rest) = template.split_at(pos);
    let suffix = &rest[1..];
    format!("{prefix}{:016x}{suffix}", rng.random::<u64>())
}

/// An exclusively created temporary file, removed again on drop.
#[derive(Debug)]
pub struct TempFile {
    file: File,
    path: PathBuf,
}

impl TempFile {
    /// Create a uniquely named file in `dir` from `template`.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::TempFileExhausted`] when every candidate name
    /// already exists, or the underlying I/O error for any other failure.
    pub fn create(dir: &Path, template: &str, rng: &mut impl Rng) -> Result<Self> {
        for _ in 0..CREATE_ATTEMPTS {
            let path = dir.join(temp_name(template, rng));
            match OpenOptions::new()
                .read(true)
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(file) => return Ok(Self { file, path }),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(err) => return Err(err.into()),
            }
        }
        Err(LauncherError::TempFileExhausted {
            dir: dir.to_path_buf(),
            template: template.to_string(),
        })
    }

    /// The path of the created file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `data` and flush it to disk.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.file.write_all(data)?;
        self.file.flush()?;
        Ok(())
    }

    /// Read the current file contents by path.
    ///
    /// The child process may have rewritten the file in place; reading by
    /// path picks up whatever is there now.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn read_to_string(&self) -> Result<String> {
        Ok(fs::read_to_string(&self.path)?)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        // Already-removed is fine; anything else is worth a diagnostic.
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    "error removing temporary file {}: {err}",
                    self.path.display()
                );
            }
        }
    }
}
