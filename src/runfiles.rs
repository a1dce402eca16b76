//! Runfiles resolution.
//!
//! A runfile is a logical, slash-separated name for a build-produced file;
//! the build tool materializes the mapping either as a real directory tree or
//! as a manifest file of `name path` lines. Discovery follows the standard
//! layout: an explicit manifest wins, then a runfiles directory, then the
//! `<argv0>.runfiles` convention next to the launcher itself.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::env::EnvSnapshot;
use crate::error::{LauncherError, Result};

pub const ENV_RUNFILES_DIR: &str = "RUNFILES_DIR";
pub const ENV_RUNFILES_MANIFEST_FILE: &str = "RUNFILES_MANIFEST_FILE";
pub const ENV_TEST_SRCDIR: &str = "TEST_SRCDIR";

#[derive(Debug)]
enum Mapping {
    /// A materialized tree; lookups join and verify the entry exists.
    Directory(PathBuf),
    /// A `name path` manifest; lookups consult the parsed map.
    Manifest {
        path: PathBuf,
        entries: HashMap<String, PathBuf>,
    },
}

/// The runfiles view of one invocation.
#[derive(Debug)]
pub struct Runfiles {
    mapping: Mapping,
}

impl Runfiles {
    /// Locate the runfiles for a program invoked as `argv0`.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::Runfiles`] if no candidate location exists.
    pub fn create(argv0: &str, env: &EnvSnapshot) -> Result<Self> {
        let mut candidates = vec![
            Candidate::Manifest(PathBuf::from(env.var(ENV_RUNFILES_MANIFEST_FILE))),
            Candidate::Directory(PathBuf::from(env.var(ENV_RUNFILES_DIR))),
        ];
        if !argv0.is_empty() {
            candidates.push(Candidate::Manifest(PathBuf::from(format!(
                "{argv0}.runfiles_manifest"
            ))));
            candidates.push(Candidate::Directory(PathBuf::from(format!(
                "{argv0}.runfiles"
            ))));
        }
        Self::from_candidates(candidates).ok_or_else(|| LauncherError::Runfiles {
            reason: format!("no runfiles tree found for '{argv0}'"),
        })
    }

    /// Locate the runfiles for a test invocation.
    ///
    /// Tests additionally fall back to the test source directory the build
    /// tool exports.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::Runfiles`] if no candidate location exists.
    pub fn create_for_test(env: &EnvSnapshot) -> Result<Self> {
        let candidates = vec![
            Candidate::Manifest(PathBuf::from(env.var(ENV_RUNFILES_MANIFEST_FILE))),
            Candidate::Directory(PathBuf::from(env.var(ENV_RUNFILES_DIR))),
            Candidate::Directory(PathBuf::from(env.var(ENV_TEST_SRCDIR))),
        ];
        Self::from_candidates(candidates).ok_or_else(|| LauncherError::Runfiles {
            reason: "no runfiles tree found for test".to_string(),
        })
    }

    fn from_candidates(candidates: Vec<Candidate>) -> Option<Self> {
        for candidate in candidates {
            match candidate {
                Candidate::Manifest(path) if path.as_os_str().is_empty() => {}
                Candidate::Manifest(path) => {
                    if path.is_file() {
                        if let Ok(entries) = parse_manifest(&path) {
                            return Some(Self {
                                mapping: Mapping::Manifest { path, entries },
                            });
                        }
                    }
                }
                Candidate::Directory(path) if path.as_os_str().is_empty() => {}
                Candidate::Directory(path) => {
                    if path.is_dir() {
                        return Some(Self {
                            mapping: Mapping::Directory(path),
                        });
                    }
                }
            }
        }
        None
    }

    /// Resolve a logical runfile name to an absolute physical path.
    ///
    /// The result is absolute but deliberately NOT canonicalized: a companion
    /// stub re-derives the runfiles root from the literal resolved string, so
    /// resolving symlinks here would break it.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::RunfileNotFound`] if the mapping has no entry.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let not_found = || LauncherError::RunfileNotFound {
            name: name.to_string(),
        };
        if name.is_empty() {
            return Err(not_found());
        }
        let physical = match &self.mapping {
            Mapping::Directory(root) => {
                let joined = root.join(name);
                // symlink_metadata: existence without following links.
                if fs::symlink_metadata(&joined).is_err() {
                    return Err(not_found());
                }
                joined
            }
            Mapping::Manifest { entries, .. } => {
                entries.get(name).cloned().ok_or_else(not_found)?
            }
        };
        Ok(std::path::absolute(&physical)?)
    }

    /// Environment variables a child needs to re-create this runfiles view.
    ///
    /// These form the lowest-precedence layer of the merged child
    /// environment.
    #[must_use]
    pub fn env_vars(&self) -> Vec<(String, String)> {
        match &self.mapping {
            Mapping::Directory(root) => vec![(
                ENV_RUNFILES_DIR.to_string(),
                root.display().to_string(),
            )],
            Mapping::Manifest { path, .. } => vec![(
                ENV_RUNFILES_MANIFEST_FILE.to_string(),
                path.display().to_string(),
            )],
        }
    }
}

enum Candidate {
    Directory(PathBuf),
    Manifest(PathBuf),
}

fn parse_manifest(path: &Path) -> Result<HashMap<String, PathBuf>> {
    let contents = fs::read_to_string(path)?;
    let mut entries = HashMap::new();
    for line in contents.lines() {
        if line.is_empty() {
            continue;
        }
        // `name path` pairs; an entry with an empty path counts as absent.
        if let Some((name, physical)) = line.split_once(' ') {
            if !physical.is_empty() {
                entries.insert(name.to_string(), PathBuf::from(physical));
            }
        }
    }
    Ok(entries)
}
