//! Immutable snapshot of the parent process environment.
//!
//! The snapshot is taken once per invocation and passed around explicitly;
//! lookups are pure functions of the snapshot, so the merged child
//! environment depends only on declared inputs.

use std::collections::BTreeMap;

/// Candidate variables naming the runfiles root, in lookup order.
const RUNFILES_DIR_CANDIDATES: &[&str] = &["RUNFILES_DIR", "TEST_SRCDIR"];

/// A name-to-value view of the environment at capture time.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    ///
    /// One entry per `NAME=VALUE` pair; entries that are not valid Unicode
    /// are skipped, since they could not be re-serialized faithfully.
    #[must_use]
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(name, value)| {
                let name = name.into_string().ok()?;
                let value = value.into_string().ok()?;
                Some((name, value))
            })
            .collect();
        Self { vars }
    }

    /// Build a snapshot from an explicit map (used by tests).
    #[must_use]
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Look up a variable; unset variables read as the empty string.
    #[must_use]
    pub fn var(&self, name: &str) -> &str {
        self.vars.get(name).map_or("", String::as_str)
    }

    /// The runfiles root directory for this invocation.
    ///
    /// Returns the first non-empty candidate (`RUNFILES_DIR`, then the test
    /// source directory fallback); empty if neither is set.
    #[must_use]
    pub fn runfiles_dir(&self) -> &str {
        RUNFILES_DIR_CANDIDATES
            .iter()
            .map(|&name| self.var(name))
            .find(|value| !value.is_empty())
            .unwrap_or("")
    }

    /// Iterate over all captured `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}
