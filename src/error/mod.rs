//! Error types and handling for `elrun_rust`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration at the edges
//! - `NotFound`-class errors are recoverable by callers (they drive the
//!   runfile-handler fallback during load-path construction); everything else
//!   is fatal to the invocation
//! - Invariant violations (absolute path in a manifest, empty or
//!   NUL-containing exec string) are panics, not error values: they indicate a
//!   construction bug upstream, and no caller can correct them

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `elrun_rust` operations.
#[derive(Error, Debug)]
pub enum LauncherError {
    // === Resolution errors ===
    /// A logical runfile has no mapping to a physical path.
    #[error("runfile not found: {name}")]
    RunfileNotFound { name: String },

    /// A directory pattern matched nothing.
    #[error("no {what} found under '{}'", .dir.display())]
    NotFound { what: &'static str, dir: PathBuf },

    /// A directory pattern matched more than one candidate.
    #[error("expected exactly one {what}, got [{}]", .candidates.join(", "))]
    Ambiguous {
        what: &'static str,
        candidates: Vec<String>,
    },

    /// The runfiles tree could not be located at all.
    #[error("couldn't create runfiles: {reason}")]
    Runfiles { reason: String },

    // === Process errors ===
    /// Spawning or waiting on the wrapper process failed.
    #[error("failed to run '{}': {source}", .binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Temp file errors ===
    /// Exclusive creation kept colliding with existing files.
    #[error("can't create temporary file in '{}' with template '{template}'", .dir.display())]
    TempFileExhausted { dir: PathBuf, template: String },

    // === Report errors ===
    /// The JSON test report did not parse; carries the offending document.
    #[error("invalid JSON report: {content}: {source}")]
    InvalidReport {
        content: String,
        #[source]
        source: serde_json::Error,
    },

    // === I/O errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Wrapped errors ===
    /// Error with additional context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Wrapped anyhow error for context chains built at the edges.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LauncherError {
    /// Is this a not-found condition a caller may recover from?
    ///
    /// Load-path construction falls back to the runfile-handler scheme for
    /// these; any other error aborts the invocation.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::RunfileNotFound { .. } | Self::NotFound { .. })
    }

    /// Get the exit code reported when this error reaches the top level.
    ///
    /// Every pre-spawn failure maps to the same fixed code; the child's own
    /// exit status is returned verbatim on the success path instead.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }

    /// Attach a context message, preserving the original as the source.
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type using `LauncherError`.
pub type Result<T> = std::result::Result<T, LauncherError>;
