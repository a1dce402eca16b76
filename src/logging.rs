//! Logging setup for `elrun_rust`.
//!
//! All diagnostics go to stderr so child stdout stays untouched. The filter
//! is derived from `-v`/`-q` flags, with `ELRUN_LOG` taking priority when set
//! (standard `tracing_subscriber::EnvFilter` syntax).

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the verbosity-derived filter.
pub const LOG_ENV_VAR: &str = "ELRUN_LOG";

/// Initialize the global tracing subscriber.
///
/// `verbose` counts `-v` occurrences; `quiet` wins over `verbose`.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let default_directive = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("{err}"))?;

    Ok(())
}

/// Initialize logging for tests; safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
