//! Shared utilities for `elrun_rust`.

pub mod temp;

pub use temp::TempFile;
