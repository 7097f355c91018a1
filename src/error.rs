use std::path::PathBuf;

use thiserror::Error;

/// Error kinds surfaced by the duplicate-detection engine.
///
/// Per-file and per-directory variants (`Enumeration`, `FileMeta`,
/// `FileOpen`, `ShortRead`) are constructed at the point the failure
/// occurs, logged via their `Display` impl, and then discarded — a single
/// bad file or directory never aborts a run. They stay public so a caller
/// that installs its own `tracing` subscriber (skipping [`crate::init_logging`])
/// still has something concrete to match on instead of parsing log lines.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to list directory {path}: {source}")]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read metadata for {path}: {source}")]
    FileMeta {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("short read on {path}: expected {expected} bytes, got {got}")]
    ShortRead {
        path: PathBuf,
        expected: usize,
        got: usize,
    },

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;
