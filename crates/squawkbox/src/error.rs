//! Acquisition and pool error types.

use thiserror::Error;

/// Errors from the one-shot engine asset acquisition.
///
/// Any of these is terminal for the session: the pool records the failure,
/// surfaces it to the host, and never retries.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The engine bundle could not be downloaded.
    #[error("failed to download engine bundle '{name}': {source}")]
    Download {
        /// URL of the bundle that failed.
        name: String,
        /// Underlying transport or HTTP error.
        source: anyhow::Error,
    },

    /// The downloaded bundle does not match the expected content digest.
    #[error("engine bundle digest mismatch (expected {expected}, got {actual})")]
    DigestMismatch {
        /// The digest the manifest pins.
        expected: String,
        /// The digest actually computed over the downloaded bytes.
        actual: String,
    },

    /// The bundle is a valid archive but lacks a required entry.
    #[error("engine bundle has no entry matching '{entry}'")]
    MissingEntry {
        /// The entry path (suffix) that was searched for.
        entry: String,
    },

    /// The bundle could not be read as a zip archive.
    #[error("failed to read engine bundle: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The blocking verify/unpack task was cancelled or panicked.
    #[error("engine install task failed: {0}")]
    Task(String),

    /// Filesystem error while installing the assets.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the pool handle itself (never from the engine).
#[derive(Debug, Error)]
pub enum PoolError {
    /// The dedicated pool thread could not be spawned.
    #[error("failed to spawn speech pool thread: {0}")]
    Spawn(std::io::Error),

    /// The pool thread has shut down; no further operations are possible.
    #[error("speech pool is closed")]
    Closed,
}
