//! Error types for the engine binding.

use std::path::PathBuf;

use thiserror::Error;

/// The engine module could not be loaded into the process.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The dynamic loader rejected the module file.
    #[error("failed to load engine module {}: {reason}", path.display())]
    Module { path: PathBuf, reason: String },

    /// The module loaded but does not export a required entry point.
    #[error("engine module is missing symbol {symbol}")]
    MissingSymbol { symbol: String },
}

/// A call into the engine returned a non-zero status code.
///
/// Codes are opaque: the engine defines them and callers only branch on
/// success versus non-success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{function} returned status code {code}")]
pub struct CallError {
    /// Name of the engine entry point that failed.
    pub function: &'static str,
    /// The raw status code as returned by the engine.
    pub code: u32,
}
