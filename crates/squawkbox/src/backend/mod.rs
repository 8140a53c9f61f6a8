//! Engine backend traits — engine-agnostic seam between the pool and a
//! concrete synthesis engine.
//!
//! The pool operates on trait objects (`Box<dyn Synthesizer>`) produced by a
//! [`SynthesizerFactory`], so engines can be swapped — and mocked in tests —
//! without touching the scheduling logic.
//!
//! [`Synthesizer`] is deliberately **not** `Send`: concrete instances wrap
//! raw native handles that must never cross threads. The pool confines every
//! instance to its dedicated actor thread; only the factory moves there, once,
//! at spawn time.

#[cfg(feature = "dectalk")]
pub mod dectalk;

use thiserror::Error;

use crate::assets::EngineAssets;

/// A call into the synthesis engine failed.
///
/// Status codes are opaque foreign values; the pool only ever branches on
/// success versus non-success.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An engine entry point returned a non-zero status code.
    #[error("{call} returned status code {code}")]
    Call {
        /// Name of the engine call that failed.
        call: &'static str,
        /// The raw status code as returned by the engine.
        code: u32,
    },

    /// The engine itself could not be brought up (module load, missing
    /// symbols). Reported per creation attempt; the downloaded assets stay
    /// valid.
    #[error("synthesis engine unavailable: {0}")]
    Unavailable(String),
}

/// One synthesis instance. Processes a single utterance at a time.
///
/// All methods are synchronous: the underlying engine renders in the
/// background and every call here is submission or query only, fast enough
/// to run directly on the pool's actor thread.
pub trait Synthesizer {
    /// Submit an utterance, preempting whatever this instance is currently
    /// rendering. Returns once the engine accepts the text, not once
    /// speaking finishes.
    fn speak(&mut self, text: &str) -> Result<(), EngineError>;

    /// Set the output volume (0–100).
    ///
    /// Callers must only invoke this on an instance they know to be idle —
    /// changing the volume mid-render corrupts the engine's heap.
    fn set_volume(&mut self, volume: u8) -> Result<(), EngineError>;

    /// Live busy query: is this instance currently rendering speech?
    /// Never cached.
    fn is_speaking(&mut self) -> Result<bool, EngineError>;

    /// Return the instance to a known idle state, discarding queued speech.
    fn reset(&mut self) -> Result<(), EngineError>;
}

/// Fallible creation of [`Synthesizer`] instances bound to the acquired
/// engine assets.
///
/// `Send` so the pool can move it onto the actor thread at spawn time; the
/// instances it creates never leave that thread.
pub trait SynthesizerFactory: Send {
    /// Allocate one new synthesis instance.
    ///
    /// A factory that fails here must leave itself usable for later
    /// attempts — the pool retries on every speak request that needs
    /// capacity.
    fn create(&mut self, assets: &EngineAssets) -> Result<Box<dyn Synthesizer>, EngineError>;
}
