//! Notification surface — events the pool emits for host UIs.
//!
//! The pool never talks to a notification system directly; hosts pass an
//! implementation of [`SpeechEventEmitter`] at construction and render the
//! events however they like (toast, status bar, log).

use serde::{Deserialize, Serialize};

/// Events emitted by the speech pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpeechEvent {
    /// Engine assets are installed and verified; instances can now be
    /// created.
    EngineReady,

    /// The one-shot asset acquisition failed. Terminal for the session — the
    /// pool will never grow, and hosts should surface a warning.
    AcquisitionFailed {
        /// Human-readable description of what went wrong.
        error: String,
    },
}

/// Trait for emitting speech pool events.
///
/// Keeps event plumbing out of the pool's public API: implementations handle
/// transport details (notification UI, channels, logs).
pub trait SpeechEventEmitter: Send + Sync {
    /// Emit an event. Must not block — the pool calls this from its actor
    /// thread.
    fn emit(&self, event: SpeechEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn SpeechEventEmitter>;
}

/// A no-op emitter for tests and headless contexts.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SpeechEventEmitter for NoopEmitter {
    fn emit(&self, _event: SpeechEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn SpeechEventEmitter> {
        Box::new(self.clone())
    }
}
