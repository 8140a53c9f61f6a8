//! Bounded pool of native text-to-speech instances.
//!
//! Each synthesis instance renders one utterance at a time, so overlapping
//! speech needs several instances. This crate multiplexes `try_speak`
//! requests onto a small, resizable pool of them: idle instances are reused
//! first-fit in creation order, the pool grows lazily up to a configurable
//! cap, and a full pool rejects the request with `false` rather than
//! queueing. Growth is gated behind a one-shot acquisition step that
//! downloads, digest-verifies, and unpacks the engine's native module and
//! pronunciation dictionary.
//!
//! All instances live on a dedicated actor thread (see [`pool`]); the public
//! [`SpeechPool`] handle is `Send + Sync` and safe to share across threads.
//!
//! The default `dectalk` feature supplies the concrete engine backend via
//! the `squawkbox-dectalk` binding crate; without it the crate compiles
//! engine-free and hosts bring their own [`SynthesizerFactory`].

pub mod assets;
pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod pool;

// Re-export key types for convenience
pub use assets::{AssetManifest, EngineAssets, ensure_assets, install_bundle};
pub use backend::{EngineError, Synthesizer, SynthesizerFactory};
pub use config::PoolConfig;
pub use error::{AcquireError, PoolError};
pub use events::{NoopEmitter, SpeechEvent, SpeechEventEmitter};
pub use pool::{AcquisitionStatus, PoolStatus, SpeechPool};

#[cfg(feature = "dectalk")]
pub use backend::dectalk::DecTalkFactory;
