//! Bounded speech instance pool — a dedicated actor thread owning every
//! synthesis instance.
//!
//! Native instance handles are `!Send`, and the engine additionally forbids
//! touching an instance that might be rendering. Rather than guard shared
//! state with a lock held across native calls, the pool confines all
//! instances (and the factory) to a single OS thread and funnels every
//! operation through an [`mpsc`] command channel. Callers from any thread go
//! through the `Send + Sync` [`SpeechPool`] handle; commands execute strictly
//! in submission order, so no caller ever observes a half-mutated pool.
//!
//! Instance creation is gated on the one-shot asset acquisition
//! ([`ensure_assets`](crate::assets::ensure_assets)), which runs as a
//! background Tokio task and posts its outcome into the same command channel.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::assets::{AssetManifest, EngineAssets, ensure_assets};
use crate::backend::{Synthesizer, SynthesizerFactory};
use crate::config::{PoolConfig, clamp_max_instances, clamp_volume};
use crate::error::{AcquireError, PoolError};
use crate::events::{SpeechEvent, SpeechEventEmitter};

// ── Status DTO ─────────────────────────────────────────────────────

/// Where the one-shot asset acquisition stands.
///
/// Acquisition starts at pool construction, so `Pending` covers everything
/// up to the outcome. `Failed` is terminal: the pool never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionStatus {
    /// The background fetch/verify/install has not finished yet.
    Pending,
    /// Assets are installed; instances can be created.
    Ready,
    /// Acquisition failed; the pool will never grow this session.
    Failed,
}

/// Snapshot of the pool for UI surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatus {
    /// Acquisition outcome so far.
    pub acquisition: AcquisitionStatus,

    /// Number of live synthesis instances.
    pub active_instances: usize,

    /// Configured instance cap.
    pub max_instances: usize,

    /// Configured volume (0–100).
    pub volume: u8,
}

impl PoolStatus {
    /// `true` once acquisition has failed — hosts render a persistent
    /// warning off this.
    #[must_use]
    pub fn download_failed(&self) -> bool {
        self.acquisition == AcquisitionStatus::Failed
    }
}

// ── Commands ───────────────────────────────────────────────────────

/// A command sent from a pool handle to the actor thread.
enum PoolCommand {
    /// Speak `text` on a free instance, growing the pool if allowed.
    TrySpeak {
        text: String,
        reply: mpsc::Sender<bool>,
    },

    /// Record a new pool volume (applied per instance on its next utterance).
    SetVolume { volume: u8 },

    /// Change the instance cap, evicting oldest-first if shrinking.
    SetMaxInstances { max: usize },

    /// Force every instance to abandon its current utterance.
    ResetAll,

    /// Snapshot the pool state.
    Status { reply: mpsc::Sender<PoolStatus> },

    /// Outcome of the background acquisition task (internal).
    AcquisitionFinished {
        result: Result<EngineAssets, AcquireError>,
    },

    /// Shut down the pool thread, releasing every instance.
    Shutdown,
}

// ── Handle (Send + Sync proxy) ─────────────────────────────────────

/// `Send + Sync` handle to the speech pool.
///
/// All methods take `&self` — the underlying `mpsc::Sender` supports shared
/// access. [`try_speak`](Self::try_speak) and [`status`](Self::status) are
/// request–reply and block for the microseconds of local channel I/O plus
/// the engine call itself; the mutators are fire-and-forget but still execute
/// in submission order. Dropping the handle shuts the pool down and joins
/// the thread, releasing every instance.
pub struct SpeechPool {
    cmd_tx: mpsc::Sender<PoolCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl SpeechPool {
    /// Spawn the pool thread and kick off asset acquisition in the
    /// background.
    ///
    /// Must be called from within a Tokio runtime (the acquisition task is
    /// spawned onto it). Until acquisition completes,
    /// [`try_speak`](Self::try_speak) returns `false` whenever no existing
    /// instance is free.
    pub fn spawn(
        factory: impl SynthesizerFactory + 'static,
        config: PoolConfig,
        manifest: AssetManifest,
        install_dir: PathBuf,
        emitter: Arc<dyn SpeechEventEmitter>,
    ) -> Result<Self, PoolError> {
        let pool = Self::spawn_actor(factory, config, emitter)?;

        let tx = pool.cmd_tx.clone();
        tokio::spawn(async move {
            let result = ensure_assets(&manifest, &install_dir).await;
            // The pool may already be gone; discard the outcome silently.
            let _ = tx.send(PoolCommand::AcquisitionFinished { result });
        });

        Ok(pool)
    }

    /// Spawn the pool thread with acquisition left pending, for tests that
    /// drive the acquisition outcome deterministically via
    /// [`finish_acquisition_for_test`](Self::finish_acquisition_for_test).
    #[doc(hidden)]
    pub fn spawn_detached_for_test(
        factory: impl SynthesizerFactory + 'static,
        config: PoolConfig,
        emitter: Arc<dyn SpeechEventEmitter>,
    ) -> Result<Self, PoolError> {
        Self::spawn_actor(factory, config, emitter)
    }

    /// Inject an acquisition outcome, as the background task would.
    #[doc(hidden)]
    pub fn finish_acquisition_for_test(&self, result: Result<EngineAssets, AcquireError>) {
        let _ = self.cmd_tx.send(PoolCommand::AcquisitionFinished { result });
    }

    fn spawn_actor(
        factory: impl SynthesizerFactory + 'static,
        config: PoolConfig,
        emitter: Arc<dyn SpeechEventEmitter>,
    ) -> Result<Self, PoolError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PoolCommand>();

        let thread = thread::Builder::new()
            .name("squawkbox-pool".into())
            .spawn(move || {
                PoolState::new(Box::new(factory), config, emitter).run(&cmd_rx);
            })
            .map_err(PoolError::Spawn)?;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    // ── Operations ─────────────────────────────────────────────────

    /// Speak `text` on the first free instance, or on a newly created one if
    /// the pool may still grow.
    ///
    /// Returns `false` when every instance is busy and the pool is at
    /// capacity, when acquisition has not succeeded, or when an engine error
    /// prevented speaking — all expected outcomes, never panics or errors.
    pub fn try_speak(&self, text: &str) -> bool {
        let (tx, rx) = mpsc::channel();
        let sent = self.cmd_tx.send(PoolCommand::TrySpeak {
            text: text.to_string(),
            reply: tx,
        });
        if sent.is_err() {
            tracing::warn!("speech pool is closed; dropping utterance");
            return false;
        }
        rx.recv().unwrap_or(false)
    }

    /// Set the pool volume (clamped to 0–100).
    ///
    /// Takes effect per instance on its next utterance — a currently
    /// speaking instance keeps its old volume until then, because the engine
    /// cannot safely change volume mid-render.
    pub fn set_volume(&self, volume: u8) {
        let _ = self.cmd_tx.send(PoolCommand::SetVolume { volume });
    }

    /// Set the instance cap (clamped to ≥ 1). Shrinking below the current
    /// instance count shuts down the oldest-created instances first, even if
    /// they are mid-utterance.
    pub fn set_max_instances(&self, max: usize) {
        let _ = self.cmd_tx.send(PoolCommand::SetMaxInstances { max });
    }

    /// Force every instance to abandon its current utterance. No instance
    /// is destroyed.
    pub fn reset_all(&self) {
        let _ = self.cmd_tx.send(PoolCommand::ResetAll);
    }

    /// Snapshot the pool state for UI surfaces.
    pub fn status(&self) -> Result<PoolStatus, PoolError> {
        let (tx, rx) = mpsc::channel();
        self.cmd_tx
            .send(PoolCommand::Status { reply: tx })
            .map_err(|_| PoolError::Closed)?;
        rx.recv().map_err(|_| PoolError::Closed)
    }
}

impl Drop for SpeechPool {
    fn drop(&mut self) {
        // Best-effort shutdown — the thread may already be dead.
        let _ = self.cmd_tx.send(PoolCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

// ── Actor state ────────────────────────────────────────────────────

/// One pooled instance plus the volume last applied to it.
struct PooledVoice {
    voice: Box<dyn Synthesizer>,
    /// Informational mirror; may lag the pool volume until this instance's
    /// next utterance.
    volume: u8,
}

/// Acquisition progress as the actor tracks it.
enum Acquisition {
    Pending,
    Ready(EngineAssets),
    Failed,
}

/// Everything the actor thread owns. Instances never leave this thread.
struct PoolState {
    factory: Box<dyn SynthesizerFactory>,
    /// Creation order; eviction removes from the front.
    handles: Vec<PooledVoice>,
    volume: u8,
    max_instances: usize,
    acquisition: Acquisition,
    emitter: Arc<dyn SpeechEventEmitter>,
}

impl PoolState {
    fn new(
        factory: Box<dyn SynthesizerFactory>,
        config: PoolConfig,
        emitter: Arc<dyn SpeechEventEmitter>,
    ) -> Self {
        Self {
            factory,
            handles: Vec::new(),
            volume: clamp_volume(config.volume),
            max_instances: clamp_max_instances(config.max_instances),
            acquisition: Acquisition::Pending,
            emitter,
        }
    }

    /// Command loop (tight: recv → execute → reply → recv).
    fn run(mut self, cmd_rx: &mpsc::Receiver<PoolCommand>) {
        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                PoolCommand::TrySpeak { text, reply } => {
                    let _ = reply.send(self.try_speak(&text));
                }

                PoolCommand::SetVolume { volume } => self.set_volume(volume),

                PoolCommand::SetMaxInstances { max } => self.set_max_instances(max),

                PoolCommand::ResetAll => self.reset_all(),

                PoolCommand::Status { reply } => {
                    let _ = reply.send(self.status());
                }

                PoolCommand::AcquisitionFinished { result } => {
                    self.finish_acquisition(result);
                }

                PoolCommand::Shutdown => break,
            }
        }

        // Instances are dropped here, on the pool thread; each Drop attempts
        // its native shutdown independently, so one stuck instance cannot
        // block the rest.
        tracing::debug!(
            instances = self.handles.len(),
            "speech pool thread shutting down"
        );
    }

    /// First-fit scheduling: reuse the first idle instance in creation
    /// order, otherwise grow if the cap and acquisition allow it.
    fn try_speak(&mut self, text: &str) -> bool {
        let volume = self.volume;

        for (index, slot) in self.handles.iter_mut().enumerate() {
            match slot.voice.is_speaking() {
                Ok(true) => {}
                Ok(false) => return speak_on(slot, volume, text, index),
                Err(err) => {
                    // Treat as busy and keep scanning; the rest of the pool
                    // may still be healthy.
                    tracing::warn!(index, error = %err, "busy query failed; skipping instance");
                }
            }
        }

        if self.handles.len() >= self.max_instances {
            tracing::debug!(
                max_instances = self.max_instances,
                "all instances busy and pool at capacity"
            );
            return false;
        }

        let assets = match &self.acquisition {
            Acquisition::Ready(assets) => assets.clone(),
            Acquisition::Pending => {
                tracing::debug!("engine assets not ready yet; cannot grow pool");
                return false;
            }
            Acquisition::Failed => {
                tracing::debug!("engine acquisition failed; cannot grow pool");
                return false;
            }
        };

        let mut voice = match self.factory.create(&assets) {
            Ok(voice) => voice,
            Err(err) => {
                tracing::warn!(error = %err, "failed to create synthesis instance");
                return false;
            }
        };

        // A fresh instance that cannot take its volume or first utterance is
        // discarded (Drop releases it) rather than pooled in an unknown
        // state.
        if let Err(err) = voice.set_volume(volume) {
            tracing::warn!(error = %err, "failed to set volume on new instance; discarding it");
            return false;
        }
        if let Err(err) = voice.speak(text) {
            tracing::warn!(error = %err, "first utterance failed on new instance; discarding it");
            return false;
        }

        self.handles.push(PooledVoice { voice, volume });
        tracing::debug!(instances = self.handles.len(), "created synthesis instance");
        true
    }

    fn set_volume(&mut self, volume: u8) {
        let clamped = clamp_volume(volume);
        if clamped != volume {
            tracing::warn!(volume, clamped, "volume out of range; clamping");
        }
        self.volume = clamped;
        // Existing instances pick the new volume up on their next utterance;
        // pushing it now could hit one that is mid-render.
        tracing::debug!(volume = clamped, "pool volume updated");
    }

    fn set_max_instances(&mut self, max: usize) {
        let clamped = clamp_max_instances(max);
        if clamped != max {
            tracing::warn!(max, clamped, "instance cap out of range; clamping");
        }
        self.max_instances = clamped;

        if self.handles.len() > self.max_instances {
            let excess = self.handles.len() - self.max_instances;
            // Oldest-created first; a mid-utterance instance just cuts off.
            drop(self.handles.drain(..excess));
            tracing::info!(
                evicted = excess,
                remaining = self.handles.len(),
                "pool shrunk to new instance cap"
            );
        } else {
            tracing::debug!(max_instances = clamped, "instance cap updated");
        }
    }

    fn reset_all(&mut self) {
        for (index, slot) in self.handles.iter_mut().enumerate() {
            if let Err(err) = slot.voice.reset() {
                tracing::warn!(index, error = %err, "failed to reset instance");
            }
        }
    }

    fn status(&self) -> PoolStatus {
        PoolStatus {
            acquisition: match self.acquisition {
                Acquisition::Pending => AcquisitionStatus::Pending,
                Acquisition::Ready(_) => AcquisitionStatus::Ready,
                Acquisition::Failed => AcquisitionStatus::Failed,
            },
            active_instances: self.handles.len(),
            max_instances: self.max_instances,
            volume: self.volume,
        }
    }

    fn finish_acquisition(&mut self, result: Result<EngineAssets, AcquireError>) {
        match result {
            Ok(assets) => {
                tracing::info!(
                    module = %assets.module.display(),
                    "engine ready; pool may now grow"
                );
                self.acquisition = Acquisition::Ready(assets);
                self.emitter.emit(SpeechEvent::EngineReady);
            }
            Err(err) => {
                tracing::error!(error = %err, "engine acquisition failed; pool will never grow");
                self.acquisition = Acquisition::Failed;
                self.emitter.emit(SpeechEvent::AcquisitionFailed {
                    error: err.to_string(),
                });
            }
        }
    }
}

/// Re-apply the pool volume (the instance is known idle here — the one safe
/// moment) and speak. Engine errors leave the instance pooled but fail the
/// request.
fn speak_on(slot: &mut PooledVoice, volume: u8, text: &str, index: usize) -> bool {
    if let Err(err) = slot.voice.set_volume(volume) {
        tracing::warn!(index, error = %err, "failed to set volume on instance");
        return false;
    }
    slot.volume = volume;

    if let Err(err) = slot.voice.speak(text) {
        tracing::warn!(index, error = %err, "failed to speak on instance");
        return false;
    }

    tracing::debug!(index, "utterance submitted");
    true
}
