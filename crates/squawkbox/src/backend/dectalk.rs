//! DECtalk engine backend — implements [`Synthesizer`] over the runtime
//! binding crate.
//!
//! The engine module is the file the acquisition step downloaded, so the
//! factory loads it lazily on the first `create`: a load failure then
//! surfaces as an ordinary per-create [`EngineError`] instead of poisoning
//! pool construction, and later attempts can still succeed (e.g. after the
//! host fixes a platform issue).

use squawkbox_dectalk::{CallError, DecTalk, DecTalkVoice};

use crate::assets::EngineAssets;
use crate::backend::{EngineError, Synthesizer, SynthesizerFactory};

/// Factory producing DECtalk-backed synthesis instances.
#[derive(Default)]
pub struct DecTalkFactory {
    /// Loaded lazily on the first `create`.
    engine: Option<DecTalk>,
}

impl DecTalkFactory {
    /// Create a factory. The engine module is not touched until the first
    /// instance is requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SynthesizerFactory for DecTalkFactory {
    fn create(&mut self, assets: &EngineAssets) -> Result<Box<dyn Synthesizer>, EngineError> {
        if self.engine.is_none() {
            let engine = DecTalk::open(&assets.module)
                .map_err(|e| EngineError::Unavailable(e.to_string()))?;
            self.engine = Some(engine);
        }
        let Some(engine) = self.engine.as_ref() else {
            return Err(EngineError::Unavailable("engine module not loaded".into()));
        };

        let voice = engine.create_voice(&assets.dictionary).map_err(map_call)?;
        Ok(Box::new(DecTalkSynthesizer { voice }))
    }
}

/// One DECtalk instance behind the engine-agnostic trait.
struct DecTalkSynthesizer {
    voice: DecTalkVoice,
}

impl Synthesizer for DecTalkSynthesizer {
    fn speak(&mut self, text: &str) -> Result<(), EngineError> {
        self.voice.speak(text).map_err(map_call)
    }

    fn set_volume(&mut self, volume: u8) -> Result<(), EngineError> {
        self.voice.set_volume(i32::from(volume)).map_err(map_call)
    }

    fn is_speaking(&mut self) -> Result<bool, EngineError> {
        self.voice.is_speaking().map_err(map_call)
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        self.voice.reset().map_err(map_call)
    }
}

fn map_call(err: CallError) -> EngineError {
    EngineError::Call {
        call: err.function,
        code: err.code,
    }
}
