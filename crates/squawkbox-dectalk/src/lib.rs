//! Runtime bindings to the DECtalk speech engine.
//!
//! The engine ships as a native module plus a pronunciation dictionary, both
//! fetched by the host at runtime — nothing here links at build time.
//! [`DecTalk::open`] loads the module and resolves its entry points;
//! [`DecTalk::create_voice`] then allocates synthesis instances bound to the
//! dictionary.
//!
//! Instance handles are raw engine pointers and therefore `!Send`. Callers
//! are expected to confine [`DecTalkVoice`] values to a single thread; the
//! pool crate runs them on a dedicated actor thread for exactly this reason.

mod error;
mod sys;

use std::ffi::CString;
use std::path::Path;
use std::sync::Arc;

pub use error::{CallError, LoadError};

/// A loaded engine module with its entry points resolved.
///
/// Voices created from it share the module via `Arc`; the module stays
/// mapped until the last voice and this value are dropped.
pub struct DecTalk {
    api: Arc<sys::Api>,
}

impl DecTalk {
    /// Load the engine module from `module` and resolve its entry points.
    pub fn open(module: &Path) -> Result<Self, LoadError> {
        let api = sys::Api::load(module)?;
        tracing::info!(path = %module.display(), "engine module loaded");
        Ok(Self { api: Arc::new(api) })
    }

    /// Allocate one synthesis instance bound to the pronunciation dictionary.
    pub fn create_voice(&self, dictionary: &Path) -> Result<DecTalkVoice, CallError> {
        let dict = c_string(&dictionary.to_string_lossy());
        let mut handle: sys::TtsHandle = std::ptr::null_mut();

        let code = unsafe {
            (self.api.startup)(
                &mut handle,
                sys::WAVE_MAPPER,
                0,
                std::ptr::null(),
                0,
                dict.as_ptr(),
            )
        };
        check("TextToSpeechStartupExFonix", code)?;

        tracing::debug!("synthesis instance started");
        Ok(DecTalkVoice {
            api: Arc::clone(&self.api),
            handle,
        })
    }
}

/// One native synthesis instance.
///
/// Dropping the value shuts the instance down exactly once; a failed
/// shutdown is logged, never raised.
pub struct DecTalkVoice {
    api: Arc<sys::Api>,
    handle: sys::TtsHandle,
}

impl DecTalkVoice {
    /// Submit an utterance, preempting anything the instance is rendering.
    ///
    /// Submission only: the call returns as soon as the engine accepts the
    /// text, while rendering continues in the background.
    pub fn speak(&mut self, text: &str) -> Result<(), CallError> {
        let text = c_string(text);
        let code = unsafe { (self.api.speak)(self.handle, text.as_ptr(), sys::SPEAK_FORCE) };
        check("TextToSpeechSpeak", code)
    }

    /// Set the main output volume (0–100).
    ///
    /// The engine corrupts its heap if the volume is changed while the
    /// instance is rendering; callers must only invoke this on an instance
    /// they know to be idle.
    pub fn set_volume(&mut self, volume: i32) -> Result<(), CallError> {
        let code = unsafe { (self.api.set_volume)(self.handle, sys::VOLUME_MAIN, volume) };
        check("TextToSpeechSetVolume", code)
    }

    /// Live busy query: is the instance currently rendering speech?
    pub fn is_speaking(&mut self) -> Result<bool, CallError> {
        let identifiers = [sys::STATUS_SPEAKING];
        let mut statuses = [0u32];

        let code = unsafe {
            (self.api.get_status)(self.handle, identifiers.as_ptr(), statuses.as_mut_ptr(), 1)
        };
        check("TextToSpeechGetStatus", code)?;

        Ok(statuses[0] != 0)
    }

    /// Return the instance to a known idle state, discarding queued speech.
    pub fn reset(&mut self) -> Result<(), CallError> {
        let code = unsafe { (self.api.reset)(self.handle, 1) };
        check("TextToSpeechReset", code)
    }
}

impl Drop for DecTalkVoice {
    fn drop(&mut self) {
        let code = unsafe { (self.api.shutdown)(self.handle) };
        if code == 0 {
            tracing::debug!("synthesis instance shut down");
        } else {
            tracing::warn!(code, "TextToSpeechShutdown failed");
        }
    }
}

fn check(function: &'static str, code: u32) -> Result<(), CallError> {
    if code == 0 {
        Ok(())
    } else {
        Err(CallError { function, code })
    }
}

/// NUL bytes cannot cross the C boundary; truncate at the first one.
fn c_string(text: &str) -> CString {
    let end = text.find('\0').unwrap_or(text.len());
    CString::new(&text[..end]).unwrap_or_default()
}
