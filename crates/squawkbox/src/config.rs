//! Pool configuration DTO.

use serde::{Deserialize, Serialize};

/// Configuration for a [`SpeechPool`](crate::pool::SpeechPool).
///
/// Serializable so hosts can persist it alongside their own settings. Both
/// fields also accept live updates through the pool's `set_volume` /
/// `set_max_instances` operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    /// Output volume, 0–100. Applied to each instance immediately before it
    /// speaks.
    pub volume: u8,

    /// Maximum number of concurrent synthesis instances (≥ 1).
    pub max_instances: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            volume: 50,
            max_instances: 5,
        }
    }
}

/// Clamp a volume value into the engine's 0–100 range.
pub(crate) fn clamp_volume(volume: u8) -> u8 {
    volume.min(100)
}

/// Clamp an instance cap to the minimum of one.
pub(crate) fn clamp_max_instances(max: usize) -> usize {
    max.max(1)
}
