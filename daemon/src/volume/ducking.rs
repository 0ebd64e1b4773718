//! Volume ducking around spoken responses

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DeviceError;

use super::device::PlaybackDevice;

/// Playback level requested by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuckLevel {
    /// Regular listening volume
    Normal,
    /// Lowered so the assistant can be heard
    Ducked,
}

impl std::fmt::Display for DuckLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuckLevel::Normal => write!(f, "normal"),
            DuckLevel::Ducked => write!(f, "ducked"),
        }
    }
}

/// Applies duck levels to the playback device, skipping repeats
pub struct VolumeDucker {
    device: Arc<dyn PlaybackDevice>,
    ducked_volume: u8,
    normal_volume: u8,
    /// Last level the device accepted
    applied: Mutex<Option<DuckLevel>>,
}

impl VolumeDucker {
    pub fn new(device: Arc<dyn PlaybackDevice>, ducked_volume: u8, normal_volume: u8) -> Self {
        Self {
            device,
            ducked_volume,
            normal_volume,
            applied: Mutex::new(None),
        }
    }

    /// Device volume for a level
    pub fn volume_for(&self, level: DuckLevel) -> u8 {
        match level {
            DuckLevel::Normal => self.normal_volume,
            DuckLevel::Ducked => self.ducked_volume,
        }
    }

    /// Request a level; failures are logged and swallowed
    pub async fn set_level(&self, level: DuckLevel) {
        if *self.applied.lock() == Some(level) {
            debug!(%level, "volume already at level");
            return;
        }

        let volume = self.volume_for(level);
        match self.device.set_volume(volume).await {
            Ok(()) => {
                debug!(%level, volume, "volume set");
                *self.applied.lock() = Some(level);
            }
            Err(DeviceError::Unreachable { url, .. }) => {
                warn!(%level, %url, "playback device not reachable");
            }
            Err(e) => {
                warn!(%level, error = %e, "failed to set playback volume");
            }
        }
    }

    /// Last level the device accepted, if any
    #[cfg(test)]
    pub fn applied(&self) -> Option<DuckLevel> {
        *self.applied.lock()
    }
}
