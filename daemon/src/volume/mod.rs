//! Volume ducking policy and the playback device it drives

mod device;
mod ducking;

pub use device::JsonRpcPlayback;
#[cfg(test)]
pub use device::PlaybackDevice;
pub use ducking::{DuckLevel, VolumeDucker};
