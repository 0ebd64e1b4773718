//! Typed errors for external collaborators

use std::time::Duration;

/// Failures talking to a device on the network
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("device at {url} is unreachable: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("playback RPC failed: {0}")]
    Rpc(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid MAC address: {0}")]
    InvalidMac(String),

    #[error("unknown device: {0}")]
    UnknownDevice(String),

    #[error("{program} exited with {status}")]
    CommandFailed { program: String, status: String },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures on the recognizer bridge
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("failed to spawn recognizer bridge {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("recognizer bridge is missing its {0} pipe")]
    MissingPipe(&'static str),

    #[error("failed to write session command: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to encode session command: {0}")]
    Encode(#[from] serde_json::Error),
}
