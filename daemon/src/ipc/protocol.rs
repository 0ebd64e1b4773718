//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::state::DispatcherState;
use crate::status::Status;

/// Requests from the status-light driver or button helper to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current daemon status
    GetStatus,

    /// The hardware button was pressed
    ButtonPressed,

    /// Ping to check connectivity
    Ping,

    /// Switch this connection to status change notifications
    Subscribe,
}

/// Responses from daemon to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current daemon status
    Status(DaemonStatus),

    /// Button press queued for the trigger
    ButtonAccepted,

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

/// Push notification from daemon to subscribed clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// The conversation status changed
    StatusChanged { status: Status },
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Current conversation status
    pub status: Status,

    /// An alert is sounding
    pub alarm_buzzing: bool,

    /// Consecutive assistant errors still tolerated
    pub error_budget: u8,

    /// Whether button presses are being handled
    pub button_armed: bool,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl DaemonStatus {
    /// Build from one consistent copy of the dispatcher state
    pub fn new(status: Status, state: &DispatcherState, uptime_secs: u64) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            status,
            alarm_buzzing: state.alarm_buzzing,
            error_budget: state.error_budget.remaining(),
            button_armed: state.button_armed,
            uptime_secs,
        }
    }
}
