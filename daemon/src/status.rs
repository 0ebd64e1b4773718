//! Conversation status shown on the status light

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

/// Status names understood by the status-light driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Recognizer not started yet
    Starting,
    /// Waiting for the hot word or the button
    Ready,
    /// Capturing the user's utterance
    Listening,
    /// Waiting for the assistant's answer
    Thinking,
}

impl Default for Status {
    fn default() -> Self {
        Self::Starting
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Starting => write!(f, "starting"),
            Status::Ready => write!(f, "ready"),
            Status::Listening => write!(f, "listening"),
            Status::Thinking => write!(f, "thinking"),
        }
    }
}

/// Sink for status changes
pub trait StatusIndicator: Send + Sync {
    fn set_status(&self, status: Status);
}

/// Publishes the status on a watch channel read by the IPC server
#[derive(Debug)]
pub struct WatchStatus {
    tx: watch::Sender<Status>,
}

impl WatchStatus {
    /// Create the indicator and the receiver the IPC server reads
    pub fn channel() -> (Self, watch::Receiver<Status>) {
        let (tx, rx) = watch::channel(Status::default());
        (Self { tx }, rx)
    }
}

impl StatusIndicator for WatchStatus {
    fn set_status(&self, status: Status) {
        debug!(%status, "status changed");
        // Keeps the value even when no client is subscribed
        self.tx.send_replace(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&Status::Listening).unwrap();
        assert_eq!(json, r#""listening""#);
    }

    #[tokio::test]
    async fn test_watch_publishes_changes() {
        let (indicator, mut rx) = WatchStatus::channel();
        assert_eq!(*rx.borrow(), Status::Starting);

        indicator.set_status(Status::Ready);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Status::Ready);
    }
}
