//! Connection to the external speech recognizer
//!
//! The recognizer runs as a bridge process. It streams events to the
//! dispatcher and accepts session commands back.

mod bridge;
mod protocol;

use anyhow::Result;
use async_trait::async_trait;

pub use bridge::Bridge;

/// Handle to the live conversation session
#[async_trait]
pub trait Session: Send + Sync {
    /// Start a conversation turn
    async fn start_conversation(&self) -> Result<()>;

    /// Stop the current turn; harmless when no turn is active
    async fn stop_conversation(&self) -> Result<()>;

    /// Send a text query as if it had been spoken
    async fn send_text_query(&self, text: &str) -> Result<()>;
}
