//! Messages exchanged with the recognizer bridge
//!
//! One JSON object per line in both directions: events arrive on the
//! bridge's stdout, session commands go to its stdin.

use serde::{Deserialize, Serialize};

use crate::events::AssistantEvent;

/// Commands sent to the recognizer session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionCommand {
    /// Begin a new conversation turn as if the hot word was heard
    StartConversation,
    /// End the current turn; a no-op on the bridge when none is active
    StopConversation,
    /// Submit a typed query to the assistant
    SendTextQuery { text: String },
}

impl SessionCommand {
    /// Encode as a newline-terminated JSON line
    pub fn to_line(&self) -> serde_json::Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

/// Decode one line of bridge output; blank lines yield `None`
pub fn parse_event_line(line: &str) -> Option<serde_json::Result<AssistantEvent>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str(line))
}
