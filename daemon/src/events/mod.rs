//! Events module for recognizer notifications
//!
//! Provides the event record produced by the recognizer bridge and the
//! closed set of event kinds the dispatcher reacts to.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kinds of event emitted by the recognizer
///
/// Anything outside the known set is carried as `Other` so it can still be
/// logged by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Recognizer finished starting up
    StartFinished,
    /// A conversation turn started (hot word or button)
    ConversationTurnStarted,
    /// The microphone mute state changed
    MutedChanged,
    /// The user's utterance was transcribed
    RecognizingSpeechFinished,
    /// The assistant rendered a text response
    RenderResponse,
    /// The user stopped speaking
    EndOfUtterance,
    /// The conversation turn completed
    ConversationTurnFinished,
    /// The assistant started speaking
    RespondingStarted,
    /// The assistant finished speaking
    RespondingFinished,
    /// An alarm or timer started sounding
    AlertStarted,
    /// An alarm or timer stopped sounding
    AlertFinished,
    /// The turn timed out waiting for speech
    ConversationTurnTimeout,
    /// The assistant reported an error
    AssistantError,
    /// Unrecognized kind, kept by name
    Other(String),
}

impl EventKind {
    /// Parse a kind name, accepting `ON_`-prefixed and lowercase spellings
    pub fn from_name(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("ON_").unwrap_or(&upper);
        match bare {
            "START_FINISHED" => Self::StartFinished,
            "CONVERSATION_TURN_STARTED" => Self::ConversationTurnStarted,
            "MUTED_CHANGED" => Self::MutedChanged,
            "RECOGNIZING_SPEECH_FINISHED" => Self::RecognizingSpeechFinished,
            "RENDER_RESPONSE" => Self::RenderResponse,
            "END_OF_UTTERANCE" => Self::EndOfUtterance,
            "CONVERSATION_TURN_FINISHED" => Self::ConversationTurnFinished,
            "RESPONDING_STARTED" => Self::RespondingStarted,
            "RESPONDING_FINISHED" => Self::RespondingFinished,
            "ALERT_STARTED" => Self::AlertStarted,
            "ALERT_FINISHED" => Self::AlertFinished,
            "CONVERSATION_TURN_TIMEOUT" => Self::ConversationTurnTimeout,
            "ASSISTANT_ERROR" => Self::AssistantError,
            _ => Self::Other(name.to_string()),
        }
    }

    /// Canonical upper-case name of this kind
    pub fn name(&self) -> &str {
        match self {
            Self::StartFinished => "START_FINISHED",
            Self::ConversationTurnStarted => "CONVERSATION_TURN_STARTED",
            Self::MutedChanged => "MUTED_CHANGED",
            Self::RecognizingSpeechFinished => "RECOGNIZING_SPEECH_FINISHED",
            Self::RenderResponse => "RENDER_RESPONSE",
            Self::EndOfUtterance => "END_OF_UTTERANCE",
            Self::ConversationTurnFinished => "CONVERSATION_TURN_FINISHED",
            Self::RespondingStarted => "RESPONDING_STARTED",
            Self::RespondingFinished => "RESPONDING_FINISHED",
            Self::AlertStarted => "ALERT_STARTED",
            Self::AlertFinished => "ALERT_FINISHED",
            Self::ConversationTurnTimeout => "CONVERSATION_TURN_TIMEOUT",
            Self::AssistantError => "ASSISTANT_ERROR",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.name().to_string()
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single event from the recognizer stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl AssistantEvent {
    /// Create an event with no arguments
    #[cfg(test)]
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            args: Map::new(),
        }
    }

    /// Add an argument
    #[cfg(test)]
    pub fn with_arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.args.insert(key.to_string(), value.into());
        self
    }

    /// The `text` argument, if present and a string
    pub fn text(&self) -> Option<&str> {
        self.args.get("text").and_then(Value::as_str)
    }

    /// Whether the `is_fatal` argument is set to true
    pub fn is_fatal(&self) -> bool {
        self.args
            .get("is_fatal")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_accepts_prefixed_names() {
        assert_eq!(
            EventKind::from_name("ON_START_FINISHED"),
            EventKind::StartFinished
        );
        assert_eq!(
            EventKind::from_name("alert_finished"),
            EventKind::AlertFinished
        );
    }

    #[test]
    fn test_unknown_kind_keeps_name() {
        let kind = EventKind::from_name("ON_MEDIA_TRACK_LOAD");
        assert_eq!(kind, EventKind::Other("ON_MEDIA_TRACK_LOAD".into()));
        assert_eq!(kind.to_string(), "ON_MEDIA_TRACK_LOAD");
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"ON_RECOGNIZING_SPEECH_FINISHED","args":{"text":"IP Address"}}"#;
        let event: AssistantEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, EventKind::RecognizingSpeechFinished);
        assert_eq!(event.text(), Some("IP Address"));
    }

    #[test]
    fn test_event_without_args() {
        let event: AssistantEvent = serde_json::from_str(r#"{"type":"END_OF_UTTERANCE"}"#).unwrap();
        assert!(event.args.is_empty());
        assert_eq!(event.text(), None);
        assert!(!event.is_fatal());
    }

    #[test]
    fn test_is_fatal_flag() {
        let fatal = AssistantEvent::new(EventKind::AssistantError).with_arg("is_fatal", true);
        assert!(fatal.is_fatal());

        let odd = AssistantEvent::new(EventKind::AssistantError).with_arg("is_fatal", "yes");
        assert!(!odd.is_fatal());
    }

    #[test]
    fn test_event_serialization() {
        let event = AssistantEvent::new(EventKind::AlertStarted);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("ALERT_STARTED"));
    }
}
