//! Spoken output

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::config::SpeechConfig;
use crate::exec;

/// Upper bound for rendering one phrase
const SPEECH_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can say a phrase out loud
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Speak `text`, returning once playback has finished
    async fn say(&self, text: &str) -> Result<()>;
}

/// Speaks by running a TTS program with the text as its last argument
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait]
impl Speaker for CommandSpeaker {
    async fn say(&self, text: &str) -> Result<()> {
        debug!(text, program = %self.program, "speaking");
        let mut args = self.args.clone();
        args.push(text.to_string());
        exec::run(&self.program, &args, SPEECH_TIMEOUT).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_text_as_last_argument() {
        let speaker = CommandSpeaker::new(&SpeechConfig {
            program: "echo".into(),
            args: vec!["-n".into()],
        });
        speaker.say("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let speaker = CommandSpeaker::new(&SpeechConfig {
            program: "/nonexistent/tts".into(),
            args: Vec::new(),
        });
        assert!(speaker.say("hello").await.is_err());
    }
}
