//! Core event dispatcher
//!
//! Reacts to recognizer events one at a time: drives the status light, the
//! volume ducking policy and local commands, and tracks the alarm flag and
//! the consecutive-error budget in the shared state.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::commands::{ActionRunner, CommandTable};
use crate::events::{AssistantEvent, EventKind};
use crate::lifecycle::{Disposition, ExitReason};
use crate::recognizer::Session;
use crate::speech::Speaker;
use crate::status::{Status, StatusIndicator};
use crate::volume::{DuckLevel, VolumeDucker};

use super::shared::SharedState;

/// External services the dispatcher drives
pub struct Collaborators {
    pub session: Arc<dyn Session>,
    pub speaker: Arc<dyn Speaker>,
    pub status: Arc<dyn StatusIndicator>,
    pub volume: VolumeDucker,
    pub actions: ActionRunner,
}

/// The session state machine
pub struct Dispatcher {
    state: SharedState,
    session: Arc<dyn Session>,
    speaker: Arc<dyn Speaker>,
    status: Arc<dyn StatusIndicator>,
    volume: VolumeDucker,
    actions: ActionRunner,
    commands: CommandTable,
    greeting: String,
}

impl Dispatcher {
    pub fn new(
        state: SharedState,
        collaborators: Collaborators,
        commands: CommandTable,
        greeting: impl Into<String>,
    ) -> Self {
        Self {
            state,
            session: collaborators.session,
            speaker: collaborators.speaker,
            status: collaborators.status,
            volume: collaborators.volume,
            actions: collaborators.actions,
            commands,
            greeting: greeting.into(),
        }
    }

    /// Shared state handle, for the button trigger and IPC server
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Consume events in delivery order until the stream ends or the daemon
    /// has to exit
    ///
    /// Each event is handled in its own task so a panicking handler is
    /// logged instead of stopping the loop.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<AssistantEvent>) -> Option<ExitReason> {
        info!("dispatcher started");

        while let Some(event) = events.recv().await {
            let kind = event.kind.clone();
            let dispatcher = Arc::clone(&self);
            match tokio::spawn(async move { dispatcher.handle(event).await }).await {
                Ok(Disposition::Continue) => {}
                Ok(Disposition::Exit(reason)) => {
                    info!(%reason, code = reason.code(), "dispatcher stopping");
                    return Some(reason);
                }
                Err(e) => {
                    error!(%kind, error = %e, "event handler failed");
                }
            }
        }

        info!("event stream closed");
        None
    }

    /// React to a single event
    pub async fn handle(&self, event: AssistantEvent) -> Disposition {
        info!(kind = %event.kind, "processing event");

        match &event.kind {
            EventKind::StartFinished => self.on_start_finished().await,
            EventKind::ConversationTurnStarted | EventKind::MutedChanged => {
                self.status.set_status(Status::Listening);
                self.volume.set_level(DuckLevel::Ducked).await;
            }
            EventKind::RecognizingSpeechFinished => return self.on_speech_recognized(&event).await,
            EventKind::RenderResponse => match event.text() {
                Some(text) => info!(text, "assistant response"),
                None => warn!("render response event without text"),
            },
            EventKind::EndOfUtterance => self.status.set_status(Status::Thinking),
            EventKind::ConversationTurnFinished => {
                self.state.lock().error_budget.reset();
                self.status.set_status(Status::Ready);
                self.volume.set_level(DuckLevel::Normal).await;
            }
            EventKind::RespondingStarted => self.volume.set_level(DuckLevel::Ducked).await,
            EventKind::RespondingFinished => self.volume.set_level(DuckLevel::Normal).await,
            EventKind::AlertStarted => {
                self.state.lock().alarm_buzzing = true;
                self.volume.set_level(DuckLevel::Ducked).await;
            }
            EventKind::AlertFinished => {
                self.state.lock().alarm_buzzing = false;
                self.volume.set_level(DuckLevel::Normal).await;
            }
            EventKind::ConversationTurnTimeout => self.volume.set_level(DuckLevel::Normal).await,
            EventKind::AssistantError => return self.on_assistant_error(&event).await,
            EventKind::Other(name) => info!(kind = %name, "unknown event type"),
        }

        Disposition::Continue
    }

    async fn on_start_finished(&self) {
        self.volume.set_level(DuckLevel::Ducked).await;
        self.status.set_status(Status::Ready);
        self.state.lock().button_armed = true;
        if let Err(e) = self.speaker.say(&self.greeting).await {
            warn!(error = %e, "failed to speak greeting");
        }
        self.volume.set_level(DuckLevel::Normal).await;
    }

    async fn on_speech_recognized(&self, event: &AssistantEvent) -> Disposition {
        let Some(text) = event.text() else {
            warn!("speech recognized event without text");
            return Disposition::Continue;
        };
        info!(text, "you said");
        self.state.lock().error_budget.reset();

        let Some(command) = self.commands.lookup(text) else {
            debug!(text, "no local command");
            return Disposition::Continue;
        };

        if let Err(e) = self.session.stop_conversation().await {
            warn!(error = %e, "failed to stop conversation");
        }
        self.actions.run(command).await
    }

    async fn on_assistant_error(&self, event: &AssistantEvent) -> Disposition {
        if event.is_fatal() {
            error!("fatal assistant error, exiting");
            return Disposition::Exit(ExitReason::FatalAssistantError);
        }

        self.status.set_status(Status::Ready);
        let (exhausted, remaining) = {
            let mut state = self.state.lock();
            let exhausted = state.error_budget.decrement_and_check();
            (exhausted, state.error_budget.remaining())
        };

        if exhausted {
            error!("too many consecutive assistant errors, exiting");
            return Disposition::Exit(ExitReason::ErrorBudgetExhausted);
        }

        warn!(remaining, "assistant error");
        self.volume.set_level(DuckLevel::Normal).await;
        Disposition::Continue
    }
}
