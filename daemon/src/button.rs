//! Hardware button trigger
//!
//! A press silences a sounding alarm, or otherwise starts a new
//! conversation turn. Presses arrive independently of the recognizer
//! stream, so the alarm flag is checked and cleared under the shared lock.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::recognizer::Session;
use crate::state::SharedState;

/// Text query that silences an alarm
pub const STOP_QUERY: &str = "stop";

/// A single press of the button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPress;

/// What a press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonOutcome {
    /// The recognizer has not started yet
    Ignored,
    /// A sounding alarm was stopped
    SilencedAlarm,
    /// A new conversation turn was started
    StartedTurn,
}

/// Handles button presses against the live session
pub struct ButtonTrigger {
    state: SharedState,
    session: Arc<dyn Session>,
}

impl ButtonTrigger {
    pub fn new(state: SharedState, session: Arc<dyn Session>) -> Self {
        Self { state, session }
    }

    /// Handle presses until the sender side closes
    pub async fn run(&self, mut presses: mpsc::Receiver<ButtonPress>) {
        info!("button trigger started");
        while presses.recv().await.is_some() {
            let outcome = self.on_press().await;
            debug!(?outcome, "button press handled");
        }
        info!("button trigger stopped");
    }

    /// React to one press
    pub async fn on_press(&self) -> ButtonOutcome {
        let silence_alarm = {
            let mut state = self.state.lock();
            if !state.button_armed {
                debug!("button pressed before recognizer started");
                return ButtonOutcome::Ignored;
            }
            std::mem::replace(&mut state.alarm_buzzing, false)
        };

        if silence_alarm {
            info!("button pressed, stopping the alarm");
            if let Err(e) = self.session.send_text_query(STOP_QUERY).await {
                warn!(error = %e, "failed to send stop query");
            }
            return ButtonOutcome::SilencedAlarm;
        }

        info!("button pressed, listening");
        if let Err(e) = self.session.stop_conversation().await {
            warn!(error = %e, "failed to stop conversation");
        }
        if let Err(e) = self.session.start_conversation().await {
            warn!(error = %e, "failed to start conversation");
        }
        ButtonOutcome::StartedTurn
    }
}
