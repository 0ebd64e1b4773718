//! Reasons the daemon ends itself

use std::process::ExitCode;

/// Why the daemon is exiting on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The assistant reported an unrecoverable error
    FatalAssistantError,
    /// Too many consecutive recoverable assistant errors
    ErrorBudgetExhausted,
    /// The user asked for a soft restart; the supervisor relaunches us
    SoftRestart,
    /// The recognizer bridge exited or closed its event stream
    BridgeLost,
}

impl ExitReason {
    /// Process exit status for this reason
    pub fn code(self) -> u8 {
        match self {
            ExitReason::FatalAssistantError => 1,
            ExitReason::ErrorBudgetExhausted => 2,
            ExitReason::SoftRestart => 3,
            ExitReason::BridgeLost => 4,
        }
    }
}

impl From<ExitReason> for ExitCode {
    fn from(reason: ExitReason) -> Self {
        ExitCode::from(reason.code())
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::FatalAssistantError => write!(f, "fatal assistant error"),
            ExitReason::ErrorBudgetExhausted => write!(f, "assistant error budget exhausted"),
            ExitReason::SoftRestart => write!(f, "soft restart requested"),
            ExitReason::BridgeLost => write!(f, "recognizer bridge lost"),
        }
    }
}

/// Outcome of handling one event or running one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    Exit(ExitReason),
}
