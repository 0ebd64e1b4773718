//! Dispatcher state and the state machine that owns it
//!
//! - `SharedState`: alarm flag, error budget and button arming behind one lock
//! - `ErrorBudget`: consecutive-error counter with escalation to exit
//! - `Dispatcher`: reacts to recognizer events one at a time

mod budget;
mod machine;
mod shared;

pub use budget::DEFAULT_ERROR_BUDGET;
pub use machine::{Collaborators, Dispatcher};
pub use shared::{DispatcherState, SharedState};
