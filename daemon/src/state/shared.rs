//! Dispatcher state shared with the button trigger and IPC server
//!
//! Every field lives behind one lock so readers always see a consistent
//! record. The lock is never held across an `.await`.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::budget::ErrorBudget;

/// Cross-event state owned by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherState {
    /// An alert is currently sounding
    pub alarm_buzzing: bool,
    /// Remaining tolerated consecutive assistant errors
    pub error_budget: ErrorBudget,
    /// Set once the recognizer has started; button presses are ignored before
    pub button_armed: bool,
}

impl DispatcherState {
    pub fn new(error_budget: u8) -> Self {
        Self {
            alarm_buzzing: false,
            error_budget: ErrorBudget::new(error_budget),
            button_armed: false,
        }
    }
}

impl Default for DispatcherState {
    fn default() -> Self {
        Self {
            alarm_buzzing: false,
            error_budget: ErrorBudget::default(),
            button_armed: false,
        }
    }
}

/// Cloneable handle to the single synchronized state record
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<DispatcherState>>,
}

impl SharedState {
    pub fn new(error_budget: u8) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DispatcherState::new(error_budget))),
        }
    }

    /// Lock the record for a read-modify-write
    pub fn lock(&self) -> MutexGuard<'_, DispatcherState> {
        self.inner.lock()
    }

    /// Copy of the whole record
    pub fn snapshot(&self) -> DispatcherState {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = SharedState::new(3);
        let snapshot = state.snapshot();
        assert!(!snapshot.alarm_buzzing);
        assert!(!snapshot.button_armed);
        assert_eq!(snapshot.error_budget.remaining(), 3);
    }

    #[test]
    fn test_clones_share_the_record() {
        let state = SharedState::default();
        let other = state.clone();
        other.lock().alarm_buzzing = true;
        assert!(state.snapshot().alarm_buzzing);
    }

    #[test]
    fn test_concurrent_writers_do_not_tear() {
        let state = SharedState::new(200);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        let mut guard = state.lock();
                        guard.error_budget.decrement_and_check();
                        guard.alarm_buzzing = !guard.alarm_buzzing;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let snapshot = state.snapshot();
        assert_eq!(snapshot.error_budget.remaining(), 100);
        assert!(!snapshot.alarm_buzzing);
    }
}
