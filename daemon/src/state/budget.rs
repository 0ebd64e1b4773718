//! Consecutive-error budget
//!
//! Counts down on each recoverable assistant error and refills on any
//! successful recognition or completed turn.

/// Default number of consecutive recoverable errors tolerated
pub const DEFAULT_ERROR_BUDGET: u8 = 3;

/// Remaining tolerated consecutive errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorBudget {
    remaining: u8,
    limit: u8,
}

impl ErrorBudget {
    /// Create a full budget; a limit of zero is raised to one
    pub fn new(limit: u8) -> Self {
        let limit = limit.max(1);
        Self {
            remaining: limit,
            limit,
        }
    }

    /// Refill the budget
    pub fn reset(&mut self) {
        self.remaining = self.limit;
    }

    /// Spend one error; returns true once the budget is exhausted
    pub fn decrement_and_check(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }

    /// Errors still tolerated
    pub fn remaining(&self) -> u8 {
        self.remaining
    }
}

impl Default for ErrorBudget {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_BUDGET)
    }
}
