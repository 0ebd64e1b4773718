//! Process lifecycle: signal shutdown and self-initiated exits

mod exit;
mod shutdown;

pub use exit::{Disposition, ExitReason};
pub use shutdown::ShutdownSignal;
