//! Local voice commands
//!
//! A small fixed table of phrases handled on the device instead of by the
//! assistant, and the runner that carries them out.

mod actions;
mod table;

pub use actions::ActionRunner;
pub use table::CommandTable;
