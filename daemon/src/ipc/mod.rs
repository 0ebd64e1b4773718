//! IPC module for the status-light driver and button helper

mod protocol;
mod server;

pub use server::Server;
