//! voicebox-daemon: session dispatcher for a voice-assistant appliance
//!
//! This daemon runs under a process supervisor and provides:
//! - Event dispatch from the recognizer bridge to the status light, speaker
//!   and playback volume
//! - A small table of local voice commands (power, reboot, network devices)
//! - Button handling that silences alarms or starts a conversation turn
//! - IPC server for the status-light driver and the button helper
//!
//! Exit status tells the supervisor what happened: 1 for a fatal assistant
//! error, 2 once the error budget is spent, 3 for a requested soft restart,
//! 4 when the recognizer bridge goes away.

mod button;
mod commands;
mod config;
mod devices;
mod error;
mod events;
mod exec;
mod host;
mod ipc;
mod lifecycle;
mod recognizer;
mod speech;
mod state;
mod status;
mod volume;

#[cfg(test)]
mod testing;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::button::ButtonTrigger;
use crate::commands::{ActionRunner, CommandTable};
use crate::config::Config;
use crate::devices::NetworkDevices;
use crate::host::SystemHost;
use crate::ipc::Server;
use crate::lifecycle::{ExitReason, ShutdownSignal};
use crate::recognizer::Bridge;
use crate::speech::CommandSpeaker;
use crate::state::{Collaborators, Dispatcher, SharedState};
use crate::status::WatchStatus;
use crate::volume::{JsonRpcPlayback, VolumeDucker};

/// Presses waiting for the trigger; extra presses are refused
const BUTTON_QUEUE: usize = 8;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "voicebox-daemon starting"
    );

    match run().await {
        Ok(code) => code,
        Err(e) => {
            error!(?e, "voicebox-daemon failed");
            ExitCode::FAILURE
        }
    }
}

/// Build the daemon and run it until something ends it
///
/// Once the main loop ends the bridge child is stopped before the exit
/// status is returned.
async fn run() -> Result<ExitCode> {
    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, devices = config.devices.len(), "configuration loaded");

    // Create shutdown signal handler
    let mut shutdown = ShutdownSignal::new()?;

    let (status_light, status_rx) = WatchStatus::channel();

    // Recognizer bridge -> dispatcher
    let Bridge {
        session,
        events,
        task: mut bridge_task,
    } = Bridge::spawn(&config.recognizer)?;
    let session = Arc::new(session);

    let speaker = Arc::new(CommandSpeaker::new(&config.speech));
    let playback = Arc::new(JsonRpcPlayback::new(&config.playback)?);
    let devices = Arc::new(NetworkDevices::new(&config.devices, config.admin.clone())?);
    let host = Arc::new(SystemHost::new(config.host.clone()));

    let device_names: Vec<&str> = config.devices.iter().map(|d| d.name.as_str()).collect();
    let commands = CommandTable::new(&device_names[..]);
    info!(phrases = commands.len(), "command table built");

    let collaborators = Collaborators {
        session: session.clone(),
        speaker: speaker.clone(),
        status: Arc::new(status_light),
        volume: VolumeDucker::new(
            playback,
            config.playback.ducked_volume,
            config.playback.normal_volume,
        ),
        actions: ActionRunner::new(speaker, host, devices),
    };
    let dispatcher = Arc::new(Dispatcher::new(
        SharedState::new(config.error_budget),
        collaborators,
        commands,
        config.greeting.clone(),
    ));

    // IPC server -> button trigger
    let (button_tx, button_rx) = mpsc::channel(BUTTON_QUEUE);
    let trigger = ButtonTrigger::new(dispatcher.state().clone(), session);
    let server = Server::new(
        &config.socket_path,
        dispatcher.state().clone(),
        status_rx,
        button_tx,
    )?;

    info!("daemon initialized, entering main loop");

    let outcome: Option<ExitReason> = tokio::select! {
        // Run the dispatcher until it asks to exit or the bridge goes away
        reason = dispatcher.run(events) => match reason {
            Some(reason) => Some(reason),
            None => {
                match bridge_task.finished().await {
                    Ok(()) => error!("recognizer event stream ended"),
                    Err(e) => error!(?e, "recognizer bridge lost"),
                }
                Some(ExitReason::BridgeLost)
            }
        },

        _ = trigger.run(button_rx) => {
            warn!("button trigger exited");
            None
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
            None
        }

        // Wait for shutdown signal
        _ = shutdown.wait() => {
            info!("shutdown signal received");
            None
        }
    };

    // Cleanup
    info!("shutting down...");

    server.shutdown().await;
    bridge_task.stop().await;

    match outcome {
        Some(reason) => {
            info!(%reason, code = reason.code(), "voicebox-daemon exiting");
            Ok(reason.into())
        }
        None => {
            info!("voicebox-daemon stopped");
            Ok(ExitCode::SUCCESS)
        }
    }
}
