//! Execution of matched commands

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::devices::DeviceControl;
use crate::host::HostControl;
use crate::lifecycle::{Disposition, ExitReason};
use crate::speech::Speaker;

use super::table::Command;

const POWER_OFF_FAREWELL: &str = "Good bye!";
const REBOOT_FAREWELL: &str = "See you in a bit!";
const SOFT_RESTART_FAREWELL: &str = "Restarting myself, back in a moment!";

/// Runs commands against the host and network devices
pub struct ActionRunner {
    speaker: Arc<dyn Speaker>,
    host: Arc<dyn HostControl>,
    devices: Arc<dyn DeviceControl>,
}

impl ActionRunner {
    pub fn new(
        speaker: Arc<dyn Speaker>,
        host: Arc<dyn HostControl>,
        devices: Arc<dyn DeviceControl>,
    ) -> Self {
        Self {
            speaker,
            host,
            devices,
        }
    }

    /// Run a command; failures are logged, only a soft restart ends the daemon
    pub async fn run(&self, command: &Command) -> Disposition {
        info!(?command, "running command");
        match command {
            Command::PowerOff => {
                self.say(POWER_OFF_FAREWELL).await;
                if let Err(e) = self.host.power_off().await {
                    error!(error = %e, "power off failed");
                }
            }
            Command::Reboot => {
                self.say(REBOOT_FAREWELL).await;
                if let Err(e) = self.host.reboot().await {
                    error!(error = %e, "reboot failed");
                }
            }
            Command::SoftRestart => {
                self.say(SOFT_RESTART_FAREWELL).await;
                return Disposition::Exit(ExitReason::SoftRestart);
            }
            Command::SayIpAddress => match self.host.primary_address().await {
                Ok(address) => self.say(&format!("My IP address is {address}")).await,
                Err(e) => warn!(error = %e, "could not determine IP address"),
            },
            Command::WakeDevice(device) => {
                self.say(&format!("starting {device}")).await;
                if let Err(e) = self.devices.wake(device).await {
                    warn!(device, error = %e, "failed to wake device");
                }
            }
            Command::KillDevice(device) => {
                self.say(&format!("restarting {device}")).await;
                if let Err(e) = self.devices.kill(device).await {
                    warn!(device, error = %e, "failed to kill device process");
                }
            }
        }
        Disposition::Continue
    }

    async fn say(&self, text: &str) {
        if let Err(e) = self.speaker.say(text).await {
            warn!(text, error = %e, "speech failed");
        }
    }
}
