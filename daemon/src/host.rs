//! Control of the machine the daemon runs on

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::config::HostConfig;
use crate::exec;

/// Host-level actions reachable by voice
#[async_trait]
pub trait HostControl: Send + Sync {
    async fn power_off(&self) -> Result<()>;

    async fn reboot(&self) -> Result<()>;

    /// Primary network address of the host
    async fn primary_address(&self) -> Result<String>;
}

/// Runs the configured system commands
#[derive(Debug, Clone)]
pub struct SystemHost {
    config: HostConfig,
}

impl SystemHost {
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl HostControl for SystemHost {
    async fn power_off(&self) -> Result<()> {
        info!("powering off host");
        exec::run_line(&self.config.shutdown, self.config.timeout()).await?;
        Ok(())
    }

    async fn reboot(&self) -> Result<()> {
        info!("rebooting host");
        exec::run_line(&self.config.reboot, self.config.timeout()).await?;
        Ok(())
    }

    async fn primary_address(&self) -> Result<String> {
        let output = exec::run_line(&self.config.address, self.config.timeout()).await?;
        first_address(&String::from_utf8_lossy(&output.stdout))
            .context("host reported no network address")
    }
}

/// First whitespace-separated field of `hostname -I` style output
fn first_address(output: &str) -> Option<String> {
    output.split_whitespace().next().map(str::to_string)
}
