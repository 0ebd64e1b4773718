//! Network devices addressable by voice
//!
//! Devices are woken with a Wake-on-LAN magic packet and restarted by
//! killing their main process over the remote admin channel; a supervisor
//! on the device relaunches it.

mod admin;
mod wol;

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddrV4};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::{AdminConfig, DeviceConfig};
use crate::error::DeviceError;

pub use admin::RemoteAdmin;
pub use wol::{send_magic_packet, MacAddress, WOL_PORT};

/// Actions on named network devices
#[async_trait]
pub trait DeviceControl: Send + Sync {
    /// Power on the device
    async fn wake(&self, device: &str) -> Result<()>;

    /// Kill the device's main process so it restarts
    async fn kill(&self, device: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Device {
    mac: Option<MacAddress>,
    broadcast: Ipv4Addr,
    host: Option<String>,
    kill_command: Option<String>,
}

/// Devices from the configuration, keyed by lowercase name
#[derive(Debug, Clone)]
pub struct NetworkDevices {
    devices: HashMap<String, Device>,
    admin: RemoteAdmin,
}

impl NetworkDevices {
    pub fn new(configs: &[DeviceConfig], admin: AdminConfig) -> Result<Self> {
        let mut devices = HashMap::new();
        for config in configs {
            let mac = config
                .mac
                .as_deref()
                .map(str::parse::<MacAddress>)
                .transpose()
                .with_context(|| format!("device {}", config.name))?;
            let broadcast = config
                .broadcast
                .parse::<Ipv4Addr>()
                .with_context(|| format!("device {} broadcast address", config.name))?;

            devices.insert(
                config.name.trim().to_lowercase(),
                Device {
                    mac,
                    broadcast,
                    host: config.host.clone(),
                    kill_command: config.kill_command.clone(),
                },
            );
        }

        Ok(Self {
            devices,
            admin: RemoteAdmin::new(admin),
        })
    }

    fn device(&self, name: &str) -> Result<&Device, DeviceError> {
        self.devices
            .get(name)
            .ok_or_else(|| DeviceError::UnknownDevice(name.to_string()))
    }
}

#[async_trait]
impl DeviceControl for NetworkDevices {
    async fn wake(&self, device: &str) -> Result<()> {
        let entry = self.device(device)?;
        let mac = entry
            .mac
            .with_context(|| format!("device {device} has no MAC address"))?;
        send_magic_packet(mac, SocketAddrV4::new(entry.broadcast, WOL_PORT)).await?;
        Ok(())
    }

    async fn kill(&self, device: &str) -> Result<()> {
        let entry = self.device(device)?;
        let (Some(host), Some(command)) = (&entry.host, &entry.kill_command) else {
            anyhow::bail!("device {device} has no admin host or kill command");
        };
        self.admin.run(host, command).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kodi() -> DeviceConfig {
        DeviceConfig {
            name: "Kodi".into(),
            mac: Some("54:04:a6:d1:0e:8e".into()),
            host: None,
            kill_command: None,
            broadcast: "127.0.0.1".into(),
        }
    }

    #[test]
    fn test_names_are_lowercased() {
        let devices = NetworkDevices::new(&[kodi()], AdminConfig::default()).unwrap();
        assert!(devices.device("kodi").is_ok());
        assert!(matches!(
            devices.device("tv"),
            Err(DeviceError::UnknownDevice(_))
        ));
    }

    #[test]
    fn test_rejects_bad_broadcast() {
        let mut config = kodi();
        config.broadcast = "not-an-ip".into();
        assert!(NetworkDevices::new(&[config], AdminConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_wake_sends_packet() {
        let devices = NetworkDevices::new(&[kodi()], AdminConfig::default()).unwrap();
        devices.wake("kodi").await.unwrap();
    }

    #[tokio::test]
    async fn test_kill_without_host_fails() {
        let devices = NetworkDevices::new(&[kodi()], AdminConfig::default()).unwrap();
        assert!(devices.kill("kodi").await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_device_fails() {
        let devices = NetworkDevices::new(&[], AdminConfig::default()).unwrap();
        assert!(devices.wake("kodi").await.is_err());
    }
}
