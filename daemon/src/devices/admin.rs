//! Remote administration over ssh

use tracing::info;

use crate::config::AdminConfig;
use crate::error::DeviceError;
use crate::exec;

/// Runs privileged commands on remote hosts
#[derive(Debug, Clone)]
pub struct RemoteAdmin {
    config: AdminConfig,
}

impl RemoteAdmin {
    pub fn new(config: AdminConfig) -> Self {
        Self { config }
    }

    /// ssh destination, prefixing the configured user when the host has none
    fn destination(&self, host: &str) -> String {
        match &self.config.user {
            Some(user) if !host.contains('@') => format!("{user}@{host}"),
            _ => host.to_string(),
        }
    }

    fn ssh_args(&self, host: &str, command: &str) -> Vec<String> {
        vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            self.destination(host),
            command.to_string(),
        ]
    }

    /// Run `command` on `host`
    pub async fn run(&self, host: &str, command: &str) -> Result<(), DeviceError> {
        info!(host, command, "running remote admin command");
        exec::run(
            &self.config.ssh_program,
            &self.ssh_args(host, command),
            self.config.timeout(),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_uses_default_user() {
        let admin = RemoteAdmin::new(AdminConfig {
            user: Some("root".into()),
            ..AdminConfig::default()
        });
        assert_eq!(admin.destination("kodi.local"), "root@kodi.local");
        assert_eq!(admin.destination("osmc@kodi.local"), "osmc@kodi.local");
    }

    #[test]
    fn test_ssh_args_are_batch_mode() {
        let admin = RemoteAdmin::new(AdminConfig::default());
        let args = admin.ssh_args("kodi.local", "killall -9 kodi.bin");
        assert_eq!(args, ["-o", "BatchMode=yes", "kodi.local", "killall -9 kodi.bin"]);
    }

    #[tokio::test]
    async fn test_runs_through_configured_program() {
        // `echo` stands in for ssh and always succeeds
        let admin = RemoteAdmin::new(AdminConfig {
            ssh_program: "echo".into(),
            ..AdminConfig::default()
        });
        admin.run("kodi.local", "true").await.unwrap();
    }
}
