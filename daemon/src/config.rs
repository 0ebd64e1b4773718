//! Configuration loading and management

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::devices::MacAddress;
use crate::state::DEFAULT_ERROR_BUDGET;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "VOICEBOX_CONFIG";

const DEFAULT_GREETING: &str = "I am here to serve you my master!";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Spoken once the recognizer has started
    pub greeting: String,

    /// Consecutive recoverable assistant errors tolerated
    pub error_budget: u8,

    pub recognizer: RecognizerConfig,
    pub speech: SpeechConfig,
    pub playback: PlaybackConfig,
    pub host: HostConfig,
    pub admin: AdminConfig,

    /// Network devices addressable by voice, first one is the default
    pub devices: Vec<DeviceConfig>,
}

/// External recognizer bridge process
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            program: "voicebox-assistant-bridge".to_string(),
            args: Vec::new(),
        }
    }
}

/// Text-to-speech program; the text is appended as the final argument
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".to_string(),
            args: Vec::new(),
        }
    }
}

/// Remote media player whose volume is ducked
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// JSON-RPC endpoint
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ducked_volume: u8,
    pub normal_volume: u8,
    pub timeout_ms: u64,
}

impl PlaybackConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            url: "http://openelec:8080/jsonrpc".to_string(),
            username: None,
            password: None,
            ducked_volume: 60,
            normal_volume: 100,
            timeout_ms: 2000,
        }
    }
}

/// Commands that act on the machine the daemon runs on
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub shutdown: Vec<String>,
    pub reboot: Vec<String>,
    /// Prints the host's addresses, first field is the primary one
    pub address: Vec<String>,
    pub timeout_ms: u64,
}

impl HostConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            shutdown: vec!["sudo".into(), "shutdown".into(), "now".into()],
            reboot: vec!["sudo".into(), "reboot".into()],
            address: vec!["hostname".into(), "-I".into()],
            timeout_ms: 5000,
        }
    }
}

/// Remote administration channel
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub ssh_program: String,
    /// Login used when a device host has no `user@` part
    pub user: Option<String>,
    pub timeout_ms: u64,
}

impl AdminConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            ssh_program: "ssh".to_string(),
            user: None,
            timeout_ms: 10_000,
        }
    }
}

/// A network device addressable by name
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    /// Link-layer address used for Wake-on-LAN
    pub mac: Option<String>,
    /// Host reached over the admin channel
    pub host: Option<String>,
    /// Remote command that kills the device's main process
    pub kill_command: Option<String>,
    #[serde(default = "default_broadcast")]
    pub broadcast: String,
}

fn default_broadcast() -> String {
    "255.255.255.255".to_string()
}

/// On-disk layout; paths default relative to `$HOME`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    socket_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    greeting: Option<String>,
    error_budget: Option<u8>,
    recognizer: RecognizerConfig,
    speech: SpeechConfig,
    playback: PlaybackConfig,
    host: HostConfig,
    admin: AdminConfig,
    devices: Vec<DeviceConfig>,
}

impl Config {
    /// Load configuration from environment, config file and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME")?;
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_config_path(Path::new(&home)));
        Self::load_from(&path, Path::new(&home))
    }

    /// Load from an explicit path; a missing file yields the defaults
    pub fn load_from(path: &Path, home: &Path) -> Result<Self> {
        let file = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            ConfigFile::default()
        };

        let config = Self::from_file(file, home);
        config.validate()?;
        Ok(config)
    }

    fn from_file(file: ConfigFile, home: &Path) -> Self {
        let data_dir = file.data_dir.unwrap_or_else(|| {
            home.join(".local").join("share").join("voicebox")
        });
        let socket_path = file
            .socket_path
            .unwrap_or_else(|| data_dir.join("daemon.sock"));

        Self {
            socket_path,
            data_dir,
            greeting: file.greeting.unwrap_or_else(|| DEFAULT_GREETING.to_string()),
            error_budget: file.error_budget.unwrap_or(DEFAULT_ERROR_BUDGET),
            recognizer: file.recognizer,
            speech: file.speech,
            playback: file.playback,
            host: file.host,
            admin: file.admin,
            devices: file.devices,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.error_budget == 0 {
            bail!("error_budget must be at least 1");
        }
        if self.playback.ducked_volume > 100 || self.playback.normal_volume > 100 {
            bail!("playback volumes must be within 0..=100");
        }
        if self.host.shutdown.is_empty() || self.host.reboot.is_empty() || self.host.address.is_empty() {
            bail!("host commands must not be empty");
        }
        for device in &self.devices {
            if device.name.trim().is_empty() {
                bail!("device names must not be empty");
            }
            if let Some(mac) = &device.mac {
                mac.parse::<MacAddress>()
                    .with_context(|| format!("device {}", device.name))?;
            }
        }
        Ok(())
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

fn default_config_path(home: &Path) -> PathBuf {
    home.join(".config").join("voicebox").join("config.toml")
}
