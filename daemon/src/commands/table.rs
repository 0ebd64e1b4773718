//! Phrase to command mapping

use std::collections::HashMap;

use tracing::warn;

/// A locally handled voice command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Shut the host down
    PowerOff,
    /// Reboot the host
    Reboot,
    /// Exit the daemon so its supervisor relaunches it
    SoftRestart,
    /// Speak the host's primary network address
    SayIpAddress,
    /// Power on a named device
    WakeDevice(String),
    /// Kill a named device's main process
    KillDevice(String),
}

/// Lowercase recognized text for lookup
///
/// Surrounding whitespace is dropped too, since recognizers sometimes pad
/// their transcripts. Inner text must still match exactly.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Fixed table of phrases
///
/// Matching is exact and case-insensitive, ignoring leading and trailing
/// whitespace only: " Power Off " resolves, "please power off" does not.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    entries: HashMap<String, Command>,
}

impl CommandTable {
    /// Built-in host commands plus phrases for each device
    ///
    /// The first device also answers to a bare "wake up".
    pub fn new<S: AsRef<str>>(devices: &[S]) -> Self {
        let mut table = Self::default();
        table.insert("power off", Command::PowerOff);
        table.insert("reboot", Command::Reboot);
        table.insert("soft reboot", Command::SoftRestart);
        table.insert("soft restart", Command::SoftRestart);
        table.insert("ip address", Command::SayIpAddress);

        for (index, device) in devices.iter().enumerate() {
            let name = normalize(device.as_ref());
            if name.is_empty() {
                continue;
            }
            let wake = Command::WakeDevice(name.clone());
            let kill = Command::KillDevice(name.clone());

            if index == 0 {
                table.insert("wake up", wake.clone());
            }
            table.insert(&format!("{name} wake up"), wake.clone());
            table.insert(&format!("power on {name}"), wake.clone());
            table.insert(&format!("start {name}"), wake);
            table.insert(&format!("kill {name}"), kill.clone());
            table.insert(&format!("restart {name}"), kill.clone());
            table.insert(&format!("{name} restart"), kill);
        }

        table
    }

    fn insert(&mut self, phrase: &str, command: Command) {
        if let Some(existing) = self.entries.get(phrase) {
            warn!(phrase, ?existing, ignored = ?command, "duplicate command phrase");
            return;
        }
        self.entries.insert(phrase.to_string(), command);
    }

    /// Find the command for recognized text
    pub fn lookup(&self, text: &str) -> Option<&Command> {
        self.entries.get(&normalize(text))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
