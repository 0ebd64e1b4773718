//! Recording fakes for the daemon's collaborators
//!
//! Every fake appends to one shared call log so tests can assert on the
//! order of side effects across collaborators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::button::ButtonTrigger;
use crate::commands::{ActionRunner, CommandTable};
use crate::devices::DeviceControl;
use crate::error::DeviceError;
use crate::host::HostControl;
use crate::recognizer::Session;
use crate::speech::Speaker;
use crate::state::{Collaborators, Dispatcher, SharedState};
use crate::status::{Status, StatusIndicator};
use crate::volume::{PlaybackDevice, VolumeDucker};

/// A side effect observed by a fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Say(String),
    Status(Status),
    Volume(u8),
    StartConversation,
    StopConversation,
    TextQuery(String),
    PowerOff,
    Reboot,
    Wake(String),
    Kill(String),
}

/// Shared, ordered record of calls
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }

    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Say(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn volumes(&self) -> Vec<u8> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Volume(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<Status> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

pub struct FakeSession {
    log: CallLog,
    active: AtomicBool,
    failing: AtomicBool,
}

impl FakeSession {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("session unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn start_conversation(&self) -> Result<()> {
        self.check()?;
        self.active.store(true, Ordering::SeqCst);
        self.log.push(Call::StartConversation);
        Ok(())
    }

    async fn stop_conversation(&self) -> Result<()> {
        self.check()?;
        self.active.store(false, Ordering::SeqCst);
        self.log.push(Call::StopConversation);
        Ok(())
    }

    async fn send_text_query(&self, text: &str) -> Result<()> {
        self.check()?;
        self.log.push(Call::TextQuery(text.to_string()));
        Ok(())
    }
}

pub struct FakeSpeaker {
    log: CallLog,
    failing: AtomicBool,
}

impl FakeSpeaker {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Speaker for FakeSpeaker {
    async fn say(&self, text: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("speaker unplugged"));
        }
        self.log.push(Call::Say(text.to_string()));
        Ok(())
    }
}

pub struct FakeStatus {
    log: CallLog,
    panicking: AtomicBool,
}

impl FakeStatus {
    pub fn set_panicking(&self, panicking: bool) {
        self.panicking.store(panicking, Ordering::SeqCst);
    }
}

impl StatusIndicator for FakeStatus {
    fn set_status(&self, status: Status) {
        if self.panicking.load(Ordering::SeqCst) {
            panic!("status light exploded");
        }
        self.log.push(Call::Status(status));
    }
}

pub struct FakePlayback {
    log: CallLog,
    unreachable: AtomicBool,
}

impl FakePlayback {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            unreachable: AtomicBool::new(false),
        }
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl PlaybackDevice for FakePlayback {
    async fn set_volume(&self, volume: u8) -> Result<(), DeviceError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(DeviceError::Io(std::io::Error::from(
                std::io::ErrorKind::ConnectionRefused,
            )));
        }
        self.log.push(Call::Volume(volume));
        Ok(())
    }
}

pub struct FakeHost {
    log: CallLog,
}

#[async_trait]
impl HostControl for FakeHost {
    async fn power_off(&self) -> Result<()> {
        self.log.push(Call::PowerOff);
        Ok(())
    }

    async fn reboot(&self) -> Result<()> {
        self.log.push(Call::Reboot);
        Ok(())
    }

    async fn primary_address(&self) -> Result<String> {
        Ok("192.168.1.20".to_string())
    }
}

pub struct FakeDevices {
    log: CallLog,
}

#[async_trait]
impl DeviceControl for FakeDevices {
    async fn wake(&self, device: &str) -> Result<()> {
        self.log.push(Call::Wake(device.to_string()));
        Ok(())
    }

    async fn kill(&self, device: &str) -> Result<()> {
        self.log.push(Call::Kill(device.to_string()));
        Ok(())
    }
}

/// One of each fake, all writing to the same log
pub struct Fakes {
    pub session: Arc<FakeSession>,
    pub speaker: Arc<FakeSpeaker>,
    pub status: Arc<FakeStatus>,
    pub playback: Arc<FakePlayback>,
    pub host: Arc<FakeHost>,
    pub devices: Arc<FakeDevices>,
}

impl Fakes {
    pub fn new(log: CallLog) -> Self {
        Self {
            session: Arc::new(FakeSession {
                log: log.clone(),
                active: AtomicBool::new(false),
                failing: AtomicBool::new(false),
            }),
            speaker: Arc::new(FakeSpeaker {
                log: log.clone(),
                failing: AtomicBool::new(false),
            }),
            status: Arc::new(FakeStatus {
                log: log.clone(),
                panicking: AtomicBool::new(false),
            }),
            playback: Arc::new(FakePlayback::new(log.clone())),
            host: Arc::new(FakeHost { log: log.clone() }),
            devices: Arc::new(FakeDevices { log }),
        }
    }

    /// Dispatcher greeting with "hello", with one device named "kodi"
    pub fn dispatcher(&self, state: SharedState) -> Dispatcher {
        let collaborators = Collaborators {
            session: self.session.clone(),
            speaker: self.speaker.clone(),
            status: self.status.clone(),
            volume: VolumeDucker::new(self.playback.clone(), 60, 100),
            actions: ActionRunner::new(
                self.speaker.clone(),
                self.host.clone(),
                self.devices.clone(),
            ),
        };
        Dispatcher::new(state, collaborators, CommandTable::new(&["kodi"]), "hello")
    }

    pub fn button(&self, state: SharedState) -> ButtonTrigger {
        ButtonTrigger::new(state, self.session.clone())
    }
}
