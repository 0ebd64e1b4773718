//! Child process running the recognizer

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RecognizerConfig;
use crate::error::BridgeError;
use crate::events::AssistantEvent;

use super::protocol::{parse_event_line, SessionCommand};
use super::Session;

/// Buffered events between the bridge reader and the dispatcher
const EVENT_QUEUE: usize = 64;

/// Session handle writing commands to the bridge
pub struct BridgeSession<W = ChildStdin> {
    writer: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send + Sync> BridgeSession<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    async fn send(&self, command: SessionCommand) -> Result<(), BridgeError> {
        debug!(?command, "sending session command");
        let line = command.to_line()?;
        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send + Sync> Session for BridgeSession<W> {
    async fn start_conversation(&self) -> Result<()> {
        Ok(self.send(SessionCommand::StartConversation).await?)
    }

    async fn stop_conversation(&self) -> Result<()> {
        Ok(self.send(SessionCommand::StopConversation).await?)
    }

    async fn send_text_query(&self, text: &str) -> Result<()> {
        Ok(self
            .send(SessionCommand::SendTextQuery {
                text: text.to_string(),
            })
            .await?)
    }
}

/// A running recognizer bridge
pub struct Bridge {
    /// Commands to the bridge
    pub session: BridgeSession,
    /// Events from the bridge, in delivery order
    pub events: mpsc::Receiver<AssistantEvent>,
    /// Reader task; finishes with an error once the bridge goes away
    pub task: BridgeTask,
}

impl Bridge {
    /// Spawn the configured bridge program
    pub fn spawn(config: &RecognizerConfig) -> Result<Self, BridgeError> {
        let mut child = Command::new(&config.program)
            .args(&config.args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BridgeError::Spawn {
                program: config.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(BridgeError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(BridgeError::MissingPipe("stdout"))?;
        info!(program = %config.program, pid = ?child.id(), "recognizer bridge started");

        let pid = child.id();
        let (tx, events) = mpsc::channel(EVENT_QUEUE);
        let handle = tokio::spawn(supervise(child, BufReader::new(stdout), tx));

        Ok(Self {
            session: BridgeSession::new(stdin),
            events,
            task: BridgeTask {
                handle: Some(handle),
                pid,
            },
        })
    }
}

/// The task that owns the bridge child process
///
/// The child is killed when the task is dropped, so it has to be stopped
/// explicitly before the daemon exits.
pub struct BridgeTask {
    handle: Option<JoinHandle<Result<()>>>,
    pid: Option<u32>,
}

impl BridgeTask {
    /// Process id of the bridge child
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the bridge to go away and report why
    pub async fn finished(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Err(anyhow!("recognizer bridge already stopped"));
        };
        match handle.await {
            Ok(result) => result,
            Err(e) => Err(anyhow!("recognizer bridge task failed: {e}")),
        }
    }

    /// Kill the bridge child and wait until it is released
    pub async fn stop(mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        handle.abort();
        match handle.await {
            Err(e) if e.is_cancelled() => debug!(pid = ?self.pid, "recognizer bridge stopped"),
            Err(e) => warn!(error = %e, "recognizer bridge task failed"),
            Ok(Err(e)) => debug!(error = %e, "recognizer bridge already gone"),
            Ok(Ok(())) => {}
        }
    }
}

/// Forward events until the bridge closes its stdout, then reap it
async fn supervise<R: AsyncBufRead + Unpin>(
    mut child: Child,
    reader: R,
    tx: mpsc::Sender<AssistantEvent>,
) -> Result<()> {
    read_events(reader, tx).await?;
    let status = child.wait().await?;
    Err(anyhow!("recognizer bridge exited with {status}"))
}

/// Parse JSON lines into events; malformed lines are skipped
pub async fn read_events<R: AsyncBufRead + Unpin>(
    reader: R,
    tx: mpsc::Sender<AssistantEvent>,
) -> Result<()> {
    let mut lines = reader.split(b'\n');
    while let Some(raw) = lines.next_segment().await? {
        let line = match String::from_utf8(raw) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "skipping bridge output that is not UTF-8");
                continue;
            }
        };
        match parse_event_line(&line) {
            None => continue,
            Some(Ok(event)) => {
                if tx.send(event).await.is_err() {
                    debug!("event receiver dropped, stopping reader");
                    break;
                }
            }
            Some(Err(e)) => {
                warn!(error = %e, line, "skipping malformed bridge output");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_read_events_in_order() {
        let input: &[u8] = b"{\"type\":\"ON_START_FINISHED\"}\n\n\
            garbage\n\
            {\"type\":\"ON_RECOGNIZING_SPEECH_FINISHED\",\"args\":{\"text\":\"reboot\"}}\n";
        let (tx, mut rx) = mpsc::channel(8);
        read_events(input, tx).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::StartFinished);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.kind, EventKind::RecognizingSpeechFinished);
        assert_eq!(second.text(), Some("reboot"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_read_events_skips_invalid_utf8() {
        let input: &[u8] = b"\xff\xfe\n{\"type\":\"ON_START_FINISHED\"}\n";
        let (tx, mut rx) = mpsc::channel(8);
        read_events(input, tx).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::StartFinished);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_session_writes_json_lines() {
        let (client, mut server) = tokio::io::duplex(1024);
        let session = BridgeSession::new(client);

        session.stop_conversation().await.unwrap();
        session.start_conversation().await.unwrap();
        session.send_text_query("stop").await.unwrap();
        drop(session);

        let mut written = String::new();
        server.read_to_string(&mut written).await.unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines,
            [
                r#"{"type":"stop_conversation"}"#,
                r#"{"type":"start_conversation"}"#,
                r#"{"type":"send_text_query","text":"stop"}"#,
            ]
        );
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let config = RecognizerConfig {
            program: "/nonexistent/bridge".into(),
            args: Vec::new(),
        };
        assert!(matches!(
            Bridge::spawn(&config),
            Err(BridgeError::Spawn { .. })
        ));
    }

    #[tokio::test]
    async fn test_bridge_exit_is_reported() {
        let config = RecognizerConfig {
            program: "echo".into(),
            args: vec![r#"{"type":"ON_START_FINISHED"}"#.into()],
        };
        let mut bridge = Bridge::spawn(&config).unwrap();
        assert_eq!(
            bridge.events.recv().await.unwrap().kind,
            EventKind::StartFinished
        );
        assert!(bridge.task.finished().await.is_err());
    }

    /// True once the process is gone or only a zombie is left
    fn process_ended(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Err(_) => true,
            Ok(stat) => stat
                .rsplit_once(')')
                .map(|(_, rest)| rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
        }
    }

    #[tokio::test]
    async fn test_stop_kills_bridge() {
        let config = RecognizerConfig {
            program: "sleep".into(),
            args: vec!["30".into()],
        };
        let bridge = Bridge::spawn(&config).unwrap();
        let pid = bridge.task.pid().unwrap();
        assert!(!process_ended(pid));

        bridge.task.stop().await;

        for _ in 0..50 {
            if process_ended(pid) {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        panic!("bridge process {pid} still running");
    }
}
