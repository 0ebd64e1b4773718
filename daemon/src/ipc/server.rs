//! Unix domain socket server for IPC
//!
//! Serves status queries, forwards button presses to the trigger task and
//! pushes status changes to subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::button::ButtonPress;
use crate::state::SharedState;
use crate::status::Status;

use super::protocol::{DaemonStatus, Notification, Request, Response};

/// Largest accepted request body
const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    shared: Arc<Shared>,
    shutdown_tx: broadcast::Sender<()>,
}

/// What client handlers can see and do
struct Shared {
    state: SharedState,
    status_rx: watch::Receiver<Status>,
    button_tx: mpsc::Sender<ButtonPress>,
    start_time: Instant,
}

impl Server {
    /// Bind the socket, replacing a stale one
    pub fn new(
        socket_path: &Path,
        state: SharedState,
        status_rx: watch::Receiver<Status>,
        button_tx: mpsc::Sender<ButtonPress>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path)
            .context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            shared: Arc::new(Shared {
                state,
                status_rx,
                button_tx,
                start_time: Instant::now(),
            }),
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let shared = Arc::clone(&self.shared);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, shared) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(mut stream: UnixStream, shared: Arc<Shared>) -> Result<()> {
        loop {
            let Some(request) = read_message::<Request>(&mut stream).await? else {
                debug!("client disconnected");
                return Ok(());
            };
            debug!(?request, "received request");

            let (response, subscribe) = Self::process_request(request, &shared);
            send_message(&mut stream, &response).await?;

            if subscribe {
                debug!("client subscribed to notifications");
                return Self::notify(stream, shared.status_rx.clone()).await;
            }
        }
    }

    /// Push the current status, then every change, until the client leaves
    async fn notify(mut stream: UnixStream, mut status_rx: watch::Receiver<Status>) -> Result<()> {
        loop {
            let status = *status_rx.borrow_and_update();
            if let Err(e) = send_message(&mut stream, &Notification::StatusChanged { status }).await {
                debug!(?e, "subscriber went away");
                return Ok(());
            }
            if status_rx.changed().await.is_err() {
                return Ok(());
            }
        }
    }

    /// Process a request and return a response
    /// Returns (Response, should_subscribe)
    fn process_request(request: Request, shared: &Shared) -> (Response, bool) {
        match request {
            Request::Ping => (Response::Pong, false),

            Request::GetStatus => {
                let snapshot = shared.state.snapshot();
                let status = *shared.status_rx.borrow();
                let uptime_secs = shared.start_time.elapsed().as_secs();
                (
                    Response::Status(DaemonStatus::new(status, &snapshot, uptime_secs)),
                    false,
                )
            }

            Request::ButtonPressed => match shared.button_tx.try_send(ButtonPress) {
                Ok(()) => (Response::ButtonAccepted, false),
                Err(e) => {
                    warn!(error = %e, "dropping button press");
                    (
                        Response::Error {
                            code: "button_busy".to_string(),
                            message: e.to_string(),
                        },
                        false,
                    )
                }
            },

            Request::Subscribe => (Response::Subscribed, true),
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Read one length-prefixed JSON message; `None` on a clean disconnect
async fn read_message<T: serde::de::DeserializeOwned>(stream: &mut UnixStream) -> Result<Option<T>> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        warn!(len, "message too large, disconnecting");
        return Ok(None);
    }

    let mut msg_buf = vec![0u8; len];
    stream.read_exact(&mut msg_buf).await?;
    let message = serde_json::from_slice(&msg_buf).context("failed to parse request")?;
    Ok(Some(message))
}

/// Send a length-prefixed JSON message
async fn send_message<T: serde::Serialize>(stream: &mut UnixStream, msg: &T) -> Result<()> {
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    stream.write_all(&msg_len).await?;
    stream.write_all(&msg_bytes).await?;

    Ok(())
}
