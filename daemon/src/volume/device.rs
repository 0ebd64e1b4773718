//! Remote playback device reached over JSON-RPC

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::PlaybackConfig;
use crate::error::DeviceError;

/// A device whose playback volume can be set
#[async_trait]
pub trait PlaybackDevice: Send + Sync {
    /// Set the volume on a 0-100 scale
    async fn set_volume(&self, volume: u8) -> Result<(), DeviceError>;
}

/// JSON-RPC 2.0 client for a media center
///
/// The HTTP client is built once; its pool connects on first use and keeps
/// the connection for later calls.
pub struct JsonRpcPlayback {
    client: Client,
    url: String,
    username: Option<String>,
    password: Option<String>,
    next_id: AtomicU64,
}

impl JsonRpcPlayback {
    pub fn new(config: &PlaybackConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, DeviceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        debug!(method, id, "playback RPC request");

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                DeviceError::Unreachable {
                    url: self.url.clone(),
                    source: e,
                }
            } else {
                DeviceError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeviceError::Rpc(format!("{method} returned HTTP {status}")));
        }

        let reply: Value = response.json().await?;
        if let Some(error) = reply.get("error") {
            return Err(DeviceError::Rpc(format!("{method} failed: {error}")));
        }
        Ok(reply.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl PlaybackDevice for JsonRpcPlayback {
    async fn set_volume(&self, volume: u8) -> Result<(), DeviceError> {
        self.call("Application.SetVolume", json!({ "volume": volume.min(100) }))
            .await?;
        Ok(())
    }
}
