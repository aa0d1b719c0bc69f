//! Publisher module for IPC communication
//!
//! Forwards produced events (quotes, fills, arbitrage signals, PnL
//! summaries) to downstream consumers over a Unix socket.

use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::events::Event;

/// Publisher for sending produced events via Unix socket
pub struct Publisher {
    socket_path: String,
    stream: Mutex<Option<UnixStream>>,
}

impl Publisher {
    /// Create a new publisher
    pub async fn new(socket_path: &str) -> Result<Self> {
        let publisher = Self {
            socket_path: socket_path.to_string(),
            stream: Mutex::new(None),
        };

        // Consumer may not be up yet
        if let Err(e) = publisher.connect().await {
            warn!(error = %e, "Initial IPC connection failed, will retry on publish");
        }

        Ok(publisher)
    }

    /// Connect to the Unix socket
    async fn connect(&self) -> Result<()> {
        let path = Path::new(&self.socket_path);

        if !path.exists() {
            return Err(EngineError::Ipc(format!(
                "Socket path does not exist: {}",
                self.socket_path
            )));
        }

        let stream = UnixStream::connect(path).await.map_err(|e| {
            EngineError::Ipc(format!("Failed to connect to {}: {}", self.socket_path, e))
        })?;

        let mut guard = self.stream.lock().await;
        *guard = Some(stream);

        info!(path = %self.socket_path, "Connected to IPC socket");
        Ok(())
    }

    /// Publish one event as a length-prefixed MessagePack frame
    pub async fn publish(&self, event: &Event) -> Result<()> {
        let data = rmp_serde::to_vec_named(event)?;

        let len = (data.len() as u32).to_be_bytes();
        let mut message = Vec::with_capacity(4 + data.len());
        message.extend_from_slice(&len);
        message.extend_from_slice(&data);

        let mut guard = self.stream.lock().await;

        if guard.is_none() {
            drop(guard);
            if let Err(e) = self.connect().await {
                debug!(error = %e, "Failed to reconnect to IPC socket");
                return Ok(()); // Don't fail on publish errors
            }
            guard = self.stream.lock().await;
        }

        if let Some(stream) = guard.as_mut() {
            match stream.write_all(&message).await {
                Ok(_) => debug!(kind = event.kind(), "Published event"),
                Err(e) => {
                    warn!(error = %e, "Failed to write to IPC socket");
                    *guard = None; // Mark as disconnected
                }
            }
        }

        Ok(())
    }

    /// Forward produced events from `events` until the bus closes
    pub async fn run(&self, mut events: broadcast::Receiver<Event>) -> Result<()> {
        loop {
            match events.recv().await {
                Ok(event) if event.is_produced() => self.publish(&event).await?,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Publisher lagged behind the engine");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            }
        }
    }
}
