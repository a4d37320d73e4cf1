//! Real-time client handle.
//!
//! A [`RealtimeClient`] is a cheap, cloneable handle to one connection
//! event loop. Every clone observes the same state and writes to the same
//! socket; dropping the last clone shuts the connection down.
//!
//! # Example
//!
//! ```ignore
//! use social_realtime::{ChatId, RealtimeClient, UserStatus};
//!
//! let client = RealtimeClient::builder()
//!     .api_base_url("https://api.example.com")
//!     .build()?;
//!
//! client.connect()?;
//! client.send_typing_status(ChatId::new(42), true);
//! client.update_user_status(UserStatus::Away);
//! client.disconnect();
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::Message;
use crate::transport::ConnectionSnapshot;
use crate::transport::connector::Frame;
use crate::transport::manager::{Command, ConnectionManager, ManagerSettings};
use crate::transport::state::Shared;

use super::builder::ClientBuilder;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the client.
pub(crate) struct ClientInner {
    /// Command channel into the event loop.
    commands: mpsc::UnboundedSender<Command>,

    /// Snapshot and send gate shared with the event loop.
    shared: Arc<Shared>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

// ============================================================================
// RealtimeClient
// ============================================================================

/// Handle to a managed WebSocket connection.
///
/// The client is responsible for:
/// - Opening the socket with the current bearer credential
/// - Reconnecting with exponential backoff after abnormal closes
/// - Sending a heartbeat while connected
/// - Dispatching inbound messages to handlers and notifications
#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.inner.shared.state.borrow();
        f.debug_struct("RealtimeClient")
            .field("is_connected", &snapshot.is_connected)
            .field("reconnect_attempts", &snapshot.reconnect_attempts)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RealtimeClient - Construction
// ============================================================================

impl RealtimeClient {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Spawns the event loop and returns the first handle.
    pub(crate) fn spawn(runtime: &Handle, settings: ManagerSettings) -> Self {
        let shared = Arc::new(Shared::new());
        let (commands, command_rx) = mpsc::unbounded_channel();

        let manager = ConnectionManager::new(settings, Arc::clone(&shared));
        runtime.spawn(manager.run(command_rx));
        debug!("Connection event loop spawned");

        Self {
            inner: Arc::new(ClientInner { commands, shared }),
        }
    }
}

// ============================================================================
// RealtimeClient - Lifecycle
// ============================================================================

impl RealtimeClient {
    /// Opens the socket unless one is already connecting or open.
    ///
    /// Returns immediately; watch [`subscribe()`](Self::subscribe) or the
    /// status callback for the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the event loop has stopped,
    /// after [`shutdown()`](Self::shutdown) or an unexpected loop exit.
    pub fn connect(&self) -> Result<()> {
        self.inner
            .commands
            .send(Command::Connect)
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Closes the socket with normal closure and cancels any pending retry.
    ///
    /// `is_connected` and `reconnect_attempts` are reset before this
    /// returns, and later [`send()`](Self::send) calls report `false`.
    pub fn disconnect(&self) {
        self.inner.shared.reset();
        self.command(Command::Disconnect);
    }

    /// Disconnects and stops the event loop for good.
    ///
    /// Every clone of this handle becomes inert.
    pub fn shutdown(&self) {
        self.inner.shared.reset();
        self.command(Command::Shutdown);
    }

    fn command(&self, command: Command) {
        if self.inner.commands.send(command).is_err() {
            debug!(?command, "Event loop stopped, command ignored");
        }
    }
}

// ============================================================================
// RealtimeClient - Sending
// ============================================================================

impl RealtimeClient {
    /// Serializes `message` to JSON and writes it if the socket is open.
    ///
    /// Returns `false` when the socket is not open or serialization fails;
    /// nothing is queued.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) -> bool {
        let writer = self.inner.shared.writer.lock();
        let Some(writer) = writer.as_ref() else {
            warn!("WebSocket is not connected, message dropped");
            return false;
        };

        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to serialize outgoing message");
                return false;
            }
        };

        trace!(len = text.len(), "Sending message");
        writer.send(Frame::Text(text)).is_ok()
    }
}

// ============================================================================
// RealtimeClient - State
// ============================================================================

impl RealtimeClient {
    /// Returns `true` while the socket is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.shared.state.borrow().is_connected
    }

    /// Returns the retries fired since the last successful open.
    #[inline]
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.shared.reconnect_attempts()
    }

    /// Returns the most recent inbound message.
    #[must_use]
    pub fn last_message(&self) -> Option<Message> {
        self.inner.shared.state.borrow().last_message.clone()
    }

    /// Returns a copy of the full connection state.
    #[must_use]
    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.inner.shared.state.borrow().clone()
    }

    /// Subscribes to connection state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.inner.shared.state.subscribe()
    }
}

// ============================================================================
// Tests
// ============================================================================
