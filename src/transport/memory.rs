//! In-memory connector.
//!
//! Sockets opened through a [`MemoryConnector`] are handed to a
//! [`MemoryListener`], where the other end drives the lifecycle by hand.
//! Useful for exercising UI code and reconnection behavior without a
//! server.
//!
//! # Example
//!
//! ```ignore
//! let (connector, mut listener) = MemoryConnector::new();
//! let client = RealtimeClient::builder()
//!     .api_base_url("https://api.example.com")
//!     .connector(connector)
//!     .build()?;
//!
//! client.connect()?;
//! let mut socket = listener.accept().await.expect("socket");
//! socket.open();
//! socket.deliver(r#"{"type":"connection_established"}"#);
//! ```

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;
use tokio::time::Instant;
use url::Url;

use super::connector::{Connector, Frame, Socket, SocketEvent, SocketPeer};

// ============================================================================
// MemoryConnector
// ============================================================================

/// Connector whose sockets are delivered to a [`MemoryListener`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    accepted: mpsc::UnboundedSender<MemorySocket>,
}

impl MemoryConnector {
    /// Creates a connector and the listener receiving its sockets.
    #[must_use]
    pub fn new() -> (Self, MemoryListener) {
        let (accepted, incoming) = mpsc::unbounded_channel();
        (Self { accepted }, MemoryListener { incoming })
    }
}

impl Connector for MemoryConnector {
    fn open(&self, url: &Url) -> Socket {
        let (socket, peer) = Socket::channel();
        let _ = self.accepted.send(MemorySocket {
            url: url.clone(),
            opened_at: Instant::now(),
            peer,
        });
        socket
    }
}

// ============================================================================
// MemoryListener
// ============================================================================

/// Receives the sockets opened through a [`MemoryConnector`].
#[derive(Debug)]
pub struct MemoryListener {
    incoming: mpsc::UnboundedReceiver<MemorySocket>,
}

impl MemoryListener {
    /// Waits for the next socket.
    ///
    /// Returns `None` once every connector clone is dropped.
    pub async fn accept(&mut self) -> Option<MemorySocket> {
        self.incoming.recv().await
    }

    /// Returns a socket that was already opened, if any.
    pub fn try_accept(&mut self) -> Option<MemorySocket> {
        self.incoming.try_recv().ok()
    }
}

// ============================================================================
// MemorySocket
// ============================================================================

/// Server end of an in-memory socket.
#[derive(Debug)]
pub struct MemorySocket {
    url: Url,
    opened_at: Instant,
    peer: SocketPeer,
}

impl MemorySocket {
    /// URL the client connected to.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Moment the client asked for this socket.
    #[inline]
    #[must_use]
    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }

    /// Completes the handshake.
    pub fn open(&self) {
        self.emit(SocketEvent::Open);
    }

    /// Sends a text frame to the client.
    pub fn deliver(&self, text: impl Into<String>) {
        self.emit(SocketEvent::Message(text.into()));
    }

    /// Closes the socket from the server side.
    pub fn close(&self, code: u16, reason: impl Into<String>) {
        self.emit(SocketEvent::Close {
            code,
            reason: reason.into(),
        });
    }

    /// Reports a transport error; follow with [`close`](Self::close).
    pub fn fail(&self, error: impl Into<String>) {
        self.emit(SocketEvent::Error(error.into()));
    }

    /// Waits for the next frame written by the client.
    ///
    /// Returns `None` once the client has released the socket.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        self.peer.frames.recv().await
    }

    /// Returns a frame the client already wrote, if any.
    pub fn try_next_frame(&mut self) -> Option<Frame> {
        self.peer.frames.try_recv().ok()
    }

    fn emit(&self, event: SocketEvent) {
        let _ = self.peer.events.send(event);
    }
}

// ============================================================================
// Tests
// ============================================================================
