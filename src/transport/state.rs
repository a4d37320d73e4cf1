//! State shared between client handles and the connection event loop.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use crate::protocol::Message;

use super::connector::Frame;

// ============================================================================
// ConnectionSnapshot
// ============================================================================

/// Observable connection state.
///
/// Published through a `watch` channel: read it synchronously with
/// [`RealtimeClient::snapshot`](crate::RealtimeClient::snapshot) or await
/// changes with [`RealtimeClient::subscribe`](crate::RealtimeClient::subscribe).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionSnapshot {
    /// `true` between an `Open` event and the next close or disconnect.
    pub is_connected: bool,
    /// Retries fired since the last successful open.
    pub reconnect_attempts: u32,
    /// Most recent inbound message.
    pub last_message: Option<Message>,
}

// ============================================================================
// Shared
// ============================================================================

/// State owned jointly by [`RealtimeClient`](crate::RealtimeClient) handles
/// and the event loop.
///
/// Every transition that touches the send gate runs under the `writer`
/// lock, so a handle-side reset and a loop-side open never interleave.
#[derive(Debug)]
pub(crate) struct Shared {
    /// Snapshot publisher.
    pub(crate) state: watch::Sender<ConnectionSnapshot>,
    /// Writer of the current socket; `Some` only while the socket is open.
    pub(crate) writer: Mutex<Option<mpsc::UnboundedSender<Frame>>>,
    /// Bumped by every reset; an open from an older generation is refused.
    generation: AtomicU64,
}

impl Shared {
    /// Creates shared state with a disconnected snapshot.
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(ConnectionSnapshot::default());
        Self {
            state,
            writer: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the current retry count.
    #[inline]
    pub(crate) fn reconnect_attempts(&self) -> u32 {
        self.state.borrow().reconnect_attempts
    }

    /// Returns the current reset generation.
    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Opens the send gate and marks the connection up.
    ///
    /// Returns `false` without touching anything if a reset happened since
    /// `generation` was read.
    pub(crate) fn open(&self, writer: mpsc::UnboundedSender<Frame>, generation: u64) -> bool {
        let mut slot = self.writer.lock();
        if self.generation() != generation {
            return false;
        }

        *slot = Some(writer);
        self.state.send_modify(|state| {
            state.is_connected = true;
            state.reconnect_attempts = 0;
        });
        true
    }

    /// Marks the connection as lost, keeping the retry count.
    pub(crate) fn mark_disconnected(&self) {
        let mut slot = self.writer.lock();
        slot.take();
        self.state.send_modify(|state| state.is_connected = false);
    }

    /// Resets to the initial disconnected state (manual disconnect).
    pub(crate) fn reset(&self) {
        let mut slot = self.writer.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        slot.take();
        self.state.send_modify(|state| {
            state.is_connected = false;
            state.reconnect_attempts = 0;
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_attempts_and_writer() {
        let shared = Shared::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        assert!(shared.open(tx, shared.generation()));
        shared
            .state
            .send_modify(|state| state.reconnect_attempts = 3);

        shared.reset();

        assert!(shared.writer.lock().is_none());
        assert_eq!(*shared.state.borrow(), ConnectionSnapshot::default());
    }

    #[test]
    fn test_mark_disconnected_keeps_attempts() {
        let shared = Shared::new();
        shared.state.send_modify(|state| {
            state.is_connected = true;
            state.reconnect_attempts = 2;
        });

        shared.mark_disconnected();

        assert!(!shared.state.borrow().is_connected);
        assert_eq!(shared.reconnect_attempts(), 2);
    }

    #[test]
    fn test_open_after_reset_is_refused() {
        let shared = Shared::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let generation = shared.generation();

        // A handle resets while the loop is still handling the open
        shared.reset();

        assert!(!shared.open(tx.clone(), generation));
        assert!(shared.writer.lock().is_none());
        assert!(!shared.state.borrow().is_connected);

        assert!(shared.open(tx, shared.generation()));
        assert!(shared.state.borrow().is_connected);
    }

    #[test]
    fn test_open_clears_attempts() {
        let shared = Shared::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        shared
            .state
            .send_modify(|state| state.reconnect_attempts = 4);

        assert!(shared.open(tx, shared.generation()));

        assert_eq!(shared.reconnect_attempts(), 0);
        assert!(shared.writer.lock().is_some());
    }
}
