//! Connection manager event loop.
//!
//! One tokio task per client owns the socket and every timer, so socket
//! events, timer callbacks and commands are handled strictly one at a
//! time.
//!
//! # Event Loop
//!
//! The loop selects, in priority order, over:
//!
//! - Commands from [`RealtimeClient`](crate::RealtimeClient) handles
//! - Socket lifecycle events (open, message, close, error)
//! - The pending reconnect deadline
//! - The pending pong deadline (when a pong timeout is configured)
//! - The heartbeat interval
//! - Page visibility changes (automatic presence)
//!
//! Commands come first so a `disconnect()` is always applied before any
//! timer or socket event that became ready at the same time.
//!
//! Caller callbacks run inside the loop behind a panic guard. If the loop
//! still ends for any reason, the shared state is reset on the way out so
//! handles never report a connection nobody is driving.

// ============================================================================
// Imports
// ============================================================================

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep, interval_at, sleep};
use tracing::{debug, error, info, trace, warn};

use crate::auth::CredentialProvider;
use crate::dispatch::{Dispatcher, invoke_guarded};
use crate::identifiers::SocketId;
use crate::presence::PresencePolicy;
use crate::protocol::{OutboundMessage, UserStatus};

use super::backoff::ReconnectPolicy;
use super::connector::{Connector, Frame, Socket, SocketEvent, close_code};
use super::endpoint::Endpoint;
use super::state::Shared;

// ============================================================================
// Types
// ============================================================================

/// Callback invoked with the new connection status on open and close.
pub type StatusHandler = Arc<dyn Fn(bool) + Send + Sync>;

/// Reason sent with a manual disconnect.
const DISCONNECT_REASON: &str = "Client disconnect";

// ============================================================================
// Command
// ============================================================================

/// Requests from client handles to the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Open a socket unless one is connecting or open.
    Connect,
    /// Cancel timers and close the socket with normal closure.
    Disconnect,
    /// Disconnect and stop the event loop.
    Shutdown,
}

// ============================================================================
// ManagerSettings
// ============================================================================

/// Everything the event loop needs, assembled by the client builder.
pub(crate) struct ManagerSettings {
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) endpoint: Endpoint,
    pub(crate) credentials: Arc<dyn CredentialProvider>,
    pub(crate) policy: ReconnectPolicy,
    pub(crate) heartbeat_interval: Duration,
    pub(crate) pong_timeout: Option<Duration>,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) on_status_change: Option<StatusHandler>,
    pub(crate) presence: PresencePolicy,
}

// ============================================================================
// ActiveSocket
// ============================================================================

/// Socket readiness while owned by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadyState {
    Connecting,
    Open,
}

/// The one socket the manager currently owns.
struct ActiveSocket {
    id: SocketId,
    state: ReadyState,
    /// Shared-state generation when the socket was requested.
    generation: u64,
    events: mpsc::UnboundedReceiver<SocketEvent>,
    frames: mpsc::UnboundedSender<Frame>,
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Owner of the socket, heartbeat, reconnect timer and backoff state.
pub(crate) struct ConnectionManager {
    settings: ManagerSettings,
    shared: Arc<Shared>,
    socket: Option<ActiveSocket>,
    heartbeat: Option<Interval>,
    reconnect_timer: Option<Pin<Box<Sleep>>>,
    pong_deadline: Option<Pin<Box<Sleep>>>,
}

impl ConnectionManager {
    /// Creates a manager with no socket.
    pub(crate) fn new(settings: ManagerSettings, shared: Arc<Shared>) -> Self {
        Self {
            settings,
            shared,
            socket: None,
            heartbeat: None,
            reconnect_timer: None,
            pong_deadline: None,
        }
    }

    /// Runs until shutdown or until every client handle is gone.
    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let _reset = ResetOnExit(Arc::clone(&self.shared));

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => {
                    match command {
                        Some(Command::Connect) => self.connect(),
                        Some(Command::Disconnect) => self.disconnect(),
                        Some(Command::Shutdown) | None => {
                            self.disconnect();
                            break;
                        }
                    }
                }

                event = next_event(&mut self.socket) => self.handle_event(event),

                _ = wait_deadline(&mut self.reconnect_timer) => {
                    self.reconnect_timer = None;
                    self.retry();
                }

                _ = wait_deadline(&mut self.pong_deadline) => {
                    self.pong_deadline = None;
                    self.handle_pong_timeout();
                }

                _ = next_tick(&mut self.heartbeat) => self.send_heartbeat(),

                status = self.settings.presence.next_status() => self.send_presence(status),
            }
        }

        debug!("Connection event loop terminated");
    }
}

// ============================================================================
// ConnectionManager - Lifecycle
// ============================================================================

impl ConnectionManager {
    /// Opens a socket unless one is already connecting or open.
    fn connect(&mut self) {
        if let Some(socket) = &self.socket {
            debug!(socket_id = %socket.id, state = ?socket.state, "Connect ignored, socket already active");
            return;
        }

        self.reconnect_timer = None;
        let generation = self.shared.generation();

        let credentials = &self.settings.credentials;
        let token = invoke_guarded("credentials", || credentials.bearer_token()).flatten();
        if token.is_none() {
            warn!("No credential available, connecting without token");
        }

        let url = self.settings.endpoint.url(token.as_deref());
        let id = SocketId::generate();
        debug!(
            socket_id = %id,
            host = url.host_str().unwrap_or_default(),
            secure = self.settings.endpoint.is_secure(),
            "Opening WebSocket"
        );

        let Socket { events, frames } = self.settings.connector.open(&url);
        self.socket = Some(ActiveSocket {
            id,
            state: ReadyState::Connecting,
            generation,
            events,
            frames,
        });
    }

    /// Fires a scheduled retry.
    fn retry(&mut self) {
        self.shared
            .state
            .send_modify(|state| state.reconnect_attempts += 1);

        debug!(
            attempt = self.shared.reconnect_attempts(),
            max = self.settings.policy.max_attempts,
            "Reconnecting"
        );
        self.connect();
    }

    /// Cancels both timers, then closes the socket with normal closure.
    fn disconnect(&mut self) {
        self.reconnect_timer = None;
        self.stop_heartbeat();

        let had_socket = match self.socket.take() {
            Some(socket) => {
                let _ = socket.frames.send(Frame::Close {
                    code: close_code::NORMAL,
                    reason: DISCONNECT_REASON.to_string(),
                });
                info!(socket_id = %socket.id, "WebSocket disconnected");
                true
            }
            None => false,
        };

        self.shared.reset();

        if had_socket {
            self.notify_status(false);
        }
    }

    /// Applies one socket lifecycle event.
    fn handle_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Open => self.handle_open(),

            SocketEvent::Message(text) => {
                let message = self
                    .settings
                    .dispatcher
                    .dispatch(&text, &self.shared.state);

                if message.as_ref().is_some_and(|m| m.kind() == "pong") {
                    self.pong_deadline = None;
                }
            }

            SocketEvent::Close { code, reason } => self.handle_close(code, &reason),

            SocketEvent::Error(message) => {
                let socket_id = self.socket.as_ref().map(|s| s.id.to_string());
                error!(socket_id = ?socket_id, error = %message, "WebSocket error");
            }
        }
    }

    fn handle_open(&mut self) {
        let Some(socket) = self.socket.as_mut() else {
            return;
        };
        if !self.shared.open(socket.frames.clone(), socket.generation) {
            // A handle reset the state; its queued command closes this socket
            debug!(socket_id = %socket.id, "Open superseded by disconnect");
            return;
        }
        socket.state = ReadyState::Open;
        info!(socket_id = %socket.id, "WebSocket connected");

        self.notify_status(true);
        self.start_heartbeat();
    }

    fn handle_close(&mut self, code: u16, reason: &str) {
        let socket_id = self.socket.take().map(|s| s.id);
        self.stop_heartbeat();
        self.shared.mark_disconnected();

        info!(socket_id = ?socket_id.map(|id| id.to_string()), code, reason, "WebSocket closed");
        self.notify_status(false);

        let attempts = self.shared.reconnect_attempts();
        match self.settings.policy.next_delay(code, attempts) {
            Some(delay) => {
                debug!(
                    attempt = attempts + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling reconnect"
                );
                self.reconnect_timer = Some(Box::pin(sleep(delay)));
            }
            None if code != close_code::NORMAL && self.settings.policy.enabled => {
                warn!(attempts, "Reconnect budget exhausted, staying disconnected");
            }
            None => {}
        }
    }

    fn notify_status(&self, connected: bool) {
        if let Some(handler) = &self.settings.on_status_change {
            invoke_guarded("on_connection_status_change", || handler(connected));
        }
    }
}

// ============================================================================
// ResetOnExit
// ============================================================================

/// Resets shared state when the event loop ends, including by panic.
struct ResetOnExit(Arc<Shared>);

impl Drop for ResetOnExit {
    fn drop(&mut self) {
        self.0.reset();
    }
}

// ============================================================================
// ConnectionManager - Heartbeat
// ============================================================================

impl ConnectionManager {
    fn start_heartbeat(&mut self) {
        let period = self.settings.heartbeat_interval;
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.heartbeat = Some(heartbeat);
        self.pong_deadline = None;
    }

    fn stop_heartbeat(&mut self) {
        self.heartbeat = None;
        self.pong_deadline = None;
    }

    fn send_heartbeat(&mut self) {
        if !self.send_frame(&OutboundMessage::Ping) {
            return;
        }

        // An unanswered earlier ping keeps its original deadline
        if let Some(timeout) = self.settings.pong_timeout
            && self.pong_deadline.is_none()
        {
            self.pong_deadline = Some(Box::pin(sleep(timeout)));
        }
    }

    fn handle_pong_timeout(&mut self) {
        let Some(socket) = &self.socket else {
            return;
        };

        warn!(
            socket_id = %socket.id,
            timeout_ms = self.settings.pong_timeout.map(|t| t.as_millis() as u64),
            "No pong received, dropping stale connection"
        );
        let _ = socket.frames.send(Frame::Close {
            code: close_code::HEARTBEAT_TIMEOUT,
            reason: "heartbeat timeout".to_string(),
        });
        self.handle_close(close_code::HEARTBEAT_TIMEOUT, "heartbeat timeout");
    }

    fn send_presence(&mut self, status: UserStatus) {
        let sent = self.send_frame(&OutboundMessage::presence(status));
        debug!(?status, sent, "Visibility changed, presence updated");
    }

    /// Writes a frame if the socket is open.
    fn send_frame<T: Serialize>(&self, message: &T) -> bool {
        let Some(socket) = &self.socket else {
            return false;
        };
        if socket.state != ReadyState::Open {
            return false;
        }

        match serde_json::to_string(message) {
            Ok(text) => {
                trace!(socket_id = %socket.id, "Frame sent");
                socket.frames.send(Frame::Text(text)).is_ok()
            }
            Err(e) => {
                warn!(error = %e, "Failed to serialize frame");
                false
            }
        }
    }
}

// ============================================================================
// Select Helpers
// ============================================================================

/// Next event of the current socket; pending while there is none.
async fn next_event(socket: &mut Option<ActiveSocket>) -> SocketEvent {
    let Some(socket) = socket else {
        return pending().await;
    };

    match socket.events.recv().await {
        Some(event) => event,
        // Transport task died without a close event
        None => SocketEvent::Close {
            code: close_code::ABNORMAL,
            reason: "socket task ended".to_string(),
        },
    }
}

/// Completes when the deadline elapses; pending while unset.
async fn wait_deadline(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(timer) => timer.as_mut().await,
        None => pending().await,
    }
}

/// Next heartbeat tick; pending while the heartbeat is stopped.
async fn next_tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(heartbeat) => {
            heartbeat.tick().await;
        }
        None => pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reset_on_exit_runs_when_loop_panics() {
        let shared = Arc::new(Shared::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(shared.open(tx, shared.generation()));
        shared.state.send_modify(|state| state.reconnect_attempts = 2);

        let guard = ResetOnExit(Arc::clone(&shared));
        let task = tokio::spawn(async move {
            let _guard = guard;
            let crash: Option<()> = None;
            crash.expect("event loop crashed");
        });

        assert!(task.await.expect_err("task panicked").is_panic());
        assert!(!shared.state.borrow().is_connected);
        assert_eq!(shared.reconnect_attempts(), 0);
        assert!(shared.writer.lock().is_none());
    }
}
