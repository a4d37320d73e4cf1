//! Socket abstraction and the tokio-tungstenite connector.
//!
//! A [`Connector`] opens one socket per call and hands it back as a pair of
//! channels that mirror the browser WebSocket lifecycle:
//!
//! ```text
//!  ConnectionManager                       socket task
//!  ─────────────────                       ───────────
//!  Socket.events   ◄── Open | Message | Close | Error ──  SocketPeer.events
//!  Socket.frames   ──► Text | Close ──────────────────►  SocketPeer.frames
//! ```
//!
//! Every socket emits exactly one `Close`, after `Open` or after a failed
//! handshake. Dropping the [`Socket`] makes the task close the connection.
//! Whichever side starts the close, the task completes the close handshake
//! before it ends.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Error;

// ============================================================================
// Close Codes
// ============================================================================

/// WebSocket close codes used by the client.
pub mod close_code {
    /// Normal closure; never retried.
    pub const NORMAL: u16 = 1000;

    /// Close frame carried no status code.
    pub const NO_STATUS: u16 = 1005;

    /// Connection dropped without a close frame.
    pub const ABNORMAL: u16 = 1006;

    /// Server rejected the connection, typically a bad credential.
    pub const POLICY_VIOLATION: u16 = 1008;

    /// Client-side heartbeat timeout.
    pub const HEARTBEAT_TIMEOUT: u16 = 4000;
}

/// Default handshake timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on waiting for the peer to finish a close handshake.
const CLOSE_DRAIN_TIMEOUT: Duration = Duration::from_secs(3);

// ============================================================================
// Events and Frames
// ============================================================================

/// Lifecycle event emitted by a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Handshake completed.
    Open,
    /// Text frame received.
    Message(String),
    /// Socket closed; always the last event.
    Close {
        /// Close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
    /// Transport error; a `Close` follows.
    Error(String),
}

/// Outbound frame written to a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Text frame.
    Text(String),
    /// Close handshake.
    Close {
        /// Close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
}

// ============================================================================
// Socket
// ============================================================================

/// Manager side of a socket.
#[derive(Debug)]
pub struct Socket {
    /// Lifecycle events.
    pub events: mpsc::UnboundedReceiver<SocketEvent>,
    /// Outbound frame writer.
    pub frames: mpsc::UnboundedSender<Frame>,
}

/// Transport side of a socket.
#[derive(Debug)]
pub struct SocketPeer {
    /// Lifecycle event sender.
    pub events: mpsc::UnboundedSender<SocketEvent>,
    /// Outbound frame reader.
    pub frames: mpsc::UnboundedReceiver<Frame>,
}

impl Socket {
    /// Creates a connected socket/peer channel pair.
    #[must_use]
    pub fn channel() -> (Socket, SocketPeer) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();

        (
            Socket {
                events: event_rx,
                frames: frame_tx,
            },
            SocketPeer {
                events: event_tx,
                frames: frame_rx,
            },
        )
    }
}

// ============================================================================
// Connector
// ============================================================================

/// Opens sockets for the connection manager.
///
/// `open` must not block: the handshake runs in the background and its
/// outcome is reported through [`SocketEvent`]s.
pub trait Connector: Send + Sync + 'static {
    /// Starts opening a socket to `url`.
    fn open(&self, url: &Url) -> Socket;
}

// ============================================================================
// TungsteniteConnector
// ============================================================================

/// Production connector backed by `tokio-tungstenite`.
///
/// Must be used from within a Tokio runtime.
#[derive(Debug, Clone, Copy)]
pub struct TungsteniteConnector {
    connect_timeout: Duration,
}

impl Default for TungsteniteConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl TungsteniteConnector {
    /// Creates a connector with the given handshake timeout.
    #[inline]
    #[must_use]
    pub const fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Connector for TungsteniteConnector {
    fn open(&self, url: &Url) -> Socket {
        let (socket, peer) = Socket::channel();
        tokio::spawn(run_socket(url.clone(), peer, self.connect_timeout));
        socket
    }
}

/// Socket task: handshake, then pump frames both ways until either side closes.
async fn run_socket(url: Url, peer: SocketPeer, connect_timeout: Duration) {
    let SocketPeer {
        events,
        frames: mut frame_rx,
    } = peer;
    let host = url.host_str().unwrap_or_default().to_string();

    let stream = match timeout(connect_timeout, connect_async(url.as_str())).await {
        Ok(Ok((stream, _response))) => stream,
        Ok(Err(e)) => {
            report_failure(&events, Error::from(e));
            return;
        }
        Err(_) => {
            report_failure(
                &events,
                Error::connection_timeout(connect_timeout.as_millis() as u64),
            );
            return;
        }
    };

    debug!(host = %host, "WebSocket handshake completed");
    let _ = events.send(SocketEvent::Open);

    let (mut ws_write, mut ws_read) = stream.split();

    loop {
        tokio::select! {
            // Frames from the connection manager
            frame = frame_rx.recv() => {
                match frame {
                    Some(Frame::Text(text)) => {
                        if let Err(e) = ws_write.send(WsMessage::Text(text.into())).await {
                            warn!(error = %e, "Failed to write frame");
                        }
                    }

                    Some(Frame::Close { code, reason }) => {
                        let close = CloseFrame {
                            code: CloseCode::from(code),
                            reason: reason.into(),
                        };
                        let _ = ws_write.send(WsMessage::Close(Some(close))).await;
                        debug!(code, "Close frame sent");
                        drain_until_closed(&mut ws_read).await;
                        break;
                    }

                    None => {
                        debug!("Socket handle dropped, closing");
                        let _ = ws_write.close().await;
                        drain_until_closed(&mut ws_read).await;
                        break;
                    }
                }
            }

            // Frames from the server
            message = ws_read.next() => {
                match message {
                    Some(Ok(WsMessage::Text(text))) => {
                        trace!(len = text.len(), "Text frame received");
                        let _ = events.send(SocketEvent::Message(text.as_str().to_owned()));
                    }

                    Some(Ok(WsMessage::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.as_str().to_owned()))
                            .unwrap_or((close_code::NO_STATUS, String::new()));
                        let _ = events.send(SocketEvent::Close { code, reason });

                        // Send the queued close reply and wait for the server to hang up
                        let _ = ws_write.flush().await;
                        drain_until_closed(&mut ws_read).await;
                        break;
                    }

                    Some(Err(e)) => {
                        let _ = events.send(SocketEvent::Error(e.to_string()));
                        let _ = events.send(SocketEvent::Close {
                            code: close_code::ABNORMAL,
                            reason: "transport error".to_string(),
                        });
                        break;
                    }

                    None => {
                        let _ = events.send(SocketEvent::Close {
                            code: close_code::ABNORMAL,
                            reason: "stream ended".to_string(),
                        });
                        break;
                    }

                    // Binary, Ping, Pong and raw frames carry nothing for us
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!(host = %host, "Socket task terminated");
}

/// Reads until the peer ends the stream, completing the close handshake.
async fn drain_until_closed<S>(ws_read: &mut S)
where
    S: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    let drained = timeout(CLOSE_DRAIN_TIMEOUT, async {
        while let Some(message) = ws_read.next().await {
            if let Err(e) = message {
                debug!(error = %e, "Close handshake ended with error");
                break;
            }
        }
    })
    .await;

    if drained.is_err() {
        debug!(
            timeout_ms = CLOSE_DRAIN_TIMEOUT.as_millis() as u64,
            "Peer did not finish close handshake"
        );
    }
}

/// Reports a failed handshake as `Error` followed by an abnormal `Close`.
fn report_failure(events: &mpsc::UnboundedSender<SocketEvent>, err: Error) {
    let _ = events.send(SocketEvent::Error(err.to_string()));
    let _ = events.send(SocketEvent::Close {
        code: close_code::ABNORMAL,
        reason: "handshake failed".to_string(),
    });
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio_tungstenite::accept_async;

    type ServerTail = Vec<Result<WsMessage, WsError>>;

    /// Binds a loopback server and returns the client URL.
    async fn loopback() -> (TcpListener, Url) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let url = Url::parse(&format!("ws://{addr}/api/v1/ws")).expect("url");
        (listener, url)
    }

    async fn next_event(socket: &mut Socket) -> Option<SocketEvent> {
        timeout(Duration::from_secs(5), socket.events.recv())
            .await
            .expect("socket event in time")
    }

    async fn join(server: JoinHandle<ServerTail>) -> ServerTail {
        timeout(Duration::from_secs(5), server)
            .await
            .expect("server finished")
            .expect("server task")
    }

    #[test]
    fn test_constants() {
        assert_eq!(close_code::NORMAL, 1000);
        assert_eq!(close_code::ABNORMAL, 1006);
        assert_eq!(close_code::POLICY_VIOLATION, 1008);
        assert_eq!(DEFAULT_CONNECT_TIMEOUT.as_secs(), 10);
    }

    #[test]
    fn test_channel_pair_is_wired() {
        let (mut socket, mut peer) = Socket::channel();

        peer.events.send(SocketEvent::Open).expect("send event");
        socket
            .frames
            .send(Frame::Text("hello".into()))
            .expect("send frame");

        assert_eq!(socket.events.try_recv().ok(), Some(SocketEvent::Open));
        assert_eq!(peer.frames.try_recv().ok(), Some(Frame::Text("hello".into())));
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_error_then_close() {
        let connector = TungsteniteConnector::new(Duration::from_secs(2));
        let url = Url::parse("ws://127.0.0.1:1/api/v1/ws").expect("url");
        let mut socket = connector.open(&url);

        let first = socket.events.recv().await.expect("first event");
        assert!(matches!(first, SocketEvent::Error(_)));

        let second = socket.events.recv().await.expect("second event");
        assert_eq!(
            second,
            SocketEvent::Close {
                code: close_code::ABNORMAL,
                reason: "handshake failed".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_loopback_server_close_round_trip() {
        let (listener, url) = loopback().await;
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(tcp).await.expect("server handshake");

            ws.send(WsMessage::Text("hello".into())).await.expect("send hello");
            let frame = ws.next().await.expect("client frame").expect("valid frame");
            assert_eq!(frame, WsMessage::Text("ping".into()));

            let close = CloseFrame {
                code: CloseCode::Policy,
                reason: "unauthorized".into(),
            };
            ws.close(Some(close)).await.expect("server close");

            let mut tail = Vec::new();
            while let Some(message) = ws.next().await {
                tail.push(message);
            }
            tail
        });

        let mut socket = TungsteniteConnector::default().open(&url);
        assert_eq!(next_event(&mut socket).await, Some(SocketEvent::Open));
        assert_eq!(
            next_event(&mut socket).await,
            Some(SocketEvent::Message("hello".into()))
        );

        socket.frames.send(Frame::Text("ping".into())).expect("send ping");
        assert_eq!(
            next_event(&mut socket).await,
            Some(SocketEvent::Close {
                code: close_code::POLICY_VIOLATION,
                reason: "unauthorized".into(),
            })
        );

        // The client answered the close instead of resetting the stream
        let tail = join(server).await;
        assert!(tail.iter().all(Result::is_ok), "unclean close: {tail:?}");
        assert_eq!(next_event(&mut socket).await, None);
    }

    #[tokio::test]
    async fn test_loopback_client_close_reaches_server() {
        let (listener, url) = loopback().await;
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(tcp).await.expect("server handshake");

            let mut tail = Vec::new();
            while let Some(message) = ws.next().await {
                tail.push(message);
            }
            tail
        });

        let mut socket = TungsteniteConnector::default().open(&url);
        assert_eq!(next_event(&mut socket).await, Some(SocketEvent::Open));

        socket
            .frames
            .send(Frame::Close {
                code: close_code::NORMAL,
                reason: "Client disconnect".into(),
            })
            .expect("send close");

        let tail = join(server).await;
        assert!(tail.iter().all(Result::is_ok), "unclean close: {tail:?}");
        match tail.first() {
            Some(Ok(WsMessage::Close(Some(frame)))) => {
                assert_eq!(u16::from(frame.code), close_code::NORMAL);
                assert_eq!(frame.reason.as_str(), "Client disconnect");
            }
            other => panic!("expected close frame, got {other:?}"),
        }

        // Task ends once the handshake completes, with no further events
        assert_eq!(next_event(&mut socket).await, None);
    }

    #[tokio::test]
    async fn test_loopback_dropped_server_is_abnormal_close() {
        let (listener, url) = loopback().await;
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.expect("accept");
            let ws = accept_async(tcp).await.expect("server handshake");
            drop(ws);
            ServerTail::new()
        });

        let mut socket = TungsteniteConnector::default().open(&url);
        assert_eq!(next_event(&mut socket).await, Some(SocketEvent::Open));
        join(server).await;

        loop {
            match next_event(&mut socket).await {
                Some(SocketEvent::Close { code, .. }) => {
                    assert_eq!(code, close_code::ABNORMAL);
                    break;
                }
                Some(SocketEvent::Error(_)) => {}
                other => panic!("expected abnormal close, got {other:?}"),
            }
        }
    }
}
