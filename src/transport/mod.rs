//! WebSocket transport layer.
//!
//! This module owns the one physical connection to the real-time endpoint
//! and keeps it alive.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   commands   ┌──────────────────────┐   frames   ┌──────────┐
//! │  RealtimeClient      │─────────────►│  ConnectionManager   │───────────►│  Socket  │
//! │  (cloned handles)    │              │  (event loop task)   │◄───────────│  task    │
//! │                      │◄─────────────│                      │   events   │          │
//! └──────────────────────┘   snapshot   └──────────────────────┘            └──────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `connect()` - Build the endpoint URL with the current credential, open a socket
//! 2. `Open` - Mark connected, reset backoff, start the 30s heartbeat
//! 3. `Message` - Hand the frame to the dispatcher
//! 4. `Close` - Mark disconnected, stop the heartbeat, maybe schedule a retry
//! 5. `disconnect()` - Cancel timers, close with 1000, reset state
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `backoff` | Reconnection policy |
//! | `connector` | Socket abstraction and tokio-tungstenite connector |
//! | `endpoint` | Endpoint URL derivation |
//! | `manager` | Connection event loop |
//! | `memory` | In-memory connector |
//! | `state` | Snapshot shared with client handles |

// ============================================================================
// Submodules
// ============================================================================

/// Reconnection policy.
pub mod backoff;

/// Socket abstraction and the production connector.
pub mod connector;

/// Endpoint URL derivation.
pub mod endpoint;

/// Connection event loop.
pub(crate) mod manager;

/// In-memory connector.
pub mod memory;

/// Snapshot shared with client handles.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use backoff::ReconnectPolicy;
pub use connector::{
    Connector, DEFAULT_CONNECT_TIMEOUT, Frame, Socket, SocketEvent, SocketPeer,
    TungsteniteConnector, close_code,
};
pub use endpoint::{DEFAULT_WS_PATH, Endpoint};
pub use manager::StatusHandler;
pub use memory::{MemoryConnector, MemoryListener, MemorySocket};
pub use state::ConnectionSnapshot;
