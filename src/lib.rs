//! Social Realtime - WebSocket client for a social platform's live events.
//!
//! This library keeps one authenticated WebSocket open to the platform's
//! real-time endpoint and turns what arrives on it into application events.
//!
//! # Architecture
//!
//! - **Connection manager**: one tokio task per client owns the socket, the
//!   30s heartbeat and the reconnect timer (exponential backoff, 5 retries)
//! - **Dispatcher**: parses frames, records the last message, calls the
//!   caller handler and raises built-in notifications
//! - **Provider**: shares one client across a tree of consumers
//! - **Presence**: typing indicators, online/away, and automatic presence
//!   driven by page visibility
//!
//! Key design principles:
//!
//! - Transport failures are absorbed and logged, never returned
//! - Close code 1000 is terminal; everything else is retried
//! - Sends while disconnected are dropped, not queued
//!
//! # Quick Start
//!
//! ```no_run
//! use social_realtime::{ChatId, RealtimeClient, Result, StaticCredential};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = RealtimeClient::builder()
//!         .api_base_url("https://api.example.com")
//!         .credentials(StaticCredential::new("token"))
//!         .on_message(|message| println!("{}", message.kind()))
//!         .build()?;
//!
//!     client.connect()?;
//!     let mut state = client.subscribe();
//!     let _ = state.wait_for(|s| s.is_connected).await;
//!
//!     client.send_typing_status(ChatId::new(42), true);
//!     client.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`auth`] | Credential providers |
//! | [`client`] | Client handle, builder and options |
//! | [`dispatch`] | Inbound routing and notifications |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`page`] | Page focus and visibility |
//! | [`presence`] | Presence and typing helpers |
//! | [`protocol`] | Wire message types |
//! | [`provider`] | Shared instance for a scope tree |
//! | [`transport`] | Socket abstraction and connection event loop |

// ============================================================================
// Modules
// ============================================================================

/// Credential providers.
///
/// The bearer token is read through [`CredentialProvider`] on every connect.
pub mod auth;

/// Client handle, builder and options.
///
/// Use [`RealtimeClient::builder()`] to create a configured client.
pub mod client;

/// Inbound message routing and notifications.
pub mod dispatch;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Page focus and visibility.
pub mod page;

/// Presence and typing helpers.
pub mod presence;

/// Wire message types.
pub mod protocol;

/// Shared client instance for a tree of consumers.
pub mod provider;

/// WebSocket transport layer.
///
/// Socket abstraction, production and in-memory connectors, and the
/// connection event loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Auth types
pub use auth::{
    CredentialProvider, DEFAULT_TOKEN_KEYS, KeyValueStore, KeyedCredentials, MemoryStore,
    StaticCredential,
};

// Client types
pub use client::{ClientBuilder, ClientOptions, RealtimeClient};

// Dispatch types
pub use dispatch::{Dispatcher, MessageHandler, Notification, NotificationLevel, Notifier, TracingNotifier};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ChatId, SocketId, UserId};

// Page types
pub use page::{FocusState, PageState, Visibility};

// Protocol types
pub use protocol::{Message, OutboundMessage, ParsedMessage, UserStatus};

// Provider types
pub use provider::{RealtimeProvider, Scope, use_realtime};

// Transport types
pub use transport::{
    ConnectionSnapshot, Connector, MemoryConnector, MemoryListener, MemorySocket,
    ReconnectPolicy, StatusHandler, TungsteniteConnector,
};
