//! Real-time client.
//!
//! This module provides the handle application code talks to.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RealtimeClient`] | Cloneable handle to one managed connection |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientOptions`] | Timing and reconnection options |
//!
//! # Example
//!
//! ```ignore
//! use social_realtime::{RealtimeClient, Result};
//!
//! async fn example() -> Result<()> {
//!     let client = RealtimeClient::builder()
//!         .api_base_url("https://api.example.com")
//!         .build()?;
//!
//!     client.connect()?;
//!     let mut state = client.subscribe();
//!     state.wait_for(|s| s.is_connected).await.ok();
//!     Ok(())
//! }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Core client handle.
pub mod core;

/// Timing and reconnection options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use core::RealtimeClient;
pub use options::{ClientOptions, DEFAULT_HEARTBEAT_INTERVAL};
