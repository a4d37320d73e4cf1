//! WebSocket protocol message types.
//!
//! Every frame on the real-time channel is a JSON object with a required
//! `type` tag and an open payload.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `ping` | Client → Server | Heartbeat probe |
//! | `pong` | Server → Client | Heartbeat acknowledgement |
//! | `typing` | Client → Server | Typing indicator for a chat |
//! | `mark_online` / `mark_away` | Client → Server | Presence update |
//! | `connection_established` | Server → Client | Handshake accepted |
//! | `connection_request` / `connection_response` | Server → Client | Network invitations |
//! | `new_message` / `message_reaction` | Server → Client | Chat traffic |
//! | `user_status_update` / `typing_status` | Server → Client | Peer presence |
//! | `error` | Server → Client | Server-side failure |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Open-payload [`Message`] wire value |
//! | `inbound` | Typed view over server frames |
//! | `outbound` | Frames built by the client |

// ============================================================================
// Submodules
// ============================================================================

/// Typed view over inbound frames.
pub mod inbound;

/// Generic wire message.
pub mod message;

/// Client-originated frames.
pub mod outbound;

// ============================================================================
// Re-exports
// ============================================================================

pub use inbound::ParsedMessage;
pub use message::Message;
pub use outbound::{OutboundMessage, UserStatus};
