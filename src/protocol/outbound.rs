//! Client-originated frames.
//!
//! Arbitrary caller frames go through [`Message`](super::Message); the
//! frames the client builds itself are modelled here.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::identifiers::ChatId;

// ============================================================================
// OutboundMessage
// ============================================================================

/// Frames produced by the heartbeat and presence helpers.
///
/// # Format
///
/// ```json
/// { "type": "typing", "chat_id": 42, "is_typing": true }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Heartbeat probe.
    Ping,

    /// Typing indicator for a chat.
    Typing {
        /// Chat the user is typing in.
        chat_id: ChatId,
        /// Whether the user is currently typing.
        is_typing: bool,
    },

    /// Presence: user is active.
    MarkOnline,

    /// Presence: user is idle or the page is hidden.
    MarkAway,
}

impl OutboundMessage {
    /// Creates the presence frame for a status.
    #[inline]
    #[must_use]
    pub const fn presence(status: UserStatus) -> Self {
        match status {
            UserStatus::Online => Self::MarkOnline,
            UserStatus::Away => Self::MarkAway,
        }
    }
}

// ============================================================================
// UserStatus
// ============================================================================

/// Presence status a user can broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UserStatus {
    /// Active.
    #[default]
    Online,
    /// Idle or backgrounded.
    Away,
}

// ============================================================================
// Tests
// ============================================================================
