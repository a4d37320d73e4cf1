//! Typed view over inbound frames.
//!
//! # Frame Types
//!
//! | `type` | Fields read |
//! |--------|-------------|
//! | `connection_established` | none |
//! | `connection_request` | `data.sender_name` |
//! | `connection_response` | `accepted`, `data.responder_name` |
//! | `new_message` | `message.sender_name`, `message.content`, `message.chat_id` |
//! | `message_reaction` | `reaction.user_name`, `reaction.emoji` |
//! | `user_status_update` | `user_id`, `status` |
//! | `typing_status` | `chat_id`, `user_id`, `is_typing` |
//! | `pong` | none |
//! | `error` | `message` |

// ============================================================================
// Imports
// ============================================================================

use crate::identifiers::{ChatId, UserId};

use super::Message;

// ============================================================================
// ParsedMessage
// ============================================================================

/// Parsed inbound frame for type-safe handling.
///
/// Missing fields fall back to empty strings or `None`; a frame with a
/// recognized tag never fails to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedMessage {
    /// Server accepted the socket.
    ConnectionEstablished,

    /// Someone asked to connect.
    ConnectionRequest {
        /// Display name of the requester.
        sender_name: String,
    },

    /// A connection request was answered.
    ConnectionResponse {
        /// Whether the request was accepted.
        accepted: bool,
        /// Display name of the responder.
        responder_name: String,
    },

    /// New chat message.
    NewMessage {
        /// Chat the message belongs to.
        chat_id: Option<ChatId>,
        /// Display name of the sender.
        sender_name: String,
        /// Message body.
        content: String,
    },

    /// Reaction on a message.
    MessageReaction {
        /// Display name of the reactor.
        user_name: String,
        /// Reaction emoji.
        emoji: String,
    },

    /// Peer presence changed.
    UserStatusUpdate {
        /// Peer id.
        user_id: Option<UserId>,
        /// New status label.
        status: String,
    },

    /// Peer typing indicator.
    TypingStatus {
        /// Chat being typed in.
        chat_id: Option<ChatId>,
        /// Typing peer.
        user_id: Option<UserId>,
        /// Whether the peer is typing.
        is_typing: bool,
    },

    /// Heartbeat acknowledgement.
    Pong,

    /// Server-reported error.
    Error {
        /// Server message text.
        message: String,
    },

    /// Unknown frame type.
    Unknown {
        /// The unrecognized tag.
        message_type: String,
    },
}

// ============================================================================
// Parsing
// ============================================================================

impl Message {
    /// Parses the frame into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedMessage {
        match self.kind() {
            "connection_established" => ParsedMessage::ConnectionEstablished,

            "connection_request" => ParsedMessage::ConnectionRequest {
                sender_name: self.get_string(&["data", "sender_name"]),
            },

            "connection_response" => ParsedMessage::ConnectionResponse {
                accepted: self.get_bool(&["accepted"]),
                responder_name: self.get_string(&["data", "responder_name"]),
            },

            "new_message" => ParsedMessage::NewMessage {
                chat_id: self.get_u64(&["message", "chat_id"]).map(ChatId::new),
                sender_name: self.get_string(&["message", "sender_name"]),
                content: self.get_string(&["message", "content"]),
            },

            "message_reaction" => ParsedMessage::MessageReaction {
                user_name: self.get_string(&["reaction", "user_name"]),
                emoji: self.get_string(&["reaction", "emoji"]),
            },

            "user_status_update" => ParsedMessage::UserStatusUpdate {
                user_id: self.get_u64(&["user_id"]).map(UserId::new),
                status: self.get_string(&["status"]),
            },

            "typing_status" => ParsedMessage::TypingStatus {
                chat_id: self.get_u64(&["chat_id"]).map(ChatId::new),
                user_id: self.get_u64(&["user_id"]).map(UserId::new),
                is_typing: self.get_bool(&["is_typing"]),
            },

            "pong" => ParsedMessage::Pong,

            "error" => ParsedMessage::Error {
                message: self
                    .get_optional_string(&["message"])
                    .unwrap_or_else(|| "An unknown error occurred".to_string()),
            },

            other => ParsedMessage::Unknown {
                message_type: other.to_string(),
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
