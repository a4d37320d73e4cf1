//! Inbound message dispatch.
//!
//! Each inbound frame is turned into:
//!
//! 1. an updated `last_message` snapshot,
//! 2. a call to the caller's [`MessageHandler`],
//! 3. a built-in [`Notification`] for the types that warrant one.
//!
//! # Built-in Effects
//!
//! | `type` | Effect |
//! |--------|--------|
//! | `connection_established` | "Connected" info notification |
//! | `connection_request` | names the requester |
//! | `connection_response` | accepted / declined |
//! | `new_message` | sender and content, only when the page is unfocused |
//! | `message_reaction` | names the reactor and emoji |
//! | `user_status_update` | debug log |
//! | `error` | error notification with the server text |
//! | `typing_status`, `pong`, others | none |

// ============================================================================
// Submodules
// ============================================================================

/// Frame dispatcher.
pub mod dispatcher;

/// Notification types and sinks.
pub mod notification;

// ============================================================================
// Re-exports
// ============================================================================

pub use dispatcher::{Dispatcher, MessageHandler};
pub(crate) use dispatcher::invoke_guarded;
pub use notification::{Notification, NotificationLevel, Notifier, TracingNotifier};
