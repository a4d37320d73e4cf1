//! Presence and typing helpers.
//!
//! Both helpers are fire-and-forget: a frame sent while the socket is not
//! open is dropped, which is acceptable for best-effort presence.
//!
//! [`PresencePolicy`] layers automatic presence on top: the connection
//! event loop sends `mark_away` when the page is hidden and `mark_online`
//! when it is shown again.

// ============================================================================
// Imports
// ============================================================================

use std::future::pending;

use tokio::sync::watch;
use tracing::trace;

use crate::client::RealtimeClient;
use crate::identifiers::ChatId;
use crate::page::Visibility;
use crate::protocol::{OutboundMessage, UserStatus};

// ============================================================================
// RealtimeClient - Presence
// ============================================================================

impl RealtimeClient {
    /// Tells peers whether the user is typing in `chat_id`.
    pub fn send_typing_status(&self, chat_id: ChatId, is_typing: bool) {
        let sent = self.send(&OutboundMessage::Typing { chat_id, is_typing });
        trace!(%chat_id, is_typing, sent, "Typing status");
    }

    /// Broadcasts the user's presence.
    pub fn update_user_status(&self, status: UserStatus) {
        let sent = self.send(&OutboundMessage::presence(status));
        trace!(?status, sent, "User status");
    }
}

// ============================================================================
// PresencePolicy
// ============================================================================

/// Maps page visibility changes to presence updates.
///
/// Polled by the connection event loop; inert when no page is attached or
/// once the page state is dropped.
#[derive(Debug, Default)]
pub(crate) struct PresencePolicy {
    visibility: Option<watch::Receiver<Visibility>>,
}

impl PresencePolicy {
    /// Creates a policy following `visibility`.
    pub(crate) fn new(visibility: Option<watch::Receiver<Visibility>>) -> Self {
        Self { visibility }
    }

    /// Waits for the next visibility change and returns the status to send.
    pub(crate) async fn next_status(&mut self) -> UserStatus {
        loop {
            let Some(rx) = self.visibility.as_mut() else {
                return pending().await;
            };

            match rx.changed().await {
                Ok(()) => return status_for(*rx.borrow_and_update()),
                Err(_) => self.visibility = None,
            }
        }
    }
}

/// Presence implied by a visibility.
#[inline]
#[must_use]
pub(crate) const fn status_for(visibility: Visibility) -> UserStatus {
    match visibility {
        Visibility::Visible => UserStatus::Online,
        Visibility::Hidden => UserStatus::Away,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::time::timeout;

    use crate::page::PageState;

    #[test]
    fn test_status_for_visibility() {
        assert_eq!(status_for(Visibility::Visible), UserStatus::Online);
        assert_eq!(status_for(Visibility::Hidden), UserStatus::Away);
    }

    #[tokio::test]
    async fn test_policy_follows_page() {
        let page = PageState::new();
        let mut policy = PresencePolicy::new(Some(page.subscribe()));

        page.set_visibility(Visibility::Hidden);
        assert_eq!(policy.next_status().await, UserStatus::Away);

        page.set_visibility(Visibility::Visible);
        assert_eq!(policy.next_status().await, UserStatus::Online);
    }

    #[tokio::test(start_paused = true)]
    async fn test_policy_goes_inert_when_page_dropped() {
        let page = PageState::new();
        let mut policy = PresencePolicy::new(Some(page.subscribe()));
        drop(page);

        let result = timeout(Duration::from_secs(5), policy.next_status()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_policy_never_fires() {
        let mut policy = PresencePolicy::default();
        let result = timeout(Duration::from_secs(5), policy.next_status()).await;
        assert!(result.is_err());
    }
}
