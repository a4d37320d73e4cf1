//! Frame dispatcher.
//!
//! Parse failures are logged and the frame is dropped; they never touch
//! connection state or later frames. A panicking caller callback is
//! caught and logged the same way.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, trace, warn};

use crate::page::FocusState;
use crate::protocol::{Message, ParsedMessage};
use crate::transport::ConnectionSnapshot;

use super::notification::{Notification, Notifier};

// ============================================================================
// Types
// ============================================================================

/// Caller handler invoked for every parsed inbound message.
pub type MessageHandler = Arc<dyn Fn(&Message) + Send + Sync>;

/// Name used when the server omits a display name.
const UNKNOWN_USER: &str = "Someone";

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes inbound frames to state, the caller handler and built-in effects.
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    focus: Arc<dyn FocusState>,
    on_message: Option<MessageHandler>,
}

impl Dispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        notifier: Arc<dyn Notifier>,
        focus: Arc<dyn FocusState>,
        on_message: Option<MessageHandler>,
    ) -> Self {
        Self {
            notifier,
            focus,
            on_message,
        }
    }

    /// Dispatches one text frame.
    ///
    /// Returns the parsed message, or `None` if the frame was malformed.
    pub fn dispatch(
        &self,
        text: &str,
        state: &watch::Sender<ConnectionSnapshot>,
    ) -> Option<Message> {
        let message = match Message::from_text(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, len = text.len(), "Failed to parse incoming message");
                return None;
            }
        };

        trace!(kind = message.kind(), "Dispatching message");

        state.send_modify(|snapshot| snapshot.last_message = Some(message.clone()));

        if let Some(handler) = &self.on_message {
            invoke_guarded("on_message", || handler(&message));
        }

        // Focus state and the notifier are caller code too
        invoke_guarded("notifier", || {
            if let Some(notification) = self.notification_for(&message.parse()) {
                self.notifier.notify(notification);
            }
        });

        Some(message)
    }

    /// Returns the built-in notification for a message, if any.
    #[must_use]
    pub fn notification_for(&self, parsed: &ParsedMessage) -> Option<Notification> {
        match parsed {
            ParsedMessage::ConnectionEstablished => Some(Notification::info("Connected")),

            ParsedMessage::ConnectionRequest { sender_name } => Some(Notification::info(format!(
                "New connection request from {}",
                display_name(sender_name)
            ))),

            ParsedMessage::ConnectionResponse {
                accepted: true,
                responder_name,
            } => Some(Notification::success(format!(
                "{} accepted your connection request",
                display_name(responder_name)
            ))),

            ParsedMessage::ConnectionResponse {
                accepted: false,
                responder_name,
            } => Some(Notification::info(format!(
                "{} declined your connection request",
                display_name(responder_name)
            ))),

            // In-app chat already shows it while the page is focused
            ParsedMessage::NewMessage {
                sender_name,
                content,
                ..
            } => (!self.focus.has_focus()).then(|| {
                Notification::info(format!("New message from {}", display_name(sender_name)))
                    .with_body(content.clone())
            }),

            ParsedMessage::MessageReaction { user_name, emoji } => Some(Notification::info(
                format!("{} reacted {} to your message", display_name(user_name), emoji),
            )),

            ParsedMessage::UserStatusUpdate { user_id, status } => {
                debug!(?user_id, status = %status, "User status update");
                None
            }

            ParsedMessage::Error { message } => Some(Notification::error(message.clone())),

            ParsedMessage::TypingStatus { .. }
            | ParsedMessage::Pong
            | ParsedMessage::Unknown { .. } => None,
        }
    }
}

// ============================================================================
// Callback Guard
// ============================================================================

/// Runs a caller-supplied callback, catching and logging a panic.
///
/// Returns `None` if the callback panicked. The event loop keeps running.
pub(crate) fn invoke_guarded<R>(callback: &'static str, f: impl FnOnce() -> R) -> Option<R> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            error!(callback, panic = panic_message(&*payload), "Callback panicked");
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Falls back to a neutral name when the server sent none.
#[inline]
fn display_name(name: &str) -> &str {
    if name.is_empty() { UNKNOWN_USER } else { name }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use crate::dispatch::NotificationLevel;

    #[derive(Default)]
    struct Collector(Mutex<Vec<Notification>>);

    impl Notifier for Collector {
        fn notify(&self, notification: Notification) {
            self.0.lock().push(notification);
        }
    }

    struct Focus(AtomicBool);

    impl FocusState for Focus {
        fn has_focus(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct Fixture {
        dispatcher: Dispatcher,
        notes: Arc<Collector>,
        focus: Arc<Focus>,
        calls: Arc<AtomicUsize>,
        state: watch::Sender<ConnectionSnapshot>,
    }

    fn fixture() -> Fixture {
        let notes = Arc::new(Collector::default());
        let focus = Arc::new(Focus(AtomicBool::new(true)));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler: MessageHandler = Arc::new(move |_message: &Message| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let (state, _) = watch::channel(ConnectionSnapshot::default());

        Fixture {
            dispatcher: Dispatcher::new(notes.clone(), focus.clone(), Some(handler)),
            notes,
            focus,
            calls,
            state,
        }
    }

    const NEW_MESSAGE: &str =
        r#"{"type":"new_message","message":{"sender_name":"Alice","content":"hi"}}"#;

    #[test]
    fn test_new_message_unfocused_notifies_once() {
        let f = fixture();
        f.focus.0.store(false, Ordering::SeqCst);

        f.dispatcher.dispatch(NEW_MESSAGE, &f.state).expect("dispatched");

        let notes = f.notes.0.lock();
        assert_eq!(notes.len(), 1);
        let text = notes[0].to_string();
        assert!(text.contains("Alice"));
        assert!(text.contains("hi"));
    }

    #[test]
    fn test_new_message_focused_is_silent_but_recorded() {
        let f = fixture();

        let message = f.dispatcher.dispatch(NEW_MESSAGE, &f.state).expect("dispatched");

        assert!(f.notes.0.lock().is_empty());
        assert_eq!(f.calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.state.borrow().last_message.as_ref(), Some(&message));
    }

    #[test]
    fn test_malformed_frame_is_dropped() {
        let f = fixture();

        assert!(f.dispatcher.dispatch("{not json", &f.state).is_none());
        assert!(f.dispatcher.dispatch(r#"{"no_type":1}"#, &f.state).is_none());

        assert_eq!(f.calls.load(Ordering::SeqCst), 0);
        assert!(f.state.borrow().last_message.is_none());
    }

    #[test]
    fn test_last_message_is_overwritten() {
        let f = fixture();

        f.dispatcher
            .dispatch(r#"{"type":"typing_status","chat_id":1}"#, &f.state)
            .expect("first");
        f.dispatcher.dispatch(r#"{"type":"pong"}"#, &f.state).expect("second");

        let snapshot = f.state.borrow();
        assert_eq!(snapshot.last_message.as_ref().map(Message::kind), Some("pong"));
        assert_eq!(f.calls.load(Ordering::SeqCst), 2);
        assert!(f.notes.0.lock().is_empty());
    }

    #[test]
    fn test_error_frame_carries_server_text() {
        let f = fixture();

        f.dispatcher
            .dispatch(r#"{"type":"error","message":"Chat not found"}"#, &f.state)
            .expect("dispatched");

        let notes = f.notes.0.lock();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].title, "Chat not found");
    }

    #[test]
    fn test_connection_frames() {
        let f = fixture();

        f.dispatcher
            .dispatch(r#"{"type":"connection_established"}"#, &f.state)
            .expect("established");
        f.dispatcher
            .dispatch(
                r#"{"type":"connection_request","data":{"sender_name":"Carol"}}"#,
                &f.state,
            )
            .expect("request");
        f.dispatcher
            .dispatch(
                r#"{"type":"connection_response","accepted":true,"data":{"responder_name":"Dan"}}"#,
                &f.state,
            )
            .expect("response");

        let titles: Vec<String> = f.notes.0.lock().iter().map(|n| n.title.clone()).collect();
        assert_eq!(
            titles,
            vec![
                "Connected".to_string(),
                "New connection request from Carol".to_string(),
                "Dan accepted your connection request".to_string(),
            ]
        );
    }

    #[test]
    fn test_reaction_names_user_and_emoji() {
        let f = fixture();
        let parsed = ParsedMessage::MessageReaction {
            user_name: "Eve".into(),
            emoji: "🎉".into(),
        };

        let note = f.dispatcher.notification_for(&parsed).expect("notification");
        assert!(note.title.contains("Eve"));
        assert!(note.title.contains("🎉"));
    }

    #[test]
    fn test_silent_types() {
        let f = fixture();
        for frame in [
            r#"{"type":"user_status_update","user_id":4,"status":"away"}"#,
            r#"{"type":"typing_status","chat_id":2,"is_typing":true}"#,
            r#"{"type":"pong"}"#,
            r#"{"type":"post_liked"}"#,
        ] {
            f.dispatcher.dispatch(frame, &f.state).expect("dispatched");
        }

        assert!(f.notes.0.lock().is_empty());
        assert_eq!(f.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_invoke_guarded_catches_panic() {
        assert_eq!(invoke_guarded("ok", || 7), Some(7));
        assert_eq!(invoke_guarded("str", || -> u8 { panic!("static") }), None);
        assert_eq!(
            invoke_guarded("string", || -> u8 { panic!("{} formatted", 1) }),
            None
        );
    }

    #[test]
    fn test_panicking_handler_still_records_and_notifies() {
        let notes = Arc::new(Collector::default());
        let focus = Arc::new(Focus(AtomicBool::new(false)));
        let handler: MessageHandler = Arc::new(|message: &Message| {
            if message.kind() == "boom" {
                panic!("handler exploded");
            }
        });
        let (state, _) = watch::channel(ConnectionSnapshot::default());
        let dispatcher = Dispatcher::new(notes.clone(), focus, Some(handler));

        let message = dispatcher.dispatch(r#"{"type":"boom"}"#, &state);
        assert_eq!(message.as_ref().map(Message::kind), Some("boom"));
        assert_eq!(state.borrow().last_message.as_ref().map(Message::kind), Some("boom"));

        dispatcher
            .dispatch(NEW_MESSAGE, &state)
            .expect("later frames still dispatched");
        assert_eq!(notes.0.lock().len(), 1);
    }

    #[test]
    fn test_panicking_notifier_is_contained() {
        let notifier = Arc::new(|notification: Notification| {
            assert!(notification.title.is_empty(), "toast failed");
        });
        let focus = Arc::new(Focus(AtomicBool::new(false)));
        let (state, _) = watch::channel(ConnectionSnapshot::default());
        let dispatcher = Dispatcher::new(notifier, focus, None);

        assert!(dispatcher.dispatch(NEW_MESSAGE, &state).is_some());
        assert!(
            dispatcher
                .dispatch(r#"{"type":"error","message":"x"}"#, &state)
                .is_some()
        );
    }

    #[test]
    fn test_missing_names_fall_back() {
        let f = fixture();
        let parsed = ParsedMessage::ConnectionRequest {
            sender_name: String::new(),
        };

        let note = f.dispatcher.notification_for(&parsed).expect("notification");
        assert_eq!(note.title, "New connection request from Someone");
    }
}
