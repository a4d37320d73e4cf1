//! Page focus and visibility.
//!
//! The UI layer reports focus and visibility changes into a [`PageState`];
//! the dispatcher reads focus to suppress duplicate chat notifications and
//! the presence policy watches visibility to broadcast online/away.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

// ============================================================================
// FocusState
// ============================================================================

/// Answers whether the user is currently looking at the application.
pub trait FocusState: Send + Sync {
    /// Returns `true` when the page has input focus.
    fn has_focus(&self) -> bool;
}

// ============================================================================
// Visibility
// ============================================================================

/// Page visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Page is shown.
    #[default]
    Visible,
    /// Page is backgrounded or minimized.
    Hidden,
}

// ============================================================================
// PageState
// ============================================================================

/// Focus and visibility of the hosting page.
///
/// Cheap to clone; all clones share the same state.
#[derive(Debug, Clone)]
pub struct PageState {
    inner: Arc<PageInner>,
}

#[derive(Debug)]
struct PageInner {
    focused: AtomicBool,
    visibility: watch::Sender<Visibility>,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new()
    }
}

impl PageState {
    /// Creates a focused, visible page.
    #[must_use]
    pub fn new() -> Self {
        let (visibility, _) = watch::channel(Visibility::Visible);
        Self {
            inner: Arc::new(PageInner {
                focused: AtomicBool::new(true),
                visibility,
            }),
        }
    }

    /// Records a focus change.
    pub fn set_focused(&self, focused: bool) {
        self.inner.focused.store(focused, Ordering::Release);
    }

    /// Records a visibility change; repeated values are not re-published.
    pub fn set_visibility(&self, visibility: Visibility) {
        self.inner.visibility.send_if_modified(|current| {
            if *current == visibility {
                return false;
            }
            *current = visibility;
            true
        });
    }

    /// Returns the current visibility.
    #[inline]
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        *self.inner.visibility.borrow()
    }

    /// Subscribes to visibility changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Visibility> {
        self.inner.visibility.subscribe()
    }
}

impl FocusState for PageState {
    fn has_focus(&self) -> bool {
        self.inner.focused.load(Ordering::Acquire) && self.visibility() == Visibility::Visible
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_page_is_focused() {
        let page = PageState::new();
        assert!(page.has_focus());
        assert_eq!(page.visibility(), Visibility::Visible);
    }

    #[test]
    fn test_hidden_page_has_no_focus() {
        let page = PageState::new();
        page.set_visibility(Visibility::Hidden);
        assert!(!page.has_focus());

        page.set_visibility(Visibility::Visible);
        page.set_focused(false);
        assert!(!page.has_focus());
    }

    #[test]
    fn test_clones_share_state() {
        let page = PageState::new();
        let clone = page.clone();
        clone.set_focused(false);
        assert!(!page.has_focus());
    }

    #[tokio::test]
    async fn test_visibility_changes_are_published_once() {
        let page = PageState::new();
        let mut rx = page.subscribe();

        page.set_visibility(Visibility::Hidden);
        page.set_visibility(Visibility::Hidden);

        rx.changed().await.expect("changed");
        assert_eq!(*rx.borrow_and_update(), Visibility::Hidden);
        assert!(!rx.has_changed().expect("sender alive"));
    }
}
