//! Shared client instance for a tree of consumers.
//!
//! A [`Scope`] is a node in a dependency-injection tree. Mounting a
//! [`RealtimeProvider`] on a scope makes one [`RealtimeClient`] available
//! to that scope and every descendant through [`use_realtime`]; asking for
//! it anywhere else fails fast with [`Error::ProviderMissing`].
//!
//! # Example
//!
//! ```ignore
//! use social_realtime::{RealtimeClient, RealtimeProvider, Scope, use_realtime};
//!
//! let app = Scope::root();
//! let _provider = RealtimeProvider::mount(
//!     &app,
//!     RealtimeClient::builder().api_base_url("https://api.example.com"),
//! )?;
//!
//! let chat_view = app.child();
//! let realtime = use_realtime(&chat_view)?;
//! realtime.send_typing_status(ChatId::new(1), true);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::client::{ClientBuilder, RealtimeClient};
use crate::error::{Error, Result};

// ============================================================================
// Scope
// ============================================================================

type Entry = Arc<dyn Any + Send + Sync>;

/// Node in a dependency-injection tree.
///
/// Cheap to clone; clones refer to the same node.
#[derive(Clone, Default)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

#[derive(Default)]
struct ScopeInner {
    parent: Option<Scope>,
    values: RwLock<FxHashMap<TypeId, Entry>>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("depth", &self.depth())
            .field("values", &self.inner.values.read().len())
            .finish()
    }
}

impl Scope {
    /// Creates a root scope.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a child that sees every value provided here.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                parent: Some(self.clone()),
                values: RwLock::default(),
            }),
        }
    }

    /// Registers `value` on this scope, replacing any value of the same type.
    pub fn provide<T: Any + Send + Sync>(&self, value: T) {
        self.inner
            .values
            .write()
            .insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Returns the nearest value of type `T`, walking up to the root.
    #[must_use]
    pub fn consume<T: Any + Send + Sync + Clone>(&self) -> Option<T> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(value) = current
                .inner
                .values
                .read()
                .get(&TypeId::of::<T>())
                .and_then(|entry| entry.downcast_ref::<T>())
            {
                return Some(value.clone());
            }
            scope = current.inner.parent.as_ref();
        }
        None
    }

    /// Like [`consume`](Self::consume), failing when no ancestor provides `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderMissing`] naming `T` and `provider`.
    pub fn require<T: Any + Send + Sync + Clone>(&self, provider: &'static str) -> Result<T> {
        self.consume::<T>()
            .ok_or_else(|| Error::provider_missing(short_type_name::<T>(), provider))
    }

    /// Returns `true` if this scope itself provides a `T`.
    #[must_use]
    pub fn provides<T: Any>(&self) -> bool {
        self.inner.values.read().contains_key(&TypeId::of::<T>())
    }

    /// Removes the `T` provided on this scope; ancestors are untouched.
    pub fn remove<T: Any>(&self) -> bool {
        self.inner
            .values
            .write()
            .remove(&TypeId::of::<T>())
            .is_some()
    }

    /// Distance from the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut parent = self.inner.parent.as_ref();
        while let Some(scope) = parent {
            depth += 1;
            parent = scope.inner.parent.as_ref();
        }
        depth
    }
}

/// Last path segment of a type name.
fn short_type_name<T>() -> &'static str {
    let name = type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

// ============================================================================
// RealtimeProvider
// ============================================================================

/// Context registered by [`RealtimeProvider`].
#[derive(Debug, Clone)]
struct RealtimeContext {
    client: RealtimeClient,
}

/// Owns the shared client of a scope subtree.
///
/// Dropping the provider (or calling [`unmount`](Self::unmount)) removes
/// the context and shuts the connection down.
#[derive(Debug)]
pub struct RealtimeProvider {
    scope: Scope,
    client: RealtimeClient,
}

impl RealtimeProvider {
    /// Builds a client, connects it, and registers it on `scope`.
    ///
    /// # Errors
    ///
    /// - Any error from [`ClientBuilder::build`]
    /// - [`Error::Config`] if `scope` already has a provider mounted
    pub fn mount(scope: &Scope, builder: ClientBuilder) -> Result<Self> {
        if scope.provides::<RealtimeContext>() {
            return Err(Error::config(
                "RealtimeProvider is already mounted on this scope",
            ));
        }

        let client = builder.build()?;
        client.connect()?;

        scope.provide(RealtimeContext {
            client: client.clone(),
        });
        debug!(depth = scope.depth(), "RealtimeProvider mounted");

        Ok(Self {
            scope: scope.clone(),
            client,
        })
    }

    /// Returns the provided client.
    #[inline]
    #[must_use]
    pub fn client(&self) -> &RealtimeClient {
        &self.client
    }

    /// Removes the context and shuts the connection down.
    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for RealtimeProvider {
    fn drop(&mut self) {
        self.scope.remove::<RealtimeContext>();
        self.client.shutdown();
        debug!("RealtimeProvider unmounted");
    }
}

/// Returns the client shared by the nearest [`RealtimeProvider`].
///
/// # Errors
///
/// Returns [`Error::ProviderMissing`] when no ancestor of `scope` has a
/// provider mounted.
pub fn use_realtime(scope: &Scope) -> Result<RealtimeClient> {
    scope
        .require::<RealtimeContext>("RealtimeProvider")
        .map(|context| context.client)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::transport::MemoryConnector;

    fn builder() -> (ClientBuilder, crate::transport::MemoryListener) {
        let (connector, listener) = MemoryConnector::new();
        let builder = RealtimeClient::builder()
            .api_base_url("http://localhost:8080")
            .connector(connector);
        (builder, listener)
    }

    #[test]
    fn test_consume_walks_parents() {
        let root = Scope::root();
        root.provide(7_u32);

        let grandchild = root.child().child();
        assert_eq!(grandchild.consume::<u32>(), Some(7));
        assert_eq!(grandchild.depth(), 2);
    }

    #[test]
    fn test_nearest_value_wins() {
        let root = Scope::root();
        root.provide("root");
        let child = root.child();
        child.provide("child");

        assert_eq!(child.consume::<&str>(), Some("child"));
        assert_eq!(root.consume::<&str>(), Some("root"));
    }

    #[test]
    fn test_remove_is_local() {
        let root = Scope::root();
        root.provide(1_u8);
        let child = root.child();

        assert!(!child.remove::<u8>());
        assert!(root.remove::<u8>());
        assert_eq!(child.consume::<u8>(), None);
    }

    #[test]
    fn test_require_names_missing_context() {
        let err = Scope::root().require::<u64>("NumberProvider").unwrap_err();
        assert!(err.is_usage_error());
        assert!(err.to_string().contains("u64"));
        assert!(err.to_string().contains("NumberProvider"));
    }

    #[tokio::test]
    async fn test_descendants_share_one_client() {
        let root = Scope::root();
        let (builder, mut listener) = builder();
        let provider = RealtimeProvider::mount(&root, builder).expect("mount");

        let socket = listener.accept().await.expect("connects on mount");
        assert_eq!(socket.url().as_str(), "ws://localhost:8080/api/v1/ws");

        let a = use_realtime(&root.child()).expect("child");
        let b = use_realtime(&root.child().child()).expect("grandchild");
        socket.open();
        let mut state = a.subscribe();
        state.wait_for(|s| s.is_connected).await.expect("loop alive");

        assert!(b.is_connected());
        assert!(provider.client().is_connected());
    }

    #[tokio::test]
    async fn test_sibling_scope_fails_fast() {
        let root = Scope::root();
        let left = root.child();
        let right = root.child();
        let (builder, _listener) = builder();
        let _provider = RealtimeProvider::mount(&left, builder).expect("mount");

        let err = use_realtime(&right).unwrap_err();
        assert!(matches!(
            err,
            Error::ProviderMissing {
                context: "RealtimeContext",
                provider: "RealtimeProvider",
            }
        ));
        assert!(use_realtime(&root).is_err());
    }

    #[tokio::test]
    async fn test_double_mount_rejected() {
        let root = Scope::root();
        let (first, _l1) = builder();
        let (second, _l2) = builder();

        let _provider = RealtimeProvider::mount(&root, first).expect("mount");
        assert!(RealtimeProvider::mount(&root, second).is_err());
    }

    #[tokio::test]
    async fn test_unmount_removes_context_and_disconnects() {
        let root = Scope::root();
        let (builder, mut listener) = builder();
        let provider = RealtimeProvider::mount(&root, builder).expect("mount");
        let mut socket = listener.accept().await.expect("socket");
        socket.open();

        let consumer = use_realtime(&root).expect("provided");
        provider.unmount();

        assert!(use_realtime(&root).is_err());
        assert!(!consumer.is_connected());

        // Drain frames until the close shows up
        loop {
            match socket.next_frame().await {
                Some(crate::transport::Frame::Close { code, .. }) => {
                    assert_eq!(code, 1000);
                    break;
                }
                Some(_) => continue,
                None => panic!("socket released without close frame"),
            }
        }
    }

    #[test]
    fn test_mount_outside_runtime_fails() {
        let root = Scope::root();
        let (builder, _listener) = builder();
        assert!(RealtimeProvider::mount(&root, builder).is_err());
        assert!(!root.provides::<RealtimeContext>());
    }
}
