//! Bearer credential sources.
//!
//! The connection manager reads the credential through
//! [`CredentialProvider`] each time it builds the endpoint URL, so a token
//! refreshed by the authentication layer is picked up on the next
//! reconnect.
//!
//! | Type | Source |
//! |------|--------|
//! | [`StaticCredential`] | Fixed token (or none) |
//! | closures | `Fn() -> Option<String>` |
//! | [`KeyedCredentials`] | First non-empty value among several keys of a [`KeyValueStore`] |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

// ============================================================================
// Constants
// ============================================================================

/// Storage keys probed by [`KeyedCredentials::with_default_keys`], in order.
pub const DEFAULT_TOKEN_KEYS: [&str; 2] = ["token", "access_token"];

// ============================================================================
// CredentialProvider
// ============================================================================

/// Supplies the bearer credential appended to the endpoint URL.
pub trait CredentialProvider: Send + Sync {
    /// Returns the current token, or `None` when the user is signed out.
    fn bearer_token(&self) -> Option<String>;
}

impl<F> CredentialProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn bearer_token(&self) -> Option<String> {
        self()
    }
}

// ============================================================================
// StaticCredential
// ============================================================================

/// A credential fixed at construction time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCredential(Option<String>);

impl StaticCredential {
    /// Creates a provider that always returns `token`.
    #[inline]
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// Creates a provider with no credential.
    #[inline]
    #[must_use]
    pub const fn anonymous() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticCredential {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone().filter(|token| !token.is_empty())
    }
}

// ============================================================================
// KeyValueStore
// ============================================================================

/// String key-value storage owned by the authentication layer.
pub trait KeyValueStore: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory [`KeyValueStore`] shared between the auth layer and the client.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<FxHashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().insert(key.into(), value.into());
    }

    /// Removes a value.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().remove(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

// ============================================================================
// KeyedCredentials
// ============================================================================

/// Reads the token from the first populated key of a store.
pub struct KeyedCredentials<S> {
    store: S,
    keys: Vec<String>,
}

impl<S: KeyValueStore> KeyedCredentials<S> {
    /// Creates a provider probing `keys` in order.
    #[must_use]
    pub fn new(store: S, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            store,
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a provider probing [`DEFAULT_TOKEN_KEYS`].
    #[must_use]
    pub fn with_default_keys(store: S) -> Self {
        Self::new(store, DEFAULT_TOKEN_KEYS)
    }
}

impl<S: KeyValueStore> CredentialProvider for KeyedCredentials<S> {
    fn bearer_token(&self) -> Option<String> {
        self.keys
            .iter()
            .filter_map(|key| self.store.get(key))
            .find(|token| !token.is_empty())
    }
}

// ============================================================================
// Tests
// ============================================================================
