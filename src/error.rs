//! Error types for the real-time client.
//!
//! Almost every transport anomaly is absorbed inside the connection
//! manager and only logged. The variants below cover what does cross
//! the public boundary: builder validation, endpoint construction and
//! provider misuse.
//!
//! # Usage
//!
//! ```ignore
//! use social_realtime::{Error, Result};
//!
//! fn example(scope: &Scope) -> Result<()> {
//!     let realtime = use_realtime(scope)?;
//!     realtime.update_user_status(UserStatus::Online);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Url`] |
//! | Connection | [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Context | [`Error::ProviderMissing`] |
//! | External | [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client options fail validation.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Endpoint URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket handshake did not finish in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The client event loop has stopped; the handle is inert.
    ///
    /// Returned by [`RealtimeClient::connect`](crate::RealtimeClient::connect)
    /// after `shutdown()` or after the loop terminated unexpectedly.
    #[error("Connection closed: client event loop has stopped")]
    ConnectionClosed,

    // ========================================================================
    // Context Errors
    // ========================================================================
    /// A consumer asked for a shared context outside its provider.
    #[error("{context} requested outside of its provider; mount {provider} higher in the tree")]
    ProviderMissing {
        /// Name of the requested context type.
        context: &'static str,
        /// Name of the provider that must wrap the consumer.
        provider: &'static str,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a provider-missing error.
    #[inline]
    pub fn provider_missing(context: &'static str, provider: &'static str) -> Self {
        Self::ProviderMissing { context, provider }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` for programmer errors that should never be retried.
    #[inline]
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::Url(_) | Self::ProviderMissing { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connection_timeout(10_000);
        assert_eq!(err.to_string(), "Connection timeout after 10000ms");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("heartbeat interval must be greater than zero");
        assert_eq!(
            err.to_string(),
            "Configuration error: heartbeat interval must be greater than zero"
        );
    }

    #[test]
    fn test_provider_missing_names_both_sides() {
        let err = Error::provider_missing("RealtimeContext", "RealtimeProvider");
        let text = err.to_string();
        assert!(text.contains("RealtimeContext"));
        assert!(text.contains("RealtimeProvider"));
        assert!(err.is_usage_error());
    }

    #[test]
    fn test_closed_loop_is_not_usage_error() {
        assert!(!Error::ConnectionClosed.is_usage_error());
        assert!(!Error::connection_timeout(10_000).is_usage_error());
        assert!(Error::config("x").is_usage_error());
    }

    #[test]
    fn test_from_url_error() {
        let parse_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Url(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
