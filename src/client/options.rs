//! Client timing and reconnection options.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use social_realtime::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_reconnect_interval(Duration::from_secs(1))
//!     .with_max_reconnect_attempts(10)
//!     .with_pong_timeout(Duration::from_secs(10));
//!
//! options.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::ReconnectPolicy;
use crate::transport::backoff::{
    DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_MAX_RECONNECT_DELAY, DEFAULT_RECONNECT_INTERVAL,
};
use crate::transport::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_WS_PATH};

// ============================================================================
// Constants
// ============================================================================

/// Default heartbeat period.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

// ============================================================================
// ClientOptions
// ============================================================================

/// Connection behavior of a [`RealtimeClient`](crate::RealtimeClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Retry abnormal closes.
    pub auto_reconnect: bool,

    /// Base delay of the exponential backoff.
    pub reconnect_interval: Duration,

    /// Retries allowed since the last successful open.
    pub max_reconnect_attempts: u32,

    /// Cap on a single backoff delay.
    pub max_reconnect_delay: Duration,

    /// Period between `ping` frames while open.
    pub heartbeat_interval: Duration,

    /// Force a reconnect when a ping goes unanswered this long.
    ///
    /// `None` never checks for pongs.
    pub pong_timeout: Option<Duration>,

    /// Handshake timeout of the default connector.
    pub connect_timeout: Duration,

    /// WebSocket route appended to the API base URL.
    pub ws_path: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with the default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            auto_reconnect: true,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            max_reconnect_delay: DEFAULT_MAX_RECONNECT_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            pong_timeout: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            ws_path: DEFAULT_WS_PATH.to_string(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Enables or disables automatic reconnection.
    #[inline]
    #[must_use]
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Sets the backoff base delay.
    #[inline]
    #[must_use]
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Sets the retry budget.
    #[inline]
    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Sets the backoff cap.
    #[inline]
    #[must_use]
    pub fn with_max_reconnect_delay(mut self, delay: Duration) -> Self {
        self.max_reconnect_delay = delay;
        self
    }

    /// Sets the heartbeat period.
    #[inline]
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Enables pong-timeout detection.
    #[inline]
    #[must_use]
    pub fn with_pong_timeout(mut self, timeout: Duration) -> Self {
        self.pong_timeout = Some(timeout);
        self
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the WebSocket route.
    #[inline]
    #[must_use]
    pub fn with_ws_path(mut self, path: impl Into<String>) -> Self {
        self.ws_path = path.into();
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl ClientOptions {
    /// Returns the reconnection policy these options describe.
    #[must_use]
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            enabled: self.auto_reconnect,
            base_interval: self.reconnect_interval,
            max_delay: self.max_reconnect_delay,
            max_attempts: self.max_reconnect_attempts,
        }
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_interval.is_zero() {
            return Err(Error::config("Heartbeat interval must be greater than zero"));
        }

        if self.reconnect_interval.is_zero() {
            return Err(Error::config("Reconnect interval must be greater than zero"));
        }

        if self.max_reconnect_delay < self.reconnect_interval {
            return Err(Error::config(format!(
                "Max reconnect delay ({}ms) is shorter than the reconnect interval ({}ms)",
                self.max_reconnect_delay.as_millis(),
                self.reconnect_interval.as_millis()
            )));
        }

        if self.pong_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(Error::config("Pong timeout must be greater than zero"));
        }

        if self.connect_timeout.is_zero() {
            return Err(Error::config("Connect timeout must be greater than zero"));
        }

        if self.ws_path.trim_matches('/').is_empty() {
            return Err(Error::config("WebSocket path must not be empty"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::new();
        assert!(options.auto_reconnect);
        assert_eq!(options.reconnect_interval, Duration::from_millis(3_000));
        assert_eq!(options.max_reconnect_attempts, 5);
        assert_eq!(options.max_reconnect_delay, Duration::from_millis(30_000));
        assert_eq!(options.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(options.pong_timeout, None);
        assert_eq!(options.ws_path, "/api/v1/ws");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let options = ClientOptions::new()
            .with_auto_reconnect(false)
            .with_reconnect_interval(Duration::from_secs(1))
            .with_max_reconnect_attempts(2)
            .with_pong_timeout(Duration::from_secs(5));

        let policy = options.reconnect_policy();
        assert!(!policy.enabled);
        assert_eq!(policy.base_interval, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(options.pong_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_validate_rejects_zero_heartbeat() {
        let options = ClientOptions::new().with_heartbeat_interval(Duration::ZERO);
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("Heartbeat"));
    }

    #[test]
    fn test_validate_rejects_inverted_backoff() {
        let options = ClientOptions::new()
            .with_reconnect_interval(Duration::from_secs(10))
            .with_max_reconnect_delay(Duration::from_secs(5));
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_path() {
        assert!(ClientOptions::new().with_ws_path("/").validate().is_err());
    }

    #[test]
    fn test_zero_attempts_is_valid() {
        let options = ClientOptions::new().with_max_reconnect_attempts(0);
        assert!(options.validate().is_ok());
        assert_eq!(options.reconnect_policy().next_delay(1006, 0), None);
    }
}
