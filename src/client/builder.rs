//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`RealtimeClient`]
//! instances.
//!
//! # Example
//!
//! ```ignore
//! use social_realtime::{PageState, RealtimeClient, StaticCredential};
//!
//! let page = PageState::new();
//! let client = RealtimeClient::builder()
//!     .api_base_url("https://api.example.com")
//!     .credentials(StaticCredential::new("token"))
//!     .page(page.clone())
//!     .on_connection_status_change(|connected| println!("connected: {connected}"))
//!     .build()?;
//!
//! client.connect()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::auth::{CredentialProvider, StaticCredential};
use crate::dispatch::{Dispatcher, MessageHandler, Notifier, TracingNotifier};
use crate::error::{Error, Result};
use crate::page::{FocusState, PageState, Visibility};
use crate::presence::PresencePolicy;
use crate::protocol::Message;
use crate::transport::manager::ManagerSettings;
use crate::transport::{Connector, Endpoint, StatusHandler, TungsteniteConnector};

use super::core::RealtimeClient;
use super::options::ClientOptions;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`RealtimeClient`] instance.
///
/// Use [`RealtimeClient::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct ClientBuilder {
    /// HTTP(S) base URL of the API.
    api_base_url: Option<String>,
    /// Source of the bearer token, read on every connect.
    credentials: Option<Arc<dyn CredentialProvider>>,
    /// Socket factory.
    connector: Option<Arc<dyn Connector>>,
    /// Sink for built-in notifications.
    notifier: Option<Arc<dyn Notifier>>,
    /// Focus used to suppress chat notifications.
    focus: Option<Arc<dyn FocusState>>,
    /// Visibility feed for automatic presence.
    visibility: Option<watch::Receiver<Visibility>>,
    /// Caller message handler.
    on_message: Option<MessageHandler>,
    /// Caller status handler.
    on_status_change: Option<StatusHandler>,
    /// Timing and reconnection options.
    options: ClientOptions,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("api_base_url", &self.api_base_url)
            .field("has_credentials", &self.credentials.is_some())
            .field("has_connector", &self.connector.is_some())
            .field("has_page", &self.visibility.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new client builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL (`http://` or `https://`).
    ///
    /// # Arguments
    ///
    /// * `url` - Base URL, e.g. "https://api.example.com"
    #[inline]
    #[must_use]
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Sets the credential source.
    ///
    /// Without one the client connects anonymously.
    #[inline]
    #[must_use]
    pub fn credentials(mut self, credentials: impl CredentialProvider + 'static) -> Self {
        self.credentials = Some(Arc::new(credentials));
        self
    }

    /// Sets a credential source that is already shared.
    #[inline]
    #[must_use]
    pub fn shared_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the socket factory.
    ///
    /// Defaults to [`TungsteniteConnector`].
    #[inline]
    #[must_use]
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Sets the sink for built-in notifications.
    ///
    /// Defaults to [`TracingNotifier`].
    #[inline]
    #[must_use]
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Sets the focus source consulted for `new_message` notifications.
    ///
    /// Without one the application is treated as unfocused.
    #[inline]
    #[must_use]
    pub fn focus(mut self, focus: impl FocusState + 'static) -> Self {
        self.focus = Some(Arc::new(focus));
        self
    }

    /// Attaches a page: its focus drives notification suppression and its
    /// visibility drives automatic presence.
    #[must_use]
    pub fn page(mut self, page: PageState) -> Self {
        self.visibility = Some(page.subscribe());
        self.focus = Some(Arc::new(page));
        self
    }

    /// Registers a handler invoked for every inbound message.
    #[inline]
    #[must_use]
    pub fn on_message(mut self, handler: impl Fn(&Message) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(handler));
        self
    }

    /// Registers a handler invoked with the connection status on open and
    /// close.
    #[inline]
    #[must_use]
    pub fn on_connection_status_change(
        mut self,
        handler: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.on_status_change = Some(Arc::new(handler));
        self
    }

    /// Replaces the timing and reconnection options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the client and starts its event loop.
    ///
    /// The client starts disconnected; call
    /// [`connect()`](RealtimeClient::connect) to open the socket.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the API base URL is missing or not HTTP(S)
    /// - [`Error::Config`] if the options fail validation
    /// - [`Error::Config`] if called outside a Tokio runtime
    /// - [`Error::Url`] if the API base URL cannot be parsed
    pub fn build(self) -> Result<RealtimeClient> {
        self.options.validate()?;
        let endpoint = self.validate_endpoint()?;

        let runtime = Handle::try_current().map_err(|_| {
            Error::config(
                "RealtimeClient must be built inside a Tokio runtime.\n\
                 Example: #[tokio::main] async fn main() { ... }",
            )
        })?;

        let connector = self.connector.unwrap_or_else(|| {
            Arc::new(TungsteniteConnector::new(self.options.connect_timeout))
        });
        let credentials = self
            .credentials
            .unwrap_or_else(|| Arc::new(StaticCredential::anonymous()));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier));
        let focus = self.focus.unwrap_or_else(|| Arc::new(Unfocused));

        let settings = ManagerSettings {
            connector,
            endpoint,
            credentials,
            policy: self.options.reconnect_policy(),
            heartbeat_interval: self.options.heartbeat_interval,
            pong_timeout: self.options.pong_timeout,
            dispatcher: Dispatcher::new(notifier, focus, self.on_message),
            on_status_change: self.on_status_change,
            presence: PresencePolicy::new(self.visibility),
        };

        Ok(RealtimeClient::spawn(&runtime, settings))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates the API base URL and derives the endpoint.
    fn validate_endpoint(&self) -> Result<Endpoint> {
        let api_base_url = self.api_base_url.as_deref().ok_or_else(|| {
            Error::config(
                "API base URL is required. Use .api_base_url() to set it.\n\
                 Example: RealtimeClient::builder().api_base_url(\"https://api.example.com\")",
            )
        })?;

        Endpoint::new(api_base_url, &self.options.ws_path)
    }
}

// ============================================================================
// Unfocused
// ============================================================================

/// Focus source used when no page is attached.
struct Unfocused;

impl FocusState for Unfocused {
    fn has_focus(&self) -> bool {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
