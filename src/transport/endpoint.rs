//! WebSocket endpoint derivation.
//!
//! The endpoint is derived from the REST base URL:
//!
//! ```text
//! https://api.example.com        →  wss://api.example.com/api/v1/ws?token=<credential>
//! http://localhost:8000/social   →  ws://localhost:8000/social/api/v1/ws?token=<credential>
//! ```

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default WebSocket route, appended to the base URL path.
pub const DEFAULT_WS_PATH: &str = "/api/v1/ws";

/// Query parameter carrying the bearer credential.
const TOKEN_PARAM: &str = "token";

// ============================================================================
// Endpoint
// ============================================================================

/// Credential-less WebSocket URL, ready to receive a token per connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    /// Derives the endpoint from a REST base URL and a WebSocket route.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if `api_base_url` does not parse
    /// - [`Error::Config`] if the scheme is not http(s) or ws(s)
    pub fn new(api_base_url: &str, ws_path: &str) -> Result<Self> {
        let mut base = Url::parse(api_base_url)?;

        let scheme = match base.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(Error::config(format!(
                    "Unsupported API URL scheme '{other}', expected http, https, ws or wss"
                )));
            }
        };
        base.set_scheme(scheme)
            .map_err(|_| Error::config(format!("Cannot switch {api_base_url} to {scheme}")))?;

        let path = format!(
            "{}/{}",
            base.path().trim_end_matches('/'),
            ws_path.trim_start_matches('/')
        );
        base.set_path(&path);
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self { base })
    }

    /// Builds the URL for one connect attempt.
    ///
    /// A missing credential yields a URL without the token parameter; the
    /// server is left to reject it.
    #[must_use]
    pub fn url(&self, token: Option<&str>) -> Url {
        let mut url = self.base.clone();
        if let Some(token) = token {
            url.set_query(Some(&format!(
                "{TOKEN_PARAM}={}",
                urlencoding::encode(token)
            )));
        }
        url
    }

    /// Returns `true` for `wss://` endpoints.
    #[inline]
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base.scheme() == "wss"
    }
}

// ============================================================================
// Tests
// ============================================================================
