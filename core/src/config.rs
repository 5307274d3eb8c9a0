//! Client configuration shared by every resource client.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Graph API host used when no other base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

/// Immutable settings handed to `GraphRequests` and `GraphClient`.
///
/// A config without an access token describes an unauthorized client: every
/// request built from it fails with `GraphError::NotAuthorized`.
#[derive(Clone)]
pub struct GraphConfig {
    base_url: String,
    access_token: Option<SecretString>,
}

impl GraphConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: Some(SecretString::from(access_token.into())),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
        }
    }

    /// Point the client at another host, e.g. a local mock server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authorized(&self) -> bool {
        self.access_token
            .as_ref()
            .is_some_and(|t| !t.expose_secret().is_empty())
    }

    pub(crate) fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_ref()
            .map(|t| t.expose_secret())
            .filter(|t| !t.is_empty())
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphConfig")
            .field("base_url", &self.base_url)
            .field("authorized", &self.is_authorized())
            .finish()
    }
}
