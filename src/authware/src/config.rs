//! Configuration for the Authware client.

use std::time::Duration;

/// Origin every request is sent to.
pub const DEFAULT_BASE_URL: &str = "https://api.authware.org/";

/// Handshake, read, write and overall request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed client identifier sent as `User-Agent`.
pub const USER_AGENT: &str = concat!("Authware-Rust/", env!("CARGO_PKG_VERSION"));

/// Configuration for the HTTPS transport.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every relative endpoint path is appended to.
    pub base_url: String,
    /// Default timeout applied to each phase of a request.
    pub timeout: Duration,
    /// Client identifier header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.into(),
        }
    }
}

impl ClientConfig {
    /// Set the base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the client identifier.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Base URL with exactly one trailing slash.
    pub(crate) fn normalized_base_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }
}
