//! Request transport for the Authware API.
//!
//! Requests are built from a serialized JSON body and a [`HeaderContext`]
//! snapshot taken from the session, then executed through a [`Transport`].
//! The production transport is [`HttpsTransport`]: a blocking `ureq` agent
//! whose `rustls` configuration enforces the issuer allow-list from
//! [`crate::trust`].
//!
//! ## Headers
//!
//! - `Authorization` - only when a token is stored
//! - `X-Authware-Hardware-ID` - only when a hardware ID provider is configured
//! - `X-Authware-App-Version` - always
//! - `User-Agent` - always

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::decoder;
use crate::error::AuthwareError;
use crate::trust::{find_rejection, IssuerAllowList, IssuerPinningVerifier};

/// Authorization header name.
pub const AUTHORIZATION_HEADER: &str = "Authorization";
/// Hardware identifier header name.
pub const HARDWARE_ID_HEADER: &str = "X-Authware-Hardware-ID";
/// Application version header name.
pub const APP_VERSION_HEADER: &str = "X-Authware-App-Version";
/// Client identifier header name.
pub const USER_AGENT_HEADER: &str = "User-Agent";

/// Upper bound on a response body read into memory.
const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// A request ready to be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// HTTP method.
    pub method: &'static str,
    /// Endpoint path relative to the base URL, e.g. `user/auth`.
    pub path: String,
    /// Header name/value pairs, in the order they were attached.
    pub headers: Vec<(&'static str, String)>,
    /// Serialized JSON body.
    pub body: Vec<u8>,
    /// Deadline for the whole request.
    pub timeout: Duration,
}

impl OutboundRequest {
    /// Look up a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw status and body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

/// Executes requests against the Authware API.
pub trait Transport: Send + Sync {
    /// Send a request and return the raw response, whatever its status.
    ///
    /// Only failures to obtain a response at all are errors here.
    fn execute(&self, request: &OutboundRequest) -> Result<RawResponse, AuthwareError>;
}

/// Session values attached to every request as headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderContext {
    /// Stored authorization token, if any.
    pub auth_token: Option<String>,
    /// Hardware identifier produced for this request, if a provider is set.
    pub hardware_id: Option<String>,
    /// Local application version.
    pub app_version: String,
    /// Client identifier.
    pub user_agent: String,
}

impl HeaderContext {
    /// Render the header list.
    pub fn into_headers(self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::with_capacity(4);
        if let Some(token) = self.auth_token.filter(|token| !token.is_empty()) {
            headers.push((AUTHORIZATION_HEADER, token));
        }
        if let Some(hardware_id) = self.hardware_id {
            headers.push((HARDWARE_ID_HEADER, hardware_id));
        }
        headers.push((APP_VERSION_HEADER, self.app_version));
        headers.push((USER_AGENT_HEADER, self.user_agent));
        headers
    }
}

/// Serialize `body`, POST it to `path` and decode the response into `T`.
pub fn post_json<B, T>(
    transport: &dyn Transport,
    path: &str,
    body: &B,
    headers: HeaderContext,
    timeout: Duration,
) -> Result<T, AuthwareError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let request = OutboundRequest {
        method: "POST",
        path: path.to_string(),
        headers: headers.into_headers(),
        body: serde_json::to_vec(body)?,
        timeout,
    };

    debug!(path = %request.path, "Authware: sending request");
    let response = transport.execute(&request)?;
    debug!(path = %request.path, status = response.status, "Authware: response received");

    decoder::decode(response.status, &response.body)
}

/// HTTPS transport backed by a blocking `ureq` agent with issuer pinning.
pub struct HttpsTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl std::fmt::Debug for HttpsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpsTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpsTransport {
    /// Create a transport with the default issuer allow-list.
    pub fn new(config: &ClientConfig) -> Result<Self, AuthwareError> {
        Self::with_allow_list(config, IssuerAllowList::default())
    }

    /// Create a transport enforcing a specific issuer allow-list.
    pub fn with_allow_list(
        config: &ClientConfig,
        allow_list: IssuerAllowList,
    ) -> Result<Self, AuthwareError> {
        let base_url = config.normalized_base_url();
        if !base_url.starts_with("https://") {
            return Err(AuthwareError::Config {
                message: format!("Base URL must use https: {}", config.base_url),
            });
        }

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let verifier = IssuerPinningVerifier::new(allow_list, provider.clone())?;

        let tls_config = rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| AuthwareError::Config {
                message: format!("Failed to configure TLS: {}", e),
            })?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
            .with_no_client_auth();

        // ureq only uses a proxy when one is set on the builder.
        let agent = ureq::AgentBuilder::new()
            .tls_config(Arc::new(tls_config))
            .timeout_connect(config.timeout)
            .timeout_read(config.timeout)
            .timeout_write(config.timeout)
            .timeout(config.timeout)
            .https_only(true)
            .redirects(0)
            .user_agent(&config.user_agent)
            .build();

        Ok(Self { agent, base_url })
    }

    /// Normalized base URL, always ending in `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Transport for HttpsTransport {
    fn execute(&self, request: &OutboundRequest) -> Result<RawResponse, AuthwareError> {
        let url = self.url_for(&request.path);

        let mut call = self
            .agent
            .request(request.method, &url)
            .timeout(request.timeout)
            .set("Content-Type", "application/json");
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }

        let response = match call.send_bytes(&request.body) {
            Ok(response) => response,
            // Non-2xx statuses still carry a body for the decoder.
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(classify_transport_error(&url, &transport))
            },
        };

        let status = response.status();
        let body = read_body(response.into_reader(), MAX_BODY_BYTES, &url)?;

        Ok(RawResponse { status, body })
    }
}

/// Read at most `limit` bytes; a longer body is an error rather than truncated.
fn read_body(reader: impl Read, limit: u64, url: &str) -> Result<Vec<u8>, AuthwareError> {
    let mut body = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|e| AuthwareError::Transport {
            message: format!("Failed to read response from {}: {}", url, e),
        })?;

    if body.len() as u64 > limit {
        warn!(url = %url, limit, "HTTPS: response body too large");
        return Err(AuthwareError::Transport {
            message: format!("response body too large from {}", url),
        });
    }
    Ok(body)
}

fn classify_transport_error(url: &str, transport: &ureq::Transport) -> AuthwareError {
    if let Some(rejection) = find_rejection(transport) {
        warn!(url = %url, issuer = %rejection.issuer, "HTTPS: certificate issuer rejected");
        return rejection.clone().into();
    }

    warn!(url = %url, error = %transport, "HTTPS request failed");
    AuthwareError::Transport {
        message: format!("Request to {} failed: {}", url, transport),
    }
}
