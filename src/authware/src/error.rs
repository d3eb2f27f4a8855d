//! Error types for Authware operations.

use thiserror::Error;

/// Errors that can occur while talking to Authware.
#[derive(Debug, Error)]
pub enum AuthwareError {
    /// The application ID or version was left empty.
    #[error(
        "invalid application configuration, ensure you set the ID and version before initializing"
    )]
    BadIdConfiguration,

    /// The backend enforces hardware IDs but no provider was configured.
    #[error(
        "invalid application configuration, a hardware ID provider is required because hardware ID \
         checking is enabled for this application; disable it on the Authware dashboard if you do \
         not want to validate hardware IDs"
    )]
    BadHardwareIdConfiguration,

    /// Client configuration error (base URL, TLS setup).
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// `initialize` was called on an application that already initialized.
    #[error("application already initialized")]
    AlreadyInitialized,

    /// An operation was called before `initialize` succeeded.
    #[error("the application must be initialized before calling this function")]
    NotInitialized,

    /// The server certificate issuer is not on the allow-list.
    ///
    /// Returned when a client intercepts HTTPS traffic with a debugging
    /// proxy, or when the SDK is out of date with the backend's issuers.
    #[error(
        "server certificate validation failed, tampering with https certificates may have occurred"
    )]
    TamperedCertificate {
        /// Issuer distinguished name of the rejected certificate.
        issuer: String,
    },

    /// Network or transport failure from the HTTP client.
    #[error("Transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The backend answered with a non-success status.
    ///
    /// Displays as the backend's message alone.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Authware response code, unrelated to the HTTP status.
        code: i64,
        /// First validation error, or the general message when there are none.
        message: String,
    },

    /// Request or response body could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthwareError {
    /// Check if this error was caused by the local configuration.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::BadIdConfiguration | Self::BadHardwareIdConfiguration | Self::Config { .. }
        )
    }

    /// Check if this error was caused by calling operations out of order.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::AlreadyInitialized | Self::NotInitialized)
    }

    /// Check if this error indicates an intercepted TLS connection.
    #[must_use]
    pub fn is_tampered(&self) -> bool {
        matches!(self, Self::TamperedCertificate { .. })
    }
}
