//! Certificate issuer pinning.
//!
//! Every TLS handshake with Authware must present a leaf certificate issued
//! by Cloudflare or Let's Encrypt. This is checked on top of the normal
//! webpki chain and hostname validation, so a root certificate installed by
//! an HTTPS debugger cannot be used to spoof API responses even though the
//! local trust store would accept it.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    CertificateError, DigitallySignedStruct, Error as TlsError, OtherError, RootCertStore,
    SignatureScheme,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::AuthwareError;

/// Issuer marker present on Cloudflare edge certificates.
pub const CLOUDFLARE_ISSUER: &str = "Cloudflare Inc";

/// Issuer marker present on Let's Encrypt certificates.
pub const LETS_ENCRYPT_ISSUER: &str = "Let's Encrypt";

/// Leaf certificate rejected by the issuer allow-list.
#[derive(Debug, Clone, Error)]
#[error("certificate issuer not allowed: {issuer}")]
pub struct TamperedCertificate {
    /// Rendered issuer distinguished name, or a parse failure description.
    pub issuer: String,
}

impl From<TamperedCertificate> for AuthwareError {
    fn from(rejection: TamperedCertificate) -> Self {
        Self::TamperedCertificate {
            issuer: rejection.issuer,
        }
    }
}

/// Set of issuer substrings accepted for the leaf certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerAllowList {
    markers: Vec<String>,
}

impl Default for IssuerAllowList {
    fn default() -> Self {
        Self::new([CLOUDFLARE_ISSUER, LETS_ENCRYPT_ISSUER])
    }
}

impl IssuerAllowList {
    /// Create an allow-list from issuer substrings.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    /// The accepted issuer substrings.
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Whether an issuer distinguished name contains any accepted marker.
    #[must_use]
    pub fn permits(&self, issuer: &str) -> bool {
        self.markers.iter().any(|marker| issuer.contains(marker.as_str()))
    }

    /// Check a DER-encoded leaf certificate's issuer.
    ///
    /// A certificate that cannot be parsed is rejected.
    pub fn check_leaf(&self, der: &[u8]) -> Result<(), TamperedCertificate> {
        let issuer = match x509_parser::parse_x509_certificate(der) {
            Ok((_, cert)) => cert.issuer().to_string(),
            Err(e) => {
                return Err(TamperedCertificate {
                    issuer: format!("<unparsable certificate: {}>", e),
                })
            },
        };

        if self.permits(&issuer) {
            debug!(issuer = %issuer, "Certificate issuer allowed");
            Ok(())
        } else {
            warn!(issuer = %issuer, "Certificate issuer rejected, possible HTTPS interception");
            Err(TamperedCertificate { issuer })
        }
    }
}

/// Server certificate verifier enforcing an [`IssuerAllowList`] before
/// standard webpki validation.
pub struct IssuerPinningVerifier {
    allow_list: IssuerAllowList,
    inner: Arc<WebPkiServerVerifier>,
}

impl fmt::Debug for IssuerPinningVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuerPinningVerifier")
            .field("allow_list", &self.allow_list)
            .finish_non_exhaustive()
    }
}

impl IssuerPinningVerifier {
    /// Create a verifier over the bundled Mozilla root certificates.
    pub fn new(
        allow_list: IssuerAllowList,
        provider: Arc<CryptoProvider>,
    ) -> Result<Self, AuthwareError> {
        let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider)
            .build()
            .map_err(|e| AuthwareError::Config {
                message: format!("Failed to create certificate verifier: {}", e),
            })?;

        Ok(Self { allow_list, inner })
    }

    /// The allow-list this verifier enforces.
    pub fn allow_list(&self) -> &IssuerAllowList {
        &self.allow_list
    }
}

impl ServerCertVerifier for IssuerPinningVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        self.allow_list
            .check_leaf(end_entity.as_ref())
            .map_err(|rejection| {
                TlsError::InvalidCertificate(CertificateError::Other(OtherError(Arc::new(
                    rejection,
                ))))
            })?;

        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Find an issuer rejection anywhere in an error's source chain.
///
/// The rejection travels from the verifier through `rustls::Error` and
/// `io::Error` wrappers before the HTTP client reports it.
pub fn find_rejection<'a>(error: &'a (dyn StdError + 'static)) -> Option<&'a TamperedCertificate> {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(rejection) = err.downcast_ref::<TamperedCertificate>() {
            return Some(rejection);
        }
        if let Some(inner) = err.downcast_ref::<io::Error>().and_then(io::Error::get_ref) {
            if let Some(rejection) = find_rejection(inner) {
                return Some(rejection);
            }
        }
        if let Some(TlsError::InvalidCertificate(CertificateError::Other(other))) =
            err.downcast_ref::<TlsError>()
        {
            if let Some(rejection) = find_rejection(other.0.as_ref()) {
                return Some(rejection);
            }
        }
        current = err.source();
    }
    None
}

/// Whether an error was caused by an issuer rejection.
pub fn is_tampered(error: &(dyn StdError + 'static)) -> bool {
    find_rejection(error).is_some()
}
