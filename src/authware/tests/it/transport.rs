//! HTTPS transport against a local TLS server with an untrusted issuer.

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{ServerConfig, ServerConnection};

use authware::transport::HeaderContext;
use authware::{AuthwareError, ClientConfig, HttpsTransport, OutboundRequest, Transport};

/// Serve one TLS handshake with a self-signed certificate for `localhost`.
fn spawn_tls_server(organization: &str, common_name: &str) -> (SocketAddr, JoinHandle<()>) {
    let mut params = CertificateParams::new(vec!["localhost".to_string()]).unwrap();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::OrganizationName, organization);
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;

    let key_pair = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key_pair).unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    let config = ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(vec![cert.der().clone()], key)
    .unwrap();
    let config = Arc::new(config);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut conn = ServerConnection::new(config).unwrap();
        // The client aborts the handshake; the server side error is expected.
        while conn.is_handshaking() {
            if conn.complete_io(&mut stream).is_err() {
                break;
            }
        }
    });

    (addr, handle)
}

fn request() -> OutboundRequest {
    OutboundRequest {
        method: "POST",
        path: "app".into(),
        headers: HeaderContext {
            app_version: "1.0.0".into(),
            user_agent: "Authware-Rust/test".into(),
            ..Default::default()
        }
        .into_headers(),
        body: br#"{"id":"app-123"}"#.to_vec(),
        timeout: Duration::from_secs(5),
    }
}

fn transport_for(addr: SocketAddr) -> HttpsTransport {
    let config = ClientConfig::default()
        .base_url(format!("https://localhost:{}/", addr.port()))
        .timeout(Duration::from_secs(5));
    HttpsTransport::new(&config).unwrap()
}

#[test]
fn intercepting_issuer_is_reported_as_tampered() {
    let (addr, server) = spawn_tls_server("mitmproxy", "mitmproxy");
    let transport = transport_for(addr);

    let err = transport.execute(&request()).unwrap_err();
    assert!(err.is_tampered(), "unexpected error: {err:?}");
    match err {
        AuthwareError::TamperedCertificate { issuer } => {
            assert!(issuer.contains("mitmproxy"));
        },
        other => panic!("unexpected error: {other:?}"),
    }

    server.join().unwrap();
}

#[test]
fn allowed_issuer_still_needs_trusted_chain() {
    // Issuer passes the allow-list but the certificate is self-signed.
    let (addr, server) = spawn_tls_server("Let's Encrypt", "R3");
    let transport = transport_for(addr);

    let err = transport.execute(&request()).unwrap_err();
    assert!(!err.is_tampered());
    assert!(matches!(err, AuthwareError::Transport { .. }));

    server.join().unwrap();
}
