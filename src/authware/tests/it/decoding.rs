//! Property-based tests for response decoding and issuer matching.

use proptest::prelude::*;

use authware::decoder::{decode, is_success};
use authware::types::{AuthResponse, LoginForm, RegisterForm};
use authware::{AuthwareError, IssuerAllowList};

/// Statuses outside the success set.
fn failure_status() -> impl Strategy<Value = u16> {
    (100u16..600).prop_filter("non-success status", |s| !is_success(*s))
}

/// Printable text without JSON-hostile constraints.
fn text() -> impl Strategy<Value = String> {
    "[ -~]{0,40}"
}

fn envelope(code: i64, message: &str, errors: &[String]) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "code": code,
        "message": message,
        "errors": errors,
    }))
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    // ========================================================================
    // Failure path
    // ========================================================================

    /// The first validation error always becomes the message.
    #[test]
    fn failure_first_error_wins(
        status in failure_status(),
        code in any::<i64>(),
        message in text(),
        errors in prop::collection::vec(text(), 1..5),
    ) {
        let err = decode::<AuthResponse>(status, &envelope(code, &message, &errors)).unwrap_err();
        match err {
            AuthwareError::Api { status: s, code: c, message: m } => {
                prop_assert_eq!(s, status);
                prop_assert_eq!(c, code);
                prop_assert_eq!(&m, &errors[0]);
            },
            other => prop_assert!(false, "unexpected error: {:?}", other),
        }
    }

    /// Without validation errors the general message is used.
    #[test]
    fn failure_message_fallback(status in failure_status(), message in text()) {
        let err = decode::<AuthResponse>(status, &envelope(1, &message, &[])).unwrap_err();
        prop_assert_eq!(err.to_string(), message);
    }

    /// Non-JSON failure bodies surface as serialization errors.
    #[test]
    fn failure_malformed_body(status in failure_status(), junk in "[a-z<>]{1,30}") {
        let err = decode::<AuthResponse>(status, junk.as_bytes()).unwrap_err();
        prop_assert!(matches!(err, AuthwareError::Json(_)));
    }

    // ========================================================================
    // Success path
    // ========================================================================

    /// Login and registration forms survive the wire unchanged.
    #[test]
    fn forms_decode_field_for_field(
        app_id in text(),
        username in text(),
        password in text(),
        token in text(),
        email in text(),
        status in prop::sample::select(vec![200u16, 201, 204]),
    ) {
        let login = LoginForm { app_id: app_id.clone(), username: username.clone(), password: password.clone() };
        let decoded: LoginForm = decode(status, &serde_json::to_vec(&login).unwrap()).unwrap();
        prop_assert_eq!(decoded, login);

        let register = RegisterForm { app_id, username, password, token, email_address: email };
        let decoded: RegisterForm = decode(status, &serde_json::to_vec(&register).unwrap()).unwrap();
        prop_assert_eq!(decoded, register);
    }

    /// The auth token is taken verbatim from a success body.
    #[test]
    fn success_token_verbatim(token in text()) {
        let body = serde_json::to_vec(&serde_json::json!({ "auth_token": token })).unwrap();
        let auth: AuthResponse = decode(200, &body).unwrap();
        prop_assert_eq!(auth.auth_token, token);
    }

    // ========================================================================
    // Issuer allow-list
    // ========================================================================

    /// Any issuer containing a marker is accepted, wherever it appears.
    #[test]
    fn issuer_marker_anywhere_is_permitted(
        prefix in text(),
        suffix in text(),
        marker in prop::sample::select(vec!["Cloudflare Inc", "Let's Encrypt"]),
    ) {
        let issuer = format!("{}{}{}", prefix, marker, suffix);
        prop_assert!(IssuerAllowList::default().permits(&issuer));
    }

    /// Issuers without a marker are rejected.
    #[test]
    fn issuer_without_marker_is_rejected(issuer in "[A-Za-z=, ]{0,60}") {
        prop_assume!(!issuer.contains("Cloudflare Inc"));
        prop_assume!(!issuer.contains("Let's Encrypt"));
        prop_assert!(!IssuerAllowList::default().permits(&issuer));
    }
}
