//! Response decoding.
//!
//! Success statuses (200, 201, 204) decode straight into the payload type
//! expected by the call site. Everything else decodes into a
//! [`DefaultResponse`] and becomes [`AuthwareError::Api`].

use serde::de::DeserializeOwned;

use crate::error::AuthwareError;
use crate::types::DefaultResponse;

/// Whether a status code is treated as success.
#[must_use]
pub fn is_success(status: u16) -> bool {
    matches!(status, 200 | 201 | 204)
}

/// Decode a raw response into `T` or a classified error.
///
/// Malformed JSON is returned as [`AuthwareError::Json`] on both paths.
pub fn decode<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, AuthwareError> {
    if is_success(status) {
        return parse_body(body);
    }

    let envelope: DefaultResponse = parse_body(body)?;
    Err(AuthwareError::Api {
        status,
        code: envelope.code,
        message: envelope.into_message(),
    })
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AuthwareError> {
    // An empty body (e.g. 204) decodes as `null`.
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(body)?)
}
