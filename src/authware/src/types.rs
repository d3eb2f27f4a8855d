//! Wire types exchanged with the Authware API.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// An API registered on an Authware application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Api {
    /// Identifier used to execute the API.
    pub id: String,
    /// Human-readable name.
    pub name: String,
}

/// Default response envelope returned across many endpoints.
///
/// Used internally to extract the error message from failed requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultResponse {
    /// Authware response code, unrelated to the HTTP status code.
    #[serde(default)]
    pub code: i64,
    /// Human-readable message about the response.
    #[serde(default)]
    pub message: String,
    /// Human-readable errors, typically input validation failures.
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
}

impl DefaultResponse {
    /// The message to surface: the first error if any, else `message`.
    #[must_use]
    pub fn into_message(self) -> String {
        self.errors.into_iter().next().unwrap_or(self.message)
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Application details returned by `POST app`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    /// Application name.
    pub name: String,
    /// Application identifier.
    #[serde(default)]
    pub id: String,
    /// Latest version registered on the backend.
    #[serde(default)]
    pub version: String,
    /// When the application was created.
    pub date_created: DateTime<Utc>,
    /// Whether hardware IDs are checked on login and every request.
    pub is_hwid_checking_enabled: bool,
    /// APIs registered on the application.
    #[serde(default, deserialize_with = "null_as_default")]
    pub apis: Vec<Api>,
    /// Number of registered users.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_count: u64,
    /// Number of proxied application API requests.
    #[serde(default, deserialize_with = "null_as_default")]
    pub request_count: u64,
}

/// Successful authentication response.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Token granting the user access to authenticated endpoints.
    pub auth_token: String,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// Body of `POST app`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitForm {
    /// Application identifier.
    pub id: String,
}

/// Body of `POST user/auth`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginForm {
    /// Application identifier.
    pub app_id: String,
    /// Username.
    pub username: String,
    /// Password for the user.
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("app_id", &self.app_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST user/register`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterForm {
    /// Application identifier.
    pub app_id: String,
    /// Name to identify the new user by.
    pub username: String,
    /// Password for the new user.
    pub password: String,
    /// License key granting the user time or a role on the application.
    pub token: String,
    /// Contact address for notifications and password resets.
    pub email_address: String,
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("app_id", &self.app_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("token", &self.token)
            .field("email_address", &self.email_address)
            .finish()
    }
}
