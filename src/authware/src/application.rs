//! Application session.
//!
//! An [`Application`] holds the identity of one Authware application: its
//! ID and local version, the current user's authorization token, an optional
//! hardware ID provider, and the metadata returned by the backend when the
//! application is initialized. Each session owns its own transport, so
//! several applications can coexist in one process.
//!
//! ```no_run
//! use authware::Application;
//!
//! let app = Application::builder("my-app-id", "1.0.0")
//!     .hardware_id(|| "machine-1234".to_string())
//!     .build()?;
//! app.initialize()?;
//! app.authenticate("alice", "hunter2")?;
//! # Ok::<(), authware::AuthwareError>(())
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::AuthwareError;
use crate::transport::{self, HeaderContext, HttpsTransport, Transport};
use crate::types::{Api, AppInfo, AuthResponse, DefaultResponse, InitForm, LoginForm, RegisterForm};

/// Endpoint returning application details.
pub const INIT_PATH: &str = "app";
/// Endpoint authenticating a user.
pub const AUTH_PATH: &str = "user/auth";
/// Endpoint registering a user.
pub const REGISTER_PATH: &str = "user/register";

/// Produces the hardware identifier of the current device.
///
/// Called synchronously every time a request is built, so it should be fast
/// and return the same value for the same machine.
pub trait HardwareIdProvider: Send + Sync {
    /// Return the hardware identifier.
    fn hardware_id(&self) -> String;
}

impl<F> HardwareIdProvider for F
where
    F: Fn() -> String + Send + Sync,
{
    fn hardware_id(&self) -> String {
        self()
    }
}

/// Application details populated by a successful initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct AppMetadata {
    /// Application name as it appears on Authware.
    pub name: String,
    /// When the application was created.
    pub date_created: DateTime<Utc>,
    /// Whether hardware IDs are checked and enforced.
    pub hwid_checking_enabled: bool,
    /// APIs registered on the application.
    pub apis: Vec<Api>,
    /// Number of registered users.
    pub user_count: u64,
    /// Number of proxied application API requests.
    pub request_count: u64,
}

impl From<AppInfo> for AppMetadata {
    fn from(info: AppInfo) -> Self {
        Self {
            name: info.name,
            date_created: info.date_created,
            hwid_checking_enabled: info.is_hwid_checking_enabled,
            apis: info.apis,
            user_count: info.user_count,
            request_count: info.request_count,
        }
    }
}

struct SessionState {
    auth_token: String,
    hardware_id: Option<Arc<dyn HardwareIdProvider>>,
    metadata: Option<AppMetadata>,
    request_timeout: Duration,
}

/// An Authware application session.
pub struct Application {
    id: String,
    version: String,
    user_agent: String,
    transport: Arc<dyn Transport>,
    state: Mutex<SessionState>,
    /// Serializes `initialize` calls.
    init_guard: Mutex<()>,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Application")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("initialized", &state.metadata.is_some())
            .field("authenticated", &!state.auth_token.is_empty())
            .field("hardware_id_provider", &state.hardware_id.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Application`].
pub struct ApplicationBuilder {
    id: String,
    version: String,
    config: ClientConfig,
    hardware_id: Option<Arc<dyn HardwareIdProvider>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ApplicationBuilder {
    /// Set the hardware ID provider.
    #[must_use]
    pub fn hardware_id(mut self, provider: impl HardwareIdProvider + 'static) -> Self {
        self.hardware_id = Some(Arc::new(provider));
        self
    }

    /// Set the client configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a specific transport instead of the default HTTPS transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the application. Does not contact the backend.
    pub fn build(self) -> Result<Application, AuthwareError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpsTransport::new(&self.config)?),
        };

        Ok(Application {
            id: self.id,
            version: self.version,
            user_agent: self.config.user_agent,
            transport,
            state: Mutex::new(SessionState {
                auth_token: String::new(),
                hardware_id: self.hardware_id,
                metadata: None,
                request_timeout: self.config.timeout,
            }),
            init_guard: Mutex::new(()),
        })
    }
}

impl Application {
    /// Start building an application.
    pub fn builder(id: impl Into<String>, version: impl Into<String>) -> ApplicationBuilder {
        ApplicationBuilder {
            id: id.into(),
            version: version.into(),
            config: ClientConfig::default(),
            hardware_id: None,
            transport: None,
        }
    }

    /// Create an application using the default HTTPS transport.
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Result<Self, AuthwareError> {
        Self::builder(id, version).build()
    }

    /// Create an application and initialize it.
    pub fn connect(
        id: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, AuthwareError> {
        let app = Self::new(id, version)?;
        app.initialize()?;
        Ok(app)
    }

    /// Perform one-time initialization.
    ///
    /// Fetches the application details from Authware. If the backend
    /// enforces hardware IDs and no provider is configured this fails with
    /// [`AuthwareError::BadHardwareIdConfiguration`] and commits nothing;
    /// set a provider and call again.
    #[instrument(skip(self), fields(app_id = %self.id))]
    pub fn initialize(&self) -> Result<(), AuthwareError> {
        let _guard = lock(&self.init_guard);

        if self.is_initialized() {
            return Err(AuthwareError::AlreadyInitialized);
        }
        if self.id.is_empty() || self.version.is_empty() {
            return Err(AuthwareError::BadIdConfiguration);
        }

        let info: AppInfo = self.send(
            INIT_PATH,
            &InitForm {
                id: self.id.clone(),
            },
        )?;

        let mut state = lock(&self.state);
        if info.is_hwid_checking_enabled && state.hardware_id.is_none() {
            warn!("Hardware ID checking is enabled but no hardware ID provider is set");
            return Err(AuthwareError::BadHardwareIdConfiguration);
        }

        info!(
            name = %info.name,
            hwid_checking = info.is_hwid_checking_enabled,
            apis = info.apis.len(),
            "Application initialized"
        );
        state.metadata = Some(info.into());
        Ok(())
    }

    /// Authenticate a user; the returned token is stored for later requests.
    #[instrument(skip(self, password), fields(app_id = %self.id))]
    pub fn authenticate(&self, username: &str, password: &str) -> Result<(), AuthwareError> {
        self.ensure_initialized()?;

        let auth: AuthResponse = self.send(
            AUTH_PATH,
            &LoginForm {
                app_id: self.id.clone(),
                username: username.to_string(),
                password: password.to_string(),
            },
        )?;

        lock(&self.state).auth_token = auth.auth_token;
        info!("User authenticated");
        Ok(())
    }

    /// Register a new user. The new user is not signed in.
    #[instrument(skip(self, password, token), fields(app_id = %self.id))]
    pub fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
        token: &str,
    ) -> Result<(), AuthwareError> {
        self.ensure_initialized()?;

        let _: Option<DefaultResponse> = self.send(
            REGISTER_PATH,
            &RegisterForm {
                app_id: self.id.clone(),
                username: username.to_string(),
                password: password.to_string(),
                token: token.to_string(),
                email_address: email.to_string(),
            },
        )?;

        info!("User registered");
        Ok(())
    }

    /// Application identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Local application version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether initialization has succeeded.
    pub fn is_initialized(&self) -> bool {
        lock(&self.state).metadata.is_some()
    }

    /// Snapshot of the application metadata, once initialized.
    pub fn metadata(&self) -> Option<AppMetadata> {
        lock(&self.state).metadata.clone()
    }

    /// Application name.
    pub fn name(&self) -> Option<String> {
        self.with_metadata(|m| m.name.clone())
    }

    /// Application creation date.
    pub fn date_created(&self) -> Option<DateTime<Utc>> {
        self.with_metadata(|m| m.date_created)
    }

    /// Whether hardware ID checking is enabled.
    pub fn hwid_checking_enabled(&self) -> Option<bool> {
        self.with_metadata(|m| m.hwid_checking_enabled)
    }

    /// APIs registered on the application.
    pub fn apis(&self) -> Option<Vec<Api>> {
        self.with_metadata(|m| m.apis.clone())
    }

    /// Number of registered users.
    pub fn user_count(&self) -> Option<u64> {
        self.with_metadata(|m| m.user_count)
    }

    /// Number of proxied application API requests.
    pub fn request_count(&self) -> Option<u64> {
        self.with_metadata(|m| m.request_count)
    }

    /// Current authorization token, if a user is authenticated.
    pub fn auth_token(&self) -> Option<String> {
        let state = lock(&self.state);
        (!state.auth_token.is_empty()).then(|| state.auth_token.clone())
    }

    /// Whether a user is authenticated.
    pub fn is_authenticated(&self) -> bool {
        !lock(&self.state).auth_token.is_empty()
    }

    /// Set or replace the hardware ID provider.
    pub fn set_hardware_id_provider(&self, provider: impl HardwareIdProvider + 'static) {
        lock(&self.state).hardware_id = Some(Arc::new(provider));
    }

    /// Set the deadline applied to each subsequent request.
    pub fn set_request_timeout(&self, timeout: Duration) {
        lock(&self.state).request_timeout = timeout;
    }

    fn ensure_initialized(&self) -> Result<(), AuthwareError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(AuthwareError::NotInitialized)
        }
    }

    fn with_metadata<T>(&self, f: impl FnOnce(&AppMetadata) -> T) -> Option<T> {
        lock(&self.state).metadata.as_ref().map(f)
    }

    fn send<B, T>(&self, path: &str, body: &B) -> Result<T, AuthwareError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let (auth_token, provider, timeout) = {
            let state = lock(&self.state);
            (
                state.auth_token.clone(),
                state.hardware_id.clone(),
                state.request_timeout,
            )
        };

        // The provider runs outside the lock.
        let headers = HeaderContext {
            auth_token: Some(auth_token),
            hardware_id: provider.map(|p| p.hardware_id()),
            app_version: self.version.clone(),
            user_agent: self.user_agent.clone(),
        };

        transport::post_json(self.transport.as_ref(), path, body, headers, timeout)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
