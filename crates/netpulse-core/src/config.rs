// ── Runtime connection configuration ──
//
// These types describe *how* to connect to a UniFi controller.
// They carry credential data and connection tuning, but never touch disk.
// A `SettingsProvider` builds them fresh for every refresh cycle.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::RefreshError;

/// How to authenticate with a controller.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// `X-API-KEY` header on every request. No login session.
    ApiKey(SecretString),
    /// Cookie-based session login.
    Credentials {
        username: String,
        password: SecretString,
    },
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs). Default for local controllers.
    #[default]
    DangerAcceptInvalid,
}

/// Everything needed to open one session against one controller.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Controller URL (e.g., `https://192.168.1.1`).
    pub url: Url,
    /// Site to read (usually `"default"`).
    pub site: String,
    pub auth: AuthCredentials,
    pub tls: TlsVerification,
    /// Bound on every request, including the login handshake.
    pub timeout: Duration,
}

/// Source of controller settings for the refresh pipeline.
///
/// Loading and resolving are separate steps so that "nothing configured"
/// and "configured but the secrets are unreadable" surface as different
/// errors.
pub trait SettingsProvider: Send + Sync + 'static {
    /// Stored controller configuration, before secrets are resolved.
    type Profile: Send;

    /// Look up the controller configuration. `Ok(None)` means none exists.
    fn load_profile(&self) -> Result<Option<Self::Profile>, RefreshError>;

    /// Resolve stored secrets into usable credentials.
    fn resolve(&self, profile: Self::Profile) -> Result<ControllerSettings, RefreshError>;
}
