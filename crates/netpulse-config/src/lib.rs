//! Configuration for netpulse.
//!
//! One TOML file (merged with `NETPULSE_` environment variables) holding a
//! `[server]` table read once at startup and a `[controller]` table that
//! [`FileSettings`] re-reads on every refresh cycle. Controller secrets are
//! resolved through a chain: named env var, then system keyring, then
//! plaintext in the file.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use netpulse_core::{
    AuthCredentials, ControllerSettings, RefreshError, SettingsProvider, TlsVerification,
};

/// Keyring service name; entries are `controller/password` and `controller/api-key`.
pub const KEYRING_SERVICE: &str = "netpulse";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no controller credentials configured")]
    NoCredentials,

    #[error("keyring lookup for '{entry}' failed: {reason}")]
    Keyring { entry: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for RefreshError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials | ConfigError::Keyring { .. } => Self::Credential {
                message: err.to_string(),
            },
            ConfigError::Validation { .. } | ConfigError::Figment(_) => {
                Self::Unexpected(err.to_string())
            }
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    /// The controller to poll. Absent means nothing to refresh yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<ControllerProfile>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address the HTTP read layer listens on.
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Length of the top-talkers list.
    #[serde(default = "default_top_clients")]
    pub top_clients: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            refresh_interval_secs: default_refresh_interval(),
            top_clients: default_top_clients(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.parse().map_err(|_| ConfigError::Validation {
            field: "server.bind".into(),
            reason: format!("not a socket address: {}", self.bind),
        })
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Reject values the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Validation {
                field: "server.refresh_interval_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.top_clients == 0 {
            return Err(ConfigError::Validation {
                field: "server.top_clients".into(),
                reason: "must be at least 1".into(),
            });
        }
        self.bind_addr().map(|_| ())
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".into()
}
fn default_refresh_interval() -> u64 {
    60
}
fn default_top_clients() -> usize {
    netpulse_core::DEFAULT_TOP_CLIENTS
}

/// The `[controller]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControllerProfile {
    /// Controller base URL (e.g., "https://192.168.1.1").
    pub url: String,

    #[serde(default = "default_site")]
    pub site: String,

    /// Username for session login.
    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Consult the system keyring.
    #[serde(default = "default_true")]
    pub keyring: bool,

    /// Verify the controller's certificate against the system store.
    #[serde(default)]
    pub verify_tls: bool,

    /// Path to custom CA certificate. Takes precedence over `verify_tls`.
    pub ca_cert: Option<PathBuf>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_site() -> String {
    "default".into()
}
fn default_true() -> bool {
    true
}
fn default_timeout() -> u64 {
    30
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "netpulse", "netpulse").map_or_else(
        || PathBuf::from("netpulse.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
///
/// A missing file yields the defaults. Nested keys come from the
/// environment with a double underscore: `NETPULSE_SERVER__BIND`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NETPULSE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Looks up one keyring entry by name.
type KeyringLookup = fn(&str) -> Result<String, keyring::Error>;

fn system_keyring(entry: &str) -> Result<String, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, entry).and_then(|e| e.get_password())
}

/// Resolve one secret: named env var → keyring → plaintext.
///
/// `Ok(None)` means no source had it. A keyring that fails (no Secret
/// Service, locked store) is treated as a miss; the failure is only
/// returned when nothing after it resolves the secret either.
fn resolve_secret(
    env_name: Option<&str>,
    lookup: Option<KeyringLookup>,
    keyring_entry: &str,
    plaintext: Option<&str>,
) -> Result<Option<SecretString>, ConfigError> {
    // 1. Named env var
    if let Some(name) = env_name {
        if let Ok(val) = std::env::var(name) {
            if !val.is_empty() {
                return Ok(Some(SecretString::from(val)));
            }
        }
    }

    // 2. System keyring
    let mut keyring_failure = None;
    if let Some(lookup) = lookup {
        match lookup(keyring_entry) {
            Ok(secret) => return Ok(Some(SecretString::from(secret))),
            Err(keyring::Error::NoEntry) => {}
            Err(e) => {
                warn!(entry = keyring_entry, error = %e, "keyring unavailable, trying next source");
                keyring_failure = Some(ConfigError::Keyring {
                    entry: keyring_entry.into(),
                    reason: e.to_string(),
                });
            }
        }
    }

    // 3. Plaintext in config
    match plaintext.filter(|s| !s.is_empty()) {
        Some(s) => Ok(Some(SecretString::from(s.to_owned()))),
        None => keyring_failure.map_or(Ok(None), Err),
    }
}

/// Pick the auth method. An API key wins when one resolves; otherwise a
/// username plus password is required.
pub fn resolve_auth(profile: &ControllerProfile) -> Result<AuthCredentials, ConfigError> {
    resolve_auth_with(profile, system_keyring)
}

fn resolve_auth_with(
    profile: &ControllerProfile,
    keyring_lookup: KeyringLookup,
) -> Result<AuthCredentials, ConfigError> {
    let lookup = profile.keyring.then_some(keyring_lookup);

    // A keyring failure on the API key must not hide a usable password.
    let api_key_failure = match resolve_secret(
        profile.api_key_env.as_deref(),
        lookup,
        "controller/api-key",
        profile.api_key.as_deref(),
    ) {
        Ok(Some(key)) => return Ok(AuthCredentials::ApiKey(key)),
        Ok(None) => None,
        Err(e) => Some(e),
    };
    let missing = || api_key_failure.unwrap_or(ConfigError::NoCredentials);

    let Some(username) = profile.username.clone().filter(|u| !u.is_empty()) else {
        return Err(missing());
    };

    match resolve_secret(
        profile.password_env.as_deref(),
        lookup,
        "controller/password",
        profile.password.as_deref(),
    )? {
        Some(password) => Ok(AuthCredentials::Credentials { username, password }),
        None => Err(missing()),
    }
}

/// Build `ControllerSettings` from the `[controller]` table.
pub fn profile_to_settings(profile: &ControllerProfile) -> Result<ControllerSettings, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "controller.url".into(),
        reason: format!("invalid URL: {}", profile.url),
    })?;

    let auth = resolve_auth(profile)?;

    let tls = if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else if profile.verify_tls {
        TlsVerification::SystemDefaults
    } else {
        TlsVerification::DangerAcceptInvalid // local controllers typically self-signed
    };

    Ok(ControllerSettings {
        url,
        site: profile.site.clone(),
        auth,
        tls,
        timeout: Duration::from_secs(profile.timeout_secs),
    })
}

// ── Settings provider ───────────────────────────────────────────────

/// Reads the `[controller]` table from disk on every refresh, so edits
/// take effect on the next cycle without a restart.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsProvider for FileSettings {
    type Profile = ControllerProfile;

    fn load_profile(&self) -> Result<Option<ControllerProfile>, RefreshError> {
        Ok(load_config(&self.path)?.controller)
    }

    fn resolve(&self, profile: ControllerProfile) -> Result<ControllerSettings, RefreshError> {
        Ok(profile_to_settings(&profile)?)
    }
}
