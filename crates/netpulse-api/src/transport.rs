// ── HTTP client construction ──
//
// The platform probe and every session build their `reqwest::Client` here,
// so TLS policy and the request timeout are applied identically. Only the
// way a client authenticates differs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

const USER_AGENT: &str = concat!("netpulse/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// System certificate store.
    System,
    /// Trust the PEM bundle at this path in addition to the system store.
    CustomCa(PathBuf),
    /// Accept any certificate. Local controllers are usually self-signed.
    DangerAcceptInvalid,
}

/// How a built client identifies itself to the controller.
#[derive(Debug, Clone, Copy)]
pub enum ClientAuth<'a> {
    /// No credentials at all (platform probe).
    Anonymous,
    /// Keeps a cookie jar so the cookie set by login rides along.
    Session,
    /// Sends `X-API-KEY` on every request.
    ApiKey(&'a SecretString),
}

/// TLS and timeout settings shared by every client for one controller.
///
/// `timeout` bounds each request, login included, so a stalled controller
/// fails the cycle instead of hanging it.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    pub fn build_client(&self, auth: ClientAuth<'_>) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        builder = match auth {
            ClientAuth::Anonymous => builder,
            ClientAuth::Session => builder.cookie_provider(Arc::new(Jar::default())),
            ClientAuth::ApiKey(key) => builder.default_headers(api_key_headers(key)?),
        };

        builder = match &self.tls {
            TlsMode::System => builder,
            TlsMode::CustomCa(path) => builder.add_root_certificate(load_ca(path)?),
            TlsMode::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        };

        builder
            .build()
            .map_err(|e| Error::Tls(format!("cannot build HTTP client: {e}")))
    }
}

fn load_ca(path: &Path) -> Result<reqwest::Certificate, Error> {
    let pem = std::fs::read(path).map_err(|e| {
        Error::Tls(format!("cannot read CA certificate {}: {e}", path.display()))
    })?;
    reqwest::Certificate::from_pem(&pem)
        .map_err(|e| Error::Tls(format!("invalid CA certificate {}: {e}", path.display())))
}

fn api_key_headers(key: &SecretString) -> Result<HeaderMap, Error> {
    let mut value =
        HeaderValue::from_str(key.expose_secret()).map_err(|_| Error::Authentication {
            message: "API key contains characters not allowed in a header".into(),
        })?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert("X-API-KEY", value);
    Ok(headers)
}
