// ── Controller client errors ──

use thiserror::Error;

/// Everything that can go wrong talking to a controller.
///
/// `netpulse-core` wraps these according to *when* they happened
/// (opening the session vs. fetching), so nothing here records the phase.
#[derive(Debug, Error)]
pub enum Error {
    /// Login rejected, session expired, or an unusable API key.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Certificate loading or HTTP client construction.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The envelope's `meta.rc` was not `"ok"`.
    #[error("Legacy API error: {message}")]
    LegacyApi { message: String },

    /// The body was not the expected envelope; `body` keeps the raw text.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Whether the next refresh cycle has a fair chance of succeeding
    /// without anyone changing the configuration.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Authentication { .. }
            | Self::InvalidUrl(_)
            | Self::Tls(_)
            | Self::LegacyApi { .. }
            | Self::Deserialization { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn only_timeouts_and_connect_failures_are_transient() {
        assert!(Error::Timeout { timeout_secs: 5 }.is_transient());
        assert!(
            !Error::Authentication {
                message: "bad password".into()
            }
            .is_transient()
        );
        assert!(
            !Error::LegacyApi {
                message: "api.err.NoSiteContext".into()
            }
            .is_transient()
        );
    }
}
