// ── Refresh error types ──
//
// Every failure a refresh cycle can hit. The orchestrator catches all of
// them at its boundary; none of them stop the scheduler.

use thiserror::Error;

/// Why a refresh cycle failed.
#[derive(Debug, Error)]
pub enum RefreshError {
    // ── Setup ────────────────────────────────────────────────────────
    #[error("No controller is configured")]
    ConfigMissing,

    #[error("Cannot resolve controller credentials: {message}")]
    Credential { message: String },

    // ── Controller I/O ───────────────────────────────────────────────
    #[error("Cannot connect to controller: {message}")]
    Connect {
        message: String,
        /// Whether the next cycle has a fair chance of succeeding.
        transient: bool,
    },

    #[error("Fetching {resource} failed: {message}")]
    Fetch {
        resource: &'static str,
        message: String,
        transient: bool,
    },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Snapshot is inconsistent: {message}")]
    Transform { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Unexpected refresh failure: {0}")]
    Unexpected(String),
}

impl RefreshError {
    /// Wrap a controller error raised while opening the session.
    pub fn connect(err: &netpulse_api::Error) -> Self {
        Self::Connect {
            message: err.to_string(),
            transient: err.is_transient(),
        }
    }

    /// Wrap a controller error raised by one of the cycle's fetches.
    pub fn fetch(resource: &'static str, err: &netpulse_api::Error) -> Self {
        Self::Fetch {
            resource,
            message: err.to_string(),
            transient: err.is_transient(),
        }
    }

    /// Whether the failure looks like a network hiccup rather than a
    /// configuration or data problem.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connect { transient, .. } | Self::Fetch { transient, .. } => *transient,
            _ => false,
        }
    }
}
