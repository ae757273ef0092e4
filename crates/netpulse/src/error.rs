//! Startup and `check` errors with miette diagnostics.
//!
//! Anything that stops the process before (or instead of) serving ends up
//! here, mapped to an exit code and actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use netpulse_config::ConfigError;
use netpulse_core::RefreshError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum AppError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Cannot load configuration from {path}")]
    #[diagnostic(
        code(netpulse::config),
        help("Fix the file, or point --config at another one.")
    )]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },

    #[error("No controller configured in {path}")]
    #[diagnostic(
        code(netpulse::no_controller),
        help(
            "Add a [controller] table with at least `url` and credentials:\n\n\
             [controller]\n\
             url = \"https://192.168.1.1\"\n\
             username = \"admin\"\n\
             password_env = \"UNIFI_PASSWORD\""
        )
    )]
    NoController { path: String },

    // ── Refresh ──────────────────────────────────────────────────────
    #[error("Controller credentials could not be resolved")]
    #[diagnostic(
        code(netpulse::credentials),
        help(
            "Set `api_key`/`api_key_env`, or `username` plus `password`/`password_env`,\n\
             or store a secret in the system keyring under service `netpulse`."
        )
    )]
    Credentials {
        #[source]
        source: RefreshError,
    },

    #[error("Could not reach the controller")]
    #[diagnostic(
        code(netpulse::connection),
        help(
            "Check the controller URL and that it is reachable.\n\
             Self-signed certificates need `verify_tls = false` or `ca_cert`."
        )
    )]
    Connection {
        #[source]
        source: RefreshError,
    },

    #[error("Refresh cycle failed")]
    #[diagnostic(code(netpulse::refresh))]
    Refresh {
        #[source]
        source: RefreshError,
    },

    // ── Runtime ──────────────────────────────────────────────────────
    #[error("Cannot open log file {path}")]
    #[diagnostic(code(netpulse::log_file))]
    LogFile {
        path: String,
        #[source]
        source: tracing_appender::rolling::InitError,
    },

    #[error("Cannot listen on {addr}")]
    #[diagnostic(
        code(netpulse::bind),
        help("Is another process already using this address? Try --bind.")
    )]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server failed")]
    #[diagnostic(code(netpulse::serve))]
    Serve(#[source] std::io::Error),
}

impl AppError {
    /// Map a failed `check` cycle to the most helpful diagnostic.
    pub fn from_refresh(err: RefreshError, config_path: &str) -> Self {
        match err {
            RefreshError::ConfigMissing => Self::NoController {
                path: config_path.to_owned(),
            },
            RefreshError::Credential { .. } => Self::Credentials { source: err },
            RefreshError::Connect { .. } => Self::Connection { source: err },
            RefreshError::Fetch { .. }
            | RefreshError::Transform { .. }
            | RefreshError::Unexpected(_) => Self::Refresh { source: err },
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::NoController { .. } => exit_code::USAGE,
            Self::Credentials { .. } => exit_code::AUTH,
            Self::Connection { .. } | Self::Bind { .. } => exit_code::CONNECTION,
            Self::Refresh { .. } | Self::LogFile { .. } | Self::Serve(_) => exit_code::GENERAL,
        }
    }
}
