// netpulse-api: Async client for the UniFi controller's legacy stat API

pub mod auth;
pub mod error;
pub mod legacy;
pub mod transport;

pub use auth::ControllerPlatform;
pub use error::Error;
pub use legacy::LegacyClient;
pub use transport::{ClientAuth, TlsMode, TransportConfig};
