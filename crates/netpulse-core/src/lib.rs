//! Refresh pipeline and snapshot store for netpulse.
//!
//! - **[`Scheduler`]** runs a [`RefreshJob`] once at start and then on a
//!   fixed interval, never more than one cycle at a time.
//! - **[`Refresher`]** is that job: it opens a controller session through
//!   the [`ControllerConnector`] seam, fetches five resources concurrently,
//!   builds a [`Snapshot`], publishes it to the [`Cache`], and notifies.
//! - **[`Cache`]** holds the current snapshot behind an atomic pointer and
//!   serves the read-side views in [`store`].

pub mod config;
pub mod convert;
pub mod error;
pub mod fetch;
pub mod model;
pub mod notify;
pub mod radio;
pub mod refresh;
pub mod scheduler;
pub mod session;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthCredentials, ControllerSettings, SettingsProvider, TlsVerification};
pub use convert::build_snapshot;
pub use error::RefreshError;
pub use fetch::{ControllerConnector, ControllerSession, FetchedData, SiteHealth, SystemInfo};
pub use model::Snapshot;
pub use notify::{BroadcastNotifier, Notifier, PulseEvent};
pub use radio::{RadioBand, classify};
pub use refresh::{DEFAULT_TOP_CLIENTS, Refresher};
pub use scheduler::{RefreshJob, Scheduler, SchedulerState};
pub use session::{LegacyConnector, LegacySession};
pub use store::{Cache, QueryError};
