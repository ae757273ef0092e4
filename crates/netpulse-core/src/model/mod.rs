// ── Domain model ──
//
// The snapshot the refresh pipeline publishes, plus the small value
// types it is built from.

pub mod mac;
pub mod snapshot;
pub mod tally;

pub use mac::{mac_eq, normalize_mac};
pub use snapshot::{
    ApStatus, ChartData, DeviceCounts, GatewayStats, NetworkHealth, Snapshot, TopClient, WanHealth,
};
pub use tally::Tally;
