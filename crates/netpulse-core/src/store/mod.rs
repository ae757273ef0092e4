// ── Snapshot store ──
//
// The cache and the read-side views over it.

mod cache;
mod query;

pub use cache::Cache;
pub use query::{
    AccessPointList, ApDetail, Bandwidth, QueryError, RefreshStatus, TopClientList,
};
