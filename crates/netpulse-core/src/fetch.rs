// ── Controller session seam ──
//
// The refresh pipeline only sees these traits. `session::LegacyConnector`
// implements them over the real controller; tests swap in fakes.

use std::collections::HashMap;
use std::future::Future;

use netpulse_api::Error;
use netpulse_api::legacy::models::{LegacyClientEntry, LegacyDevice};

use crate::config::ControllerSettings;

/// Gateway identity plus infrastructure counts, derived from the device list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemInfo {
    pub gateway_model: Option<String>,
    pub gateway_name: Option<String>,
    pub gateway_version: Option<String>,
    pub uptime: Option<u64>,
    pub cpu_utilization: Option<f64>,
    pub mem_utilization: Option<f64>,
    pub wan_status: Option<String>,
    pub wan_ip: Option<String>,
    pub ap_count: usize,
    pub switch_count: usize,
}

/// Health blocks keyed by subsystem name (`wan`, `www`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteHealth(pub HashMap<String, serde_json::Value>);

impl SiteHealth {
    pub fn block(&self, subsystem: &str) -> Option<&serde_json::Value> {
        self.0.get(subsystem)
    }

    /// Read `key` from one subsystem block.
    pub fn field(&self, subsystem: &str, key: &str) -> Option<&serde_json::Value> {
        self.block(subsystem)?.get(key)
    }
}

/// Raw results of one cycle's five fetches.
#[derive(Debug, Clone, Default)]
pub struct FetchedData {
    pub system_info: SystemInfo,
    pub health: SiteHealth,
    pub access_points: Vec<LegacyDevice>,
    pub top_clients: Vec<LegacyClientEntry>,
    pub clients: Vec<LegacyClientEntry>,
}

/// Opens sessions against a controller.
pub trait ControllerConnector: Send + Sync + 'static {
    type Session: ControllerSession;

    fn connect(
        &self,
        settings: &ControllerSettings,
    ) -> impl Future<Output = Result<Self::Session, Error>> + Send;
}

/// One authenticated session. Every fetch may run concurrently with the others.
pub trait ControllerSession: Send + Sync {
    fn system_info(&self) -> impl Future<Output = Result<SystemInfo, Error>> + Send;

    fn health(&self) -> impl Future<Output = Result<SiteHealth, Error>> + Send;

    fn access_points(&self) -> impl Future<Output = Result<Vec<LegacyDevice>, Error>> + Send;

    /// The `limit` clients with the most traffic, highest first.
    fn top_clients(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LegacyClientEntry>, Error>> + Send;

    fn clients(&self) -> impl Future<Output = Result<Vec<LegacyClientEntry>, Error>> + Send;

    /// End the session. Must be called exactly once, whatever the fetches did.
    fn close(self) -> impl Future<Output = ()> + Send;
}
