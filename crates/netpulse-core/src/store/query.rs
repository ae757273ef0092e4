// ── Read-side views over the cache ──
//
// Each accessor returns one slice of the current snapshot, shaped the way
// the HTTP layer serves it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::Cache;
use crate::model::{
    ApStatus, DeviceCounts, GatewayStats, NetworkHealth, Snapshot, Tally, TopClient, mac_eq,
};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Dashboard data not yet available. Please wait for initial refresh.")]
    Unavailable,

    #[error("AP not found: {mac}")]
    ApNotFound { mac: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bandwidth {
    pub current_tx_rate: u64,
    pub current_rx_rate: u64,
    /// Hourly samples. No history is kept between cycles, so this is
    /// always empty; the key is served so dashboards can rely on it.
    pub bandwidth_history: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessPointList {
    pub access_points: Vec<ApStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopClientList {
    pub top_clients: Vec<TopClient>,
}

/// One AP with the roster entries attached to it.
#[derive(Debug, Clone, Serialize)]
pub struct ApDetail {
    pub ap_info: ApStatus,
    pub clients: Vec<TopClient>,
    pub clients_by_band: Tally,
}

/// Refresh bookkeeping. Always available, even before the first snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshStatus {
    pub has_data: bool,
    pub last_refresh: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub refresh_interval: u64,
}

impl Cache {
    /// The whole snapshot, or `Unavailable` before the first publish.
    pub fn stats(&self) -> Result<std::sync::Arc<Snapshot>, QueryError> {
        self.get().ok_or(QueryError::Unavailable)
    }

    pub fn gateway(&self) -> Result<GatewayStats, QueryError> {
        Ok(self.stats()?.gateway.clone())
    }

    pub fn bandwidth(&self) -> Result<Bandwidth, QueryError> {
        let snap = self.stats()?;
        Ok(Bandwidth {
            current_tx_rate: snap.current_tx_rate,
            current_rx_rate: snap.current_rx_rate,
            bandwidth_history: Vec::new(),
        })
    }

    pub fn access_points(&self) -> Result<AccessPointList, QueryError> {
        Ok(AccessPointList {
            access_points: self.stats()?.access_points.clone(),
        })
    }

    pub fn top_clients(&self) -> Result<TopClientList, QueryError> {
        Ok(TopClientList {
            top_clients: self.stats()?.top_clients.clone(),
        })
    }

    pub fn health(&self) -> Result<NetworkHealth, QueryError> {
        Ok(self.stats()?.health.clone())
    }

    pub fn devices(&self) -> Result<DeviceCounts, QueryError> {
        Ok(self.stats()?.devices)
    }

    /// Look up one AP by MAC in any case or separator style.
    pub fn ap_detail(&self, ap_mac: &str) -> Result<ApDetail, QueryError> {
        let snap = self.stats()?;

        let ap_info = snap
            .access_points
            .iter()
            .find(|ap| mac_eq(&ap.mac, ap_mac))
            .cloned()
            .ok_or_else(|| QueryError::ApNotFound {
                mac: ap_mac.to_owned(),
            })?;

        let clients: Vec<TopClient> = snap
            .all_clients
            .iter()
            .filter(|c| c.ap_mac.as_deref().is_some_and(|mac| mac_eq(mac, ap_mac)))
            .cloned()
            .collect();

        let mut clients_by_band = Tally::new();
        for client in &clients {
            clients_by_band.increment(&client.band_key());
        }

        Ok(ApDetail {
            ap_info,
            clients,
            clients_by_band,
        })
    }

    pub fn status(&self, refresh_interval: Duration) -> RefreshStatus {
        RefreshStatus {
            has_data: self.has_data(),
            last_refresh: self.last_refresh(),
            last_error: self.last_error(),
            refresh_interval: refresh_interval.as_secs(),
        }
    }
}
