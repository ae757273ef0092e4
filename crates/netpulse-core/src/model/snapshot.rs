// ── Snapshot domain types ──
//
// One `Snapshot` is built per successful refresh and never mutated after
// it is published. Field names are the JSON the read layer serves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Tally;
use crate::error::RefreshError;
use crate::radio::RadioBand;

/// Gateway identity and load, taken from the system-info fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayStats {
    pub model: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub uptime: Option<u64>,
    pub cpu_utilization: Option<f64>,
    pub mem_utilization: Option<f64>,
    pub wan_status: Option<String>,
    pub wan_ip: Option<String>,
}

/// WAN health. Latency comes from the `www` block, the rest from `wan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WanHealth {
    pub status: String,
    pub wan_ip: Option<String>,
    pub isp_name: Option<String>,
    pub availability: Option<f64>,
    pub latency: Option<f64>,
    /// Bytes per second.
    pub tx_bytes_rate: u64,
    pub rx_bytes_rate: u64,
}

impl Default for WanHealth {
    fn default() -> Self {
        Self {
            status: "unknown".into(),
            wan_ip: None,
            isp_name: None,
            availability: None,
            latency: None,
            tx_bytes_rate: 0,
            rx_bytes_rate: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCounts {
    pub clients: usize,
    pub wired_clients: usize,
    pub wireless_clients: usize,
    pub aps: usize,
    pub switches: usize,
}

/// One access point.
///
/// `user_num_sta + guest_num_sta <= num_sta` usually holds but is whatever
/// the controller reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApStatus {
    pub mac: String,
    pub name: String,
    /// Product name when known, otherwise the raw model code.
    pub model: String,
    pub model_code: Option<String>,
    pub num_sta: u32,
    pub user_num_sta: u32,
    pub guest_num_sta: u32,
    /// Operating channel of each radio.
    pub channels: Vec<u32>,
    pub state: i32,
    pub uptime: u64,
    pub satisfaction: Option<i32>,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
}

/// A connected client. Used for both the top-N list and the full roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopClient {
    pub mac: String,
    pub name: String,
    pub hostname: Option<String>,
    pub ip: Option<String>,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    /// Always `tx_bytes + rx_bytes`.
    pub total_bytes: u64,
    pub rssi: Option<i32>,
    pub is_wired: bool,
    pub uptime: Option<u64>,
    pub essid: Option<String>,
    pub network: Option<String>,
    pub radio: Option<RadioBand>,
    pub ap_mac: Option<String>,
}

impl TopClient {
    /// Label this client is counted under in band charts.
    pub fn band_key(&self) -> String {
        if self.is_wired {
            "Wired".to_owned()
        } else {
            self.radio
                .map_or_else(|| "Unknown".to_owned(), |band| band.to_string())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartData {
    pub clients_by_band: Tally,
    pub clients_by_ssid: Tally,
}

/// Per-subsystem health blocks, passed through as the controller sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkHealth {
    pub wan: Option<serde_json::Value>,
    pub wan2: Option<serde_json::Value>,
    pub lan: Option<serde_json::Value>,
    pub wlan: Option<serde_json::Value>,
    pub vpn: Option<serde_json::Value>,
    pub www: Option<serde_json::Value>,
}

/// Everything the dashboard shows, as of one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub gateway: GatewayStats,
    pub wan: WanHealth,
    pub devices: DeviceCounts,
    pub current_tx_rate: u64,
    pub current_rx_rate: u64,
    pub access_points: Vec<ApStatus>,
    pub top_clients: Vec<TopClient>,
    /// Every connected client, highest `total_bytes` first.
    pub all_clients: Vec<TopClient>,
    pub chart_data: ChartData,
    pub health: NetworkHealth,
    pub last_refresh: DateTime<Utc>,
    /// Seconds between scheduled refreshes.
    pub refresh_interval: u64,
}

impl Snapshot {
    /// Verify the derived aggregates agree with the client roster.
    pub fn check_consistency(&self) -> Result<(), RefreshError> {
        let roster = self.all_clients.len();
        if self.devices.clients != roster {
            return Err(RefreshError::Transform {
                message: format!(
                    "client count {} does not match roster of {roster}",
                    self.devices.clients
                ),
            });
        }
        if self.devices.wired_clients + self.devices.wireless_clients != roster {
            return Err(RefreshError::Transform {
                message: format!(
                    "wired ({}) + wireless ({}) does not match roster of {roster}",
                    self.devices.wired_clients, self.devices.wireless_clients
                ),
            });
        }
        let banded = self.chart_data.clients_by_band.total();
        if usize::try_from(banded).ok() != Some(roster) {
            return Err(RefreshError::Transform {
                message: format!("band chart counts {banded} clients, roster has {roster}"),
            });
        }
        if self
            .all_clients
            .windows(2)
            .any(|pair| pair[0].total_bytes < pair[1].total_bytes)
        {
            return Err(RefreshError::Transform {
                message: "client roster is not sorted by total bytes".into(),
            });
        }
        Ok(())
    }
}
