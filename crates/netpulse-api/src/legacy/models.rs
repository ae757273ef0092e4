// Legacy API response types
//
// Models for the UniFi controller's legacy JSON API. All responses are wrapped
// in the `LegacyResponse<T>` envelope. Fields use `#[serde(default)]` liberally
// because the API is inconsistent about field presence across firmware versions.

use serde::{Deserialize, Serialize};

// ── Response Envelope ────────────────────────────────────────────────

/// Standard UniFi legacy API response envelope.
///
/// Every legacy endpoint wraps its payload:
/// ```json
/// { "meta": { "rc": "ok", "msg": "optional" }, "data": [...] }
/// ```
#[derive(Debug, Deserialize)]
pub struct LegacyResponse<T> {
    pub meta: Meta,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Metadata from the legacy envelope. `rc` == `"ok"` means success.
#[derive(Debug, Deserialize)]
pub struct Meta {
    pub rc: String,
    #[serde(default)]
    pub msg: Option<String>,
}

// ── Device ───────────────────────────────────────────────────────────

/// Full device object from `stat/device`.
///
/// The legacy API can return 100+ fields per device. We model the ones the
/// dashboard reads; everything else lands in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyDevice {
    #[serde(default, rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub mac: String,
    /// `uap`, `usw`, `ugw`, `udm`, `uxg`, ...
    #[serde(default, rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Model code (`U6LR`, `UDMPRO`).
    #[serde(default)]
    pub model: Option<String>,
    /// Marketing name, when the firmware reports one.
    #[serde(default)]
    pub shortname: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub adopted: bool,
    /// 0=offline, 1=online, 2=pending, 4=upgrading, 5=provisioning
    #[serde(default)]
    pub state: i32,
    #[serde(default)]
    pub uptime: Option<u64>,
    #[serde(default)]
    pub num_sta: Option<u32>,
    #[serde(default, rename = "user-num_sta")]
    pub user_num_sta: Option<u32>,
    #[serde(default, rename = "guest-num_sta")]
    pub guest_num_sta: Option<u32>,
    #[serde(default)]
    pub satisfaction: Option<i32>,
    #[serde(default)]
    pub tx_bytes: Option<u64>,
    #[serde(default)]
    pub rx_bytes: Option<u64>,
    #[serde(default, rename = "system-stats")]
    pub system_stats: Option<SystemStats>,
    /// Primary WAN port (gateways only).
    #[serde(default)]
    pub wan1: Option<WanPort>,
    /// Per-radio live stats (access points only).
    #[serde(default)]
    pub radio_table_stats: Vec<RadioStats>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `system-stats` block. Firmware reports these as strings (`"12.5"`)
/// or numbers depending on version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemStats {
    #[serde(default)]
    pub cpu: Option<serde_json::Value>,
    #[serde(default)]
    pub mem: Option<serde_json::Value>,
}

impl SystemStats {
    /// CPU utilization in percent.
    pub fn cpu_pct(&self) -> Option<f64> {
        self.cpu.as_ref().and_then(loose_f64)
    }

    /// Memory utilization in percent.
    pub fn mem_pct(&self) -> Option<f64> {
        self.mem.as_ref().and_then(loose_f64)
    }
}

/// A gateway WAN port (`wan1`, `wan2`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WanPort {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub up: Option<bool>,
}

/// One entry of an access point's `radio_table_stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RadioStats {
    #[serde(default)]
    pub name: Option<String>,
    /// Vendor radio code (`ng`, `na`, `6e`).
    #[serde(default)]
    pub radio: Option<String>,
    #[serde(default)]
    pub channel: Option<u32>,
    #[serde(default)]
    pub num_sta: Option<u32>,
}

// ── Client (Station) ─────────────────────────────────────────────────

/// Connected client from `stat/sta`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyClientEntry {
    #[serde(default, rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_guest: Option<bool>,
    #[serde(default)]
    pub is_wired: Option<bool>,
    #[serde(default)]
    pub tx_bytes: Option<u64>,
    #[serde(default)]
    pub rx_bytes: Option<u64>,
    #[serde(default)]
    pub uptime: Option<u64>,
    #[serde(default)]
    pub essid: Option<String>,
    #[serde(default)]
    pub radio: Option<String>,
    #[serde(default)]
    pub rssi: Option<i32>,
    #[serde(default)]
    pub ap_mac: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LegacyClientEntry {
    /// Bytes transferred in both directions, treating missing counters as zero.
    pub fn total_bytes(&self) -> u64 {
        self.tx_bytes
            .unwrap_or(0)
            .saturating_add(self.rx_bytes.unwrap_or(0))
    }
}

// ── Health ───────────────────────────────────────────────────────────

/// One subsystem entry from `stat/health`.
///
/// Only the subsystem name is pulled out; the rest of the block is kept
/// verbatim because each subsystem carries a different field set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyHealth {
    #[serde(default)]
    pub subsystem: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LegacyHealth {
    /// Reassemble the full JSON block as the controller sent it.
    pub fn to_value(&self) -> serde_json::Value {
        let mut block = self.extra.clone();
        block.insert("subsystem".into(), self.subsystem.clone().into());
        if let Some(ref status) = self.status {
            block.insert("status".into(), status.clone().into());
        }
        serde_json::Value::Object(block)
    }
}

/// Read a number that may arrive as a JSON number or a numeric string.
pub fn loose_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
