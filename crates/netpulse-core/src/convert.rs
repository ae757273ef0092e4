// ── Raw-to-snapshot conversion ──
//
// Turns one cycle's `FetchedData` into a `Snapshot`. Pure: no I/O, no
// clock reads, and missing upstream fields fall back to defaults instead
// of failing.

use std::cmp::Reverse;
use std::time::Duration;

use chrono::{DateTime, Utc};
use netpulse_api::legacy::models::{LegacyClientEntry, LegacyDevice, loose_f64};
use serde_json::Value;

use crate::fetch::{FetchedData, SiteHealth};
use crate::model::{
    ApStatus, ChartData, DeviceCounts, GatewayStats, NetworkHealth, Snapshot, Tally, TopClient,
    WanHealth,
};
use crate::radio::classify;

const UNKNOWN: &str = "Unknown";
const WIRED: &str = "Wired";

// ── Helpers ────────────────────────────────────────────────────────

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.is_empty())
}

/// Byte rates arrive as integers or floats depending on firmware.
#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn rate(value: Option<&Value>) -> u64 {
    let Some(value) = value else { return 0 };
    value.as_u64().unwrap_or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f > 0.0)
            .map_or(0, |f| f as u64)
    })
}

fn string_field(health: &SiteHealth, subsystem: &str, key: &str) -> Option<String> {
    health
        .field(subsystem, key)
        .and_then(Value::as_str)
        .map(String::from)
}

// ── Entity conversions ─────────────────────────────────────────────

/// Normalize one controller client. Used for both the top list and the roster.
pub fn convert_client(raw: &LegacyClientEntry) -> TopClient {
    let is_wired = raw.is_wired.unwrap_or(false);
    let tx_bytes = raw.tx_bytes.unwrap_or(0);
    let rx_bytes = raw.rx_bytes.unwrap_or(0);
    let name = non_empty(raw.name.as_deref())
        .or_else(|| non_empty(raw.hostname.as_deref()))
        .unwrap_or(UNKNOWN)
        .to_owned();

    TopClient {
        mac: raw.mac.clone(),
        name,
        hostname: raw.hostname.clone(),
        ip: raw.ip.clone(),
        tx_bytes,
        rx_bytes,
        total_bytes: tx_bytes.saturating_add(rx_bytes),
        rssi: raw.rssi,
        is_wired,
        uptime: raw.uptime,
        essid: raw.essid.clone(),
        network: raw.network.clone(),
        radio: classify(raw.radio.as_deref(), is_wired),
        ap_mac: raw.ap_mac.clone(),
    }
}

pub fn convert_access_point(raw: &LegacyDevice) -> ApStatus {
    let model_code = non_empty(raw.model.as_deref()).map(String::from);
    let model = non_empty(raw.shortname.as_deref())
        .or(model_code.as_deref())
        .unwrap_or(UNKNOWN)
        .to_owned();

    ApStatus {
        mac: raw.mac.clone(),
        name: non_empty(raw.name.as_deref()).unwrap_or(UNKNOWN).to_owned(),
        model,
        model_code,
        num_sta: raw.num_sta.unwrap_or(0),
        user_num_sta: raw.user_num_sta.unwrap_or(0),
        guest_num_sta: raw.guest_num_sta.unwrap_or(0),
        channels: raw
            .radio_table_stats
            .iter()
            .filter_map(|r| r.channel)
            .collect(),
        state: raw.state,
        uptime: raw.uptime.unwrap_or(0),
        satisfaction: raw.satisfaction,
        tx_bytes: raw.tx_bytes.unwrap_or(0),
        rx_bytes: raw.rx_bytes.unwrap_or(0),
    }
}

fn convert_wan(health: &SiteHealth) -> WanHealth {
    let availability = health
        .field("wan", "availability")
        .or_else(|| {
            health
                .field("wan", "uptime_stats")
                .and_then(|u| u.get("WAN"))
                .and_then(|w| w.get("availability"))
        })
        .and_then(loose_f64);

    WanHealth {
        status: string_field(health, "wan", "status").unwrap_or_else(|| "unknown".into()),
        wan_ip: string_field(health, "wan", "wan_ip"),
        isp_name: string_field(health, "wan", "isp_name"),
        availability,
        latency: health.field("www", "latency").and_then(loose_f64),
        tx_bytes_rate: wan_rate(health, "tx"),
        rx_bytes_rate: wan_rate(health, "rx"),
    }
}

/// Current WAN rate for one direction. Prefers the `-r` rate field and
/// falls back to the plain counter older firmware reports there.
fn wan_rate(health: &SiteHealth, direction: &str) -> u64 {
    let rate_key = format!("{direction}_bytes-r");
    let plain_key = format!("{direction}_bytes");
    rate(
        health
            .field("wan", &rate_key)
            .or_else(|| health.field("wan", &plain_key)),
    )
}

fn sort_by_traffic(clients: &mut [TopClient]) {
    clients.sort_by_key(|c| Reverse(c.total_bytes));
}

// ── Snapshot assembly ──────────────────────────────────────────────

/// Build the snapshot for one successful cycle.
pub fn build_snapshot(
    data: &FetchedData,
    refresh_interval: Duration,
    now: DateTime<Utc>,
) -> Snapshot {
    let info = &data.system_info;
    let gateway = GatewayStats {
        model: info.gateway_model.clone(),
        name: info.gateway_name.clone(),
        version: info.gateway_version.clone(),
        uptime: info.uptime,
        cpu_utilization: info.cpu_utilization,
        mem_utilization: info.mem_utilization,
        wan_status: info.wan_status.clone(),
        wan_ip: info.wan_ip.clone(),
    };

    let wan = convert_wan(&data.health);

    let mut all_clients: Vec<TopClient> = data.clients.iter().map(convert_client).collect();
    let mut clients_by_band = Tally::new();
    let mut clients_by_ssid = Tally::new();
    for client in &all_clients {
        clients_by_band.increment(&client.band_key());
        match non_empty(client.essid.as_deref()) {
            Some(essid) => clients_by_ssid.increment(essid),
            None if client.is_wired => clients_by_ssid.increment(WIRED),
            None => {}
        }
    }
    sort_by_traffic(&mut all_clients);

    let mut top_clients: Vec<TopClient> = data.top_clients.iter().map(convert_client).collect();
    sort_by_traffic(&mut top_clients);

    let total = all_clients.len();
    let wired = all_clients.iter().filter(|c| c.is_wired).count();
    let devices = DeviceCounts {
        clients: total,
        wired_clients: wired,
        wireless_clients: total.saturating_sub(wired),
        aps: info.ap_count,
        switches: info.switch_count,
    };

    let block = |name: &str| data.health.block(name).cloned();
    let health = NetworkHealth {
        wan: block("wan"),
        wan2: block("wan2"),
        lan: block("lan"),
        wlan: block("wlan"),
        vpn: block("vpn"),
        www: block("www"),
    };

    Snapshot {
        gateway,
        current_tx_rate: wan.tx_bytes_rate,
        current_rx_rate: wan.rx_bytes_rate,
        wan,
        devices,
        access_points: data.access_points.iter().map(convert_access_point).collect(),
        top_clients,
        all_clients,
        chart_data: ChartData {
            clients_by_band,
            clients_by_ssid,
        },
        health,
        last_refresh: now,
        refresh_interval: refresh_interval.as_secs(),
    }
}
