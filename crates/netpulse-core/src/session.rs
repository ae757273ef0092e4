// ── Legacy API session adapter ──
//
// Implements the fetch seam over `LegacyClient`: platform detection,
// login or API-key auth, the derived fetches, and logout on close.

use std::cmp::Reverse;
use std::collections::HashMap;

use netpulse_api::legacy::models::{LegacyClientEntry, LegacyDevice};
use netpulse_api::{Error, LegacyClient, TlsMode, TransportConfig};
use tracing::{debug, warn};

use crate::config::{AuthCredentials, ControllerSettings, TlsVerification};
use crate::fetch::{ControllerConnector, ControllerSession, SiteHealth, SystemInfo};

const GATEWAY_TYPES: &[&str] = &["ugw", "udm", "uxg"];
const AP_TYPE: &str = "uap";
const SWITCH_TYPE: &str = "usw";

/// Opens `LegacySession`s. Stateless; one per process is enough.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyConnector;

impl ControllerConnector for LegacyConnector {
    type Session = LegacySession;

    async fn connect(&self, settings: &ControllerSettings) -> Result<LegacySession, Error> {
        let transport = TransportConfig {
            tls: tls_to_transport(&settings.tls),
            timeout: settings.timeout,
        };

        let platform = LegacyClient::detect_platform(&settings.url, &transport).await?;
        debug!(?platform, url = %settings.url, "opening controller session");

        match &settings.auth {
            AuthCredentials::ApiKey(key) => {
                let client = LegacyClient::with_api_key(
                    settings.url.clone(),
                    settings.site.clone(),
                    platform,
                    key,
                    &transport,
                )?;
                Ok(LegacySession {
                    client,
                    logout_on_close: false,
                })
            }
            AuthCredentials::Credentials { username, password } => {
                let client = LegacyClient::new(
                    settings.url.clone(),
                    settings.site.clone(),
                    platform,
                    &transport,
                )?;
                client.login(username, password).await?;
                Ok(LegacySession {
                    client,
                    logout_on_close: true,
                })
            }
        }
    }
}

/// One authenticated session against a controller.
pub struct LegacySession {
    client: LegacyClient,
    /// Cookie sessions hold server state; API-key sessions do not.
    logout_on_close: bool,
}

impl ControllerSession for LegacySession {
    async fn system_info(&self) -> Result<SystemInfo, Error> {
        let devices = self.client.list_devices().await?;
        Ok(summarize_devices(&devices))
    }

    async fn health(&self) -> Result<SiteHealth, Error> {
        let blocks = self.client.get_health().await?;
        let by_subsystem: HashMap<_, _> = blocks
            .iter()
            .map(|h| (h.subsystem.clone(), h.to_value()))
            .collect();
        Ok(SiteHealth(by_subsystem))
    }

    async fn access_points(&self) -> Result<Vec<LegacyDevice>, Error> {
        let devices = self.client.list_devices().await?;
        Ok(devices
            .into_iter()
            .filter(|d| d.device_type == AP_TYPE)
            .collect())
    }

    async fn top_clients(&self, limit: usize) -> Result<Vec<LegacyClientEntry>, Error> {
        let clients = self.client.list_clients().await?;
        Ok(rank_clients(clients, limit))
    }

    async fn clients(&self) -> Result<Vec<LegacyClientEntry>, Error> {
        self.client.list_clients().await
    }

    async fn close(self) {
        if !self.logout_on_close {
            return;
        }
        if let Err(e) = self.client.logout().await {
            warn!(error = %e, "controller logout failed");
        }
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

/// Pull gateway identity and infrastructure counts out of the device list.
pub(crate) fn summarize_devices(devices: &[LegacyDevice]) -> SystemInfo {
    let gateway = devices
        .iter()
        .find(|d| GATEWAY_TYPES.contains(&d.device_type.as_str()));
    let count = |kind: &str| devices.iter().filter(|d| d.device_type == kind).count();

    let mut info = SystemInfo {
        ap_count: count(AP_TYPE),
        switch_count: count(SWITCH_TYPE),
        ..SystemInfo::default()
    };

    if let Some(gw) = gateway {
        info.gateway_model.clone_from(&gw.model);
        info.gateway_name.clone_from(&gw.name);
        info.gateway_version.clone_from(&gw.version);
        info.uptime = gw.uptime;
        if let Some(ref stats) = gw.system_stats {
            info.cpu_utilization = stats.cpu_pct();
            info.mem_utilization = stats.mem_pct();
        }
        if let Some(ref wan) = gw.wan1 {
            info.wan_ip.clone_from(&wan.ip);
            info.wan_status = wan
                .up
                .map(|up| if up { "online" } else { "offline" }.to_owned());
        }
    }

    info
}

/// Highest-traffic clients first. Ties keep controller order.
pub(crate) fn rank_clients(
    mut clients: Vec<LegacyClientEntry>,
    limit: usize,
) -> Vec<LegacyClientEntry> {
    clients.sort_by_key(|c| Reverse(c.total_bytes()));
    clients.truncate(limit);
    clients
}
