#![allow(clippy::unwrap_used)]
// End-to-end refresh through `LegacyConnector` against a wiremock controller.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use netpulse_core::{
    AuthCredentials, BroadcastNotifier, Cache, ControllerSettings, LegacyConnector, PulseEvent,
    RefreshError, Refresher, SettingsProvider, TlsVerification,
};

// ── Helpers ─────────────────────────────────────────────────────────

struct StaticSettings(ControllerSettings);

impl SettingsProvider for StaticSettings {
    type Profile = ControllerSettings;

    fn load_profile(&self) -> Result<Option<ControllerSettings>, RefreshError> {
        Ok(Some(self.0.clone()))
    }

    fn resolve(&self, profile: ControllerSettings) -> Result<ControllerSettings, RefreshError> {
        Ok(profile)
    }
}

fn settings(server: &MockServer, auth: AuthCredentials) -> StaticSettings {
    StaticSettings(ControllerSettings {
        url: Url::parse(&server.uri()).unwrap(),
        site: "default".into(),
        auth,
        tls: TlsVerification::SystemDefaults,
        timeout: Duration::from_secs(5),
    })
}

fn password_auth() -> AuthCredentials {
    AuthCredentials::Credentials {
        username: "admin".into(),
        password: SecretString::from("pw".to_owned()),
    }
}

fn envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "meta": { "rc": "ok" }, "data": data }))
}

async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(envelope(json!([
            {
                "mac": "00:11:22:33:44:55",
                "type": "ugw",
                "model": "UXG",
                "name": "Gateway",
                "system-stats": { "cpu": "3.0", "mem": "40.0" },
                "wan1": { "ip": "203.0.113.7", "up": true }
            },
            {
                "mac": "AA:BB:CC:DD:EE:01",
                "type": "uap",
                "name": "Hallway",
                "model": "U6LR",
                "num_sta": 2,
                "radio_table_stats": [{ "channel": 6 }, { "channel": 36 }]
            },
            { "mac": "00:00:00:00:00:02", "type": "usw", "model": "USW24" }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/sta"))
        .respond_with(envelope(json!([
            {
                "mac": "11:11:11:11:11:11",
                "hostname": "laptop",
                "tx_bytes": 100,
                "rx_bytes": 250,
                "radio": "na",
                "essid": "HomeNet",
                "ap_mac": "aa:bb:cc:dd:ee:01"
            },
            { "mac": "22:22:22:22:22:22", "is_wired": true, "tx_bytes": 5000 }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/health"))
        .respond_with(envelope(json!([
            { "subsystem": "wan", "status": "ok", "tx_bytes-r": 800, "rx_bytes-r": 1600 },
            { "subsystem": "www", "status": "ok", "latency": 9 }
        ])))
        .mount(server)
        .await;
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn full_cycle_logs_in_fetches_and_logs_out() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = BroadcastNotifier::new();
    let mut events = notifier.subscribe();
    let cache = Arc::new(Cache::new());
    let refresher = Refresher::new(
        settings(&server, password_auth()),
        LegacyConnector,
        notifier,
        Arc::clone(&cache),
        Duration::from_secs(60),
        10,
    );

    let snapshot = refresher.run().await.unwrap();

    assert_eq!(snapshot.gateway.model.as_deref(), Some("UXG"));
    assert_eq!(snapshot.gateway.wan_status.as_deref(), Some("online"));
    assert_eq!(snapshot.gateway.cpu_utilization, Some(3.0));
    assert_eq!(snapshot.devices.aps, 1);
    assert_eq!(snapshot.devices.switches, 1);
    assert_eq!(snapshot.devices.clients, 2);
    assert_eq!(snapshot.access_points.len(), 1);
    assert_eq!(snapshot.access_points[0].channels, [6, 36]);
    assert_eq!(snapshot.current_tx_rate, 800);
    assert_eq!(snapshot.wan.latency, Some(9.0));
    assert_eq!(snapshot.all_clients[0].mac, "22:22:22:22:22:22");
    assert_eq!(snapshot.all_clients[1].total_bytes, 350);

    let detail = cache.ap_detail("AA-BB-CC-DD-EE-01").unwrap();
    assert_eq!(detail.clients.len(), 1);
    assert_eq!(detail.clients[0].name, "laptop");

    let PulseEvent::StatsUpdate(pushed) = events.recv().await.unwrap();
    assert!(Arc::ptr_eq(&pushed, &snapshot));
}

#[tokio::test]
async fn api_key_session_skips_login_and_logout() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let refresher = Refresher::new(
        settings(
            &server,
            AuthCredentials::ApiKey(SecretString::from("key-abc".to_owned())),
        ),
        LegacyConnector,
        BroadcastNotifier::new(),
        Arc::new(Cache::new()),
        Duration::from_secs(60),
        10,
    );

    let snapshot = refresher.run().await.unwrap();
    assert_eq!(snapshot.devices.clients, 2);

    let site_requests: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path().starts_with("/api/s/"))
        .collect();
    assert!(!site_requests.is_empty());
    for request in site_requests {
        assert_eq!(
            request.headers.get("X-API-KEY").and_then(|v| v.to_str().ok()),
            Some("key-abc"),
            "{} sent without API key",
            request.url
        );
    }
}

#[tokio::test]
async fn rejected_login_is_a_connect_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(400).set_body_string("api.err.Invalid"))
        .mount(&server)
        .await;

    let refresher = Refresher::new(
        settings(&server, password_auth()),
        LegacyConnector,
        BroadcastNotifier::new(),
        Arc::new(Cache::new()),
        Duration::from_secs(60),
        10,
    );

    let err = refresher.run().await.unwrap_err();
    assert!(
        matches!(err, RefreshError::Connect { .. }),
        "expected Connect error, got: {err:?}"
    );
}

#[tokio::test]
async fn logout_failure_does_not_fail_the_cycle() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let refresher = Refresher::new(
        settings(&server, password_auth()),
        LegacyConnector,
        BroadcastNotifier::new(),
        Arc::new(Cache::new()),
        Duration::from_secs(60),
        10,
    );

    assert!(refresher.run().await.is_ok());
}

#[tokio::test]
async fn fetch_error_still_logs_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "meta": { "rc": "error", "msg": "api.err.NoSiteContext" } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let refresher = Refresher::new(
        settings(&server, password_auth()),
        LegacyConnector,
        BroadcastNotifier::new(),
        Arc::new(Cache::new()),
        Duration::from_secs(60),
        10,
    );

    let err = refresher.run().await.unwrap_err();
    assert!(
        matches!(err, RefreshError::Fetch { .. }),
        "expected Fetch error, got: {err:?}"
    );
}
