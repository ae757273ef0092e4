#![allow(clippy::unwrap_used)]
// Refresh pipeline tests against in-memory fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use netpulse_api::Error;
use netpulse_api::legacy::models::{LegacyClientEntry, LegacyDevice};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use url::Url;

use netpulse_core::{
    AuthCredentials, Cache, ControllerConnector, ControllerSession, ControllerSettings, Notifier,
    PulseEvent, RefreshError, RefreshJob, Refresher, SettingsProvider, SiteHealth, SystemInfo,
    TlsVerification,
};

// ── Fakes ───────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum ProfileMode {
    Missing,
    BadSecret,
    Ready,
}

struct FakeSettings(ProfileMode);

impl SettingsProvider for FakeSettings {
    type Profile = String;

    fn load_profile(&self) -> Result<Option<String>, RefreshError> {
        match self.0 {
            ProfileMode::Missing => Ok(None),
            ProfileMode::BadSecret | ProfileMode::Ready => Ok(Some("https://192.0.2.1".into())),
        }
    }

    fn resolve(&self, url: String) -> Result<ControllerSettings, RefreshError> {
        if matches!(self.0, ProfileMode::BadSecret) {
            return Err(RefreshError::Credential {
                message: "keyring locked".into(),
            });
        }
        Ok(ControllerSettings {
            url: Url::parse(&url).unwrap(),
            site: "default".into(),
            auth: AuthCredentials::Credentials {
                username: "admin".into(),
                password: SecretString::from("pw".to_owned()),
            },
            tls: TlsVerification::DangerAcceptInvalid,
            timeout: Duration::from_secs(5),
        })
    }
}

/// What the fake controller should do on the next cycle.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Healthy,
    RefuseConnect,
    FailHealth,
    PanicInClients,
}

#[derive(Default)]
struct Counters {
    connects: AtomicUsize,
    closes: AtomicUsize,
}

#[derive(Clone)]
struct FakeConnector {
    behavior: Arc<Mutex<Behavior>>,
    counters: Arc<Counters>,
}

impl FakeConnector {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            counters: Arc::new(Counters::default()),
        }
    }

    fn set(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    fn connects(&self) -> usize {
        self.counters.connects.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }
}

struct FakeSession {
    behavior: Behavior,
    counters: Arc<Counters>,
}

impl ControllerConnector for FakeConnector {
    type Session = FakeSession;

    async fn connect(&self, _settings: &ControllerSettings) -> Result<FakeSession, Error> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock().unwrap();
        if behavior == Behavior::RefuseConnect {
            return Err(Error::Authentication {
                message: "bad password".into(),
            });
        }
        Ok(FakeSession {
            behavior,
            counters: Arc::clone(&self.counters),
        })
    }
}

fn roster() -> Vec<LegacyClientEntry> {
    [("a", 500, false), ("b", 100, true), ("c", 300, false), ("d", 50, false)]
        .into_iter()
        .map(|(mac, tx, wired)| LegacyClientEntry {
            mac: mac.into(),
            tx_bytes: Some(tx),
            is_wired: Some(wired),
            radio: (!wired).then(|| "na".to_owned()),
            ..LegacyClientEntry::default()
        })
        .collect()
}

impl ControllerSession for FakeSession {
    async fn system_info(&self) -> Result<SystemInfo, Error> {
        Ok(SystemInfo {
            gateway_model: Some("UDMPRO".into()),
            ap_count: 1,
            switch_count: 2,
            ..SystemInfo::default()
        })
    }

    async fn health(&self) -> Result<SiteHealth, Error> {
        if self.behavior == Behavior::FailHealth {
            return Err(Error::LegacyApi {
                message: "api.err.NoSiteContext".into(),
            });
        }
        Ok(SiteHealth::default())
    }

    async fn access_points(&self) -> Result<Vec<LegacyDevice>, Error> {
        Ok(vec![LegacyDevice {
            mac: "aa:bb:cc:dd:ee:01".into(),
            device_type: "uap".into(),
            ..LegacyDevice::default()
        }])
    }

    async fn top_clients(&self, limit: usize) -> Result<Vec<LegacyClientEntry>, Error> {
        let mut clients = roster();
        clients.sort_by_key(|c| std::cmp::Reverse(c.total_bytes()));
        clients.truncate(limit);
        Ok(clients)
    }

    async fn clients(&self) -> Result<Vec<LegacyClientEntry>, Error> {
        assert!(
            self.behavior != Behavior::PanicInClients,
            "controller returned garbage"
        );
        Ok(roster())
    }

    async fn close(self) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
struct CountingNotifier {
    sent: Arc<AtomicUsize>,
}

impl Notifier for CountingNotifier {
    fn broadcast(&self, event: PulseEvent) {
        let PulseEvent::StatsUpdate(_) = event;
        self.sent.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

struct Harness {
    refresher: Refresher<FakeSettings, FakeConnector, CountingNotifier>,
    connector: FakeConnector,
    notifier: CountingNotifier,
    cache: Arc<Cache>,
}

fn harness(mode: ProfileMode, behavior: Behavior) -> Harness {
    let connector = FakeConnector::new(behavior);
    let notifier = CountingNotifier::default();
    let cache = Arc::new(Cache::new());
    let refresher = Refresher::new(
        FakeSettings(mode),
        connector.clone(),
        notifier.clone(),
        Arc::clone(&cache),
        Duration::from_secs(60),
        3,
    );
    Harness {
        refresher,
        connector,
        notifier,
        cache,
    }
}

impl Harness {
    fn notified(&self) -> usize {
        self.notifier.sent.load(Ordering::SeqCst)
    }
}

// ── Success path ────────────────────────────────────────────────────

#[tokio::test]
async fn successful_cycle_publishes_and_notifies_once() {
    let h = harness(ProfileMode::Ready, Behavior::Healthy);

    let snapshot = h.refresher.run().await.unwrap();

    assert_eq!(h.connector.connects(), 1);
    assert_eq!(h.connector.closes(), 1);
    assert_eq!(h.notified(), 1);
    assert!(Arc::ptr_eq(&h.cache.get().unwrap(), &snapshot));
    assert_eq!(h.cache.last_refresh(), Some(snapshot.last_refresh));

    assert_eq!(snapshot.devices.clients, 4);
    assert_eq!(snapshot.devices.wired_clients, 1);
    assert_eq!(snapshot.devices.switches, 2);
    assert_eq!(snapshot.refresh_interval, 60);
    let top: Vec<_> = snapshot.top_clients.iter().map(|c| c.mac.as_str()).collect();
    assert_eq!(top, ["a", "c", "b"]);
    let all: Vec<_> = snapshot.all_clients.iter().map(|c| c.mac.as_str()).collect();
    assert_eq!(all, ["a", "c", "b", "d"]);
}

#[tokio::test]
async fn success_clears_previous_error() {
    let h = harness(ProfileMode::Ready, Behavior::RefuseConnect);

    h.refresher.run_cycle().await;
    assert!(h.cache.last_error().is_some());

    h.connector.set(Behavior::Healthy);
    h.refresher.run_cycle().await;

    assert!(h.cache.last_error().is_none());
    assert!(h.cache.get().is_some());
}

// ── Failure isolation ───────────────────────────────────────────────

#[tokio::test]
async fn missing_config_does_nothing_else() {
    let h = harness(ProfileMode::Missing, Behavior::Healthy);

    let err = h.refresher.run().await.unwrap_err();
    assert!(matches!(err, RefreshError::ConfigMissing));
    assert_eq!(h.connector.connects(), 0);

    h.refresher.run_cycle().await;
    assert_eq!(
        h.cache.last_error().as_deref(),
        Some("No controller is configured")
    );
    assert!(h.cache.get().is_none());
    assert_eq!(h.notified(), 0);
}

#[tokio::test]
async fn credential_failure_skips_connect() {
    let h = harness(ProfileMode::BadSecret, Behavior::Healthy);

    let err = h.refresher.run().await.unwrap_err();

    assert!(matches!(err, RefreshError::Credential { .. }));
    assert_eq!(h.connector.connects(), 0);
}

#[tokio::test]
async fn connect_failure_is_reported_without_close() {
    let h = harness(ProfileMode::Ready, Behavior::RefuseConnect);

    let err = h.refresher.run().await.unwrap_err();

    assert!(matches!(err, RefreshError::Connect { .. }));
    assert_eq!(h.connector.connects(), 1);
    assert_eq!(h.connector.closes(), 0);
    assert!(h.cache.get().is_none());
}

#[tokio::test]
async fn fetch_failure_releases_session_and_keeps_snapshot() {
    let h = harness(ProfileMode::Ready, Behavior::Healthy);
    let first = h.refresher.run().await.unwrap();

    h.connector.set(Behavior::FailHealth);
    h.refresher.run_cycle().await;

    assert_eq!(h.connector.connects(), 2);
    assert_eq!(h.connector.closes(), 2, "session closed on failure too");
    assert!(Arc::ptr_eq(&h.cache.get().unwrap(), &first));
    assert_eq!(h.notified(), 1);
    assert_eq!(
        h.cache.last_error().as_deref(),
        Some("Fetching health failed: Legacy API error: api.err.NoSiteContext")
    );
}

#[tokio::test]
async fn fetch_error_names_resource() {
    let h = harness(ProfileMode::Ready, Behavior::FailHealth);

    match h.refresher.run().await {
        Err(RefreshError::Fetch { resource, .. }) => assert_eq!(resource, "health"),
        other => panic!("expected Fetch error, got: {other:?}"),
    }
}

#[tokio::test]
async fn panic_in_cycle_becomes_unexpected() {
    let h = harness(ProfileMode::Ready, Behavior::PanicInClients);

    h.refresher.run_cycle().await;

    let recorded = h.cache.last_error().unwrap();
    assert!(
        recorded.starts_with("Unexpected refresh failure"),
        "got: {recorded}"
    );
    assert!(h.cache.get().is_none());
    assert!(recorded.contains("controller returned garbage"), "got: {recorded}");
    assert_eq!(h.connector.connects(), 1);
    assert_eq!(h.connector.closes(), 1, "session must be closed after a panic");

    // The refresher stays usable.
    h.connector.set(Behavior::Healthy);
    h.refresher.run_cycle().await;
    assert!(h.cache.get().is_some());
}
