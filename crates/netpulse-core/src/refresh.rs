// ── Refresh orchestration ──
//
// One cycle: load settings, resolve secrets, open a session, run the five
// fetches concurrently, always close the session, then build, check,
// publish, and notify. Errors never escape `run_cycle`; they are logged and
// recorded on the cache.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::FutureExt;
use tracing::{debug, error, info, warn};

use crate::config::SettingsProvider;
use crate::convert::build_snapshot;
use crate::error::RefreshError;
use crate::fetch::{ControllerConnector, ControllerSession, FetchedData};
use crate::model::Snapshot;
use crate::notify::{Notifier, PulseEvent};
use crate::scheduler::RefreshJob;
use crate::store::Cache;

/// Number of clients in the top-talkers list unless configured otherwise.
pub const DEFAULT_TOP_CLIENTS: usize = 10;

/// Drives refresh cycles against one controller.
///
/// Cheaply cloneable via `Arc`; every clone shares the same cache.
pub struct Refresher<P, C, N> {
    inner: Arc<RefresherInner<P, C, N>>,
}

struct RefresherInner<P, C, N> {
    settings: P,
    connector: C,
    notifier: N,
    cache: Arc<Cache>,
    refresh_interval: Duration,
    top_clients: usize,
}

impl<P, C, N> Clone for Refresher<P, C, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, C, N> Refresher<P, C, N>
where
    P: SettingsProvider,
    C: ControllerConnector,
    N: Notifier,
{
    pub fn new(
        settings: P,
        connector: C,
        notifier: N,
        cache: Arc<Cache>,
        refresh_interval: Duration,
        top_clients: usize,
    ) -> Self {
        Self {
            inner: Arc::new(RefresherInner {
                settings,
                connector,
                notifier,
                cache,
                refresh_interval,
                top_clients,
            }),
        }
    }

    pub fn cache(&self) -> &Arc<Cache> {
        &self.inner.cache
    }

    pub fn notifier(&self) -> &N {
        &self.inner.notifier
    }

    /// Execute one full cycle and return the published snapshot.
    pub async fn run(&self) -> Result<Arc<Snapshot>, RefreshError> {
        let inner = &self.inner;

        let profile = inner
            .settings
            .load_profile()?
            .ok_or(RefreshError::ConfigMissing)?;
        let settings = inner.settings.resolve(profile)?;

        debug!(url = %settings.url, site = %settings.site, "connecting to controller");
        let session = inner
            .connector
            .connect(&settings)
            .await
            .map_err(|e| RefreshError::connect(&e))?;

        // A panicking fetch must still give the session back.
        let fetched = AssertUnwindSafe(fetch_all(&session, inner.top_clients))
            .catch_unwind()
            .await;
        session.close().await;
        let data = match fetched {
            Ok(result) => result?,
            Err(payload) => return Err(RefreshError::Unexpected(panic_message(&*payload))),
        };

        let snapshot = Arc::new(build_snapshot(&data, inner.refresh_interval, Utc::now()));
        snapshot.check_consistency()?;

        inner.cache.publish(Arc::clone(&snapshot));
        inner
            .notifier
            .broadcast(PulseEvent::StatsUpdate(Arc::clone(&snapshot)));
        Ok(snapshot)
    }
}

impl<P, C, N> RefreshJob for Refresher<P, C, N>
where
    P: SettingsProvider,
    C: ControllerConnector,
    N: Notifier,
{
    async fn run_cycle(&self) {
        info!("starting network stats refresh");

        // A panic inside the cycle surfaces as a JoinError instead of
        // taking the scheduler down with it.
        let this = self.clone();
        let outcome = match tokio::spawn(async move { this.run().await }).await {
            Ok(result) => result,
            Err(e) => Err(RefreshError::Unexpected(e.to_string())),
        };

        match outcome {
            Ok(snapshot) => info!(
                clients = snapshot.devices.clients,
                aps = snapshot.devices.aps,
                "network stats refresh completed"
            ),
            Err(e) => {
                if matches!(e, RefreshError::ConfigMissing) {
                    warn!("no controller configured, skipping refresh");
                } else {
                    error!(error = %e, transient = e.is_transient(), "network stats refresh failed");
                }
                self.inner.cache.record_error(e.to_string());
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "fetch panicked".into())
}

async fn fetch_all<S: ControllerSession>(
    session: &S,
    top_clients: usize,
) -> Result<FetchedData, RefreshError> {
    let (system_info, health, access_points, top_clients, clients) = tokio::try_join!(
        async {
            session
                .system_info()
                .await
                .map_err(|e| RefreshError::fetch("system info", &e))
        },
        async {
            session
                .health()
                .await
                .map_err(|e| RefreshError::fetch("health", &e))
        },
        async {
            session
                .access_points()
                .await
                .map_err(|e| RefreshError::fetch("access points", &e))
        },
        async {
            session
                .top_clients(top_clients)
                .await
                .map_err(|e| RefreshError::fetch("top clients", &e))
        },
        async {
            session
                .clients()
                .await
                .map_err(|e| RefreshError::fetch("clients", &e))
        },
    )?;

    Ok(FetchedData {
        system_info,
        health,
        access_points,
        top_clients,
        clients,
    })
}
