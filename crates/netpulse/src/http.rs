//! JSON read layer over the snapshot cache, plus a live event stream.
//!
//! Every `GET` is answered from memory; nothing here talks to the
//! controller. `POST /api/stats/refresh` only asks the scheduler for an
//! out-of-band cycle.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use serde_json::json;
use thiserror::Error;
use tokio_stream::{
    Stream, StreamExt,
    wrappers::{BroadcastStream, errors::BroadcastStreamRecvError},
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use netpulse_core::model::{DeviceCounts, GatewayStats, NetworkHealth};
use netpulse_core::store::{AccessPointList, ApDetail, Bandwidth, RefreshStatus, TopClientList};
use netpulse_core::{BroadcastNotifier, Cache, QueryError, RefreshJob, Scheduler, Snapshot};

// ── State ───────────────────────────────────────────────────────────

/// Something that can start an out-of-band refresh without waiting for it.
pub trait RefreshTrigger: Send + Sync + 'static {
    /// `false` when no cycle was started.
    fn trigger(&self) -> bool;
}

impl<J: RefreshJob> RefreshTrigger for Scheduler<J> {
    fn trigger(&self) -> bool {
        Scheduler::trigger(self)
    }
}

#[derive(Clone)]
pub struct AppState {
    cache: Arc<Cache>,
    notifier: BroadcastNotifier,
    trigger: Arc<dyn RefreshTrigger>,
    refresh_interval: Duration,
}

impl AppState {
    pub fn new(
        cache: Arc<Cache>,
        notifier: BroadcastNotifier,
        trigger: Arc<dyn RefreshTrigger>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            cache,
            notifier,
            trigger,
            refresh_interval,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/stats", get(stats))
        .route("/api/stats/gateway", get(gateway))
        .route("/api/stats/bandwidth", get(bandwidth))
        .route("/api/stats/aps", get(access_points))
        .route("/api/stats/clients", get(top_clients))
        .route("/api/stats/health", get(health))
        .route("/api/stats/devices", get(devices))
        .route("/api/stats/ap/{ap_mac}", get(ap_detail))
        .route("/api/stats/status", get(status))
        .route("/api/stats/refresh", post(refresh))
        .route("/api/stats/events", get(events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("A refresh is already in progress")]
    RefreshInFlight,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Query(QueryError::Unavailable) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Query(QueryError::ApNotFound { .. }) => StatusCode::NOT_FOUND,
            Self::RefreshInFlight => StatusCode::CONFLICT,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ── Handlers ────────────────────────────────────────────────────────

async fn stats(State(state): State<AppState>) -> ApiResult<Arc<Snapshot>> {
    Ok(Json(state.cache.stats()?))
}

async fn gateway(State(state): State<AppState>) -> ApiResult<GatewayStats> {
    Ok(Json(state.cache.gateway()?))
}

async fn bandwidth(State(state): State<AppState>) -> ApiResult<Bandwidth> {
    Ok(Json(state.cache.bandwidth()?))
}

async fn access_points(State(state): State<AppState>) -> ApiResult<AccessPointList> {
    Ok(Json(state.cache.access_points()?))
}

async fn top_clients(State(state): State<AppState>) -> ApiResult<TopClientList> {
    Ok(Json(state.cache.top_clients()?))
}

async fn health(State(state): State<AppState>) -> ApiResult<NetworkHealth> {
    Ok(Json(state.cache.health()?))
}

async fn devices(State(state): State<AppState>) -> ApiResult<DeviceCounts> {
    Ok(Json(state.cache.devices()?))
}

async fn ap_detail(
    State(state): State<AppState>,
    Path(ap_mac): Path<String>,
) -> ApiResult<ApDetail> {
    Ok(Json(state.cache.ap_detail(&ap_mac)?))
}

async fn status(State(state): State<AppState>) -> Json<RefreshStatus> {
    Json(state.cache.status(state.refresh_interval))
}

async fn refresh(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    if !state.trigger.trigger() {
        return Err(ApiError::RefreshInFlight);
    }
    info!("manual refresh started");
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "detail": "Refresh started" })),
    ))
}

async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = BroadcastStream::new(state.notifier.subscribe()).filter_map(|msg| match msg {
        Ok(event) => Some(Event::default().json_data(&event)),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            debug!(skipped, "event subscriber fell behind");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
