// ── Change notification ──
//
// Fire-and-forget fan-out of freshly published snapshots.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::model::Snapshot;

const EVENT_CHANNEL_SIZE: usize = 16;

/// Event pushed to subscribers.
///
/// Serializes as `{"type": "stats_update", "data": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PulseEvent {
    StatsUpdate(Arc<Snapshot>),
}

/// Delivers events to whoever is listening. Must never block the caller.
pub trait Notifier: Send + Sync + 'static {
    fn broadcast(&self, event: PulseEvent);
}

/// `Notifier` over a `tokio::sync::broadcast` channel.
///
/// Subscribers that fall behind lose the oldest events.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<PulseEvent>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PulseEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for BroadcastNotifier {
    fn broadcast(&self, event: PulseEvent) {
        // No subscribers is not an error.
        if let Ok(n) = self.tx.send(event) {
            trace!(subscribers = n, "event broadcast");
        }
    }
}
