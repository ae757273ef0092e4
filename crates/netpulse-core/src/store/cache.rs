// ── Snapshot cache ──
//
// Holds the one current snapshot plus refresh metadata. Reads are
// wait-free pointer loads; a publish is a single pointer swap, so a reader
// sees either the old snapshot or the new one, never a mix.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::Snapshot;

/// Process-wide store for the latest published snapshot.
///
/// Constructed once at startup and shared as `Arc<Cache>` between the
/// refresher (the only writer) and every reader.
pub struct Cache {
    snapshot: ArcSwapOption<Snapshot>,
    last_error: ArcSwapOption<String>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl Cache {
    pub fn new() -> Self {
        let (last_refresh, _) = watch::channel(None);

        Self {
            snapshot: ArcSwapOption::empty(),
            last_error: ArcSwapOption::empty(),
            last_refresh,
        }
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Replace the current snapshot, clear the last error, and stamp the
    /// last-refresh time with the snapshot's build time.
    pub fn publish(&self, snapshot: Arc<Snapshot>) {
        let stamped = snapshot.last_refresh;
        self.snapshot.store(Some(snapshot));
        self.last_error.store(None);
        self.last_refresh.send_replace(Some(stamped));
    }

    /// Remember why the latest cycle failed. The snapshot is left alone.
    pub fn record_error(&self, message: impl Into<String>) {
        self.last_error.store(Some(Arc::new(message.into())));
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// The current snapshot, or `None` before the first successful refresh.
    pub fn get(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.load_full()
    }

    pub fn has_data(&self) -> bool {
        self.snapshot.load().is_some()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.load().as_deref().cloned()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    /// Watch the last-refresh timestamp.
    pub fn subscribe_refresh(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_refresh.subscribe()
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}
