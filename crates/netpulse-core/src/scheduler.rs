// ── Refresh scheduler ──
//
// Runs a refresh job once at start, then on a fixed interval. At most one
// cycle is in flight at any time: ticks and manual triggers that find a
// cycle running are dropped, never queued.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One unit of scheduled work. Failures are the job's own business.
pub trait RefreshJob: Send + Sync + 'static {
    fn run_cycle(&self) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

struct Ticker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Fixed-interval, single-flight driver for a `RefreshJob`.
pub struct Scheduler<J> {
    job: Arc<J>,
    interval: Duration,
    /// Held for the whole duration of a cycle.
    in_flight: Arc<Mutex<()>>,
    state: watch::Sender<SchedulerState>,
    ticker: Mutex<Option<Ticker>>,
}

impl<J: RefreshJob> Scheduler<J> {
    pub fn new(job: Arc<J>, interval: Duration) -> Self {
        let (state, _) = watch::channel(SchedulerState::Stopped);

        Self {
            job,
            interval,
            in_flight: Arc::new(Mutex::new(())),
            state,
            ticker: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one cycle now, then arm the interval ticker. No-op if already running.
    pub async fn start(&self) {
        let mut ticker = self.ticker.lock().await;
        if ticker.is_some() {
            debug!("scheduler already running");
            return;
        }

        self.state.send_replace(SchedulerState::Running);
        info!(
            interval_secs = self.interval.as_secs(),
            "scheduler started, running initial refresh"
        );

        {
            let _cycle = self.in_flight.lock().await;
            self.job.run_cycle().await;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(tick_loop(
            Arc::clone(&self.job),
            Arc::clone(&self.in_flight),
            self.interval,
            cancel.clone(),
        ));
        *ticker = Some(Ticker { cancel, handle });
    }

    /// Start an out-of-band cycle. Returns `false` if one is already in
    /// flight or the scheduler is stopped.
    pub fn trigger(&self) -> bool {
        let Ok(guard) = Arc::clone(&self.in_flight).try_lock_owned() else {
            debug!("manual refresh rejected, cycle in flight");
            return false;
        };
        if self.state() != SchedulerState::Running {
            return false;
        }
        let job = Arc::clone(&self.job);
        tokio::spawn(async move {
            job.run_cycle().await;
            drop(guard);
        });
        true
    }

    /// Cancel the ticker and wait for any in-flight cycle to finish.
    ///
    /// The state flips to `Stopped` before anything is awaited, so a
    /// `trigger()` racing with shutdown never starts a new cycle.
    pub async fn stop(&self) {
        self.state.send_replace(SchedulerState::Stopped);

        let Some(Ticker { cancel, handle }) = self.ticker.lock().await.take() else {
            return;
        };

        cancel.cancel();
        if let Err(e) = handle.await {
            warn!(error = %e, "scheduler ticker ended abnormally");
        }

        let _idle = self.in_flight.lock().await;
        // A `start` that held the ticker lock may have set `Running` again.
        self.state.send_replace(SchedulerState::Stopped);
        info!("scheduler stopped");
    }
}

async fn tick_loop<J: RefreshJob>(
    job: Arc<J>,
    in_flight: Arc<Mutex<()>>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Ok(guard) = Arc::clone(&in_flight).try_lock_owned() else {
                    warn!("previous refresh still running, skipping scheduled tick");
                    continue;
                };
                let job = Arc::clone(&job);
                tokio::spawn(async move {
                    job.run_cycle().await;
                    drop(guard);
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Counts cycles and tracks peak concurrency. Cycle `n` sleeps for
    /// `durations[n]`, or one second past the end of the list.
    #[derive(Default)]
    struct FakeJob {
        durations: Vec<Duration>,
        starts: AtomicUsize,
        finishes: AtomicUsize,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FakeJob {
        fn with_durations(secs: &[u64]) -> Arc<Self> {
            Arc::new(Self {
                durations: secs.iter().map(|&s| Duration::from_secs(s)).collect(),
                ..Self::default()
            })
        }

        fn starts(&self) -> usize {
            self.starts.load(Ordering::SeqCst)
        }
    }

    impl RefreshJob for FakeJob {
        async fn run_cycle(&self) {
            let n = self.starts.fetch_add(1, Ordering::SeqCst);
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now_active, Ordering::SeqCst);

            let pause = self
                .durations
                .get(n)
                .copied()
                .unwrap_or(Duration::from_secs(1));
            tokio::time::sleep(pause).await;

            self.active.fetch_sub(1, Ordering::SeqCst);
            self.finishes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_runs_immediately() {
        let job = FakeJob::with_durations(&[]);
        let scheduler = Scheduler::new(Arc::clone(&job), Duration::from_secs(60));

        scheduler.start().await;

        assert_eq!(job.starts(), 1);
        assert_eq!(scheduler.state(), SchedulerState::Running);
        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_interval() {
        let job = FakeJob::with_durations(&[]);
        let scheduler = Scheduler::new(Arc::clone(&job), Duration::from_secs(60));

        scheduler.start().await;
        tokio::time::sleep(Duration::from_secs(125)).await;

        // Initial run plus ticks at ~61s and ~121s.
        assert_eq!(job.starts(), 3);
        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_ticks_are_dropped() {
        // The second cycle outlasts two intervals.
        let job = FakeJob::with_durations(&[1, 150]);
        let scheduler = Scheduler::new(Arc::clone(&job), Duration::from_secs(60));

        scheduler.start().await;
        tokio::time::sleep(Duration::from_secs(249)).await;

        // t=0 initial, t=61 long run until 211, ticks at 121 and 181 dropped,
        // t=241 runs again.
        assert_eq!(job.starts(), 3);
        assert_eq!(job.peak.load(Ordering::SeqCst), 1);
        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_is_single_flight() {
        let job = FakeJob::with_durations(&[1, 100]);
        let scheduler = Scheduler::new(Arc::clone(&job), Duration::from_secs(600));

        assert!(!scheduler.trigger(), "stopped scheduler must not run");
        scheduler.start().await;

        assert!(scheduler.trigger());
        assert!(!scheduler.trigger());
        tokio::time::sleep(Duration::from_secs(101)).await;
        assert!(scheduler.trigger());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(job.starts(), 3);
        assert_eq!(job.peak.load(Ordering::SeqCst), 1);
        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_waits_for_in_flight_cycle_and_halts_ticks() {
        let job = FakeJob::with_durations(&[1, 30]);
        let scheduler = Scheduler::new(Arc::clone(&job), Duration::from_secs(60));

        scheduler.start().await;
        assert!(scheduler.trigger());
        scheduler.stop().await;

        assert_eq!(job.finishes.load(Ordering::SeqCst), 2);
        assert_eq!(job.active.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.state(), SchedulerState::Stopped);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(job.starts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_is_refused_once_stop_has_begun() {
        let job = FakeJob::with_durations(&[]);
        let scheduler = Scheduler::new(Arc::clone(&job), Duration::from_secs(60));
        scheduler.start().await;

        let stopping = scheduler.stop();
        tokio::pin!(stopping);
        // Poll once so `stop` is parked on the ticker join.
        tokio::select! {
            biased;
            () = &mut stopping => {}
            () = std::future::ready(()) => {}
        }

        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert!(!scheduler.trigger());

        stopping.await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(job.starts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn can_restart_after_stop() {
        let job = FakeJob::with_durations(&[]);
        let scheduler = Scheduler::new(Arc::clone(&job), Duration::from_secs(60));

        scheduler.start().await;
        scheduler.stop().await;
        scheduler.start().await;

        assert_eq!(job.starts(), 2);
        assert_eq!(scheduler.state(), SchedulerState::Running);
        scheduler.stop().await;
    }
}
