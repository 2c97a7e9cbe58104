//! Background reconciliation retries
//!
//! When the index cannot be reconciled at startup, a single periodic task
//! keeps calling [`IndexReconciler::ensure_index`] with the same arguments.
//! The first success cancels the task for good. Failures are only counted;
//! the reconciler already logs them. There is no backoff and no retry limit.
//!
//! The task is a plain tokio task, so it never keeps the runtime alive on
//! process exit.

use crate::metrics;
use crate::reconcile::IndexReconciler;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Default delay and period between attempts
pub const DEFAULT_RETRY_PERIOD: Duration = Duration::from_secs(5 * 60);

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Timing and progress of a scheduled retry
#[derive(Debug)]
pub struct RetryState {
    pub delay: Duration,
    pub period: Duration,
    cancelled: AtomicBool,
    attempts: AtomicU64,
}

impl RetryState {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Attempts made so far, successful or not
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }
}

/// Handle to a running retry task
pub struct RetryHandle {
    state: Arc<RetryState>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RetryHandle {
    pub fn state(&self) -> &RetryState {
        &self.state
    }

    /// Whether the task has finished for good
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// Ask the task to stop after any attempt in flight
    pub(crate) fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Stop the task immediately, even mid-attempt
    pub(crate) fn abort(&self) {
        self.task.abort();
        self.state.cancelled.store(true, Ordering::Release);
    }
}

/// Schedules fixed-period reconciliation retries
#[derive(Debug, Clone, Copy)]
pub struct RetryScheduler {
    delay: Duration,
    period: Duration,
}

impl Default for RetryScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_PERIOD)
    }
}

impl RetryScheduler {
    /// First attempt after one period, then every period
    pub fn new(period: Duration) -> Self {
        Self::with_delay(period, period)
    }

    pub fn with_delay(delay: Duration, period: Duration) -> Self {
        Self {
            delay,
            period: period.max(MIN_PERIOD),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawn the retry task for `ensure_index(name, consider_as_alias)`
    pub fn schedule(
        &self,
        reconciler: IndexReconciler,
        name: String,
        consider_as_alias: bool,
    ) -> RetryHandle {
        self.schedule_with(reconciler, name, consider_as_alias, || {})
    }

    /// Like [`schedule`](Self::schedule), running `on_success` once after
    /// the attempt that reconciles the index
    ///
    /// The first attempt is timed from this call, not from when the runtime
    /// first polls the task.
    pub fn schedule_with<F>(
        &self,
        reconciler: IndexReconciler,
        name: String,
        consider_as_alias: bool,
        on_success: F,
    ) -> RetryHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let state = Arc::new(RetryState {
            delay: self.delay,
            period: self.period,
            cancelled: AtomicBool::new(false),
            attempts: AtomicU64::new(0),
        });
        let (stop_tx, stop_rx) = watch::channel(false);
        let start = Instant::now() + self.delay;

        info!(
            index = %name,
            delay = ?self.delay,
            period = ?self.period,
            "Scheduling background index reconciliation"
        );

        let task = tokio::spawn(run_retry_loop(
            RetryTarget {
                reconciler,
                name,
                consider_as_alias,
            },
            start,
            state.clone(),
            stop_rx,
            on_success,
        ));

        RetryHandle {
            state,
            stop_tx,
            task,
        }
    }
}

struct RetryTarget {
    reconciler: IndexReconciler,
    name: String,
    consider_as_alias: bool,
}

async fn run_retry_loop<F>(
    target: RetryTarget,
    start: Instant,
    state: Arc<RetryState>,
    mut stop_rx: watch::Receiver<bool>,
    on_success: F,
) where
    F: FnOnce() + Send + 'static,
{
    let RetryTarget {
        reconciler,
        name,
        consider_as_alias,
    } = target;
    let mut ticker = interval_at(start, state.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let succeeded = loop {
        tokio::select! {
            _ = ticker.tick() => {
                state.attempts.fetch_add(1, Ordering::AcqRel);
                match reconciler.ensure_index(&name, consider_as_alias).await {
                    Ok(()) => {
                        metrics::record_retry_tick(true);
                        info!(
                            index = %name,
                            attempts = state.attempts(),
                            "Background index reconciliation succeeded"
                        );
                        break true;
                    }
                    Err(e) => {
                        metrics::record_retry_tick(false);
                        debug!(index = %name, error = %e, "Retry attempt failed, waiting for next tick");
                    }
                }
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    debug!(index = %name, "Background index reconciliation stopped");
                    break false;
                }
            }
        }
    };

    state.cancelled.store(true, Ordering::Release);
    if succeeded {
        on_success();
    }
}
