//! Background polling for out-of-band world changes.
//!
//! The poller only produces ticks. Whoever owns the [`WorldSyncStore`]
//! decides whether a tick turns into a fetch, and feeds the fetch result
//! back through [`apply_poll`]. Poll failures never escape: they are logged
//! and the next tick proceeds on schedule.

use std::ops::ControlFlow;
use std::time::Duration;

use lorekeeper_core::error::DomainError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::sync_store::{Reconciliation, WorldSyncStore, WorldView};

/// Default polling period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// What a completed poll amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// World time moved; the held view was replaced.
    Advanced {
        /// Hours before.
        from: u64,
        /// Hours after.
        to: u64,
    },
    /// Nothing changed; the fetched view was discarded.
    Unchanged,
    /// The fetch failed and was swallowed.
    Failed,
}

impl PollOutcome {
    /// Whether the player should be told the world shifted.
    pub const fn should_notify(self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

/// Reconciles a poll's fetch result against `store`.
pub fn apply_poll(
    store: &mut WorldSyncStore,
    fetched: Result<WorldView, DomainError>,
) -> PollOutcome {
    match fetched {
        Ok(view) => match store.reconcile(view) {
            Reconciliation::Advanced { from, to } => {
                info!(from, to, "poll detected world advance");
                PollOutcome::Advanced { from, to }
            }
            Reconciliation::Initial | Reconciliation::Unchanged => PollOutcome::Unchanged,
        },
        Err(error) => {
            warn!(%error, "world poll failed");
            PollOutcome::Failed
        }
    }
}

/// Fires a callback on a fixed period until stopped.
///
/// The first tick fires one full period after [`BackgroundPoller::start`].
/// Dropping the poller stops it.
#[derive(Debug)]
pub struct BackgroundPoller {
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundPoller {
    /// Creates a stopped poller.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `period` is zero.
    pub fn new(period: Duration) -> Result<Self, DomainError> {
        if period.is_zero() {
            return Err(DomainError::Validation(
                "poll interval must be greater than zero".into(),
            ));
        }
        Ok(Self {
            period,
            handle: None,
        })
    }

    /// The polling period.
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Starts ticking, replacing any previous schedule. `on_tick` returning
    /// `ControlFlow::Break` ends the loop, e.g. when its receiver is gone.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&mut self, mut on_tick: F)
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        self.stop();
        let period = self.period;
        debug!(?period, "starting background poller");
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if on_tick().is_break() {
                    break;
                }
            }
        }));
    }

    /// Stops ticking. No callback runs after this returns.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("stopping background poller");
            handle.abort();
        }
    }

    /// Whether the poller is scheduled.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for BackgroundPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
