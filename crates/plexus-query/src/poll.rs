//! Interval refetching bound to a scope's lifetime.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use plexus_core::MountGuard;
use plexus_core::logging::targets;

use crate::fetch::Fetcher;

/// A repeating task that stops when its scope unmounts, when [`stop`] is
/// called, or when the poller is dropped.
///
/// The first tick fires one full interval after start. A tick that overruns
/// the interval delays the next one rather than bursting.
///
/// [`stop`]: Poller::stop
#[derive(Debug)]
pub struct Poller {
    handle: JoinHandle<()>,
    interval: Duration,
}

impl Poller {
    /// Run `tick` every `interval` while `guard`'s scope is mounted.
    ///
    /// Fails if the scope has already unmounted. Must be called from within a
    /// tokio runtime.
    pub fn start<F, Fut>(guard: &MountGuard, interval: Duration, tick: F) -> plexus_core::Result<Self>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        // tokio panics on a zero period.
        let interval = interval.max(Duration::from_millis(1));
        let scope = guard.scope_id().get();
        let handle = guard.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tracing::trace!(target: targets::POLL, scope, "poll tick");
                let pending = tick();
                pending.await;
            }
        })?;
        tracing::debug!(target: targets::POLL, scope, ?interval, "poller started");
        Ok(Self { handle, interval })
    }

    /// Refetch `fetcher` every `interval`, skipping ticks while it is skipped.
    pub fn for_fetcher<T>(fetcher: &Fetcher<T>, interval: Duration) -> plexus_core::Result<Self>
    where
        T: Clone + Send + Sync + 'static,
    {
        let guard = fetcher.state().guard().clone();
        let fetcher = fetcher.clone();
        Self::start(&guard, interval, move || {
            let fetcher = fetcher.clone();
            async move {
                if !fetcher.is_skipped() {
                    fetcher.refetch().await;
                }
            }
        })
    }

    /// Stop polling. An in-flight tick is abandoned at its next await point.
    pub fn stop(&self) {
        self.handle.abort();
    }

    /// Whether the polling task is still alive.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
