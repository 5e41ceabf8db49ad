//! Data fetching with auto-fetch on activation.
//!
//! A [`Fetcher`] owns a `data` value produced by a fetch closure. Calling
//! [`Fetcher::activate`] plays the role of a mount/re-render effect: the first
//! call starts one automatic fetch (unless `auto_fetch` is off or `skip` is
//! set) and later calls do nothing until the has-fetched guard is re-armed by
//! [`Fetcher::set_skip`] or [`Fetcher::rearm`]. [`Fetcher::refetch`] always
//! fetches.
//!
//! # Example
//!
//! ```no_run
//! use plexus_core::Scope;
//! use plexus_query::{FetchOptions, Fetcher};
//!
//! # async fn demo() {
//! let scope = Scope::new();
//! let fetcher = Fetcher::new(
//!     &scope,
//!     || async { Ok::<_, std::io::Error>(vec![1, 2, 3]) },
//!     FetchOptions::with_transform(|raw: Vec<u32>| raw.len()).initial_data(0),
//! );
//!
//! if let Some(handle) = fetcher.activate() {
//!     handle.await.ok();
//! }
//! assert_eq!(fetcher.data(), Some(3));
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use plexus_core::logging::targets;
use plexus_core::{Property, Scope, Signal};

use crate::async_operation::{ErrorCallback, SuccessCallback};
use crate::options::FetchOptions;
use crate::poll::Poller;
use crate::policy::error_message;
use crate::state::OperationState;

type FetchFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, String>> + Send + Sync>;

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Auto,
    Manual,
}

impl Trigger {
    fn as_str(self) -> &'static str {
        match self {
            Trigger::Auto => "auto",
            Trigger::Manual => "refetch",
        }
    }
}

struct FetcherInner<T> {
    state: OperationState,
    data: Property<Option<T>>,
    data_changed: Signal<Option<T>>,
    fetch_fn: FetchFn<T>,
    initial_data: Option<T>,
    auto_fetch: bool,
    skip: AtomicBool,
    has_fetched: AtomicBool,
    discard_stale: bool,
    generation: AtomicU64,
    poll_interval: Option<std::time::Duration>,
    poller: Mutex<Option<Poller>>,
    on_success: Option<SuccessCallback<T>>,
    on_error: Option<ErrorCallback>,
}

/// Fetches and holds a value of type `T` for one scope.
///
/// Cloning yields another handle to the same state.
pub struct Fetcher<T> {
    inner: Arc<FetcherInner<T>>,
}

impl<T> Clone for Fetcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Fetcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a fetcher owned by `scope`.
    ///
    /// Nothing is fetched until [`activate`](Self::activate) or
    /// [`refetch`](Self::refetch) is called. The options' transform is applied
    /// to every successful result before it is stored.
    pub fn new<R, E, F, Fut>(scope: &Scope, fetch_fn: F, options: FetchOptions<R, T>) -> Self
    where
        R: 'static,
        E: fmt::Display + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let transform = options.transform;
        let fetch_fn: FetchFn<T> = Arc::new(move || {
            let pending = fetch_fn();
            let transform = transform.clone();
            async move {
                match pending.await {
                    Ok(raw) => Ok(transform(raw)),
                    Err(err) => Err(error_message(&err)),
                }
            }
            .boxed()
        });

        Self {
            inner: Arc::new(FetcherInner {
                state: OperationState::new(scope.guard()),
                data: Property::new(options.initial_data.clone()),
                data_changed: Signal::new(),
                fetch_fn,
                initial_data: options.initial_data,
                auto_fetch: options.auto_fetch,
                skip: AtomicBool::new(options.skip),
                has_fetched: AtomicBool::new(false),
                discard_stale: options.discard_stale,
                generation: AtomicU64::new(0),
                poll_interval: options.poll_interval,
                poller: Mutex::new(None),
                on_success: options.on_success,
                on_error: options.on_error,
            }),
        }
    }

    /// Run the mount effect.
    ///
    /// Starts the configured poller on first use, then spawns one automatic
    /// fetch if `auto_fetch` is on, `skip` is off and no automatic fetch has
    /// run since the guard was last armed. Returns the fetch task when one
    /// was started. Must be called from within a tokio runtime.
    pub fn activate(&self) -> Option<JoinHandle<Option<T>>> {
        let inner = &*self.inner;
        if !inner.state.is_mounted() {
            return None;
        }
        self.ensure_polling();

        if !inner.auto_fetch || inner.skip.load(Ordering::Acquire) {
            return None;
        }
        if inner.has_fetched.swap(true, Ordering::AcqRel) {
            return None;
        }

        let this = self.clone();
        Some(tokio::spawn(async move { this.run(Trigger::Auto).await }))
    }

    /// Fetch now, regardless of `skip` and `auto_fetch`.
    ///
    /// Returns the transformed data on success.
    pub async fn refetch(&self) -> Option<T> {
        self.run(Trigger::Manual).await
    }

    /// Update `skip` and re-run the mount effect.
    ///
    /// Setting `skip` re-arms the has-fetched guard, so clearing it later
    /// starts exactly one automatic fetch.
    pub fn set_skip(&self, skip: bool) -> Option<JoinHandle<Option<T>>> {
        self.inner.skip.store(skip, Ordering::Release);
        if skip {
            self.rearm();
            None
        } else {
            self.activate()
        }
    }

    /// Re-arm the has-fetched guard so the next [`activate`](Self::activate)
    /// fetches again.
    pub fn rearm(&self) {
        self.inner.has_fetched.store(false, Ordering::Release);
    }

    /// Replace the stored data.
    pub fn set_data(&self, data: T) {
        self.store(Some(data));
    }

    /// Replace the stored data with the result of `f`.
    pub fn update_data<F>(&self, f: F)
    where
        F: FnOnce(Option<T>) -> Option<T>,
    {
        if !self.inner.state.is_mounted() {
            return;
        }
        let next = self.inner.data.update(f);
        self.inner.data_changed.emit(next);
    }

    /// Clear `loading` and `error`, and restore the initial data.
    pub fn reset(&self) {
        self.inner.state.reset();
        self.store(self.inner.initial_data.clone());
    }

    /// Start refetching every `interval` until the scope unmounts or
    /// [`stop_polling`](Self::stop_polling) is called.
    ///
    /// Replaces any running poller. Ticks are skipped while `skip` is set.
    pub fn start_polling(&self, interval: std::time::Duration) -> plexus_core::Result<()> {
        let poller = Poller::for_fetcher(self, interval)?;
        *self.inner.poller.lock() = Some(poller);
        Ok(())
    }

    /// Stop the running poller, if any.
    pub fn stop_polling(&self) {
        if let Some(poller) = self.inner.poller.lock().take() {
            poller.stop();
        }
    }

    /// Whether a poller is running.
    pub fn is_polling(&self) -> bool {
        self.inner
            .poller
            .lock()
            .as_ref()
            .is_some_and(Poller::is_running)
    }

    pub fn data(&self) -> Option<T> {
        self.inner.data.get()
    }

    /// Read the data without cloning it.
    pub fn with_data<F, U>(&self, f: F) -> U
    where
        F: FnOnce(Option<&T>) -> U,
    {
        self.inner.data.with(|data| f(data.as_ref()))
    }

    pub fn loading(&self) -> bool {
        self.inner.state.loading()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.error()
    }

    /// Whether `skip` is set.
    pub fn is_skipped(&self) -> bool {
        self.inner.skip.load(Ordering::Acquire)
    }

    /// Whether an automatic fetch has run since the guard was last armed.
    pub fn has_fetched(&self) -> bool {
        self.inner.has_fetched.load(Ordering::Acquire)
    }

    pub fn data_changed(&self) -> &Signal<Option<T>> {
        &self.inner.data_changed
    }

    pub fn loading_changed(&self) -> &Signal<bool> {
        self.inner.state.loading_changed()
    }

    pub fn error_changed(&self) -> &Signal<Option<String>> {
        self.inner.state.error_changed()
    }

    /// The underlying loading/error state.
    pub fn state(&self) -> &OperationState {
        &self.inner.state
    }

    async fn run(&self, trigger: Trigger) -> Option<T> {
        let inner = &*self.inner;
        let generation = inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(
            target: targets::FETCH,
            scope = inner.state.scope_id(),
            generation,
            trigger = trigger.as_str(),
            "fetch started"
        );

        inner.state.begin(true, true);
        let outcome = (inner.fetch_fn)().await;

        let stale =
            inner.discard_stale && inner.generation.load(Ordering::Acquire) != generation;

        match outcome {
            Ok(data) => {
                if stale {
                    tracing::debug!(
                        target: targets::FETCH,
                        scope = inner.state.scope_id(),
                        generation,
                        "stale fetch result discarded"
                    );
                    return Some(data);
                }
                self.store(Some(data.clone()));
                if inner.state.settle(None, true)
                    && let Some(on_success) = &inner.on_success
                {
                    on_success(&data);
                }
                Some(data)
            }
            Err(message) => {
                tracing::error!(
                    target: targets::FETCH,
                    scope = inner.state.scope_id(),
                    generation,
                    error = %message,
                    "fetch failed"
                );
                if !stale
                    && inner.state.settle(Some(message.clone()), true)
                    && let Some(on_error) = &inner.on_error
                {
                    on_error(&message);
                }
                None
            }
        }
    }

    fn store(&self, data: Option<T>) {
        if !self.inner.state.is_mounted() {
            return;
        }
        self.inner.data.set_silent(data.clone());
        self.inner.data_changed.emit(data);
    }

    fn ensure_polling(&self) {
        let Some(interval) = self.inner.poll_interval else {
            return;
        };
        if self.inner.poller.lock().is_some() {
            return;
        }
        if let Err(err) = self.start_polling(interval) {
            tracing::debug!(target: targets::POLL, error = %err, "poller not started");
        }
    }
}

impl<T: fmt::Debug + Clone> fmt::Debug for Fetcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("state", &self.inner.state)
            .field("data", &self.inner.data.get())
            .field("skip", &self.inner.skip.load(Ordering::Relaxed))
            .field("has_fetched", &self.inner.has_fetched.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn counting_fetcher(
        scope: &Scope,
        options: FetchOptions<u32>,
    ) -> (Fetcher<u32>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let fetcher = Fetcher::new(
            scope,
            move || {
                let n = calls_clone.fetch_add(1, Ordering::SeqCst) as u32;
                async move { Ok::<_, String>(n + 1) }
            },
            options,
        );
        (fetcher, calls)
    }

    #[tokio::test]
    async fn test_initial_state_without_auto_fetch() {
        let scope = Scope::new();
        let (fetcher, calls) =
            counting_fetcher(&scope, FetchOptions::new().auto_fetch(false).initial_data(42));

        assert!(fetcher.activate().is_none());
        assert!(!fetcher.loading());
        assert!(fetcher.error().is_none());
        assert_eq!(fetcher.data(), Some(42));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_activate_fetches_once() {
        let scope = Scope::new();
        let (fetcher, calls) = counting_fetcher(&scope, FetchOptions::new());

        let handle = fetcher.activate().expect("first activation fetches");
        assert_eq!(handle.await.unwrap(), Some(1));
        assert!(fetcher.activate().is_none());
        assert!(fetcher.activate().is_none());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.data(), Some(1));
        assert!(fetcher.has_fetched());
    }

    #[tokio::test]
    async fn test_skip_then_unskip_fetches_exactly_once() {
        let scope = Scope::new();
        let (fetcher, calls) = counting_fetcher(&scope, FetchOptions::new().skip(true));

        assert!(fetcher.activate().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let handle = fetcher.set_skip(false).expect("unskip fetches");
        handle.await.unwrap();
        assert!(fetcher.activate().is_none());
        assert!(fetcher.set_skip(false).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Skipping again re-arms the guard.
        assert!(fetcher.set_skip(true).is_none());
        fetcher.set_skip(false).unwrap().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refetch_ignores_skip_and_auto_fetch() {
        let scope = Scope::new();
        let (fetcher, calls) =
            counting_fetcher(&scope, FetchOptions::new().skip(true).auto_fetch(false));

        assert_eq!(fetcher.refetch().await, Some(1));
        assert_eq!(fetcher.refetch().await, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transform_applied_to_every_fetch() {
        #[derive(Clone)]
        struct Raw {
            items: Vec<u32>,
        }

        let scope = Scope::new();
        let fetcher = Fetcher::new(
            &scope,
            || async { Ok::<_, String>(Raw { items: vec![3, 1, 2] }) },
            FetchOptions::with_transform(|raw: Raw| raw.items.iter().sum::<u32>())
                .auto_fetch(false),
        );

        assert_eq!(fetcher.refetch().await, Some(6));
        assert_eq!(fetcher.data(), Some(6));
        assert_eq!(fetcher.refetch().await, Some(6));
        assert_eq!(fetcher.data(), Some(6));
    }

    #[tokio::test]
    async fn test_failure_keeps_data() {
        let scope = Scope::new();
        let fail = Arc::new(AtomicBool::new(false));
        let errors = Arc::new(Mutex::new(Vec::new()));

        let fail_clone = fail.clone();
        let errors_clone = errors.clone();
        let fetcher = Fetcher::new(
            &scope,
            move || {
                let fail = fail_clone.load(Ordering::SeqCst);
                async move {
                    if fail {
                        Err("Server unavailable".to_string())
                    } else {
                        Ok(10u32)
                    }
                }
            },
            FetchOptions::new()
                .auto_fetch(false)
                .on_error(move |m| errors_clone.lock().push(m.to_string())),
        );

        fetcher.refetch().await;
        fail.store(true, Ordering::SeqCst);
        assert_eq!(fetcher.refetch().await, None);

        assert_eq!(fetcher.error().as_deref(), Some("Server unavailable"));
        assert!(!fetcher.loading());
        assert_eq!(fetcher.data(), Some(10));
        assert_eq!(*errors.lock(), vec!["Server unavailable".to_string()]);

        // The next fetch clears the error.
        fail.store(false, Ordering::SeqCst);
        fetcher.refetch().await;
        assert!(fetcher.error().is_none());
    }

    #[tokio::test]
    async fn test_unmount_before_completion() {
        let scope = Scope::new();
        let fetcher = Fetcher::new(
            &scope,
            || async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, String>(7u32)
            },
            FetchOptions::new(),
        );

        let handle = fetcher.activate().unwrap();
        scope.unmount();

        // The request still completes; only the writes are dropped.
        assert_eq!(handle.await.unwrap(), Some(7));
        assert_eq!(fetcher.data(), None);
        assert!(fetcher.error().is_none());
        assert!(fetcher.activate().is_none());
    }

    #[tokio::test]
    async fn test_set_update_and_reset_data() {
        let scope = Scope::new();
        let (fetcher, _) =
            counting_fetcher(&scope, FetchOptions::new().auto_fetch(false).initial_data(0));

        let changes = Arc::new(Mutex::new(Vec::new()));
        let changes_clone = changes.clone();
        fetcher.data_changed().connect(move |data: &Option<u32>| {
            changes_clone.lock().push(*data);
        });

        fetcher.set_data(5);
        fetcher.update_data(|d| d.map(|n| n * 2));
        assert_eq!(fetcher.data(), Some(10));

        fetcher.reset();
        assert_eq!(fetcher.data(), Some(0));
        assert_eq!(*changes.lock(), vec![Some(5), Some(10), Some(0)]);
    }

    #[tokio::test]
    async fn test_last_completion_wins_by_default() {
        let (first, second) = race(false).await;
        assert_eq!(first, Some("old"));
        assert_eq!(second, Some("old"));
    }

    #[tokio::test]
    async fn test_discard_stale_keeps_newest() {
        let (first, second) = race(true).await;
        assert_eq!(first, Some("old"));
        assert_eq!(second, Some("new"));
    }

    /// Start a slow fetch, then a fast one. Returns the slow fetch's result
    /// and the data stored once both have settled.
    async fn race(discard_stale: bool) -> (Option<&'static str>, Option<&'static str>) {
        let scope = Scope::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let fetcher = Fetcher::new(
            &scope,
            move || {
                let n = calls_clone.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok::<_, String>("old")
                    } else {
                        Ok("new")
                    }
                }
            },
            FetchOptions::new()
                .auto_fetch(false)
                .discard_stale(discard_stale),
        );

        let slow = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.refetch().await })
        };
        while calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(fetcher.refetch().await, Some("new"));
        let first = slow.await.unwrap();
        (first, fetcher.data())
    }
}
