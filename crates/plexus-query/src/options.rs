//! Configuration for [`Fetcher`](crate::Fetcher) and the hooks built on it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::async_operation::{ErrorCallback, SuccessCallback};

pub(crate) type Transform<R, T> = Arc<dyn Fn(R) -> T + Send + Sync>;

/// Options for a fetcher whose fetch yields `R` and whose stored data is `T`.
///
/// `T` defaults to `R`; use [`FetchOptions::with_transform`] to reshape the
/// raw result before it is stored.
///
/// ```
/// use plexus_query::FetchOptions;
///
/// struct Page { items: Vec<u32>, cursor: Option<String> }
///
/// let options = FetchOptions::with_transform(|page: Page| page.items)
///     .initial_data(Vec::new())
///     .auto_fetch(false);
/// assert!(!options.auto_fetch);
/// ```
pub struct FetchOptions<R, T = R> {
    /// Fetch automatically on activation. Defaults to `true`.
    pub auto_fetch: bool,
    /// Suppress automatic fetching. Defaults to `false`.
    pub skip: bool,
    /// Data before the first successful fetch and after [`reset`](crate::Fetcher::reset).
    pub initial_data: Option<T>,
    /// Drop completions of fetches superseded by a newer one. Defaults to `false`.
    pub discard_stale: bool,
    /// Refetch on a fixed interval while the scope is mounted.
    pub poll_interval: Option<Duration>,
    pub(crate) transform: Transform<R, T>,
    pub(crate) on_success: Option<SuccessCallback<T>>,
    pub(crate) on_error: Option<ErrorCallback>,
}

impl<T: 'static> FetchOptions<T, T> {
    /// Default options, storing the fetch result unchanged.
    pub fn new() -> Self {
        Self::with_transform(|value| value)
    }
}

impl<T: 'static> Default for FetchOptions<T, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, T> FetchOptions<R, T> {
    /// Default options with a transform applied to every successful fetch.
    pub fn with_transform<F>(transform: F) -> Self
    where
        F: Fn(R) -> T + Send + Sync + 'static,
    {
        Self {
            auto_fetch: true,
            skip: false,
            initial_data: None,
            discard_stale: false,
            poll_interval: None,
            transform: Arc::new(transform),
            on_success: None,
            on_error: None,
        }
    }

    pub fn auto_fetch(mut self, auto_fetch: bool) -> Self {
        self.auto_fetch = auto_fetch;
        self
    }

    pub fn skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn initial_data(mut self, data: T) -> Self {
        self.initial_data = Some(data);
        self
    }

    pub fn discard_stale(mut self, discard: bool) -> Self {
        self.discard_stale = discard;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Called with the transformed data after each successful fetch.
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    /// Called with the error message after each failed fetch.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }
}

impl<R, T: fmt::Debug> fmt::Debug for FetchOptions<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("auto_fetch", &self.auto_fetch)
            .field("skip", &self.skip)
            .field("initial_data", &self.initial_data)
            .field("discard_stale", &self.discard_stale)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}
