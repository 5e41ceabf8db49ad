//! Single async operations with loading/error tracking.
//!
//! [`AsyncOperation`] is the building block underneath every hook: it wraps a
//! future, flips `loading` around it, records a failure message, and drops
//! all state writes once the owning [`Scope`] unmounts.
//!
//! # Example
//!
//! ```no_run
//! use plexus_core::Scope;
//! use plexus_query::{AsyncOperation, AsyncOptions};
//!
//! # async fn demo() {
//! let scope = Scope::new();
//! let save = AsyncOperation::<u32>::new(
//!     &scope,
//!     AsyncOptions::new().on_success(|id| println!("saved {id}")),
//! );
//!
//! let id = save.execute(async { Ok::<_, std::io::Error>(7) }).await;
//! assert_eq!(id, Some(7));
//! assert!(!save.loading());
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use plexus_core::logging::targets;
use plexus_core::{MountGuard, Scope, Signal};

use crate::policy::{ErrorPolicy, ExecuteOptions};
use crate::state::{OperationState, Tracked};

pub(crate) type SuccessCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;
pub(crate) type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Options fixed when an [`AsyncOperation`] is created.
pub struct AsyncOptions<R> {
    /// Clear the previous error when a new execution starts. Defaults to `true`.
    pub reset_error_on_execute: bool,
    on_success: Option<SuccessCallback<R>>,
    on_error: Option<ErrorCallback>,
}

impl<R> Default for AsyncOptions<R> {
    fn default() -> Self {
        Self {
            reset_error_on_execute: true,
            on_success: None,
            on_error: None,
        }
    }
}

impl<R> AsyncOptions<R> {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether a new execution clears the previous error.
    pub fn reset_error_on_execute(mut self, reset: bool) -> Self {
        self.reset_error_on_execute = reset;
        self
    }

    /// Called with the result of each successful execution while mounted.
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&R) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    /// Called with the error message of each failed execution while mounted.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }
}

impl<R> fmt::Debug for AsyncOptions<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncOptions")
            .field("reset_error_on_execute", &self.reset_error_on_execute)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

struct AsyncOperationInner<R> {
    state: OperationState,
    options: AsyncOptions<R>,
}

/// Executes async operations on behalf of one scope.
///
/// Cloning yields another handle to the same state. Concurrent executions are
/// allowed; the last one to settle determines the final state.
pub struct AsyncOperation<R> {
    inner: Arc<AsyncOperationInner<R>>,
}

impl<R> Clone for AsyncOperation<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R> AsyncOperation<R> {
    /// Create an idle operation owned by `scope`.
    pub fn new(scope: &Scope, options: AsyncOptions<R>) -> Self {
        Self::with_guard(scope.guard(), options)
    }

    /// Create an idle operation bound to an existing mount guard.
    pub fn with_guard(guard: MountGuard, options: AsyncOptions<R>) -> Self {
        Self {
            inner: Arc::new(AsyncOperationInner {
                state: OperationState::new(guard),
                options,
            }),
        }
    }

    /// Run `operation`, capturing any failure.
    ///
    /// Returns the result on success, even if the scope unmounted in the
    /// meantime, and `None` on failure.
    pub async fn execute<F, E>(&self, operation: F) -> Option<R>
    where
        F: Future<Output = Result<R, E>>,
        E: fmt::Display,
    {
        self.execute_with(operation, ExecuteOptions::default())
            .await
            .ok()
            .flatten()
    }

    /// Run `operation` with per-call options.
    ///
    /// With [`ErrorPolicy::Capture`] failures yield `Ok(None)`; with
    /// [`ErrorPolicy::Propagate`] the original error is returned after it has
    /// been recorded.
    pub async fn execute_with<F, E>(
        &self,
        operation: F,
        options: ExecuteOptions,
    ) -> Result<Option<R>, E>
    where
        F: Future<Output = Result<R, E>>,
        E: fmt::Display,
    {
        self.execute_observed(operation, options, itself).await
    }

    /// Run `operation` whose output carries the callback payload alongside
    /// the caller's result.
    ///
    /// `observed` picks the `R` handed to `on_success` out of the output, so
    /// a caller can post-process inside `operation` and still have exactly
    /// one outcome per call.
    pub(crate) async fn execute_observed<F, O, E, P>(
        &self,
        operation: F,
        options: ExecuteOptions,
        observed: P,
    ) -> Result<Option<O>, E>
    where
        F: Future<Output = Result<O, E>>,
        E: fmt::Display,
        P: FnOnce(&O) -> &R,
    {
        let inner = &*self.inner;
        let tracked = inner
            .state
            .track(
                inner.options.reset_error_on_execute,
                options.show_loading,
                operation,
            )
            .await;

        match tracked {
            Tracked::Done { value, applied } => {
                if applied && let Some(on_success) = &inner.options.on_success {
                    on_success(observed(&value));
                }
                Ok(Some(value))
            }
            Tracked::Failed {
                error,
                message,
                applied,
            } => {
                tracing::error!(
                    target: targets::OPERATION,
                    scope = inner.state.scope_id(),
                    error = %message,
                    "async operation failed"
                );
                if applied && let Some(on_error) = &inner.options.on_error {
                    on_error(&message);
                }
                match options.policy {
                    ErrorPolicy::Capture => Ok(None),
                    ErrorPolicy::Propagate => Err(error),
                }
            }
        }
    }

    /// Record a failure detected outside the wrapped future.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(
            target: targets::OPERATION,
            scope = self.inner.state.scope_id(),
            error = %message,
            "async operation failed"
        );
        if self.inner.state.settle(Some(message.clone()), false)
            && let Some(on_error) = &self.inner.options.on_error
        {
            on_error(&message);
        }
    }

    /// Clear `loading` and `error`.
    pub fn reset(&self) {
        self.inner.state.reset();
    }

    pub fn loading(&self) -> bool {
        self.inner.state.loading()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.error()
    }

    pub fn loading_changed(&self) -> &Signal<bool> {
        self.inner.state.loading_changed()
    }

    pub fn error_changed(&self) -> &Signal<Option<String>> {
        self.inner.state.error_changed()
    }

    /// The underlying state.
    pub fn state(&self) -> &OperationState {
        &self.inner.state
    }
}

fn itself<T>(value: &T) -> &T {
    value
}

impl<R> fmt::Debug for AsyncOperation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncOperation")
            .field("state", &self.inner.state)
            .field("options", &self.inner.options)
            .finish()
    }
}
