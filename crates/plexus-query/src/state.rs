//! Shared `loading`/`error` state for every hook.

use std::fmt;
use std::future::Future;

use plexus_core::logging::targets;
use plexus_core::{MountGuard, Property, Signal};

use crate::policy::error_message;

/// Loading and error state of one hook, gated by its scope's mount guard.
///
/// Writes made after the owning scope unmounts are dropped, so a request that
/// completes late never touches a torn-down view.
pub struct OperationState {
    guard: MountGuard,
    loading: Property<bool>,
    error: Property<Option<String>>,
    loading_changed: Signal<bool>,
    error_changed: Signal<Option<String>>,
}

/// How a tracked future settled.
pub(crate) enum Tracked<R, E> {
    Done {
        value: R,
        applied: bool,
    },
    Failed {
        error: E,
        message: String,
        applied: bool,
    },
}

impl OperationState {
    /// Idle state bound to `guard`.
    pub fn new(guard: MountGuard) -> Self {
        Self {
            guard,
            loading: Property::new(false),
            error: Property::new(None),
            loading_changed: Signal::new(),
            error_changed: Signal::new(),
        }
    }

    /// Whether an execution that toggles loading is outstanding.
    pub fn loading(&self) -> bool {
        self.loading.get()
    }

    /// Message of the most recent failure.
    pub fn error(&self) -> Option<String> {
        self.error.get()
    }

    /// Whether the owning scope is still mounted.
    pub fn is_mounted(&self) -> bool {
        self.guard.is_mounted()
    }

    /// The owning scope's mount guard.
    pub fn guard(&self) -> &MountGuard {
        &self.guard
    }

    /// Emitted with the new value whenever `loading` changes.
    pub fn loading_changed(&self) -> &Signal<bool> {
        &self.loading_changed
    }

    /// Emitted with the new value whenever `error` changes.
    pub fn error_changed(&self) -> &Signal<Option<String>> {
        &self.error_changed
    }

    /// Clear `loading` and `error`.
    pub fn reset(&self) {
        self.write_loading(false);
        self.write_error(None);
    }

    pub(crate) fn scope_id(&self) -> u64 {
        self.guard.scope_id().get()
    }

    /// Mark an execution as started.
    pub(crate) fn begin(&self, clear_error: bool, show_loading: bool) {
        if !self.writable() {
            return;
        }
        if clear_error {
            self.write_error(None);
        }
        if show_loading {
            self.write_loading(true);
        }
    }

    /// Mark an execution as finished, recording `error` if it failed.
    ///
    /// Returns `false` when the write was suppressed by the mount guard.
    pub(crate) fn settle(&self, error: Option<String>, show_loading: bool) -> bool {
        if !self.writable() {
            return false;
        }
        if let Some(message) = error {
            self.write_error(Some(message));
        }
        if show_loading {
            self.write_loading(false);
        }
        true
    }

    /// Run `operation` between [`begin`](Self::begin) and
    /// [`settle`](Self::settle).
    pub(crate) async fn track<F, R, E>(
        &self,
        clear_error: bool,
        show_loading: bool,
        operation: F,
    ) -> Tracked<R, E>
    where
        F: Future<Output = Result<R, E>>,
        E: fmt::Display,
    {
        self.begin(clear_error, show_loading);
        match operation.await {
            Ok(value) => {
                let applied = self.settle(None, show_loading);
                Tracked::Done { value, applied }
            }
            Err(error) => {
                let message = error_message(&error);
                let applied = self.settle(Some(message.clone()), show_loading);
                Tracked::Failed {
                    error,
                    message,
                    applied,
                }
            }
        }
    }

    fn writable(&self) -> bool {
        let mounted = self.guard.is_mounted();
        if !mounted {
            tracing::trace!(
                target: targets::OPERATION,
                scope = self.scope_id(),
                "state write suppressed after unmount"
            );
        }
        mounted
    }

    fn write_loading(&self, loading: bool) {
        if self.loading.set(loading) {
            self.loading_changed.emit(loading);
        }
    }

    fn write_error(&self, error: Option<String>) {
        if self.error.set(error.clone()) {
            self.error_changed.emit(error);
        }
    }
}

impl fmt::Debug for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationState")
            .field("scope", &self.scope_id())
            .field("loading", &self.loading())
            .field("error", &self.error())
            .finish()
    }
}
