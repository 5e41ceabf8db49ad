//! Component lifetimes.
//!
//! A [`Scope`] stands for one mounted view instance. Hooks created against a
//! scope hold a [`MountGuard`] and check it before every state write, so a
//! request that completes after the view is torn down cannot touch its state.
//! Unmounting never aborts in-flight requests; it only suppresses their
//! writes. Tasks started with [`Scope::spawn`] (pollers, for instance) are
//! stopped at their next await point once the scope unmounts.
//!
//! # Example
//!
//! ```
//! use plexus_core::Scope;
//!
//! let scope = Scope::new();
//! let guard = scope.guard();
//! assert!(guard.is_mounted());
//!
//! drop(scope);
//! assert!(!guard.is_mounted());
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::error::{CoreError, Result};
use crate::logging::targets;

/// Unique identifier for a scope, used in log output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct ScopeState {
    id: ScopeId,
    mounted: AtomicBool,
    notify: Notify,
}

/// A liveness flag shared between a scope and the hooks it owns.
#[derive(Debug, Clone)]
pub struct MountGuard {
    state: Arc<ScopeState>,
}

impl MountGuard {
    /// `true` from scope creation until it unmounts.
    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.state.mounted.load(Ordering::Acquire)
    }

    /// The id of the owning scope.
    pub fn scope_id(&self) -> ScopeId {
        self.state.id
    }

    /// Wait until the owning scope unmounts.
    ///
    /// Returns immediately if it already has.
    pub async fn unmounted(&self) {
        loop {
            let notified = self.state.notify.notified();
            if !self.is_mounted() {
                return;
            }
            notified.await;
        }
    }

    /// Spawn a task on the current tokio runtime that runs until it finishes
    /// or the owning scope unmounts, whichever comes first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&self, future: F) -> Result<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.is_mounted() {
            return Err(CoreError::ScopeUnmounted(self.scope_id().get()));
        }
        let guard = self.clone();
        Ok(tokio::spawn(async move {
            tokio::select! {
                _ = future => {}
                _ = guard.unmounted() => {
                    tracing::trace!(target: targets::SCOPE, scope = guard.scope_id().get(), "scoped task stopped");
                }
            }
        }))
    }
}

/// A mounted view instance.
///
/// Dropping the scope unmounts it.
#[derive(Debug)]
pub struct Scope {
    guard: MountGuard,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// Create a new, mounted scope.
    pub fn new() -> Self {
        let id = ScopeId::next();
        tracing::trace!(target: targets::SCOPE, scope = id.get(), "scope mounted");
        Self {
            guard: MountGuard {
                state: Arc::new(ScopeState {
                    id,
                    mounted: AtomicBool::new(true),
                    notify: Notify::new(),
                }),
            },
        }
    }

    /// The scope's id.
    pub fn id(&self) -> ScopeId {
        self.guard.scope_id()
    }

    /// A new handle to this scope's mount guard.
    pub fn guard(&self) -> MountGuard {
        self.guard.clone()
    }

    /// Whether the scope is still mounted.
    pub fn is_mounted(&self) -> bool {
        self.guard.is_mounted()
    }

    /// Unmount the scope.
    ///
    /// Idempotent. Wakes every task waiting in [`MountGuard::unmounted`].
    pub fn unmount(&self) {
        if self.guard.state.mounted.swap(false, Ordering::AcqRel) {
            tracing::trace!(target: targets::SCOPE, scope = self.id().get(), "scope unmounted");
            self.guard.state.notify.notify_waiters();
        }
    }

    /// Spawn a task bound to this scope. See [`MountGuard::spawn`].
    pub fn spawn<F>(&self, future: F) -> Result<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.guard.spawn(future)
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.unmount();
    }
}
