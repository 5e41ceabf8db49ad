//! Caller-triggered writes that propagate failures.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use plexus_core::logging::targets;
use plexus_core::{Scope, Signal};

use crate::state::{OperationState, Tracked};

/// Runs mutations for one scope, recording loading/error state.
///
/// Unlike [`AsyncOperation`](crate::AsyncOperation), a failure is returned
/// to the caller after it has been recorded, so call sites can branch on it.
/// A mutator never runs on its own.
///
/// ```no_run
/// use plexus_core::Scope;
/// use plexus_query::Mutator;
///
/// # async fn demo() {
/// let scope = Scope::new();
/// let mutator = Mutator::new(&scope);
///
/// match mutator.execute(async { Err::<(), _>("Title is required") }).await {
///     Ok(()) => {}
///     Err(message) => assert_eq!(mutator.error().as_deref(), Some(message)),
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct Mutator {
    state: Arc<OperationState>,
}

impl Mutator {
    pub fn new(scope: &Scope) -> Self {
        Self {
            state: Arc::new(OperationState::new(scope.guard())),
        }
    }

    /// Run `mutation`, returning its result or its original error.
    pub async fn execute<F, R, E>(&self, mutation: F) -> Result<R, E>
    where
        F: Future<Output = Result<R, E>>,
        E: fmt::Display,
    {
        match self.state.track(true, true, mutation).await {
            Tracked::Done { value, .. } => Ok(value),
            Tracked::Failed { error, message, .. } => {
                tracing::error!(
                    target: targets::MUTATION,
                    scope = self.state.scope_id(),
                    error = %message,
                    "mutation failed"
                );
                Err(error)
            }
        }
    }

    /// Clear `loading` and `error`.
    pub fn reset(&self) {
        self.state.reset();
    }

    pub fn loading(&self) -> bool {
        self.state.loading()
    }

    pub fn error(&self) -> Option<String> {
        self.state.error()
    }

    pub fn loading_changed(&self) -> &Signal<bool> {
        self.state.loading_changed()
    }

    pub fn error_changed(&self) -> &Signal<Option<String>> {
        self.state.error_changed()
    }

    pub fn state(&self) -> &OperationState {
        &self.state
    }
}

impl fmt::Debug for Mutator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutator").field("state", &*self.state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Conflict {
        version: u32,
    }

    impl fmt::Display for Conflict {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "version {} is stale", self.version)
        }
    }

    #[tokio::test]
    async fn test_failure_is_recorded_and_returned() {
        let scope = Scope::new();
        let mutator = Mutator::new(&scope);

        let result = mutator
            .execute(async { Err::<(), _>(Conflict { version: 3 }) })
            .await;

        assert_eq!(result, Err(Conflict { version: 3 }));
        assert_eq!(mutator.error().as_deref(), Some("version 3 is stale"));
        assert!(!mutator.loading());
    }

    #[tokio::test]
    async fn test_success_clears_previous_error() {
        let scope = Scope::new();
        let mutator = Mutator::new(&scope);

        let _ = mutator.execute(async { Err::<u8, _>("nope") }).await;
        assert_eq!(mutator.execute(async { Ok::<_, &str>(4u8) }).await, Ok(4));
        assert!(mutator.error().is_none());
    }

    #[tokio::test]
    async fn test_unmounted_still_returns_error() {
        let scope = Scope::new();
        let mutator = Mutator::new(&scope);
        scope.unmount();

        let result = mutator.execute(async { Err::<u8, _>("late") }).await;
        assert_eq!(result, Err("late"));
        assert!(mutator.error().is_none());
    }

    #[test]
    fn test_idle_until_called() {
        let scope = Scope::new();
        let mutator = Mutator::new(&scope);
        assert!(!mutator.loading());
        assert!(mutator.error().is_none());
    }
}
