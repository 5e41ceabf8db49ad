//! Authentication collaborators.
//!
//! The transport never reads ambient storage. A [`TokenSource`] is injected
//! at client construction and consulted on every request, so a login or
//! logout that rewrites the stored token takes effect on the next call.
//!
//! [`AuthState`] is the snapshot views use to gate queries: a query that
//! needs a session should be skipped until `is_ready()` holds.
//!
//! ```
//! use plexus_core::LocalStore;
//! use plexus_net::auth::{AuthState, StoreToken, TokenSource};
//!
//! let store = LocalStore::new();
//! let source = StoreToken::new(store.clone());
//! assert_eq!(source.token(), None);
//!
//! store.set("token", "abc");
//! assert_eq!(source.token().as_deref(), Some("abc"));
//!
//! let auth = AuthState::resolved(true);
//! assert!(auth.is_ready());
//! ```

use plexus_core::LocalStore;

/// Store key the session token is kept under by default.
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// Supplies the bearer token attached to outgoing requests.
pub trait TokenSource: Send + Sync {
    /// The current token, or `None` when no session exists.
    fn token(&self) -> Option<String>;
}

impl<F> TokenSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// A fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.clone())
        }
    }
}

/// Reads the token from a [`LocalStore`] entry on every request.
#[derive(Debug, Clone)]
pub struct StoreToken {
    store: LocalStore,
    key: String,
}

impl StoreToken {
    /// Read the token from [`DEFAULT_TOKEN_KEY`].
    pub fn new(store: LocalStore) -> Self {
        Self::with_key(store, DEFAULT_TOKEN_KEY)
    }

    /// Read the token from a custom key.
    pub fn with_key(store: LocalStore, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

impl TokenSource for StoreToken {
    fn token(&self) -> Option<String> {
        self.store.get(&self.key).filter(|t| !t.is_empty())
    }
}

/// Snapshot of the auth provider's state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthState {
    /// A user session exists.
    pub is_authenticated: bool,
    /// The provider is still resolving the session.
    pub auth_loading: bool,
}

impl AuthState {
    /// Session resolution in progress.
    pub fn loading() -> Self {
        Self {
            is_authenticated: false,
            auth_loading: true,
        }
    }

    /// Session resolved.
    pub fn resolved(is_authenticated: bool) -> Self {
        Self {
            is_authenticated,
            auth_loading: false,
        }
    }

    /// Authenticated and done loading.
    pub fn is_ready(&self) -> bool {
        self.is_authenticated && !self.auth_loading
    }

    /// Convenience for `skip` options: `true` while queries must not fire.
    pub fn should_skip(&self) -> bool {
        !self.is_ready()
    }
}
