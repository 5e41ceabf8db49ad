//! Logging facilities for Plexus.
//!
//! Plexus uses the `tracing` crate for instrumentation. Every log line is
//! emitted with an explicit target from [`targets`], so subsystems can be
//! filtered independently:
//!
//! ```text
//! RUST_LOG=plexus_query::fetch=debug,plexus_net::graphql=trace
//! ```
//!
//! Applications usually install their own subscriber. [`init`] and
//! [`try_init`] install a plain `fmt` subscriber driven by `RUST_LOG` for
//! binaries and tests that do not care.

use tracing_subscriber::EnvFilter;

use crate::error::{CoreError, Result};

/// Target names for log filtering.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "plexus_core";
    /// Signal emission.
    pub const SIGNAL: &str = "plexus_core::signal";
    /// Scope mount/unmount.
    pub const SCOPE: &str = "plexus_core::scope";
    /// Local key/value store.
    pub const STORE: &str = "plexus_core::store";
    /// GraphQL transport.
    pub const GRAPHQL: &str = "plexus_net::graphql";
    /// Generic async operations.
    pub const OPERATION: &str = "plexus_query::operation";
    /// Fetchers and query hooks.
    pub const FETCH: &str = "plexus_query::fetch";
    /// Mutators and mutation hooks.
    pub const MUTATION: &str = "plexus_query::mutation";
    /// Polling tasks.
    pub const POLL: &str = "plexus_query::poll";
}

/// Default filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn,plexus_core=info,plexus_net=info,plexus_query=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a global `fmt` subscriber, failing if one is already set.
pub fn try_init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .try_init()
        .map_err(|e| CoreError::Logging(e.to_string()))
}

/// Install a global `fmt` subscriber, ignoring an already installed one.
pub fn init() {
    if let Err(err) = try_init() {
        tracing::debug!(target: targets::CORE, "{}", err);
    }
}

/// Install a test-writer subscriber (output captured by the test harness).
///
/// Safe to call from every test.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init();
}
