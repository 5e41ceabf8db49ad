//! Core primitives for Plexus.
//!
//! This crate provides the building blocks the data-fetching hooks are made
//! of:
//!
//! - **Signal/Slot System**: change notifications for hook state
//! - **Property System**: lock-protected values with change detection
//! - **Scopes**: component lifetimes and the mount guard
//! - **Local Store**: in-memory key/value UI state
//! - **Logging**: tracing targets and subscriber setup
//!
//! # Example
//!
//! ```
//! use plexus_core::{Property, Scope, Signal};
//!
//! let scope = Scope::new();
//! let guard = scope.guard();
//!
//! let title = Property::new(String::new());
//! let title_changed = Signal::<String>::new();
//!
//! if guard.is_mounted() && title.set("Feed".to_string()) {
//!     title_changed.emit(title.get());
//! }
//! ```

mod error;
pub mod logging;
pub mod property;
pub mod scope;
pub mod signal;
pub mod store;

pub use error::{CoreError, Result};
pub use property::Property;
pub use scope::{MountGuard, Scope, ScopeId};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use store::LocalStore;
