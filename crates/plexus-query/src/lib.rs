//! Data-fetching hooks for Plexus.
//!
//! Every view that talks to the backend does so through one of these hooks.
//! Each hook owns `loading`/`error` (and, for fetchers, `data`) state paired
//! with change signals, and is bound to a [`Scope`](plexus_core::Scope) so
//! that requests finishing after the view unmounts leave its state alone.
//!
//! - [`AsyncOperation`]: wraps one async call, capturing failures
//! - [`Fetcher`]: holds fetched data with auto-fetch, skip, transform and
//!   refetch
//! - [`Mutator`]: caller-triggered writes that return their errors
//! - [`QueryHook`] / [`MutationHook`]: the above wired to a
//!   [`GraphQLClient`](plexus_net::GraphQLClient)
//! - [`Poller`]: interval refetching that stops on unmount
//!
//! # Example
//!
//! ```ignore
//! use plexus_core::Scope;
//! use plexus_query::{FetchOptions, QueryHook};
//!
//! let scope = Scope::new();
//! let feed = QueryHook::for_operation::<GetFeed>(
//!     &scope,
//!     &client,
//!     &NoVariables,
//!     FetchOptions::with_transform(|d: FeedData| d.feed)
//!         .initial_data(Vec::new())
//!         .skip(auth.should_skip()),
//! )?;
//!
//! feed.loading_changed().connect(|_| schedule_render());
//! feed.activate();
//! ```

mod async_operation;
mod fetch;
mod mutation;
mod mutation_query;
mod options;
mod poll;
pub mod policy;
mod query;
mod state;

pub use async_operation::{AsyncOperation, AsyncOptions};
pub use fetch::Fetcher;
pub use mutation::Mutator;
pub use mutation_query::{MutationHook, MutationOptions, NO_DOCUMENT_BOUND};
pub use options::FetchOptions;
pub use poll::Poller;
pub use policy::{ErrorPolicy, ExecuteOptions, FALLBACK_ERROR_MESSAGE};
pub use query::QueryHook;
pub use state::OperationState;
