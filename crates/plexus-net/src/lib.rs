//! GraphQL transport for Plexus.
//!
//! This crate provides the network edge of the data-fetching layer:
//!
//! - **GraphQL Client**: single-endpoint POST transport that unwraps the
//!   `data`/`errors` envelope, first server error wins
//! - **Typed Operations**: documents declared with their variables and
//!   response types
//! - **Auth**: injected token sources and the auth-state snapshot used to
//!   gate queries
//! - **Configuration**: builder API and TOML settings
//!
//! # Example
//!
//! ```ignore
//! use plexus_net::{ClientSettings, StoreToken};
//!
//! let client = ClientSettings::from_file("plexus.toml")?
//!     .with_env_overrides()?
//!     .into_builder()
//!     .token_source(StoreToken::new(store.clone()))
//!     .build()?;
//!
//! let data: ItemsData = client.execute_query(GET_ITEMS, serde_json::json!({})).await?;
//! ```

pub mod auth;
pub mod config;
mod error;
pub mod graphql;

pub use auth::{AuthState, StaticToken, StoreToken, TokenSource};
pub use config::ClientSettings;
pub use error::{ClientError, Result};
pub use graphql::{
    GraphQLClient, GraphQLClientBuilder, GraphQLError, GraphQLRequest, GraphQLResponse,
    NoVariables, Operation, OperationType,
};
