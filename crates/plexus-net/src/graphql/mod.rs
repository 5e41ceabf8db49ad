//! GraphQL client for queries and mutations.
//!
//! # Example
//!
//! ```ignore
//! use plexus_net::graphql::{GraphQLClient, GraphQLRequest};
//!
//! let client = GraphQLClient::builder("https://api.example.com/graphql")
//!     .bearer_auth("token")
//!     .build()?;
//!
//! let request = GraphQLRequest::query(r#"
//!     query GetUser($id: ID!) {
//!         user(id: $id) { id name }
//!     }
//! "#)
//! .variable("id", "123");
//!
//! let user: UserData = client.execute(request).await?.into_data()?;
//! ```

mod client;
mod operation;
mod request;
mod response;

pub use client::{GraphQLClient, GraphQLClientBuilder};
pub use operation::{NoVariables, Operation};
pub use request::{GraphQLRequest, OperationType};
pub use response::{GraphQLError, GraphQLLocation, GraphQLResponse, PathSegment};
