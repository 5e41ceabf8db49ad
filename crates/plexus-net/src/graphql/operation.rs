//! Typed GraphQL operations.
//!
//! Every document a view issues is declared once as a type implementing
//! [`Operation`], naming its variables and its response shape. The hook layer
//! deserializes straight into `Response`, so transforms are written against a
//! concrete type rather than untyped JSON.
//!
//! ```
//! use plexus_net::{NoVariables, Operation, OperationType};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Post { id: String, body: String }
//!
//! #[derive(Debug, Deserialize)]
//! struct FeedData { feed: Vec<Post> }
//!
//! struct GetFeed;
//!
//! impl Operation for GetFeed {
//!     type Variables = NoVariables;
//!     type Response = FeedData;
//!     const NAME: &'static str = "GetFeed";
//!     const DOCUMENT: &'static str = "query GetFeed { feed { id body } }";
//!     const KIND: OperationType = OperationType::Query;
//! }
//!
//! let request = GetFeed::request(&NoVariables).unwrap();
//! assert_eq!(request.operation_name.as_deref(), Some("GetFeed"));
//! ```

use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::request::{GraphQLRequest, OperationType};
use crate::error::Result;

/// A GraphQL operation with statically known document, variables and
/// response types.
pub trait Operation {
    /// The variables type.
    type Variables: Serialize;

    /// The `data` payload type.
    type Response: DeserializeOwned;

    /// The operation name, sent as `operationName`.
    const NAME: &'static str;

    /// The GraphQL document.
    const DOCUMENT: &'static str;

    /// Query or mutation.
    const KIND: OperationType;

    /// Build the wire request for `variables`.
    fn request(variables: &Self::Variables) -> Result<GraphQLRequest> {
        let request = match Self::KIND {
            OperationType::Query => GraphQLRequest::query(Self::DOCUMENT),
            OperationType::Mutation => GraphQLRequest::mutation(Self::DOCUMENT),
        };
        Ok(request
            .variables(serde_json::to_value(variables)?)
            .operation_name(Self::NAME))
    }
}

/// Variables for operations that take none. Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoVariables;

impl Serialize for NoVariables {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }
}
