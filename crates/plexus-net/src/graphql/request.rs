//! GraphQL request types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A GraphQL operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// A query operation (read-only).
    #[default]
    Query,
    /// A mutation operation (modifies data).
    Mutation,
}

/// A GraphQL request.
///
/// Serializes to the wire body `{ "query": ..., "variables": ..., "operationName": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLRequest {
    /// The GraphQL document.
    pub query: String,

    /// Variables for the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,

    /// Operation name (for documents with multiple operations).
    #[serde(skip_serializing_if = "Option::is_none", rename = "operationName")]
    pub operation_name: Option<String>,

    /// The operation type (not serialized, used for logging).
    #[serde(skip)]
    pub(crate) operation_type: OperationType,
}

impl GraphQLRequest {
    /// Create a new query request.
    pub fn query(query: impl Into<String>) -> Self {
        Self::with_type(query, OperationType::Query)
    }

    /// Create a new mutation request.
    pub fn mutation(query: impl Into<String>) -> Self {
        Self::with_type(query, OperationType::Mutation)
    }

    fn with_type(query: impl Into<String>, operation_type: OperationType) -> Self {
        Self {
            query: query.into(),
            variables: None,
            operation_name: None,
            operation_type,
        }
    }

    /// Set a single variable.
    ///
    /// ```
    /// use plexus_net::GraphQLRequest;
    ///
    /// let request = GraphQLRequest::query("query($id: ID!) { user(id: $id) { name } }")
    ///     .variable("id", "123")
    ///     .variable("limit", 10);
    /// assert_eq!(request.variables.unwrap()["limit"], 10);
    /// ```
    pub fn variable(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        let variables = self
            .variables
            .get_or_insert_with(|| Value::Object(Default::default()));
        if let Value::Object(map) = variables
            && let Ok(value) = serde_json::to_value(value)
        {
            map.insert(name.into(), value);
        }
        self
    }

    /// Replace all variables with an already-serialized value.
    pub fn variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Set the operation name.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Get the operation type.
    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    /// A label for log output: the operation name or the first document line.
    pub fn label(&self) -> &str {
        if let Some(name) = self.operation_name.as_deref() {
            return name;
        }
        self.query
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("<anonymous>")
    }
}
