//! GraphQL response envelope.

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;

use crate::error::{ClientError, Result};

/// A GraphQL error returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    /// The error message.
    pub message: String,

    /// Locations in the document where the error occurred.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<GraphQLLocation>,

    /// Path to the field that caused the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,

    /// Additional error metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLError {
    /// The error path rendered as `user.friends[0]`.
    pub fn path_string(&self) -> Option<String> {
        let path = self.path.as_ref()?;
        let mut out = String::new();
        for segment in path {
            match segment {
                PathSegment::Field(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                PathSegment::Index(idx) => out.push_str(&format!("[{idx}]")),
            }
        }
        Some(out)
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(path) = self.path_string() {
            write!(f, " (at {path})")?;
        }
        Ok(())
    }
}

impl From<GraphQLError> for ClientError {
    fn from(err: GraphQLError) -> Self {
        let path = err.path_string();
        ClientError::GraphQL {
            message: err.message,
            path,
        }
    }
}

/// A location in a GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQLLocation {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
}

/// A segment in an error path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A field name.
    Field(String),
    /// An array index.
    Index(usize),
}

/// A GraphQL response from the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
    /// The data returned by the operation.
    ///
    /// `None` when the field is absent; an explicit `null` is kept as
    /// `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present")]
    pub data: Option<Value>,

    /// Errors that occurred during execution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,

    /// Additional response metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl GraphQLResponse {
    /// Check if the response contains errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Unwrap the envelope into the raw `data` value.
    ///
    /// A non-empty `errors` array wins over any `data` sent alongside it:
    /// the first error becomes [`ClientError::GraphQL`] and partial data is
    /// discarded. A missing `data` field is [`ClientError::NoData`]; an
    /// explicit `null` is returned as [`Value::Null`] so the caller's type
    /// decides whether it is acceptable.
    pub fn into_value(mut self) -> Result<Value> {
        if !self.errors.is_empty() {
            return Err(self.errors.swap_remove(0).into());
        }
        self.data.ok_or(ClientError::NoData)
    }

    /// Unwrap the envelope and deserialize `data` into `T`.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T> {
        let value = self.into_value()?;
        serde_json::from_value(value).map_err(|e| {
            ClientError::Json(format!("Failed to deserialize GraphQL response: {e}"))
        })
    }
}
