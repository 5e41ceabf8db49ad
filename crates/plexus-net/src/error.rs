//! Error types for the GraphQL transport.

use thiserror::Error;

/// Errors returned by [`GraphQLClient`](crate::GraphQLClient) and client
/// configuration.
///
/// `GraphQL` displays as the bare server message, so callers that render
/// `err.to_string()` show exactly what the server reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// HTTP request failed before a response was received.
    #[error("HTTP request error: {0}")]
    Request(String),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Connection refused or failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Non-success HTTP status without a GraphQL error envelope.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// The response body (possibly empty).
        body: String,
    },

    /// The server reported an error in the `errors` array.
    ///
    /// Only the first reported error is kept.
    #[error("{message}")]
    GraphQL {
        /// The first error's message.
        message: String,
        /// The first error's path, dotted (`user.friends[0]`), if any.
        path: Option<String>,
    },

    /// The response carried neither errors nor data.
    #[error("No data in GraphQL response")]
    NoData,

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Whether the error was reported by the GraphQL server rather than the
    /// transport.
    pub fn is_graphql(&self) -> bool {
        matches!(self, Self::GraphQL { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Json(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidConfig(format!("invalid endpoint URL: {err}"))
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

/// A specialized Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
