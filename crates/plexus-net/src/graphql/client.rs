//! GraphQL client implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use plexus_core::logging::targets;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::operation::Operation;
use super::request::GraphQLRequest;
use super::response::GraphQLResponse;
use crate::auth::{StaticToken, TokenSource};
use crate::error::{ClientError, Result};

/// Builder for creating a GraphQL client.
pub struct GraphQLClientBuilder {
    http_url: String,
    http_client: Option<reqwest::Client>,
    default_headers: HashMap<String, String>,
    token_source: Option<Arc<dyn TokenSource>>,
    request_timeout: Option<Duration>,
}

impl GraphQLClientBuilder {
    /// Create a new builder for the given endpoint URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http_url: url.into(),
            http_client: None,
            default_headers: HashMap::new(),
            token_source: None,
            request_timeout: None,
        }
    }

    /// Use an existing reqwest client (shares its connection pool).
    ///
    /// `request_timeout` is ignored when a client is supplied.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Add a default header to all requests.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Add multiple headers.
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.default_headers.extend(headers);
        self
    }

    /// Attach a fixed bearer token to every request.
    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.token_source(StaticToken::new(token))
    }

    /// Consult `source` for a bearer token on every request.
    pub fn token_source(mut self, source: impl TokenSource + 'static) -> Self {
        self.token_source = Some(Arc::new(source));
        self
    }

    /// Set the request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build the GraphQL client.
    pub fn build(self) -> Result<GraphQLClient> {
        let parsed = url::Url::parse(&self.http_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "unsupported endpoint scheme '{}'",
                parsed.scheme()
            )));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::InvalidHeader(format!("{name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::InvalidHeader(format!("{name}: {e}")))?;
            headers.insert(name, value);
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.request_timeout {
                    builder = builder.timeout(timeout);
                }
                builder
                    .build()
                    .map_err(|e| ClientError::InvalidConfig(e.to_string()))?
            }
        };

        Ok(GraphQLClient {
            inner: Arc::new(GraphQLClientInner {
                http_client,
                http_url: self.http_url,
                default_headers: headers,
                token_source: self.token_source,
            }),
        })
    }
}

struct GraphQLClientInner {
    http_client: reqwest::Client,
    http_url: String,
    default_headers: HeaderMap,
    token_source: Option<Arc<dyn TokenSource>>,
}

/// A GraphQL client for queries and mutations against a single endpoint.
///
/// Each call is a single POST attempt: no retry, no backoff. Failures reach
/// the caller as [`ClientError`].
///
/// # Example
///
/// ```ignore
/// use plexus_net::GraphQLClient;
///
/// let client = GraphQLClient::builder("https://api.example.com/graphql")
///     .token_source(StoreToken::new(store.clone()))
///     .build()?;
///
/// let data: FeedData = client
///     .execute_query("query Feed($first: Int) { feed(first: $first) { id } }", json!({"first": 20}))
///     .await?;
/// ```
#[derive(Clone)]
pub struct GraphQLClient {
    inner: Arc<GraphQLClientInner>,
}

impl GraphQLClient {
    /// Create a new builder for the given endpoint URL.
    pub fn builder(url: impl Into<String>) -> GraphQLClientBuilder {
        GraphQLClientBuilder::new(url)
    }

    /// Get the endpoint URL.
    pub fn url(&self) -> &str {
        &self.inner.http_url
    }

    /// The token the next request would carry.
    pub fn current_token(&self) -> Option<String> {
        self.inner.token_source.as_ref().and_then(|s| s.token())
    }

    /// Send a request and return the unprocessed envelope.
    ///
    /// A non-2xx response whose body is a GraphQL envelope with errors is
    /// returned as `Ok`, so the server-reported error can take priority.
    /// Any other non-2xx response becomes [`ClientError::HttpStatus`].
    pub async fn execute(&self, request: GraphQLRequest) -> Result<GraphQLResponse> {
        tracing::debug!(
            target: targets::GRAPHQL,
            operation = request.label(),
            kind = ?request.operation_type(),
            "sending GraphQL request"
        );

        let mut req = self
            .inner
            .http_client
            .post(&self.inner.http_url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .headers(self.inner.default_headers.clone());

        if let Some(token) = self.current_token() {
            req = req.bearer_auth(token);
        }

        let body = serde_json::to_vec(&request)?;
        let response = req.body(body).send().await.inspect_err(|e| {
            tracing::warn!(target: targets::GRAPHQL, operation = request.label(), "transport failure: {}", e);
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            if let Ok(envelope) = serde_json::from_str::<GraphQLResponse>(&text)
                && envelope.has_errors()
            {
                return Ok(envelope);
            }
            tracing::warn!(
                target: targets::GRAPHQL,
                operation = request.label(),
                status = status.as_u16(),
                "non-success HTTP status"
            );
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| ClientError::Json(format!("Invalid GraphQL response body: {e}")))
    }

    /// Send a request and unwrap the envelope into the raw `data` value.
    pub async fn execute_value(&self, request: GraphQLRequest) -> Result<Value> {
        let label = request.label().to_string();
        let result = self.execute(request).await?.into_value();
        if let Err(ClientError::GraphQL { message, .. }) = &result {
            tracing::debug!(target: targets::GRAPHQL, operation = %label, "server reported error: {}", message);
        }
        result
    }

    /// Execute a query document and deserialize `data` into `T`.
    pub async fn execute_query<T: DeserializeOwned>(
        &self,
        document: impl Into<String>,
        variables: impl Serialize,
    ) -> Result<T> {
        let request = GraphQLRequest::query(document).variables(serde_json::to_value(variables)?);
        self.execute(request).await?.into_data()
    }

    /// Execute a mutation document and deserialize `data` into `T`.
    pub async fn execute_mutation<T: DeserializeOwned>(
        &self,
        document: impl Into<String>,
        variables: impl Serialize,
    ) -> Result<T> {
        let request =
            GraphQLRequest::mutation(document).variables(serde_json::to_value(variables)?);
        self.execute(request).await?.into_data()
    }

    /// Execute a typed operation.
    pub async fn run<Op: Operation>(&self, variables: &Op::Variables) -> Result<Op::Response> {
        let request = Op::request(variables)?;
        self.execute(request).await?.into_data()
    }
}

impl std::fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("http_url", &self.inner.http_url)
            .field("has_token_source", &self.inner.token_source.is_some())
            .finish()
    }
}
