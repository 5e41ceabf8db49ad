//! GraphQL mutations with captured failures.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;

use plexus_core::{Scope, Signal};
use plexus_net::{ClientError, GraphQLClient, GraphQLRequest, Operation};

use crate::async_operation::{AsyncOperation, AsyncOptions};
use crate::policy::ExecuteOptions;
use crate::state::OperationState;

/// Options for a [`MutationHook`].
///
/// `on_success` receives the raw `data` value of a response that also decoded
/// into the caller's type; a response that fails to decode only reaches
/// `on_error`.
pub type MutationOptions = AsyncOptions<Value>;

/// Message recorded when [`MutationHook::mutate`] is called without a document.
pub const NO_DOCUMENT_BOUND: &str = "no mutation document bound";

struct MutationInner {
    client: GraphQLClient,
    document: Option<String>,
    operation: AsyncOperation<Value>,
}

/// Sends mutations through a [`GraphQLClient`], tracking loading/error state.
///
/// A hook is either bound to one document ([`mutate`](Self::mutate)) or
/// unbound and given a document per call ([`execute`](Self::execute)). Both
/// forms, and typed [`run`](Self::run), share one loading/error state.
/// Failures are recorded and yield `None`.
#[derive(Clone)]
pub struct MutationHook {
    inner: Arc<MutationInner>,
}

impl MutationHook {
    /// A hook bound to `document`.
    pub fn bound(
        scope: &Scope,
        client: &GraphQLClient,
        document: impl Into<String>,
        options: MutationOptions,
    ) -> Self {
        Self::create(scope, client, Some(document.into()), options)
    }

    /// A hook that takes its document per call.
    pub fn unbound(scope: &Scope, client: &GraphQLClient, options: MutationOptions) -> Self {
        Self::create(scope, client, None, options)
    }

    fn create(
        scope: &Scope,
        client: &GraphQLClient,
        document: Option<String>,
        options: MutationOptions,
    ) -> Self {
        Self {
            inner: Arc::new(MutationInner {
                client: client.clone(),
                document,
                operation: AsyncOperation::new(scope, options),
            }),
        }
    }

    /// Send the bound document with `variables`.
    ///
    /// On an unbound hook this records [`NO_DOCUMENT_BOUND`] and returns `None`.
    pub async fn mutate<R>(&self, variables: impl Serialize) -> Option<R>
    where
        R: DeserializeOwned,
    {
        let Some(document) = self.inner.document.as_deref() else {
            self.inner.operation.fail(NO_DOCUMENT_BOUND);
            return None;
        };
        let request = serde_json::to_value(variables)
            .map(|vars| GraphQLRequest::mutation(document).variables(vars))
            .map_err(ClientError::from);
        self.send(request).await
    }

    /// Send `document` with `variables`.
    pub async fn execute<R>(&self, document: &str, variables: impl Serialize) -> Option<R>
    where
        R: DeserializeOwned,
    {
        let request = serde_json::to_value(variables)
            .map(|vars| GraphQLRequest::mutation(document).variables(vars))
            .map_err(ClientError::from);
        self.send(request).await
    }

    /// Send a typed operation.
    pub async fn run<Op: Operation>(&self, variables: &Op::Variables) -> Option<Op::Response> {
        self.send(Op::request(variables)).await
    }

    async fn send<R>(&self, request: plexus_net::Result<GraphQLRequest>) -> Option<R>
    where
        R: DeserializeOwned,
    {
        let client = &self.inner.client;
        let outcome = self
            .inner
            .operation
            .execute_observed(
                async move {
                    let data = client.execute_value(request?).await?;
                    let response = R::deserialize(&data).map_err(|e| {
                        ClientError::Json(format!("Failed to deserialize GraphQL response: {e}"))
                    })?;
                    Ok::<_, ClientError>((response, data))
                },
                ExecuteOptions::default(),
                raw_data,
            )
            .await;

        outcome.ok().flatten().map(|(response, _)| response)
    }

    /// Clear `loading` and `error`.
    pub fn reset(&self) {
        self.inner.operation.reset();
    }

    /// The bound document, if any.
    pub fn document(&self) -> Option<&str> {
        self.inner.document.as_deref()
    }

    pub fn loading(&self) -> bool {
        self.inner.operation.loading()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.operation.error()
    }

    pub fn loading_changed(&self) -> &Signal<bool> {
        self.inner.operation.loading_changed()
    }

    pub fn error_changed(&self) -> &Signal<Option<String>> {
        self.inner.operation.error_changed()
    }

    pub fn state(&self) -> &OperationState {
        self.inner.operation.state()
    }
}

fn raw_data<R>(decoded: &(R, Value)) -> &Value {
    &decoded.1
}

impl fmt::Debug for MutationHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationHook")
            .field("document", &self.inner.document)
            .field("operation", &self.inner.operation)
            .finish()
    }
}
