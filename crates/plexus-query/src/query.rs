//! GraphQL queries as fetchers.
//!
//! A [`QueryHook`] is a [`Fetcher`] whose fetch closure posts a query through
//! a [`GraphQLClient`] with the hook's current variables. The response's
//! `data` is deserialized into the operation's response type, passed through
//! the options' transform, and stored.
//!
//! Auth gating is the caller's job: pass
//! `FetchOptions::skip(auth.should_skip())` and call
//! [`QueryHook::set_skip`] once the session resolves.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use plexus_core::logging::targets;
use plexus_core::{Scope, Signal};
use plexus_net::{GraphQLClient, GraphQLRequest, Operation};

use crate::fetch::Fetcher;
use crate::options::FetchOptions;

/// A query bound to one scope.
///
/// ```no_run
/// use plexus_core::Scope;
/// use plexus_net::GraphQLClient;
/// use plexus_query::{FetchOptions, QueryHook};
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Deserialize)]
/// struct Data { items: Items }
/// #[derive(Deserialize)]
/// struct Items { list: Vec<Item> }
/// #[derive(Clone, Deserialize)]
/// struct Item { id: u32 }
///
/// # fn demo(client: GraphQLClient) {
/// let scope = Scope::new();
/// let items = QueryHook::new(
///     &scope,
///     &client,
///     "query Items($first: Int) { items(first: $first) { list { id } } }",
///     json!({ "first": 20 }),
///     FetchOptions::with_transform(|d: Data| d.items.list).initial_data(Vec::new()),
/// );
/// items.activate();
/// # }
/// ```
pub struct QueryHook<T> {
    fetcher: Fetcher<T>,
    variables: Arc<RwLock<Value>>,
    label: Arc<str>,
}

impl<T> Clone for QueryHook<T> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            variables: self.variables.clone(),
            label: self.label.clone(),
        }
    }
}

impl<T> QueryHook<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a query hook for `document`.
    ///
    /// Nothing is sent until [`activate`](Self::activate) or
    /// [`refetch`](Self::refetch).
    pub fn new<R>(
        scope: &Scope,
        client: &GraphQLClient,
        document: impl Into<String>,
        variables: Value,
        options: FetchOptions<R, T>,
    ) -> Self
    where
        R: DeserializeOwned + Send + 'static,
    {
        Self::from_request(scope, client, GraphQLRequest::query(document), variables, options)
    }

    /// Create a query hook for a typed operation.
    ///
    /// Fails only if `variables` cannot be serialized.
    pub fn for_operation<Op>(
        scope: &Scope,
        client: &GraphQLClient,
        variables: &Op::Variables,
        options: FetchOptions<Op::Response, T>,
    ) -> plexus_net::Result<Self>
    where
        Op: Operation,
        Op::Response: Send + 'static,
    {
        let mut request = Op::request(variables)?;
        let variables = request.variables.take().unwrap_or_else(|| json!({}));
        Ok(Self::from_request(scope, client, request, variables, options))
    }

    fn from_request<R>(
        scope: &Scope,
        client: &GraphQLClient,
        template: GraphQLRequest,
        variables: Value,
        options: FetchOptions<R, T>,
    ) -> Self
    where
        R: DeserializeOwned + Send + 'static,
    {
        let label: Arc<str> = Arc::from(template.label());
        let variables = Arc::new(RwLock::new(variables));

        let client = client.clone();
        let current = variables.clone();
        let fetcher = Fetcher::new(
            scope,
            move || {
                let client = client.clone();
                let request = template.clone().variables(current.read().clone());
                async move { client.execute(request).await?.into_data::<R>() }
            },
            options,
        );

        Self {
            fetcher,
            variables,
            label,
        }
    }

    /// Run the mount effect. See [`Fetcher::activate`].
    pub fn activate(&self) -> Option<JoinHandle<Option<T>>> {
        self.fetcher.activate()
    }

    /// Send the query now.
    pub async fn refetch(&self) -> Option<T> {
        self.fetcher.refetch().await
    }

    /// Replace the variables.
    ///
    /// When they differ from the current ones the has-fetched guard is
    /// re-armed and the mount effect re-runs, so the new variables are
    /// fetched once (unless skipped).
    pub fn set_variables(&self, variables: Value) -> Option<JoinHandle<Option<T>>> {
        {
            let mut current = self.variables.write();
            if *current == variables {
                return None;
            }
            *current = variables;
        }
        tracing::debug!(
            target: targets::FETCH,
            operation = %self.label,
            "query variables changed"
        );
        self.fetcher.rearm();
        self.fetcher.activate()
    }

    /// Serialize and apply typed variables. See [`set_variables`](Self::set_variables).
    pub fn set_typed_variables<V: Serialize>(
        &self,
        variables: &V,
    ) -> plexus_net::Result<Option<JoinHandle<Option<T>>>> {
        Ok(self.set_variables(serde_json::to_value(variables)?))
    }

    /// The current variables.
    pub fn variables(&self) -> Value {
        self.variables.read().clone()
    }

    pub fn set_skip(&self, skip: bool) -> Option<JoinHandle<Option<T>>> {
        self.fetcher.set_skip(skip)
    }

    pub fn set_data(&self, data: T) {
        self.fetcher.set_data(data);
    }

    pub fn update_data<F>(&self, f: F)
    where
        F: FnOnce(Option<T>) -> Option<T>,
    {
        self.fetcher.update_data(f);
    }

    pub fn reset(&self) {
        self.fetcher.reset();
    }

    pub fn data(&self) -> Option<T> {
        self.fetcher.data()
    }

    pub fn loading(&self) -> bool {
        self.fetcher.loading()
    }

    pub fn error(&self) -> Option<String> {
        self.fetcher.error()
    }

    pub fn data_changed(&self) -> &Signal<Option<T>> {
        self.fetcher.data_changed()
    }

    pub fn loading_changed(&self) -> &Signal<bool> {
        self.fetcher.loading_changed()
    }

    pub fn error_changed(&self) -> &Signal<Option<String>> {
        self.fetcher.error_changed()
    }

    /// The underlying fetcher.
    pub fn fetcher(&self) -> &Fetcher<T> {
        &self.fetcher
    }
}

impl<T: fmt::Debug + Clone> fmt::Debug for QueryHook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryHook")
            .field("operation", &self.label)
            .field("variables", &*self.variables.read())
            .field("fetcher", &self.fetcher)
            .finish()
    }
}
