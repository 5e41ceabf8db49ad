//! Query and mutation hooks against a mock GraphQL endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use plexus_core::{LocalStore, Scope};
use plexus_net::{AuthState, GraphQLClient, Operation, OperationType, StoreToken};
use plexus_query::{FetchOptions, MutationHook, MutationOptions, NO_DOCUMENT_BOUND, QueryHook};
use serde::{Deserialize, Serialize};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GET_ITEMS: &str = "query GetItems($first: Int) { items(first: $first) { list { id } } }";
const RENAME_ITEM: &str = "mutation RenameItem($id: ID!, $name: String!) { renameItem(id: $id, name: $name) { id name } }";

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct Item {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct ItemList {
    list: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct ItemsData {
    items: ItemList,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct Renamed {
    id: String,
    name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct RenameData {
    rename_item: Renamed,
}

#[derive(Debug, Serialize)]
struct RenameVars {
    id: String,
    name: String,
}

struct RenameItem;

impl Operation for RenameItem {
    type Variables = RenameVars;
    type Response = RenameData;
    const NAME: &'static str = "RenameItem";
    const DOCUMENT: &'static str = RENAME_ITEM;
    const KIND: OperationType = OperationType::Mutation;
}

fn client_for(server: &MockServer) -> GraphQLClient {
    GraphQLClient::builder(format!("{}/graphql", server.uri()))
        .build()
        .unwrap()
}

fn items_options() -> FetchOptions<ItemsData, Vec<Item>> {
    FetchOptions::with_transform(|d: ItemsData| d.items.list).initial_data(Vec::new())
}

#[tokio::test]
async fn test_query_hook_end_to_end() {
    plexus_core::logging::init_for_tests();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({"query": GET_ITEMS})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"items": {"list": [{"id": 1}]}}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let scope = Scope::new();
    let query = QueryHook::new(
        &scope,
        &client_for(&server),
        GET_ITEMS,
        json!({"first": 10}),
        items_options(),
    );
    assert_eq!(query.data(), Some(Vec::new()));

    let transitions = Arc::new(Mutex::new(Vec::new()));
    let transitions_clone = transitions.clone();
    query.loading_changed().connect(move |&loading| {
        transitions_clone.lock().push(loading);
    });

    let handle = query.activate().expect("activation fetches");
    assert_eq!(handle.await.unwrap(), Some(vec![Item { id: 1 }]));
    assert!(query.activate().is_none());

    assert_eq!(query.data(), Some(vec![Item { id: 1 }]));
    assert!(!query.loading());
    assert!(query.error().is_none());
    assert_eq!(*transitions.lock(), vec![true, false]);
}

#[tokio::test]
async fn test_query_hook_records_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"items": {"list": [{"id": 1}]}},
            "errors": [{"message": "Not authorized to view items"}],
        })))
        .mount(&server)
        .await;

    let scope = Scope::new();
    let query = QueryHook::new(
        &scope,
        &client_for(&server),
        GET_ITEMS,
        json!({}),
        items_options(),
    );

    assert_eq!(query.refetch().await, None);
    assert_eq!(query.error().as_deref(), Some("Not authorized to view items"));
    assert_eq!(query.data(), Some(Vec::new()));
    assert!(!query.loading());
}

#[tokio::test]
async fn test_query_hook_refetches_on_variable_change() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"variables": {"first": 1}})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"items": {"list": [{"id": 1}]}}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"variables": {"first": 2}})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"items": {"list": [{"id": 1}, {"id": 2}]}}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let scope = Scope::new();
    let query = QueryHook::new(
        &scope,
        &client_for(&server),
        GET_ITEMS,
        json!({"first": 1}),
        items_options(),
    );

    query.activate().unwrap().await.unwrap();
    assert!(query.set_variables(json!({"first": 1})).is_none());

    query
        .set_variables(json!({"first": 2}))
        .expect("new variables fetch")
        .await
        .unwrap();
    assert_eq!(query.variables(), json!({"first": 2}));
    assert_eq!(query.data().map(|items| items.len()), Some(2));
}

#[tokio::test]
async fn test_query_hook_waits_for_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer session-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"items": {"list": [{"id": 5}]}}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = LocalStore::new();
    let client = GraphQLClient::builder(format!("{}/graphql", server.uri()))
        .token_source(StoreToken::new(store.clone()))
        .build()
        .unwrap();

    let auth = AuthState::loading();
    let scope = Scope::new();
    let query = QueryHook::new(
        &scope,
        &client,
        GET_ITEMS,
        json!({}),
        items_options().skip(auth.should_skip()),
    );
    assert!(query.activate().is_none());

    store.set("token", "session-token");
    let auth = AuthState::resolved(true);
    query
        .set_skip(auth.should_skip())
        .expect("auth resolved, fetching")
        .await
        .unwrap();

    assert_eq!(query.data(), Some(vec![Item { id: 5 }]));
}

#[tokio::test]
async fn test_query_hook_unmounted_before_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(std::time::Duration::from_millis(100))
                .set_body_json(json!({"data": {"items": {"list": [{"id": 1}]}}})),
        )
        .mount(&server)
        .await;

    let scope = Scope::new();
    let query = QueryHook::new(
        &scope,
        &client_for(&server),
        GET_ITEMS,
        json!({}),
        items_options(),
    );

    let handle = query.activate().unwrap();
    scope.unmount();
    handle.await.unwrap();

    assert_eq!(query.data(), Some(Vec::new()));
    assert!(query.error().is_none());
}

#[tokio::test]
async fn test_bound_mutation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "query": RENAME_ITEM,
            "variables": {"id": "7", "name": "Groceries"},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"renameItem": {"id": "7", "name": "Groceries"}},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let successes = Arc::new(Mutex::new(Vec::new()));
    let successes_clone = successes.clone();
    let scope = Scope::new();
    let rename = MutationHook::bound(
        &scope,
        &client_for(&server),
        RENAME_ITEM,
        MutationOptions::new().on_success(move |data| successes_clone.lock().push(data.clone())),
    );

    let data: Option<RenameData> = rename
        .mutate(json!({"id": "7", "name": "Groceries"}))
        .await;

    assert_eq!(
        data.map(|d| d.rename_item.name),
        Some("Groceries".to_string())
    );
    assert!(!rename.loading());
    assert!(rename.error().is_none());
    assert_eq!(successes.lock().len(), 1);
}

#[tokio::test]
async fn test_unbound_mutation_and_typed_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"renameItem": {"id": "3", "name": "Inbox"}},
        })))
        .expect(2)
        .mount(&server)
        .await;

    let scope = Scope::new();
    let hook = MutationHook::unbound(&scope, &client_for(&server), MutationOptions::new());

    assert_eq!(hook.mutate::<RenameData>(json!({})).await, None);
    assert_eq!(hook.error().as_deref(), Some(NO_DOCUMENT_BOUND));

    let data: Option<RenameData> = hook
        .execute(RENAME_ITEM, json!({"id": "3", "name": "Inbox"}))
        .await;
    assert_eq!(data.map(|d| d.rename_item.id), Some("3".to_string()));
    assert!(hook.error().is_none());

    let typed = hook
        .run::<RenameItem>(&RenameVars {
            id: "3".into(),
            name: "Inbox".into(),
        })
        .await
        .unwrap();
    assert_eq!(typed.rename_item.name, "Inbox");
}

#[tokio::test]
async fn test_mutation_failure_is_captured() {
    plexus_core::logging::init_for_tests();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "Name already taken"}],
        })))
        .mount(&server)
        .await;

    let messages = Arc::new(Mutex::new(Vec::new()));
    let messages_clone = messages.clone();
    let scope = Scope::new();
    let rename = MutationHook::bound(
        &scope,
        &client_for(&server),
        RENAME_ITEM,
        MutationOptions::new().on_error(move |m| messages_clone.lock().push(m.to_string())),
    );

    let data: Option<RenameData> = rename.mutate(json!({"id": "1", "name": "x"})).await;
    assert!(data.is_none());
    assert_eq!(rename.error().as_deref(), Some("Name already taken"));
    assert_eq!(*messages.lock(), vec!["Name already taken".to_string()]);

    rename.reset();
    assert!(rename.error().is_none());
}

#[tokio::test]
async fn test_mutation_response_shape_mismatch_is_a_single_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"somethingElse": true}})),
        )
        .mount(&server)
        .await;

    let successes = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(AtomicUsize::new(0));
    let successes_clone = successes.clone();
    let failures_clone = failures.clone();
    let scope = Scope::new();
    let rename = MutationHook::bound(
        &scope,
        &client_for(&server),
        RENAME_ITEM,
        MutationOptions::new()
            .on_success(move |_| {
                successes_clone.fetch_add(1, Ordering::SeqCst);
            })
            .on_error(move |_| {
                failures_clone.fetch_add(1, Ordering::SeqCst);
            }),
    );

    let data: Option<RenameData> = rename.mutate(json!({"id": "1", "name": "x"})).await;
    assert!(data.is_none());
    assert_eq!(successes.load(Ordering::SeqCst), 0);
    assert_eq!(failures.load(Ordering::SeqCst), 1);

    let error = rename.error().expect("decode failure is recorded");
    assert!(error.contains("renameItem"), "unexpected error: {error}");
    assert!(!rename.loading());
}
