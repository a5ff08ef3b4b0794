//! Integration tests for the GraphLens HTTP API.
//!
//! Uses axum-test to drive the router against a scripted in-memory store.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum_test::TestServer;
use graphlens::api::{
    AppState, ConnectionInfoResponse, ErrorResponse, HealthResponse, INTERNAL_ERROR_DETAIL,
    NeighborsResponse, SearchResponse, SharedService, create_router,
};
use graphlens_core::{
    ChartData, MemoryStore, QueryRegistry, QueryService, QuerySummary, RawRecord, ResultSet,
    StoreExecutor, StoreNode, StoreRelationship,
    primitives::{EDGE_PROPERTIES_QUERY, NODE_PROPERTIES_QUERY},
};
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};

/// Serializes router construction: `create_router` reads env vars.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const REGISTRY: &str = r#"
acct_graph:
  enabled: true
  display_name: Accounts
  description: Payments between accounts
  primary: MATCH (a:Account)-[r:PAYS]->(b:Account) RETURN a, r, b LIMIT $limit
  table_query: MATCH (a:Account) RETURN a.name AS name LIMIT $limit
  chart: MATCH (a:Account) RETURN a.dept AS dept, count(a) AS accounts
default_graph:
  enabled: true
  neighbors:
    Account: MATCH (a)-[r]->(b) WHERE elementId(a) = $node_id RETURN r, b
archived_graph:
  enabled: false
  primary: MATCH (n) RETURN n
"#;

const PRIMARY: &str = "MATCH (a:Account)-[r:PAYS]->(b:Account) RETURN a, r, b LIMIT $limit";
const TABLE: &str = "MATCH (a:Account) RETURN a.name AS name LIMIT $limit";
const CHART: &str = "MATCH (a:Account) RETURN a.dept AS dept, count(a) AS accounts";
const NEIGHBORS: &str = "MATCH (a)-[r]->(b) WHERE elementId(a) = $node_id RETURN r, b";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn primary_rows() -> ResultSet {
    let record = RawRecord::new()
        .with("a", StoreNode::new("n1", ["Account"]).with_property("name", "Alpha"))
        .with("r", StoreRelationship::new("r1", "PAYS", "n1", "n2"))
        .with("b", StoreNode::new("n2", ["Account"]).with_property("name", "Beta"));
    ResultSet::new(["a", "r", "b"]).with_record(record)
}

fn table_rows() -> ResultSet {
    ResultSet::new(["name"])
        .with_record(RawRecord::new().with("name", "Alpha"))
        .with_record(RawRecord::new().with("name", "Beta"))
}

fn scripted_store() -> MemoryStore {
    MemoryStore::new()
        .respond(PRIMARY, primary_rows())
        .respond(TABLE, table_rows())
        .respond(
            CHART,
            ResultSet::new(["dept", "accounts"])
                .with_record(RawRecord::new().with("dept", "eng").with("accounts", 4i64)),
        )
}

fn service(store: Arc<MemoryStore>) -> SharedService {
    let registry = Arc::new(QueryRegistry::from_yaml_str(REGISTRY).unwrap());
    let executor: Arc<dyn StoreExecutor> = store;
    QueryService::new(registry, executor)
}

fn connection() -> ConnectionInfoResponse {
    ConnectionInfoResponse {
        user_name: "reader".to_string(),
        database_name: "neo4j".to_string(),
    }
}

/// Create a test server over `store`, with rate limiting from `rate_limit`.
fn server_with(store: Arc<MemoryStore>, rate_limit: Option<&str>) -> TestServer {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: env access is serialized by ENV_MUTEX.
    unsafe {
        match rate_limit {
            Some(limit) => std::env::set_var("GRAPHLENS_RATE_LIMIT", limit),
            None => std::env::remove_var("GRAPHLENS_RATE_LIMIT"),
        }
    }
    let router = create_router(AppState::new(service(store), connection()));
    // SAFETY: env access is serialized by ENV_MUTEX.
    unsafe { std::env::remove_var("GRAPHLENS_RATE_LIMIT") };
    TestServer::new(router).unwrap()
}

fn create_test_server() -> (TestServer, Arc<MemoryStore>) {
    let store = Arc::new(scripted_store());
    (server_with(Arc::clone(&store), None), store)
}

// =============================================================================
// HEALTH / INFO TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _store) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_connection_info_has_no_credentials() {
    let (server, _store) = create_test_server();

    let response = server.get("/api/connection-info").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({"user_name": "reader", "database_name": "neo4j"}));
}

#[tokio::test]
async fn test_queries_lists_enabled_sets_only() {
    let (server, store) = create_test_server();

    let response = server.get("/api/queries").await;

    response.assert_status_ok();
    let queries: Vec<QuerySummary> = response.json();
    let names: Vec<&str> = queries.iter().map(|q| q.name.as_str()).collect();
    assert_eq!(names, vec!["acct_graph", "default_graph"]);
    assert_eq!(queries[0].display_name, "Accounts");
    assert_eq!(store.call_count(), 0);
}

// =============================================================================
// SEARCH TESTS
// =============================================================================

#[tokio::test]
async fn test_search_returns_graph_and_table() {
    let (server, store) = create_test_server();

    let response = server.get("/api/search/acct_graph").await;

    response.assert_status_ok();
    let body: SearchResponse = response.json();
    assert_eq!(body.graph.len(), 3);
    assert_eq!(body.keys, vec!["a", "r", "b"]);
    assert_eq!(body.records.len(), 1);
    assert_eq!(body.table.keys, vec!["name"]);
    assert_eq!(body.table.records.len(), 2);

    let calls = store.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].query, PRIMARY);
    assert_eq!(calls[1].query, TABLE);
}

#[tokio::test]
async fn test_search_injects_months_and_defaults() {
    let (server, store) = create_test_server();

    server
        .get("/api/search/acct_graph")
        .add_query_param("text_search", "Al")
        .await
        .assert_status_ok();

    let params = store.calls()[0].params.to_json();
    assert_eq!(params["months"], json!(1));
    assert_eq!(params["limit"], json!(10));
    assert_eq!(params["text_search"], json!("Al"));
}

#[tokio::test]
async fn test_search_keeps_caller_values_typed() {
    let (server, store) = create_test_server();

    server
        .get("/api/search/acct_graph")
        .add_query_param("months", "6")
        .add_query_param("limit", "25")
        .await
        .assert_status_ok();

    let params = store.calls()[0].params.to_json();
    assert_eq!(params["months"], json!(6));
    assert_eq!(params["limit"], json!(25));
}

#[tokio::test]
async fn test_search_text_is_bound_verbatim() {
    let (server, store) = create_test_server();

    server
        .get("/api/search/acct_graph")
        .add_query_param("text_search", "00123")
        .add_query_param("code", "1e3")
        .await
        .assert_status_ok();

    let params = store.calls()[0].params.to_json();
    assert_eq!(params["text_search"], json!("00123"));
    assert_eq!(params["code"], json!("1e3"));
}

#[tokio::test]
async fn test_search_unknown_query_set() {
    let (server, store) = create_test_server();

    let response = server.get("/api/search/nope").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json();
    assert_eq!(body.detail, "Query set 'nope' not found.");
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_search_disabled_query_set() {
    let (server, store) = create_test_server();

    let response = server.get("/api/search/archived_graph").await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: ErrorResponse = response.json();
    assert_eq!(body.detail, "Query set 'archived_graph' is disabled.");
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_search_store_failure_is_opaque() {
    let store = Arc::new(MemoryStore::new().fail(PRIMARY, "connection refused by 10.0.0.7"));
    let server = server_with(store, None);

    let response = server.get("/api/search/acct_graph").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = response.json();
    assert_eq!(body.detail, INTERNAL_ERROR_DETAIL);
}

// =============================================================================
// NEIGHBORS TESTS
// =============================================================================

#[tokio::test]
async fn test_neighbors_requires_node_type() {
    let (server, store) = create_test_server();

    let response = server.get("/api/nodes/n1/neighbors").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_neighbors_defaults_to_default_graph() {
    let record = RawRecord::new()
        .with("r", StoreRelationship::new("r9", "OWNS", "n5", "n7"))
        .with("b", StoreNode::new("n7", ["Account"]).with_property("name", "Gamma"));
    let store = Arc::new(MemoryStore::new().respond_when(
        NEIGHBORS,
        "node_id",
        "n5",
        ResultSet::new(["r", "b"]).with_record(record),
    ));
    let server = server_with(Arc::clone(&store), None);

    let response = server
        .get("/api/nodes/r1_n5/neighbors")
        .add_query_param("node_type", "Account")
        .await;

    response.assert_status_ok();
    let body: NeighborsResponse = response.json();
    let graph = serde_json::to_value(&body.graph).unwrap();
    assert_eq!(
        graph,
        json!([
            {"data": {
                "id": "r9_n7",
                "label": "Account",
                "name": "Gamma",
                "original_element_id": "n7",
            }},
            {"data": {"id": "r9", "source": "r1_n5", "target": "r9_n7", "label": "OWNS"}},
        ])
    );
    assert!(body.table.records.is_empty());

    let params = &store.calls()[0].params;
    assert_eq!(params.get_str("node_id"), Some("n5"));
    assert_eq!(params.get_str("node_type"), Some("Account"));
}

#[tokio::test]
async fn test_neighbors_numeric_looking_id_stays_text() {
    let store = Arc::new(MemoryStore::new().respond(NEIGHBORS, ResultSet::new(["r", "b"])));
    let server = server_with(Arc::clone(&store), None);

    server
        .get("/api/nodes/42/neighbors")
        .add_query_param("node_type", "Account")
        .await
        .assert_status_ok();

    assert_eq!(store.calls()[0].params.get_str("node_id"), Some("42"));
}

#[tokio::test]
async fn test_neighbors_unknown_query_key() {
    let (server, _store) = create_test_server();

    let response = server
        .get("/api/nodes/n1/neighbors")
        .add_query_param("node_type", "Account")
        .add_query_param("query_key", "missing_set")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

#[tokio::test]
async fn test_node_properties_resolve_synthetic_id() {
    let node = StoreNode::new("n7", ["Account"])
        .with_property("name", "Gamma")
        .with_property("balance", 30i64);
    let store = Arc::new(MemoryStore::new().respond_when(
        NODE_PROPERTIES_QUERY,
        "node_id",
        "n7",
        ResultSet::new(["n"]).with_record(RawRecord::new().with("n", node)),
    ));
    let server = server_with(store, None);

    let response = server.get("/api/nodes/r9_n7/properties").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({"balance": 30, "name": "Gamma"}));
}

#[tokio::test]
async fn test_node_properties_missing() {
    let store = Arc::new(MemoryStore::new().respond(NODE_PROPERTIES_QUERY, ResultSet::new(["n"])));
    let server = server_with(store, None);

    let response = server.get("/api/nodes/n404/properties").await;

    response.assert_status_not_found();
    let body: ErrorResponse = response.json();
    assert_eq!(body.detail, "Node not found or has no properties.");
}

#[tokio::test]
async fn test_edge_properties() {
    let mut props = Map::new();
    props.insert("amount".to_string(), json!(7.5));
    let rel = StoreRelationship::new("r1", "PAYS", "n1", "n2").with_property("amount", 7.5);
    let store = Arc::new(MemoryStore::new().respond(
        EDGE_PROPERTIES_QUERY,
        ResultSet::new(["r"]).with_record(RawRecord::new().with("r", rel)),
    ));
    let server = server_with(store, None);

    let response = server.get("/api/edges/r1/properties").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, Value::Object(props));
}

#[tokio::test]
async fn test_edge_properties_missing() {
    let store = Arc::new(MemoryStore::new().respond(EDGE_PROPERTIES_QUERY, ResultSet::new(["r"])));
    let server = server_with(store, None);

    let response = server.get("/api/edges/r404/properties").await;

    response.assert_status_not_found();
    let body: ErrorResponse = response.json();
    assert_eq!(body.detail, "Edge not found or has no properties.");
}

// =============================================================================
// CHART TESTS
// =============================================================================

#[tokio::test]
async fn test_chart_series() {
    let (server, _store) = create_test_server();

    let response = server.get("/api/chart/acct_graph").await;

    response.assert_status_ok();
    let chart: ChartData = response.json();
    assert_eq!(chart.labels, vec!["eng"]);
    assert_eq!(chart.datasets[0].label, "accounts");
    assert_eq!(chart.datasets[0].data, vec![json!(4)]);
}

#[tokio::test]
async fn test_chart_missing_query_type() {
    let (server, _store) = create_test_server();

    let response = server.get("/api/chart/default_graph").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json();
    assert_eq!(
        body.detail,
        "Query type 'chart' not found in query set 'default_graph'."
    );
}

// =============================================================================
// ROUTING / MIDDLEWARE TESTS
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let (server, _store) = create_test_server();

    let response = server.get("/unknown").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (server, _store) = create_test_server();

    let response = server.post("/api/queries").await;
    assert_eq!(response.status_code().as_u16(), 405);
}

#[tokio::test]
async fn test_rate_limit_rejects_burst() {
    let server = server_with(Arc::new(scripted_store()), Some("1"));

    server.get("/api/chart/acct_graph").await.assert_status_ok();
    let response = server.get("/api/chart/acct_graph").await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: ErrorResponse = response.json();
    assert_eq!(body.detail, "Too Many Requests");
}

#[tokio::test]
async fn test_health_is_not_rate_limited() {
    let server = server_with(Arc::new(scripted_store()), Some("1"));

    server.get("/api/queries").await.assert_status_ok();
    for _ in 0..3 {
        server.get("/health").await.assert_status_ok();
    }
    server
        .get("/api/queries")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}
