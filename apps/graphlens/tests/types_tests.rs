//! Unit tests for API types serialization and query-string binding.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use graphlens::api::{
    ConnectionInfoResponse, ErrorResponse, HealthResponse, NeighborsResponse, SearchResponse,
    bind_param, parse_query_value, query_params,
};
use graphlens_core::{GraphResult, TableResult};
use serde_json::{Map, json};
use std::collections::BTreeMap;

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_deserialization() {
    let json = r#"{"status":"ok","version":"1.0.0"}"#;
    let health: HealthResponse = serde_json::from_str(json).unwrap();

    assert_eq!(health.status, "ok");
    assert_eq!(health.version, "1.0.0");
}

// =============================================================================
// RESPONSE SHAPE TESTS
// =============================================================================

#[test]
fn test_connection_info_fields() {
    let info = ConnectionInfoResponse {
        user_name: "reader".to_string(),
        database_name: "sales".to_string(),
    };
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json, json!({"user_name": "reader", "database_name": "sales"}));
}

#[test]
fn test_search_response_flattens_graph_result() {
    let mut row = Map::new();
    row.insert("name".to_string(), json!("Alpha"));
    let graph = GraphResult {
        graph: Vec::new(),
        records: vec![row.clone()],
        keys: vec!["a".to_string()],
    };
    let table = TableResult {
        records: vec![row],
        keys: vec!["name".to_string()],
    };

    let json = serde_json::to_value(SearchResponse::new(graph, table)).unwrap();
    assert_eq!(
        json,
        json!({
            "graph": [],
            "records": [{"name": "Alpha"}],
            "keys": ["a"],
            "table": {"records": [{"name": "Alpha"}], "keys": ["name"]},
        })
    );
}

#[test]
fn test_neighbors_response_has_empty_table() {
    let json = serde_json::to_value(NeighborsResponse::default()).unwrap();
    assert_eq!(json, json!({"graph": [], "table": {"records": [], "keys": []}}));
}

#[test]
fn test_error_response_uses_detail() {
    let json = serde_json::to_string(&ErrorResponse {
        detail: "Query set 'x' not found.".to_string(),
    })
    .unwrap();
    assert_eq!(json, r#"{"detail":"Query set 'x' not found."}"#);
}

// =============================================================================
// QUERY-STRING BINDING TESTS
// =============================================================================

#[test]
fn test_parse_query_value_types() {
    assert_eq!(parse_query_value("10"), json!(10));
    assert_eq!(parse_query_value("-3"), json!(-3));
    assert_eq!(parse_query_value("2.5"), json!(2.5));
    assert_eq!(parse_query_value("true"), json!(true));
    assert_eq!(parse_query_value("false"), json!(false));
    assert_eq!(parse_query_value("Acme"), json!("Acme"));
    assert_eq!(parse_query_value(""), json!(""));
}

#[test]
fn test_parse_query_value_rejects_non_numeric_floats() {
    assert_eq!(parse_query_value("NaN"), json!("NaN"));
    assert_eq!(parse_query_value("inf"), json!("inf"));
    assert_eq!(parse_query_value("infinity"), json!("infinity"));
    assert_eq!(parse_query_value("True"), json!("True"));
}

#[test]
fn test_query_params_binds_every_pair() {
    let raw: BTreeMap<String, String> = [
        ("limit".to_string(), "5".to_string()),
        ("text_search".to_string(), "Al".to_string()),
    ]
    .into_iter()
    .collect();

    let params = query_params(raw);
    assert_eq!(params.to_json(), json!({"limit": 5, "text_search": "Al"}));
}

#[test]
fn test_parse_query_value_keeps_non_canonical_numbers_as_text() {
    assert_eq!(parse_query_value("00123"), json!("00123"));
    assert_eq!(parse_query_value("007"), json!("007"));
    assert_eq!(parse_query_value("1e3"), json!("1e3"));
    assert_eq!(parse_query_value("+5"), json!("+5"));
    assert_eq!(parse_query_value("3.0"), json!("3.0"));
}

#[test]
fn test_search_text_and_identities_are_never_typed() {
    assert_eq!(bind_param("text_search", "00123"), json!("00123"));
    assert_eq!(bind_param("text_search", "42"), json!("42"));
    assert_eq!(bind_param("node_id", "17"), json!("17"));
    assert_eq!(bind_param("months", "6"), json!(6));

    let raw: BTreeMap<String, String> = [
        ("text_search".to_string(), "00123".to_string()),
        ("code".to_string(), "1e3".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(
        query_params(raw).to_json(),
        json!({"code": "1e3", "text_search": "00123"})
    );
}
