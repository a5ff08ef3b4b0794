//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API and the binding
//! of query-string values to query parameters.

use graphlens_core::{GraphElement, GraphResult, JsonRecord, QueryParams, TableResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// CONNECTION INFO
// =============================================================================

/// Who and what the server is connected to. Never includes credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfoResponse {
    pub user_name: String,
    pub database_name: String,
}

// =============================================================================
// SEARCH / NEIGHBORS RESPONSES
// =============================================================================

/// Primary graph plus the paired table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub graph: Vec<GraphElement>,
    pub records: Vec<JsonRecord>,
    pub keys: Vec<String>,
    pub table: TableResult,
}

impl SearchResponse {
    #[must_use]
    pub fn new(graph: GraphResult, table: TableResult) -> Self {
        Self {
            graph: graph.graph,
            records: graph.records,
            keys: graph.keys,
            table,
        }
    }
}

/// Drill-down graph. The table is always empty: expanding a node does not
/// change the tabular view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborsResponse {
    pub graph: Vec<GraphElement>,
    pub table: TableResult,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Error body for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

// =============================================================================
// QUERY-STRING BINDING
// =============================================================================

/// Parameters bound as text whatever they look like.
const TEXT_PARAMS: [&str; 4] = ["text_search", "node_id", "node_type", "query_key"];

/// Bind a query-string value. Integers, floats and booleans are typed only
/// when their canonical text is exactly `raw` (`00123`, `1e3` and `+5` stay
/// strings); everything else is a string.
#[must_use]
pub fn parse_query_value(raw: &str) -> Value {
    match raw.parse::<i64>() {
        Ok(i) if i.to_string() == raw => return Value::from(i),
        _ => {}
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f.to_string() == raw => return Value::from(f),
        _ => {}
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

/// Bind one named parameter. Search text and identities are never typed.
#[must_use]
pub fn bind_param(key: &str, raw: &str) -> Value {
    if TEXT_PARAMS.contains(&key) {
        Value::String(raw.to_string())
    } else {
        parse_query_value(raw)
    }
}

/// Bind every query-string pair.
#[must_use]
pub fn query_params(raw: BTreeMap<String, String>) -> QueryParams {
    raw.into_iter()
        .map(|(k, v)| {
            let value = bind_param(&k, &v);
            (k, value)
        })
        .collect()
}
