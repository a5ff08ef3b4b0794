//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers. Every engine
//! call is blocking and runs on tokio's blocking pool.

use super::{
    AppState, SharedService,
    error::ApiError,
    types::{
        ConnectionInfoResponse, HealthResponse, NeighborsResponse, SearchResponse, query_params,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use graphlens_core::{
    ChartData, GraphLensError, JsonRecord, QueryKind, QuerySummary, TableResult,
    primitives::DEFAULT_DRILLDOWN_QUERY_SET,
};
use std::collections::BTreeMap;
use std::sync::Arc;

type RawQuery = Query<BTreeMap<String, String>>;

/// Run an engine operation on the blocking pool.
async fn run_blocking<T, F>(state: &AppState, operation: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&SharedService) -> Result<T, GraphLensError> + Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || operation(&service))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::from)
}

// =============================================================================
// HEALTH / INFO HANDLERS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Connected user and database.
pub async fn connection_info_handler(State(state): State<AppState>) -> Json<ConnectionInfoResponse> {
    Json(state.connection.clone())
}

/// Enabled query sets.
pub async fn queries_handler(State(state): State<AppState>) -> Json<Vec<QuerySummary>> {
    Json(state.service.list_available_queries())
}

// =============================================================================
// SEARCH HANDLER
// =============================================================================

/// Run a query set's primary query and its paired table query.
pub async fn search_handler(
    State(state): State<AppState>,
    Path(query_set): Path<String>,
    Query(raw): RawQuery,
) -> Result<Json<SearchResponse>, ApiError> {
    let mut params = query_params(raw);
    params.set_default("months", 1);

    let response = run_blocking(&state, move |service| {
        let graph = service
            .resolve_and_run(&query_set, QueryKind::Primary, params.clone())?
            .into_graph()
            .unwrap_or_default();
        let table = service.run_table_query(service.table_query_for(&query_set), params)?;
        Ok(SearchResponse::new(graph, table))
    })
    .await?;

    Ok(Json(response))
}

// =============================================================================
// NEIGHBORS HANDLER
// =============================================================================

/// Expand a node. `node_type` selects the query; `query_key` names the query
/// set (`default_graph` when absent).
pub async fn neighbors_handler(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    Query(mut raw): RawQuery,
) -> Result<Json<NeighborsResponse>, ApiError> {
    let node_type = raw
        .remove("node_type")
        .ok_or_else(|| ApiError::bad_request("Missing required query parameter 'node_type'."))?;
    let query_set = raw
        .get("query_key")
        .filter(|key| !key.is_empty())
        .cloned()
        .unwrap_or_else(|| DEFAULT_DRILLDOWN_QUERY_SET.to_string());

    // Identities and type names are bound as text, whatever they look like.
    let mut params = query_params(raw);
    params.insert("node_id", node_id.as_str());
    params.insert("node_type", node_type);

    let graph = run_blocking(&state, move |service| {
        service
            .resolve_and_run(&query_set, QueryKind::Neighbors, params)
            .inspect_err(|e| {
                tracing::error!("An error occurred while fetching neighbors for node {}: {}", node_id, e);
            })
            .map(|outcome| outcome.into_graph().unwrap_or_default())
    })
    .await?;

    Ok(Json(NeighborsResponse {
        graph: graph.graph,
        table: TableResult::default(),
    }))
}

// =============================================================================
// PROPERTY HANDLERS
// =============================================================================

/// Properties of one node.
pub async fn node_properties_handler(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
) -> Result<Json<JsonRecord>, ApiError> {
    run_blocking(&state, move |service| service.lookup_node_properties(&node_id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Node not found or has no properties."))
}

/// Properties of one relationship.
pub async fn edge_properties_handler(
    State(state): State<AppState>,
    Path(edge_id): Path<String>,
) -> Result<Json<JsonRecord>, ApiError> {
    run_blocking(&state, move |service| service.lookup_edge_properties(&edge_id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Edge not found or has no properties."))
}

// =============================================================================
// CHART HANDLER
// =============================================================================

/// Run a query set's chart query.
pub async fn chart_handler(
    State(state): State<AppState>,
    Path(query_set): Path<String>,
    Query(raw): RawQuery,
) -> Result<Json<ChartData>, ApiError> {
    let params = query_params(raw);
    let chart = run_blocking(&state, move |service| {
        service
            .resolve_and_run(&query_set, QueryKind::Chart, params)
            .map(|outcome| outcome.into_chart().unwrap_or_default())
    })
    .await?;
    Ok(Json(chart))
}
