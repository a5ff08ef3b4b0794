//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, AppState, ConnectionInfoResponse, SharedService, bind_param};
use crate::config::Settings;
use crate::store::Neo4jConnector;
use graphlens_core::{
    ConnectionManager, GraphLensError, ParamDefaults, QueryKind, QueryOutcome, QueryParams,
    QueryRegistry, QueryService, StoreExecutor,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;

type Neo4jManager = ConnectionManager<Neo4jConnector>;

// =============================================================================
// SHARED SETUP
// =============================================================================

/// Load settings; `queries` overrides the registry path.
pub fn load_settings(
    config: Option<&Path>,
    queries: Option<PathBuf>,
) -> Result<Settings, GraphLensError> {
    let mut settings = Settings::load(config)?;
    if let Some(path) = queries {
        settings.queries_file_path = path;
    }
    tracing::debug!("Loaded settings: {:?}", settings);
    Ok(settings)
}

fn load_registry(settings: &Settings) -> Result<Arc<QueryRegistry>, GraphLensError> {
    let registry = QueryRegistry::load(&settings.queries_file_path)?;
    for issue in registry.validate() {
        tracing::warn!("{}", issue);
    }
    Ok(Arc::new(registry))
}

/// Build the engine over a lazily connecting Neo4j manager.
fn build_service(
    settings: &Settings,
) -> Result<(SharedService, Arc<Neo4jManager>), GraphLensError> {
    settings.validate()?;
    let registry = load_registry(settings)?;
    let connector = Neo4jConnector::new(settings, Handle::current())?;
    let manager = Arc::new(ConnectionManager::new(connector));

    let executor: Arc<dyn StoreExecutor> = manager.clone();
    let service = QueryService::new(registry, executor).with_defaults(ParamDefaults {
        limit: settings.default_limit,
    });
    Ok((service, manager))
}

/// Open the store connection on the blocking pool.
async fn connect(manager: &Arc<Neo4jManager>) -> Result<(), GraphLensError> {
    let manager = Arc::clone(manager);
    tokio::task::spawn_blocking(move || manager.acquire().map(|_| ()))
        .await
        .map_err(|e| GraphLensError::Store(format!("Connection task failed: {}", e)))?
}

fn print_json(value: &impl serde::Serialize) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Parse a `key=value` parameter. Values bind like query-string values.
pub fn parse_param(raw: &str) -> Result<(String, serde_json::Value), GraphLensError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            let key = key.trim();
            Ok((key.to_string(), bind_param(key, value)))
        }
        _ => Err(GraphLensError::Config(format!(
            "Invalid parameter '{}', expected key=value",
            raw
        ))),
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(settings: &Settings, host: &str, port: u16) -> Result<(), GraphLensError> {
    let (service, manager) = build_service(settings)?;
    connect(&manager).await?;

    println!("GraphLens Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:      {}", host);
    println!("  Port:      {}", port);
    println!("  Store:     {}", settings.neo4j_uri);
    println!("  Database:  {}", settings.neo4j_database);
    println!("  Queries:   {}", settings.queries_file_path.display());
    println!();
    println!("Endpoints:");
    println!("  GET /api/queries                      - Enabled query sets");
    println!("  GET /api/search/{{query_set}}           - Graph + table");
    println!("  GET /api/nodes/{{node_id}}/neighbors    - Expand a node");
    println!("  GET /api/nodes/{{node_id}}/properties   - Node properties");
    println!("  GET /api/edges/{{edge_id}}/properties   - Edge properties");
    println!("  GET /api/chart/{{query_set}}            - Chart series");
    println!("  GET /health                           - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let connection = ConnectionInfoResponse {
        user_name: settings.neo4j_user.clone(),
        database_name: settings.neo4j_database.clone(),
    };
    let addr = format!("{}:{}", host, port);
    let served = api::run_server(&addr, AppState::new(service, connection)).await;

    manager.release();
    served
}

// =============================================================================
// QUERIES COMMAND
// =============================================================================

/// List enabled query sets.
pub fn cmd_queries(settings: &Settings, json_mode: bool) -> Result<(), GraphLensError> {
    let registry = load_registry(settings)?;
    let available = registry.available();

    if json_mode {
        print_json(&available);
        return Ok(());
    }

    println!("GraphLens Query Sets");
    println!("====================");
    println!("Registry: {}", settings.queries_file_path.display());
    println!(
        "Enabled:  {} of {}",
        available.len(),
        registry.len()
    );
    println!();
    for summary in &available {
        if summary.description.is_empty() {
            println!("  {:<24} {}", summary.name, summary.display_name);
        } else {
            println!(
                "  {:<24} {} - {}",
                summary.name, summary.display_name, summary.description
            );
        }
    }

    Ok(())
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Run one query set and print the outcome.
pub async fn cmd_run(
    settings: &Settings,
    json_mode: bool,
    query_set: String,
    kind: QueryKind,
    raw_params: &[String],
) -> Result<(), GraphLensError> {
    let params: QueryParams = raw_params
        .iter()
        .map(|raw| parse_param(raw))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .collect();

    let (service, manager) = build_service(settings)?;
    let outcome = tokio::task::spawn_blocking(move || {
        service.resolve_and_run(&query_set, kind, params)
    })
    .await
    .map_err(|e| GraphLensError::Store(format!("Query task failed: {}", e)))?;
    manager.release();
    let outcome = outcome?;

    if json_mode {
        print_json(&outcome);
        return Ok(());
    }

    match &outcome {
        QueryOutcome::Graph(graph) => {
            println!("Graph elements: {}", graph.graph.len());
            println!("Records:        {}", graph.records.len());
            println!("Columns:        {}", graph.keys.join(", "));
        }
        QueryOutcome::Chart(chart) => {
            println!("Labels:   {}", chart.labels.len());
            for dataset in &chart.datasets {
                println!("Dataset:  {} ({} values)", dataset.label, dataset.data.len());
            }
        }
    }
    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Validate settings and registry; optionally verify the store connection.
pub async fn cmd_check(
    settings: &Settings,
    json_mode: bool,
    connect_store: bool,
) -> Result<(), GraphLensError> {
    let registry = load_registry(settings)?;
    let mut issues = registry.validate();
    if let Err(e) = settings.validate() {
        issues.push(e.to_string());
    }

    let mut connected = None;
    if connect_store && issues.is_empty() {
        let (_, manager) = build_service(settings)?;
        let result = connect(&manager).await;
        manager.release();
        if let Err(e) = &result {
            issues.push(e.to_string());
        }
        connected = Some(result.is_ok());
    }

    if json_mode {
        print_json(&serde_json::json!({
            "queries_file": settings.queries_file_path.to_string_lossy(),
            "query_sets": registry.len(),
            "enabled": registry.available().len(),
            "connected": connected,
            "issues": issues,
        }));
    } else {
        println!("Registry:   {}", settings.queries_file_path.display());
        println!("Query sets: {} ({} enabled)", registry.len(), registry.available().len());
        if let Some(ok) = connected {
            println!("Store:      {}", if ok { "connected" } else { "unreachable" });
        }
        for issue in &issues {
            println!("  ! {}", issue);
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(GraphLensError::Config(format!(
            "{} problem(s) found",
            issues.len()
        )))
    }
}

// =============================================================================
// TESTS
// =============================================================================
