//! # GraphLens HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api/connection-info` - Connected user and database
//! - `GET /api/queries` - Enabled query sets
//! - `GET /api/search/{query_set_name}` - Primary graph plus paired table
//! - `GET /api/nodes/{node_id}/neighbors` - Drill-down expansion
//! - `GET /api/nodes/{node_id}/properties` - Node properties
//! - `GET /api/edges/{edge_id}/properties` - Relationship properties
//! - `GET /api/chart/{query_set_name}` - Chart series
//!
//! ## Configuration (Environment Variables)
//!
//! - `GRAPHLENS_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `GRAPHLENS_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)

mod error;
mod handlers;
mod middleware;
mod types;

pub use error::{ApiError, INTERNAL_ERROR_DETAIL};
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    ConnectionInfoResponse, ErrorResponse, HealthResponse, NeighborsResponse, SearchResponse,
    bind_param, parse_query_value, query_params,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::get,
};
use graphlens_core::{GraphLensError, QueryService, StoreExecutor};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// The engine as shared by every request.
pub type SharedService = QueryService<Arc<dyn StoreExecutor>>;

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SharedService>,
    pub connection: ConnectionInfoResponse,
}

impl AppState {
    #[must_use]
    pub fn new(service: SharedService, connection: ConnectionInfoResponse) -> Self {
        Self {
            service: Arc::new(service),
            connection,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `GRAPHLENS_CORS_ORIGINS`.
///
/// - `*`: allows all origins
/// - unset: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("GRAPHLENS_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (GRAPHLENS_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in GRAPHLENS_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => {
            tracing::info!("CORS: No GRAPHLENS_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Localhost-only CORS.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8000",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8000",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Rate Limiting - if enabled
pub fn create_router(state: AppState) -> Router {
    let rate_limit = get_rate_limit_from_env();

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/connection-info", get(handlers::connection_info_handler))
        .route("/api/queries", get(handlers::queries_handler))
        .route("/api/search/{query_set_name}", get(handlers::search_handler))
        .route("/api/nodes/{node_id}/neighbors", get(handlers::neighbors_handler))
        .route(
            "/api/nodes/{node_id}/properties",
            get(handlers::node_properties_handler),
        )
        .route(
            "/api/edges/{edge_id}/properties",
            get(handlers::edge_properties_handler),
        )
        .route("/api/chart/{query_set_name}", get(handlers::chart_handler));

    if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer()),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve until Ctrl+C.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), GraphLensError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| GraphLensError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("GraphLens HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GraphLensError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
