//! # Neo4j Store Adapter
//!
//! Connects the synchronous core to Neo4j through the HTTP Query API
//! (`POST {uri}/db/{database}/query/v2`, typed JSON responses).
//!
//! The core calls [`StoreExecutor::execute`] from blocking threads; each call
//! is bridged onto the async `reqwest` client through the tokio runtime
//! handle captured when the connector was built. Never call it from inside an
//! async task.

pub mod decode;

use crate::config::Settings;
use graphlens_core::{Connector, GraphLensError, QueryParams, ResultSet, StoreExecutor};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;

/// Media type of typed JSON responses.
pub const TYPED_JSON: &str = "application/vnd.neo4j.query";

/// Query used to verify a new connection.
pub const VERIFY_QUERY: &str = "RETURN 1 AS ok";

// =============================================================================
// ERRORS
// =============================================================================

/// Errors from the HTTP client layer.
#[derive(Debug, Error)]
pub enum StoreClientError {
    /// Cannot reach the store.
    #[error("Cannot connect to graph store at {0}")]
    Connection(String),

    /// 401 Unauthorized - invalid credentials.
    #[error("Unauthorized: invalid graph store credentials")]
    Unauthorized,

    /// The store rejected the query.
    #[error("{code}: {message}")]
    Query { code: String, message: String },

    /// The store returned a non-success status without an error body.
    #[error("Server error ({0}): {1}")]
    Server(u16, String),

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<StoreClientError> for GraphLensError {
    fn from(e: StoreClientError) -> Self {
        GraphLensError::Store(e.to_string())
    }
}

// =============================================================================
// CONNECTOR
// =============================================================================

/// Opens [`Neo4jConnection`]s from process settings.
#[derive(Clone)]
pub struct Neo4jConnector {
    endpoint: String,
    user: String,
    password: String,
    database: String,
    timeout: Duration,
    runtime: Handle,
}

impl Neo4jConnector {
    /// Build a connector. `settings.neo4j_uri` must be an `http(s)://` base URL.
    pub fn new(settings: &Settings, runtime: Handle) -> Result<Self, GraphLensError> {
        let base = settings.neo4j_uri.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(GraphLensError::Config(format!(
                "neo4j_uri must be an http:// or https:// URL for the Query API, got '{}'",
                settings.neo4j_uri
            )));
        }

        Ok(Self {
            endpoint: query_endpoint(base, &settings.neo4j_database),
            user: settings.neo4j_user.clone(),
            password: settings.neo4j_password.clone(),
            database: settings.neo4j_database.clone(),
            timeout: Duration::from_secs(settings.request_timeout_secs),
            runtime,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Query API endpoint for a database.
#[must_use]
pub fn query_endpoint(base_uri: &str, database: &str) -> String {
    format!("{}/db/{}/query/v2", base_uri.trim_end_matches('/'), database)
}

impl Connector for Neo4jConnector {
    type Connection = Neo4jConnection;

    fn connect(&self) -> Result<Neo4jConnection, GraphLensError> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| GraphLensError::Store(format!("Cannot build HTTP client: {}", e)))?;

        let connection = Neo4jConnection {
            http,
            endpoint: self.endpoint.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            runtime: self.runtime.clone(),
        };
        connection.execute(VERIFY_QUERY, &QueryParams::new())?;
        Ok(connection)
    }

    fn target(&self) -> String {
        format!("{} (database '{}', user '{}')", self.endpoint, self.database, self.user)
    }
}

// =============================================================================
// CONNECTION
// =============================================================================

/// A verified Query API client. Cheap to share; `reqwest` pools connections.
pub struct Neo4jConnection {
    http: reqwest::Client,
    endpoint: String,
    user: String,
    password: String,
    runtime: Handle,
}

impl Neo4jConnection {
    async fn run(&self, query: &str, params: &QueryParams) -> Result<ResultSet, StoreClientError> {
        let body = json!({
            "statement": query,
            "parameters": params.to_json(),
        });

        let response = self
            .http
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .header(ACCEPT, TYPED_JSON)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreClientError::Connection(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(StoreClientError::Unauthorized);
        }

        let text = response
            .text()
            .await
            .map_err(|e| StoreClientError::Parse(e.to_string()))?;
        let parsed: Result<Value, _> = serde_json::from_str(&text);

        match parsed {
            Ok(body) => {
                if let Some(error) = decode::first_error(&body) {
                    return Err(error);
                }
                if !status.is_success() {
                    return Err(StoreClientError::Server(status.as_u16(), text));
                }
                decode::decode_response(&body)
            }
            Err(_) if !status.is_success() => Err(StoreClientError::Server(status.as_u16(), text)),
            Err(e) => Err(StoreClientError::Parse(e.to_string())),
        }
    }
}

impl StoreExecutor for Neo4jConnection {
    fn execute(&self, query: &str, params: &QueryParams) -> Result<ResultSet, GraphLensError> {
        self.runtime
            .block_on(self.run(query, params))
            .map_err(|e| {
                tracing::error!("Graph store query failed: {}", e);
                GraphLensError::from(e)
            })
    }
}

// =============================================================================
// TESTS
// =============================================================================
