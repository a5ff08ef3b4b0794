//! # Query Service
//!
//! The request-level entry points of the engine:
//! resolve → normalize → execute → {serialize, project} → respond.
//!
//! The service holds the immutable registry and the store executor; nothing
//! else is shared between requests.

use crate::chart::{ChartData, project_chart};
use crate::executor::StoreExecutor;
use crate::params::{NormalizedParams, ParamDefaults, QueryParams, apply_defaults, normalize, real_identity};
use crate::primitives::{EDGE_PROPERTIES_QUERY, NODE_PROPERTIES_QUERY};
use crate::projection::{GraphElement, GraphProjector};
use crate::query::QueryKind;
use crate::registry::{QueryRegistry, QuerySummary};
use crate::resolver::resolve;
use crate::serialize::{JsonRecord, serialize_properties, serialize_records, serialize_value};
use crate::{GraphLensError, GraphValue, ResultSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// Graph response: projected elements plus the JSON-safe echo of the records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphResult {
    pub graph: Vec<GraphElement>,
    pub records: Vec<JsonRecord>,
    pub keys: Vec<String>,
}

/// Tabular response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableResult {
    pub records: Vec<JsonRecord>,
    pub keys: Vec<String>,
}

impl TableResult {
    fn from_result_set(result: &ResultSet) -> Self {
        Self {
            records: serialize_records(&result.records),
            keys: result.keys.clone(),
        }
    }
}

/// Outcome of [`QueryService::resolve_and_run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Graph(GraphResult),
    Chart(ChartData),
}

impl QueryOutcome {
    /// The graph result, if this is one.
    #[must_use]
    pub fn into_graph(self) -> Option<GraphResult> {
        match self {
            Self::Graph(graph) => Some(graph),
            Self::Chart(_) => None,
        }
    }

    /// The chart payload, if this is one.
    #[must_use]
    pub fn into_chart(self) -> Option<ChartData> {
        match self {
            Self::Chart(chart) => Some(chart),
            Self::Graph(_) => None,
        }
    }
}

// =============================================================================
// SERVICE
// =============================================================================

/// Query dispatch and projection over a registry and a store executor.
pub struct QueryService<E> {
    registry: Arc<QueryRegistry>,
    executor: E,
    defaults: ParamDefaults,
}

impl<E: StoreExecutor> QueryService<E> {
    /// Create a service with the default parameter defaults.
    #[must_use]
    pub fn new(registry: Arc<QueryRegistry>, executor: E) -> Self {
        Self {
            registry,
            executor,
            defaults: ParamDefaults::default(),
        }
    }

    /// Override the injected parameter defaults.
    #[must_use]
    pub fn with_defaults(mut self, defaults: ParamDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &QueryRegistry {
        &self.registry
    }

    #[must_use]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    #[must_use]
    pub fn defaults(&self) -> ParamDefaults {
        self.defaults
    }

    /// Enabled query sets.
    #[must_use]
    pub fn list_available_queries(&self) -> Vec<QuerySummary> {
        self.registry.available()
    }

    /// Resolve a query set / kind pair, run it, and project the result.
    ///
    /// Fails with `NotFound` / `Forbidden` before anything reaches the store.
    pub fn resolve_and_run(
        &self,
        query_set: &str,
        kind: QueryKind,
        params: QueryParams,
    ) -> Result<QueryOutcome, GraphLensError> {
        let resolved = resolve(&self.registry, query_set, kind, &params)?;
        let NormalizedParams { params, clicked_id } = normalize(kind, params, self.defaults);

        tracing::info!(query_set, kind = %kind, "Executing query");
        let result = self.run(resolved.text, &params)?;

        if kind == QueryKind::Chart {
            return Ok(QueryOutcome::Chart(project_chart(&result)));
        }

        let projector = GraphProjector::for_query_set(resolved.set);
        let projection = if kind.is_drilldown() {
            projector.project_neighbors(&result.records, clicked_id.as_deref())
        } else {
            projector.project_primary(&result.records)
        };

        Ok(QueryOutcome::Graph(GraphResult {
            graph: projection.into_elements(),
            records: serialize_records(&result.records),
            keys: result.keys,
        }))
    }

    /// The paired table query of a query set, if configured.
    #[must_use]
    pub fn table_query_for(&self, query_set: &str) -> Option<&str> {
        self.registry
            .get(query_set)
            .and_then(|set| set.table_query.as_deref())
    }

    /// Run a table query. No query configured is an empty result, not an error.
    pub fn run_table_query(
        &self,
        query: Option<&str>,
        mut params: QueryParams,
    ) -> Result<TableResult, GraphLensError> {
        let Some(query) = query else {
            return Ok(TableResult::default());
        };
        apply_defaults(&mut params, self.defaults);
        let result = self.run(query, &params)?;
        Ok(TableResult::from_result_set(&result))
    }

    /// Properties of a node by real or synthetic identity. `None` when no node matches.
    pub fn lookup_node_properties(
        &self,
        id: &str,
    ) -> Result<Option<JsonRecord>, GraphLensError> {
        let params = QueryParams::new().with("node_id", real_identity(id));
        let result = self.run(NODE_PROPERTIES_QUERY, &params)?;

        let properties = result
            .records
            .first()
            .and_then(|record| record.first())
            .and_then(GraphValue::as_node)
            .map(|node| serialize_properties(&node.properties));

        if properties.is_none() {
            tracing::warn!("No node record found for node {}", id);
        }
        Ok(properties)
    }

    /// Properties of a relationship by real or synthetic identity. `None` when
    /// no relationship matches.
    pub fn lookup_edge_properties(
        &self,
        id: &str,
    ) -> Result<Option<JsonRecord>, GraphLensError> {
        let params = QueryParams::new().with("edge_id", real_identity(id));
        let result = self.run(EDGE_PROPERTIES_QUERY, &params)?;

        let properties = result
            .records
            .first()
            .and_then(|record| record.first())
            .and_then(|value| match value {
                GraphValue::Map(_) => serialize_value(value).as_object().cloned(),
                GraphValue::Relationship(rel) => Some(serialize_properties(&rel.properties)),
                _ => None,
            });

        if properties.is_none() {
            tracing::warn!("No properties record found for edge {}", id);
        }
        Ok(properties)
    }

    fn run(&self, query: &str, params: &QueryParams) -> Result<ResultSet, GraphLensError> {
        tracing::info!("Final Cypher Query:\n{}", query.trim());
        tracing::info!("Parameters: {}", params.to_json());
        let result = self.executor.execute(query, params)?;
        tracing::info!("Query returned {} records.", result.records.len());
        Ok(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================
