//! # graphlens-core
//!
//! The query dispatch and graph projection engine for GraphLens.
//!
//! A request names a query set and a query kind. The engine resolves the
//! query text from a declarative registry, fills parameter defaults, runs it
//! through a [`StoreExecutor`], and turns the heterogeneous result into:
//! - a JSON-safe tabular echo of every record (`serialize`)
//! - a deduplicated node/edge element list for a graph renderer (`projection`)
//! - or, for chart queries, parallel label/value series (`chart`)
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies. The store is reached through the
//!   blocking [`StoreExecutor`] seam; adapters live in the application crate.
//! - Deterministic output: every emitted collection is ordered.
//! - Nothing survives a request except the immutable [`QueryRegistry`] and the
//!   connection held by a [`ConnectionManager`].

// =============================================================================
// MODULES
// =============================================================================

pub mod chart;
pub mod connection;
pub mod executor;
pub mod params;
pub mod primitives;
pub mod projection;
pub mod query;
pub mod registry;
pub mod resolver;
pub mod serialize;
pub mod service;
pub mod temporal;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    GraphLensError, GraphValue, Properties, RawRecord, ResultSet, SpatialPoint, StoreNode,
    StoreRelationship,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use chart::{ChartData, ChartDataset, project_chart};
pub use connection::{ConnectionManager, Connector};
pub use executor::{ExecutedQuery, MemoryStore, StoreExecutor};
pub use params::{
    NormalizedParams, ParamDefaults, QueryParams, apply_defaults, is_synthetic, normalize,
    real_identity, synthesize_identity,
};
pub use projection::{
    ElementData, GraphElement, GraphProjector, GroupNode, ProjectedEdge, ProjectedNode, Projection,
};
pub use query::QueryKind;
pub use registry::{NeighborQueries, QueryRegistry, QuerySet, QuerySummary, VisualMapping};
pub use resolver::{ResolvedQuery, resolve};
pub use serialize::{JsonRecord, serialize_properties, serialize_record, serialize_records, serialize_value};
pub use service::{GraphResult, QueryOutcome, QueryService, TableResult};

// =============================================================================
// RE-EXPORTS: Temporal
// =============================================================================

pub use temporal::{IsoDuration, TemporalKind, TemporalParseError, TemporalValue};
