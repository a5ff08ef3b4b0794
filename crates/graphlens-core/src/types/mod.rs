//! # Core Type Definitions
//!
//! This module contains the store-facing types of the GraphLens engine:
//! - Typed graph values as returned by the store (`GraphValue`)
//! - Store-native graph entities (`StoreNode`, `StoreRelationship`)
//! - Spatial values (`SpatialPoint`)
//! - Result containers (`RawRecord`, `ResultSet`)
//! - Error types (`GraphLensError`)
//!
//! Temporal values live in [`crate::temporal`]; projected output types live in
//! [`crate::projection`].

use crate::temporal::TemporalValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Property mapping of a node or relationship.
pub type Properties = BTreeMap<String, GraphValue>;

// =============================================================================
// GRAPH VALUE
// =============================================================================

/// A single typed value as returned by the graph store.
///
/// Every column of every record is one of these. The projector only looks at
/// `Node`, `Relationship` and `List`; the serializer handles all of them.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GraphValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<GraphValue>),
    Map(BTreeMap<String, GraphValue>),
    Node(StoreNode),
    Relationship(StoreRelationship),
    Temporal(TemporalValue),
    Point(SpatialPoint),
    /// A value kind the adapter does not model; passed through untouched.
    Other(serde_json::Value),
}

impl GraphValue {
    /// Returns the node if this value is one.
    #[must_use]
    pub fn as_node(&self) -> Option<&StoreNode> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Returns the relationship if this value is one.
    #[must_use]
    pub fn as_relationship(&self) -> Option<&StoreRelationship> {
        match self {
            Self::Relationship(rel) => Some(rel),
            _ => None,
        }
    }

    /// Numeric view of the value. Only integers and floats qualify.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) if f.is_finite() => Some(*f),
            _ => None,
        }
    }

    /// Text view of a scalar value, used for captions, group ids and chart labels.
    ///
    /// Returns `None` for null, containers and graph entities.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Temporal(t) => Some(t.to_canonical()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for GraphValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for GraphValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for GraphValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for GraphValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for GraphValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<StoreNode> for GraphValue {
    fn from(node: StoreNode) -> Self {
        Self::Node(node)
    }
}

impl From<StoreRelationship> for GraphValue {
    fn from(rel: StoreRelationship) -> Self {
        Self::Relationship(rel)
    }
}

impl From<TemporalValue> for GraphValue {
    fn from(t: TemporalValue) -> Self {
        Self::Temporal(t)
    }
}

impl From<SpatialPoint> for GraphValue {
    fn from(p: SpatialPoint) -> Self {
        Self::Point(p)
    }
}

// =============================================================================
// STORE ENTITIES
// =============================================================================

/// A node as returned by the store.
///
/// `element_id` is the store-assigned identity: opaque, stable per store
/// generation, and never containing the synthetic-identity separator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreNode {
    pub element_id: String,
    pub labels: Vec<String>,
    pub properties: Properties,
}

impl StoreNode {
    /// Create a node with the given identity and labels and no properties.
    #[must_use]
    pub fn new<I, L>(element_id: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            element_id: element_id.into(),
            labels: labels.into_iter().map(Into::into).collect(),
            properties: Properties::new(),
        }
    }

    /// Builder-style property setter.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<GraphValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The first label, if any.
    #[must_use]
    pub fn primary_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&GraphValue> {
        self.properties.get(key)
    }
}

/// A relationship as returned by the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreRelationship {
    pub element_id: String,
    pub rel_type: String,
    pub start_id: String,
    pub end_id: String,
    pub properties: Properties,
}

impl StoreRelationship {
    /// Create a relationship `start -[rel_type]-> end` with no properties.
    #[must_use]
    pub fn new(
        element_id: impl Into<String>,
        rel_type: impl Into<String>,
        start_id: impl Into<String>,
        end_id: impl Into<String>,
    ) -> Self {
        Self {
            element_id: element_id.into(),
            rel_type: rel_type.into(),
            start_id: start_id.into(),
            end_id: end_id.into(),
            properties: Properties::new(),
        }
    }

    /// Builder-style property setter.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<GraphValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&GraphValue> {
        self.properties.get(key)
    }
}

// =============================================================================
// SPATIAL
// =============================================================================

/// A spatial point value. `z` is only present for 3-D reference systems.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialPoint {
    pub srid: u32,
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl SpatialPoint {
    #[must_use]
    pub const fn new_2d(srid: u32, x: f64, y: f64) -> Self {
        Self { srid, x, y, z: None }
    }

    #[must_use]
    pub const fn new_3d(srid: u32, x: f64, y: f64, z: f64) -> Self {
        Self {
            srid,
            x,
            y,
            z: Some(z),
        }
    }
}

// =============================================================================
// RESULT CONTAINERS
// =============================================================================

/// One result row: an ordered mapping from column key to value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord {
    fields: Vec<(String, GraphValue)>,
}

impl RawRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column append. Column order is insertion order.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<GraphValue>) -> Self {
        self.push(key, value);
        self
    }

    /// Append a column.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<GraphValue>) {
        self.fields.push((key.into(), value.into()));
    }

    /// Lookup a column by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&GraphValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterate `(key, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &GraphValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate values in column order.
    pub fn values(&self) -> impl Iterator<Item = &GraphValue> {
        self.fields.iter().map(|(_, v)| v)
    }

    /// First column value, if any.
    #[must_use]
    pub fn first(&self) -> Option<&GraphValue> {
        self.fields.first().map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, GraphValue)> for RawRecord {
    fn from_iter<T: IntoIterator<Item = (String, GraphValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// The full materialized result of one store call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    /// Column keys in store order.
    pub keys: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl ResultSet {
    /// Create a result set with the given column keys and no records.
    #[must_use]
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            records: Vec::new(),
        }
    }

    /// Builder-style record append.
    #[must_use]
    pub fn with_record(mut self, record: RawRecord) -> Self {
        self.records.push(record);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the GraphLens engine.
///
/// The HTTP layer maps the first three variants 1:1:
/// - `NotFound` → bad request
/// - `Forbidden` → not permitted
/// - `Store` → opaque internal failure (detail stays in server logs)
#[derive(Debug, Error)]
pub enum GraphLensError {
    /// Unknown query set, unknown query kind, or unknown node type without a default.
    #[error("{0}")]
    NotFound(String),

    /// The query set exists but is disabled.
    #[error("{0}")]
    Forbidden(String),

    /// The store failed to execute a query (connectivity, syntax, timeout).
    #[error("Store error: {0}")]
    Store(String),

    /// The query registry document could not be parsed.
    #[error("Registry error: {0}")]
    Registry(String),

    /// Process settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================
