//! # Value Serializer
//!
//! Converts store values into JSON-safe values for the tabular echo of a
//! result set. Runs independently of graph projection and never fails:
//! anything it does not model passes through unchanged.

use crate::types::Properties;
use crate::{GraphValue, RawRecord, SpatialPoint};
use serde_json::{Map, Number, Value, json};

/// A record as JSON: column key → serialized value, in column order.
pub type JsonRecord = Map<String, Value>;

/// Serialize a single store value.
///
/// - temporal → canonical ISO-8601 text
/// - point → `{srid, x, y, z}`
/// - node → `{_type: "node", _labels, properties}`
/// - relationship → `{_type: "relationship", _relation_type, properties}`
/// - maps and lists → recursively serialized
/// - non-finite floats → `null`
#[must_use]
pub fn serialize_value(value: &GraphValue) -> Value {
    match value {
        GraphValue::Null => Value::Null,
        GraphValue::Bool(b) => Value::Bool(*b),
        GraphValue::Integer(i) => Value::Number((*i).into()),
        GraphValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        GraphValue::String(s) => Value::String(s.clone()),
        GraphValue::List(items) => Value::Array(items.iter().map(serialize_value).collect()),
        GraphValue::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), serialize_value(v)))
                .collect(),
        ),
        GraphValue::Node(node) => json!({
            "_type": "node",
            "_labels": node.labels,
            "properties": serialize_properties(&node.properties),
        }),
        GraphValue::Relationship(rel) => json!({
            "_type": "relationship",
            "_relation_type": rel.rel_type,
            "properties": serialize_properties(&rel.properties),
        }),
        GraphValue::Temporal(t) => Value::String(t.to_canonical()),
        GraphValue::Point(point) => serialize_point(point),
        GraphValue::Other(raw) => raw.clone(),
    }
}

/// Serialize a property mapping.
#[must_use]
pub fn serialize_properties(properties: &Properties) -> JsonRecord {
    properties
        .iter()
        .map(|(k, v)| (k.clone(), serialize_value(v)))
        .collect()
}

/// Serialize every column of a record.
#[must_use]
pub fn serialize_record(record: &RawRecord) -> JsonRecord {
    record
        .iter()
        .map(|(k, v)| (k.to_string(), serialize_value(v)))
        .collect()
}

/// Serialize every record of a result set.
#[must_use]
pub fn serialize_records(records: &[RawRecord]) -> Vec<JsonRecord> {
    records.iter().map(serialize_record).collect()
}

fn serialize_point(point: &SpatialPoint) -> Value {
    let coord = |c: f64| Number::from_f64(c).map_or(Value::Null, Value::Number);
    json!({
        "srid": point.srid,
        "x": coord(point.x),
        "y": coord(point.y),
        "z": point.z.map_or(Value::Null, coord),
    })
}

// =============================================================================
// TESTS
// =============================================================================
