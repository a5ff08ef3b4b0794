//! # Typed JSON Decoding
//!
//! Decodes Query API responses (`application/vnd.neo4j.query`) into core
//! values. Every value arrives as `{"$type": ..., "_value": ...}`; integers
//! and floats may arrive as strings. Values that do not decode are kept as
//! raw JSON ([`GraphValue::Other`]) rather than failing the whole result.

use super::StoreClientError;
use graphlens_core::temporal::{TemporalKind, TemporalValue};
use graphlens_core::{
    GraphValue, Properties, RawRecord, ResultSet, SpatialPoint, StoreNode, StoreRelationship,
};
use serde_json::{Map, Value};

/// Decode a successful response body into a result set.
pub fn decode_response(body: &Value) -> Result<ResultSet, StoreClientError> {
    let data = body
        .get("data")
        .ok_or_else(|| StoreClientError::Parse("response has no 'data' member".to_string()))?;

    let keys: Vec<String> = data
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreClientError::Parse("response has no 'data.fields' array".to_string()))?
        .iter()
        .filter_map(|f| f.as_str().map(str::to_string))
        .collect();

    let rows = data
        .get("values")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreClientError::Parse("response has no 'data.values' array".to_string()))?;

    let mut result = ResultSet::new(keys.iter().map(String::as_str));
    for row in rows {
        let values = row
            .as_array()
            .ok_or_else(|| StoreClientError::Parse("result row is not an array".to_string()))?;
        if values.len() != keys.len() {
            return Err(StoreClientError::Parse(format!(
                "result row has {} values for {} fields",
                values.len(),
                keys.len()
            )));
        }
        let record: RawRecord = keys
            .iter()
            .cloned()
            .zip(values.iter().map(decode_value))
            .collect();
        result = result.with_record(record);
    }
    Ok(result)
}

/// The first error reported in a response body, if any.
pub fn first_error(body: &Value) -> Option<StoreClientError> {
    let error = body.get("errors")?.as_array()?.first()?;
    let text = |key: &str| {
        error
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Some(StoreClientError::Query {
        code: text("code"),
        message: text("message"),
    })
}

/// Decode one typed value. Plain JSON (no `$type`) is decoded structurally.
pub fn decode_value(value: &Value) -> GraphValue {
    let Some(type_name) = value.get("$type").and_then(Value::as_str) else {
        return decode_plain(value);
    };
    let inner = value.get("_value").unwrap_or(&Value::Null);

    let decoded = match type_name {
        "Null" => Some(GraphValue::Null),
        "Boolean" => inner.as_bool().map(GraphValue::Bool),
        "Integer" => decode_integer(inner),
        "Float" => decode_float(inner),
        "String" => inner.as_str().map(GraphValue::from),
        "List" | "Path" => inner
            .as_array()
            .map(|items| GraphValue::List(items.iter().map(decode_value).collect())),
        "Map" => inner.as_object().map(|map| GraphValue::Map(decode_map(map))),
        "Node" => inner.as_object().map(decode_node),
        "Relationship" => inner.as_object().map(decode_relationship),
        "Point" => inner.as_str().and_then(parse_point).map(GraphValue::Point),
        "Date" => decode_temporal(TemporalKind::Date, inner),
        "Time" => decode_temporal(TemporalKind::Time, inner),
        "LocalTime" => decode_temporal(TemporalKind::LocalTime, inner),
        "DateTime" | "OffsetDateTime" | "ZonedDateTime" => {
            decode_temporal(TemporalKind::DateTime, inner)
        }
        "LocalDateTime" => decode_temporal(TemporalKind::LocalDateTime, inner),
        "Duration" => decode_temporal(TemporalKind::Duration, inner),
        _ => None,
    };

    decoded.unwrap_or_else(|| {
        tracing::debug!(type_name, "Keeping undecoded store value as raw JSON");
        GraphValue::Other(value.clone())
    })
}

fn decode_plain(value: &Value) -> GraphValue {
    match value {
        Value::Null => GraphValue::Null,
        Value::Bool(b) => GraphValue::Bool(*b),
        Value::Number(n) => n
            .as_i64()
            .map(GraphValue::Integer)
            .or_else(|| n.as_f64().map(GraphValue::Float))
            .unwrap_or_else(|| GraphValue::Other(value.clone())),
        Value::String(s) => GraphValue::String(s.clone()),
        Value::Array(items) => GraphValue::List(items.iter().map(decode_value).collect()),
        Value::Object(map) => GraphValue::Map(decode_map(map)),
    }
}

fn decode_map(map: &Map<String, Value>) -> Properties {
    map.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect()
}

fn decode_integer(inner: &Value) -> Option<GraphValue> {
    match inner {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .map(GraphValue::Integer)
}

fn decode_float(inner: &Value) -> Option<GraphValue> {
    match inner {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .map(GraphValue::Float)
}

fn decode_temporal(kind: TemporalKind, inner: &Value) -> Option<GraphValue> {
    let text = inner.as_str()?;
    match TemporalValue::parse(kind, text) {
        Ok(value) => Some(GraphValue::Temporal(value)),
        Err(e) => {
            tracing::debug!("{}", e);
            None
        }
    }
}

fn string_member(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn properties_member(map: &Map<String, Value>) -> Properties {
    map.get("_properties")
        .and_then(Value::as_object)
        .map(decode_map)
        .unwrap_or_default()
}

fn decode_node(map: &Map<String, Value>) -> GraphValue {
    let labels: Vec<String> = map
        .get("_labels")
        .and_then(Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .filter_map(|l| l.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let mut node = StoreNode::new(string_member(map, "_element_id"), labels);
    node.properties = properties_member(map);
    GraphValue::Node(node)
}

fn decode_relationship(map: &Map<String, Value>) -> GraphValue {
    let mut rel = StoreRelationship::new(
        string_member(map, "_element_id"),
        string_member(map, "_type"),
        string_member(map, "_start_node_element_id"),
        string_member(map, "_end_node_element_id"),
    );
    rel.properties = properties_member(map);
    GraphValue::Relationship(rel)
}

/// Parse WKT-style point text: `SRID=4326;POINT (x y)` or `SRID=4979;POINT Z (x y z)`.
pub fn parse_point(text: &str) -> Option<SpatialPoint> {
    let (srid, shape) = text.trim().strip_prefix("SRID=")?.split_once(';')?;
    let srid: u32 = srid.trim().parse().ok()?;

    let shape = shape.trim().strip_prefix("POINT")?.trim_start();
    let shape = shape.strip_prefix('Z').unwrap_or(shape).trim();
    let coords = shape.strip_prefix('(')?.strip_suffix(')')?;

    let coords: Vec<f64> = coords
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;

    match coords.as_slice() {
        [x, y] => Some(SpatialPoint::new_2d(srid, *x, *y)),
        [x, y, z] => Some(SpatialPoint::new_3d(srid, *x, *y, *z)),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================
