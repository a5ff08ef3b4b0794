//! # Chart Projection
//!
//! Reduces a record set into parallel label/value series. The query itself
//! does the bucketing and aggregation; this only reshapes its rows:
//! the first column becomes the label axis, each further column one dataset.

use crate::serialize::serialize_value;
use crate::{GraphValue, ResultSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One named value series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub label: String,
    /// One entry per label; `null` where the row had no numeric value.
    pub data: Vec<Value>,
}

/// Chart payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

/// Reshape a result set into chart series.
#[must_use]
pub fn project_chart(result: &ResultSet) -> ChartData {
    let Some((label_key, series_keys)) = result.keys.split_first() else {
        return ChartData::default();
    };

    let labels = result
        .records
        .iter()
        .map(|record| record.get(label_key).map(label_text).unwrap_or_default())
        .collect();

    let datasets = series_keys
        .iter()
        .map(|key| ChartDataset {
            label: key.clone(),
            data: result
                .records
                .iter()
                .map(|record| record.get(key).map_or(Value::Null, numeric_value))
                .collect(),
        })
        .collect();

    ChartData { labels, datasets }
}

fn label_text(value: &GraphValue) -> String {
    match value.to_text() {
        Some(text) => text,
        None if value.is_null() => String::new(),
        None => serialize_value(value).to_string(),
    }
}

fn numeric_value(value: &GraphValue) -> Value {
    match value {
        GraphValue::Integer(_) | GraphValue::Float(_) => serialize_value(value),
        _ => Value::Null,
    }
}

// =============================================================================
// TESTS
// =============================================================================
