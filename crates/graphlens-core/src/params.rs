//! # Query Parameters
//!
//! Per-request parameter mapping, default injection, and the synthetic
//! identity scheme used by drill-down projections.
//!
//! A synthetic identity is `<relationshipId>_<childNodeId>`. It is opaque to
//! every part of the engine except [`real_identity`], which recovers the store
//! identity before anything is sent to the store.

use crate::primitives::{DEFAULT_LIMIT, SYNTHETIC_SEPARATOR};
use crate::query::QueryKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// =============================================================================
// SYNTHETIC IDENTITIES
// =============================================================================

/// Build the synthetic identity of a drill-down child.
#[must_use]
pub fn synthesize_identity(relationship_id: &str, child_id: &str) -> String {
    format!("{relationship_id}{SYNTHETIC_SEPARATOR}{child_id}")
}

/// Whether an identity was produced by [`synthesize_identity`].
#[must_use]
pub fn is_synthetic(id: &str) -> bool {
    id.contains(SYNTHETIC_SEPARATOR)
}

/// The store identity behind an identity: the text after the last separator
/// for synthetic identities, the identity itself otherwise.
///
/// Nested drill-downs always synthesize from the child's *real* identity, so
/// the trailing segment is a store identity at any depth.
#[must_use]
pub fn real_identity(id: &str) -> &str {
    id.rsplit_once(SYNTHETIC_SEPARATOR)
        .map_or(id, |(_, real)| real)
}

// =============================================================================
// QUERY PARAMS
// =============================================================================

/// Parameter mapping bound to a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, Value>);

impl QueryParams {
    /// Create an empty parameter mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert a parameter only if the key is absent. Returns whether it was inserted.
    pub fn set_default(&mut self, key: &str, value: impl Into<Value>) -> bool {
        if self.0.contains_key(key) {
            return false;
        }
        self.0.insert(key.to_string(), value.into());
        true
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String parameter, if present and a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The parameters as a JSON object, as sent to the store.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// =============================================================================
// NORMALIZER
// =============================================================================

/// Defaults injected into every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDefaults {
    pub limit: i64,
}

impl Default for ParamDefaults {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Parameters ready for the store, plus the drill-down anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedParams {
    /// What the store receives. Never contains a synthetic identity.
    pub params: QueryParams,
    /// The identity the caller expanded (synthetic or real), for `neighbors`.
    pub clicked_id: Option<String>,
}

/// Inject `limit` / `text_search` defaults without overwriting caller values.
pub fn apply_defaults(params: &mut QueryParams, defaults: ParamDefaults) {
    params.set_default("limit", defaults.limit);
    params.set_default("text_search", Value::Null);
}

/// Prepare request parameters for execution.
///
/// For `neighbors`, a synthetic `node_id` is captured as the clicked identity
/// and rewritten to its trailing store identity.
#[must_use]
pub fn normalize(kind: QueryKind, mut params: QueryParams, defaults: ParamDefaults) -> NormalizedParams {
    apply_defaults(&mut params, defaults);

    let clicked_id = if kind == QueryKind::Neighbors {
        params.get_str("node_id").map(str::to_string)
    } else {
        None
    };

    if let Some(clicked) = &clicked_id {
        let real = real_identity(clicked);
        if real != clicked {
            tracing::debug!(clicked = %clicked, real = %real, "Rewrote synthetic node id");
            params.insert("node_id", real);
        }
    }

    NormalizedParams { params, clicked_id }
}

// =============================================================================
// TESTS
// =============================================================================
