//! # Query Registry
//!
//! The declarative mapping of query-set name → [`QuerySet`], loaded once from a
//! YAML document at startup and read-only afterwards. Re-creating the registry
//! is the only supported refresh.
//!
//! ```yaml
//! acct_graph:
//!   enabled: true
//!   display_name: Account graph
//!   caption_property: title
//!   mapping:
//!     node_size: balance
//!     node_community: dept
//!   primary: |
//!     MATCH (a:Account)-[r]->(b) RETURN a, r, b LIMIT $limit
//!   neighbors:
//!     Account: MATCH (a)-[r]->(b) WHERE elementId(a) = $node_id RETURN r, b
//!     _default: MATCH (a)-[r]->(b) WHERE elementId(a) = $node_id RETURN r, b
//!   table_query: MATCH (a:Account) RETURN a.name AS name LIMIT $limit
//! ```

use crate::primitives::{DEFAULT_CAPTION_PROPERTY, DEFAULT_NEIGHBOR_KEY};
use crate::GraphLensError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// =============================================================================
// QUERY SET
// =============================================================================

/// Property names used to drive visual encodings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_community: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_weight: Option<String>,
}

/// Drill-down query texts.
///
/// Registries written against the older contract carry a single query string
/// that serves every node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NeighborQueries {
    Single(String),
    ByType(BTreeMap<String, String>),
}

impl NeighborQueries {
    /// Select the query for a node type, falling back to the `_default` entry.
    #[must_use]
    pub fn select(&self, node_type: &str) -> Option<&str> {
        match self {
            Self::Single(query) => Some(query.as_str()),
            Self::ByType(by_type) => by_type
                .get(node_type)
                .or_else(|| by_type.get(DEFAULT_NEIGHBOR_KEY))
                .map(String::as_str),
        }
    }
}

/// A named bundle of query texts plus display and visual metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySet {
    /// Registry key; filled in from the document key on load.
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_caption_property")]
    pub caption_property: String,
    #[serde(default)]
    pub mapping: VisualMapping,
    #[serde(default)]
    pub colors: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub neighbors: Option<NeighborQueries>,
    #[serde(default)]
    pub table_query: Option<String>,
    #[serde(default)]
    pub chart: Option<String>,
}

fn default_caption_property() -> String {
    DEFAULT_CAPTION_PROPERTY.to_string()
}

impl QuerySet {
    /// Create a disabled query set with no queries.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: false,
            display_name: None,
            description: None,
            caption_property: default_caption_property(),
            mapping: VisualMapping::default(),
            colors: BTreeMap::new(),
            primary: None,
            neighbors: None,
            table_query: None,
            chart: None,
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_primary(mut self, query: impl Into<String>) -> Self {
        self.primary = Some(query.into());
        self
    }

    /// Add a node-type keyed drill-down query. Use `_default` for the fallback.
    #[must_use]
    pub fn with_neighbors(mut self, node_type: impl Into<String>, query: impl Into<String>) -> Self {
        let mut by_type = match self.neighbors.take() {
            Some(NeighborQueries::ByType(map)) => map,
            Some(NeighborQueries::Single(query)) => {
                BTreeMap::from([(DEFAULT_NEIGHBOR_KEY.to_string(), query)])
            }
            None => BTreeMap::new(),
        };
        by_type.insert(node_type.into(), query.into());
        self.neighbors = Some(NeighborQueries::ByType(by_type));
        self
    }

    #[must_use]
    pub fn with_table_query(mut self, query: impl Into<String>) -> Self {
        self.table_query = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_chart(mut self, query: impl Into<String>) -> Self {
        self.chart = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_mapping(mut self, mapping: VisualMapping) -> Self {
        self.mapping = mapping;
        self
    }

    #[must_use]
    pub fn with_caption_property(mut self, property: impl Into<String>) -> Self {
        self.caption_property = property.into();
        self
    }

    /// Display name, derived from the set name when not configured
    /// (`acct_graph` → `Acct Graph`).
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.display_name {
            return name.clone();
        }
        self.name
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.flat_map(char::to_lowercase))
                        .collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }

    /// Listing entry for this set.
    #[must_use]
    pub fn summary(&self) -> QuerySummary {
        QuerySummary {
            name: self.name.clone(),
            display_name: self.display_name(),
            description: self.description.clone().unwrap_or_default(),
            caption_property: self.caption_property.clone(),
            mapping: self.mapping.clone(),
            colors: self.colors.clone(),
        }
    }
}

/// Public description of an enabled query set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySummary {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub caption_property: String,
    pub mapping: VisualMapping,
    pub colors: BTreeMap<String, serde_json::Value>,
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Immutable registry of query sets, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct QueryRegistry {
    sets: BTreeMap<String, QuerySet>,
}

impl QueryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from already constructed query sets.
    pub fn from_sets(sets: impl IntoIterator<Item = QuerySet>) -> Self {
        Self {
            sets: sets
                .into_iter()
                .map(|set| (set.name.clone(), set))
                .collect(),
        }
    }

    /// Parse a registry from YAML text. An empty document is an empty registry.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, GraphLensError> {
        if yaml.trim().is_empty() {
            return Ok(Self::new());
        }
        let parsed: Option<BTreeMap<String, QuerySet>> = serde_yaml::from_str(yaml)
            .map_err(|e| GraphLensError::Registry(format!("Invalid query registry: {}", e)))?;

        let sets = parsed
            .unwrap_or_default()
            .into_iter()
            .map(|(name, mut set)| {
                set.name.clone_from(&name);
                (name, set)
            })
            .collect();

        Ok(Self { sets })
    }

    /// Load a registry from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphLensError> {
        let path = path.as_ref();
        tracing::info!("Loading queries from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            GraphLensError::Io(format!("Cannot read query registry '{}': {}", path.display(), e))
        })?;
        let registry = Self::from_yaml_str(&content)?;
        tracing::info!(
            total = registry.len(),
            enabled = registry.iter().filter(|s| s.enabled).count(),
            "Query registry loaded"
        );
        Ok(registry)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&QuerySet> {
        self.sets.get(name)
    }

    /// All query sets in name order.
    pub fn iter(&self) -> impl Iterator<Item = &QuerySet> {
        self.sets.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Summaries of every enabled query set, in name order.
    #[must_use]
    pub fn available(&self) -> Vec<QuerySummary> {
        self.iter()
            .filter(|set| set.enabled)
            .map(QuerySet::summary)
            .collect()
    }

    /// Structural problems a maintainer should fix. An empty list means the
    /// registry is usable as-is.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for set in self.iter().filter(|s| s.enabled) {
            if set.primary.as_deref().is_none_or(|q| q.trim().is_empty()) {
                issues.push(format!("Query set '{}' is enabled but has no primary query", set.name));
            }
            if let Some(NeighborQueries::ByType(by_type)) = &set.neighbors {
                for (node_type, query) in by_type {
                    if query.trim().is_empty() {
                        issues.push(format!(
                            "Query set '{}' has an empty neighbors query for '{}'",
                            set.name, node_type
                        ));
                    }
                }
            }
        }
        issues
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r##"
acct_graph:
  enabled: true
  description: Accounts and transfers
  mapping:
    node_community: dept
  colors:
    Account: "#1f77b4"
  primary: MATCH (a)-[r]->(b) RETURN a, r, b LIMIT $limit
  neighbors:
    Account: MATCH (a:Account)-[r]->(b) RETURN r, b
    _default: MATCH (a)-[r]->(b) RETURN r, b
  table_query: MATCH (a) RETURN a.name AS name
legacy_graph:
  enabled: true
  display_name: Legacy
  caption_property: title
  primary: MATCH (n) RETURN n
  neighbors: MATCH (a)-[r]->(b) RETURN r, b
hidden_graph:
  enabled: false
  primary: MATCH (n) RETURN n
"##;

    #[test]
    fn parses_query_sets_and_names_them() {
        let registry = QueryRegistry::from_yaml_str(REGISTRY).expect("parse");
        assert_eq!(registry.len(), 3);

        let acct = registry.get("acct_graph").expect("acct");
        assert_eq!(acct.name, "acct_graph");
        assert!(acct.enabled);
        assert_eq!(acct.caption_property, "name");
        assert_eq!(acct.mapping.node_community.as_deref(), Some("dept"));
        assert!(acct.chart.is_none());
        assert_eq!(acct.colors.get("Account"), Some(&serde_json::json!("#1f77b4")));
    }

    #[test]
    fn neighbor_dispatch_with_default() {
        let registry = QueryRegistry::from_yaml_str(REGISTRY).expect("parse");
        let neighbors = registry
            .get("acct_graph")
            .and_then(|s| s.neighbors.as_ref())
            .expect("neighbors");

        assert_eq!(
            neighbors.select("Account"),
            Some("MATCH (a:Account)-[r]->(b) RETURN r, b")
        );
        assert_eq!(neighbors.select("Person"), Some("MATCH (a)-[r]->(b) RETURN r, b"));
    }

    #[test]
    fn legacy_single_neighbors_query_serves_every_type() {
        let registry = QueryRegistry::from_yaml_str(REGISTRY).expect("parse");
        let legacy = registry.get("legacy_graph").expect("legacy");
        let neighbors = legacy.neighbors.as_ref().expect("neighbors");
        assert_eq!(neighbors.select("Anything"), Some("MATCH (a)-[r]->(b) RETURN r, b"));
        assert_eq!(legacy.caption_property, "title");
    }

    #[test]
    fn available_lists_enabled_only() {
        let registry = QueryRegistry::from_yaml_str(REGISTRY).expect("parse");
        let names: Vec<_> = registry.available().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["acct_graph", "legacy_graph"]);
    }

    #[test]
    fn display_name_defaults_to_title_case() {
        assert_eq!(QuerySet::new("acct_graph").display_name(), "Acct Graph");
        let mut set = QuerySet::new("x");
        set.display_name = Some("Custom".into());
        assert_eq!(set.display_name(), "Custom");
    }

    #[test]
    fn empty_document_is_empty_registry() {
        let registry = QueryRegistry::from_yaml_str("").expect("parse");
        assert!(registry.is_empty());
    }

    #[test]
    fn malformed_document_is_registry_error() {
        let result = QueryRegistry::from_yaml_str("acct_graph: [1, 2");
        assert!(matches!(result, Err(GraphLensError::Registry(_))));
    }

    #[test]
    fn validate_flags_enabled_set_without_primary() {
        let registry = QueryRegistry::from_sets([
            QuerySet::new("ok").enabled(true).with_primary("MATCH (n) RETURN n"),
            QuerySet::new("broken").enabled(true),
            QuerySet::new("off"),
        ]);
        let issues = registry.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("broken"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("queries.yaml");
        std::fs::write(&path, REGISTRY).expect("write");

        let registry = QueryRegistry::load(&path).expect("load");
        assert_eq!(registry.available().len(), 2);

        let missing = QueryRegistry::load(dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(GraphLensError::Io(_))));
    }
}
