//! # Query Resolver
//!
//! Selects query text from the registry for a query-set / kind pair.
//! Pure: nothing here touches the store.

use crate::params::QueryParams;
use crate::query::QueryKind;
use crate::registry::{QueryRegistry, QuerySet};
use crate::GraphLensError;

/// A resolved query: the owning set and the text to run.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedQuery<'a> {
    pub set: &'a QuerySet,
    pub text: &'a str,
}

/// Resolve `kind` within the query set `name`.
///
/// # Errors
///
/// - `NotFound` for an unknown set, a missing query kind, or (for
///   `neighbors`) a node type with neither its own entry nor `_default`
/// - `Forbidden` for a disabled set
pub fn resolve<'a>(
    registry: &'a QueryRegistry,
    name: &str,
    kind: QueryKind,
    params: &QueryParams,
) -> Result<ResolvedQuery<'a>, GraphLensError> {
    let set = registry
        .get(name)
        .ok_or_else(|| GraphLensError::NotFound(format!("Query set '{}' not found.", name)))?;

    if !set.enabled {
        return Err(GraphLensError::Forbidden(format!(
            "Query set '{}' is disabled.",
            name
        )));
    }

    let missing_kind = || {
        GraphLensError::NotFound(format!(
            "Query type '{}' not found in query set '{}'.",
            kind, name
        ))
    };

    let text = match kind {
        QueryKind::Primary => set.primary.as_deref(),
        QueryKind::Table => set.table_query.as_deref(),
        QueryKind::Chart => set.chart.as_deref(),
        QueryKind::Neighbors => {
            let neighbors = set.neighbors.as_ref().ok_or_else(missing_kind)?;
            let node_type = params.get_str("node_type").unwrap_or_default();
            let text = neighbors.select(node_type).ok_or_else(|| {
                GraphLensError::NotFound(format!(
                    "Neighbor query for node type '{}' not found in query set '{}'.",
                    node_type, name
                ))
            })?;
            Some(text)
        }
    };

    let text = text.ok_or_else(missing_kind)?;
    Ok(ResolvedQuery { set, text })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> QueryRegistry {
        QueryRegistry::from_sets([
            QuerySet::new("acct_graph")
                .enabled(true)
                .with_primary("P")
                .with_neighbors("Account", "N-account")
                .with_neighbors("_default", "N-default"),
            QuerySet::new("typed_only")
                .enabled(true)
                .with_primary("P")
                .with_neighbors("Account", "N-account"),
            QuerySet::new("off_graph").with_primary("P"),
        ])
    }

    #[test]
    fn primary_text() {
        let registry = registry();
        let resolved = resolve(&registry, "acct_graph", QueryKind::Primary, &QueryParams::new())
            .expect("resolve");
        assert_eq!(resolved.text, "P");
        assert_eq!(resolved.set.name, "acct_graph");
    }

    #[test]
    fn unknown_set_is_not_found() {
        let err = resolve(&registry(), "nope", QueryKind::Primary, &QueryParams::new())
            .expect_err("unknown");
        assert!(matches!(err, GraphLensError::NotFound(_)));
        assert_eq!(err.to_string(), "Query set 'nope' not found.");
    }

    #[test]
    fn disabled_set_is_forbidden() {
        let err = resolve(&registry(), "off_graph", QueryKind::Primary, &QueryParams::new())
            .expect_err("disabled");
        assert!(matches!(err, GraphLensError::Forbidden(_)));
    }

    #[test]
    fn missing_kind_is_not_found() {
        let err = resolve(&registry(), "acct_graph", QueryKind::Chart, &QueryParams::new())
            .expect_err("no chart");
        assert_eq!(
            err.to_string(),
            "Query type 'chart' not found in query set 'acct_graph'."
        );
    }

    #[test]
    fn neighbors_dispatch_by_node_type() {
        let registry = registry();
        let params = QueryParams::new().with("node_type", "Account");
        let resolved =
            resolve(&registry, "acct_graph", QueryKind::Neighbors, &params).expect("resolve");
        assert_eq!(resolved.text, "N-account");

        let params = QueryParams::new().with("node_type", "Person");
        let resolved =
            resolve(&registry, "acct_graph", QueryKind::Neighbors, &params).expect("resolve");
        assert_eq!(resolved.text, "N-default");
    }

    #[test]
    fn neighbors_without_match_or_default_is_not_found() {
        let params = QueryParams::new().with("node_type", "Person");
        let err = resolve(&registry(), "typed_only", QueryKind::Neighbors, &params)
            .expect_err("no default");
        assert!(matches!(err, GraphLensError::NotFound(_)));
    }
}
