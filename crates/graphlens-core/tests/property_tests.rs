//! # Property-Based Tests
//!
//! Projection and normalization invariants checked with proptest.

use graphlens_core::{
    ElementData, GraphProjector, IsoDuration, ParamDefaults, QueryKind, QueryParams, RawRecord,
    StoreNode, StoreRelationship, TemporalKind, TemporalValue, VisualMapping, normalize,
    real_identity,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Records `(a)-[r]->(b)` drawn from a small identity space so duplicates occur.
fn edge_records(pairs: &[(u8, u8)]) -> Vec<RawRecord> {
    pairs
        .iter()
        .map(|&(from, to)| {
            let a = StoreNode::new(format!("n{from}"), ["Account"]);
            let b = StoreNode::new(format!("n{to}"), ["Account"]);
            let r = StoreRelationship::new(
                format!("r{from}-{to}"),
                "PAYS",
                format!("n{from}"),
                format!("n{to}"),
            );
            RawRecord::new().with("a", a).with("r", r).with("b", b)
        })
        .collect()
}

/// Drill-down records `(clicked)-[r]->(child)`. The child is a function of the
/// relationship, and several relationships may reach the same child.
fn drilldown_records(rels: &[u8]) -> Vec<RawRecord> {
    rels.iter()
        .map(|&rel| {
            let child = format!("n{}", rel % 4);
            let r = StoreRelationship::new(format!("r{rel}"), "KNOWS", "root", child.clone());
            let b = StoreNode::new(child, ["Person"]);
            RawRecord::new().with("r", r).with("b", b)
        })
        .collect()
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Primary projection emits every store identity at most once, and every
    /// edge resolves to a node of the same response.
    #[test]
    fn primary_projection_is_deduplicated(pairs in vec((0u8..8, 0u8..8), 0..40)) {
        let mapping = VisualMapping::default();
        let projection = GraphProjector::new("name", &mapping).project_primary(&edge_records(&pairs));

        let node_ids: BTreeSet<_> = projection.nodes.iter().map(|n| n.id.clone()).collect();
        let edge_ids: BTreeSet<_> = projection.edges.iter().map(|e| e.id.clone()).collect();
        prop_assert_eq!(node_ids.len(), projection.nodes.len());
        prop_assert_eq!(edge_ids.len(), projection.edges.len());

        for edge in &projection.edges {
            prop_assert!(node_ids.contains(&edge.source));
            prop_assert!(node_ids.contains(&edge.target));
        }
    }

    /// Same records, same elements, same order.
    #[test]
    fn projection_is_deterministic(pairs in vec((0u8..8, 0u8..8), 0..40)) {
        let mapping = VisualMapping::default();
        let projector = GraphProjector::new("name", &mapping);
        let records = edge_records(&pairs);

        prop_assert_eq!(
            projector.project_primary(&records).into_elements(),
            projector.project_primary(&records).into_elements()
        );
    }

    /// Drill-down children never share an identity: one child per distinct
    /// relationship, each anchored at the clicked node.
    #[test]
    fn drilldown_projection_is_a_tree(rels in vec(0u8..16, 1..30)) {
        let mapping = VisualMapping::default();
        let projection = GraphProjector::new("name", &mapping)
            .project_neighbors(&drilldown_records(&rels), Some("clicked"));

        let distinct_rels: BTreeSet<_> = rels.iter().copied().collect();
        prop_assert_eq!(projection.nodes.len(), distinct_rels.len());
        prop_assert_eq!(projection.edges.len(), distinct_rels.len());

        let child_ids: BTreeSet<_> = projection.nodes.iter().map(|n| n.id.clone()).collect();
        for edge in &projection.edges {
            prop_assert_eq!(edge.source.as_str(), "clicked");
            prop_assert!(child_ids.contains(&edge.target));
        }
        for node in &projection.nodes {
            prop_assert_eq!(node.original_element_id.as_deref(), Some(real_identity(&node.id)));
        }
    }

    /// Defaults are filled but never overwrite caller values.
    #[test]
    fn defaults_never_overwrite_caller_values(
        limit in proptest::option::of(1i64..1000),
        search in proptest::option::of("[a-z]{1,8}"),
        default_limit in 1i64..100,
    ) {
        let mut params = QueryParams::new();
        if let Some(limit) = limit {
            params.insert("limit", limit);
        }
        if let Some(search) = &search {
            params.insert("text_search", search.as_str());
        }

        let normalized = normalize(QueryKind::Primary, params, ParamDefaults { limit: default_limit });
        prop_assert_eq!(
            normalized.params.get("limit").and_then(serde_json::Value::as_i64),
            Some(limit.unwrap_or(default_limit))
        );
        prop_assert_eq!(
            normalized.params.get_str("text_search").map(str::to_string),
            search
        );
        prop_assert!(normalized.params.contains_key("text_search"));
    }

    /// Canonical date text parses back to the same value.
    #[test]
    fn date_canonical_text_round_trips(y in 1i32..9999, m in 1u32..=12, d in 1u32..=28) {
        let text = format!("{y:04}-{m:02}-{d:02}");
        let value = TemporalValue::parse(TemporalKind::Date, &text).expect("date");
        prop_assert_eq!(value.to_canonical(), text);
    }

    /// Duration canonical text parses back to the same normalized duration.
    #[test]
    fn duration_canonical_text_round_trips(
        months in -100i64..100,
        days in -100i64..100,
        seconds in -100_000i64..100_000,
        nanos in 0i64..1_000_000_000,
    ) {
        let duration = IsoDuration::new(months, days, seconds, nanos);
        let parsed = IsoDuration::parse(&duration.to_canonical()).expect("duration");
        prop_assert_eq!(parsed, duration);
    }
}

// =============================================================================
// GROUP INVARIANTS
// =============================================================================

#[test]
fn groups_follow_nodes_and_are_unique() {
    let mapping = VisualMapping {
        node_community: Some("dept".into()),
        ..VisualMapping::default()
    };
    let records: Vec<RawRecord> = ["Ops", "Sales", "Ops"]
        .iter()
        .enumerate()
        .map(|(i, dept)| {
            RawRecord::new().with(
                "n",
                StoreNode::new(format!("n{i}"), ["Person"]).with_property("dept", *dept),
            )
        })
        .collect();

    let elements = GraphProjector::new("name", &mapping)
        .project_primary(&records)
        .into_elements();

    let groups: Vec<_> = elements
        .iter()
        .filter_map(|e| match &e.data {
            ElementData::Group(g) => Some(g.id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(groups, vec!["Ops", "Sales"]);
    assert!(matches!(elements.last().map(|e| &e.data), Some(ElementData::Group(_))));
}
