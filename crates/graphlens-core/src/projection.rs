//! # Graph Projector
//!
//! Turns a record set into a visualization model: nodes, edges and compound
//! group nodes, serialized as Cytoscape-style `{"data": {...}}` elements.
//!
//! Two projections exist:
//!
//! - **Primary** (also used for table-style queries): every store identity is
//!   projected at most once. Nodes and relationships are found at the top level
//!   of each record and inside nested lists and maps.
//! - **Drill-down** (`neighbors`): each record contributes one relationship and
//!   its end node. The child is projected under the synthetic identity
//!   `<relId>_<childId>` and the edge hangs off the identity the caller clicked,
//!   so the rendered structure stays a tree even when the store graph is cyclic
//!   or diamond-shaped.

use crate::params::synthesize_identity;
use crate::primitives::{DEFAULT_CAPTION_PROPERTY, FALLBACK_NODE_LABEL};
use crate::registry::{QuerySet, VisualMapping};
use crate::{GraphValue, RawRecord, StoreNode, StoreRelationship};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// PROJECTED TYPES
// =============================================================================

/// A node of the visualization model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedNode {
    /// Store identity (primary) or synthetic identity (drill-down).
    pub id: String,
    pub label: String,
    /// Caption.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    /// Compound group this node is nested in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// True store identity, set when `id` is synthetic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_element_id: Option<String>,
}

/// An edge of the visualization model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedEdge {
    /// Store relationship identity.
    pub id: String,
    pub source: String,
    pub target: String,
    /// Relationship type.
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// A compound container node, one per distinct community value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNode {
    pub id: String,
}

/// Payload of a graph element.
///
/// Variant order matters for deserialization: edges carry the most fields,
/// groups the fewest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementData {
    Edge(ProjectedEdge),
    Node(ProjectedNode),
    Group(GroupNode),
}

/// One element of the flattened graph sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphElement {
    pub data: ElementData,
}

/// Projection result before flattening.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub nodes: Vec<ProjectedNode>,
    pub edges: Vec<ProjectedEdge>,
    pub groups: Vec<GroupNode>,
}

impl Projection {
    /// Flatten into one sequence: nodes, then edges, then groups.
    #[must_use]
    pub fn into_elements(self) -> Vec<GraphElement> {
        let nodes = self.nodes.into_iter().map(ElementData::Node);
        let edges = self.edges.into_iter().map(ElementData::Edge);
        let groups = self.groups.into_iter().map(ElementData::Group);
        nodes
            .chain(edges)
            .chain(groups)
            .map(|data| GraphElement { data })
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.groups.is_empty()
    }
}

// =============================================================================
// PROJECTOR
// =============================================================================

/// Projects records using a query set's caption rule and visual mapping.
#[derive(Debug, Clone, Copy)]
pub struct GraphProjector<'a> {
    caption_property: &'a str,
    mapping: &'a VisualMapping,
}

impl<'a> GraphProjector<'a> {
    #[must_use]
    pub fn new(caption_property: &'a str, mapping: &'a VisualMapping) -> Self {
        Self {
            caption_property,
            mapping,
        }
    }

    /// Projector configured from a query set.
    #[must_use]
    pub fn for_query_set(set: &'a QuerySet) -> Self {
        Self::new(&set.caption_property, &set.mapping)
    }

    /// Primary projection: dedup by store identity.
    ///
    /// Relationships whose endpoints are not among the projected nodes are
    /// dropped so every edge resolves within the response.
    #[must_use]
    pub fn project_primary(&self, records: &[RawRecord]) -> Projection {
        let mut builder = ProjectionBuilder::default();

        for record in records {
            for value in record.values() {
                self.visit_primary(value, &mut builder);
            }
        }

        let dangling = builder.drop_dangling_edges();
        if dangling > 0 {
            tracing::debug!(dangling, "Dropped edges without projected endpoints");
        }
        builder.finish()
    }

    fn visit_primary(&self, value: &GraphValue, builder: &mut ProjectionBuilder) {
        match value {
            GraphValue::Node(node) => {
                if !builder.has_node(&node.element_id) {
                    let projected = self.project_node(node, node.element_id.clone(), None, builder);
                    builder.push_node(projected);
                }
            }
            GraphValue::Relationship(rel) => {
                if !builder.has_edge(&rel.element_id) {
                    let edge = self.project_edge(rel, rel.start_id.clone(), rel.end_id.clone());
                    builder.push_edge(edge);
                }
            }
            GraphValue::List(items) => {
                for item in items {
                    self.visit_primary(item, builder);
                }
            }
            GraphValue::Map(map) => {
                for item in map.values() {
                    self.visit_primary(item, builder);
                }
            }
            _ => {}
        }
    }

    /// Drill-down projection anchored at `clicked_id`.
    ///
    /// When no clicked identity is known, the relationship's start node is
    /// used as the edge source.
    #[must_use]
    pub fn project_neighbors(&self, records: &[RawRecord], clicked_id: Option<&str>) -> Projection {
        let mut builder = ProjectionBuilder::default();

        for record in records {
            let mut nodes = Vec::new();
            let mut relationship = None;
            for value in record.values() {
                collect_entities(value, &mut nodes, &mut relationship);
            }

            let Some(rel) = relationship else {
                tracing::debug!("Skipping drill-down record without a relationship");
                continue;
            };
            if builder.has_edge(&rel.element_id) {
                continue;
            }
            let Some(child) = nodes.iter().find(|n| n.element_id == rel.end_id) else {
                tracing::debug!(
                    relationship = %rel.element_id,
                    end = %rel.end_id,
                    "Skipping drill-down record without its end node"
                );
                continue;
            };

            let child_id = synthesize_identity(&rel.element_id, &child.element_id);
            if !builder.has_node(&child_id) {
                let projected = self.project_node(
                    child,
                    child_id.clone(),
                    Some(child.element_id.clone()),
                    &mut builder,
                );
                builder.push_node(projected);
            }

            let source = clicked_id.unwrap_or(&rel.start_id).to_string();
            let edge = self.project_edge(rel, source, child_id);
            builder.push_edge(edge);
        }

        builder.finish()
    }

    fn project_node(
        &self,
        node: &StoreNode,
        id: String,
        original_element_id: Option<String>,
        builder: &mut ProjectionBuilder,
    ) -> ProjectedNode {
        let label = node.primary_label().unwrap_or(FALLBACK_NODE_LABEL).to_string();
        let name = node
            .property(self.caption_property)
            .and_then(GraphValue::to_text)
            .or_else(|| {
                node.property(DEFAULT_CAPTION_PROPERTY)
                    .and_then(GraphValue::to_text)
            })
            .unwrap_or_else(|| label.clone());

        let size = self
            .mapping
            .node_size
            .as_deref()
            .and_then(|key| node.property(key))
            .and_then(GraphValue::as_number);

        let parent = self
            .mapping
            .node_community
            .as_deref()
            .and_then(|key| node.property(key))
            .and_then(GraphValue::to_text);
        if let Some(group) = &parent {
            builder.register_group(group);
        }

        ProjectedNode {
            id,
            label,
            name,
            size,
            parent,
            original_element_id,
        }
    }

    fn project_edge(&self, rel: &StoreRelationship, source: String, target: String) -> ProjectedEdge {
        let weight = self
            .mapping
            .edge_weight
            .as_deref()
            .and_then(|key| rel.property(key))
            .and_then(GraphValue::as_number);

        ProjectedEdge {
            id: rel.element_id.clone(),
            source,
            target,
            label: rel.rel_type.clone(),
            weight,
        }
    }
}

/// Gather node values and the first relationship value of a record.
fn collect_entities<'v>(
    value: &'v GraphValue,
    nodes: &mut Vec<&'v StoreNode>,
    relationship: &mut Option<&'v StoreRelationship>,
) {
    match value {
        GraphValue::Node(node) => nodes.push(node),
        GraphValue::Relationship(rel) => {
            if relationship.is_none() {
                *relationship = Some(rel);
            }
        }
        GraphValue::List(items) => {
            for item in items {
                collect_entities(item, nodes, relationship);
            }
        }
        GraphValue::Map(map) => {
            for item in map.values() {
                collect_entities(item, nodes, relationship);
            }
        }
        _ => {}
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Accumulates projected elements in first-seen order with identity dedup.
#[derive(Debug, Default)]
struct ProjectionBuilder {
    nodes: Vec<ProjectedNode>,
    node_ids: BTreeSet<String>,
    edges: Vec<ProjectedEdge>,
    edge_ids: BTreeSet<String>,
    groups: BTreeSet<String>,
}

impl ProjectionBuilder {
    fn has_node(&self, id: &str) -> bool {
        self.node_ids.contains(id)
    }

    fn has_edge(&self, id: &str) -> bool {
        self.edge_ids.contains(id)
    }

    fn push_node(&mut self, node: ProjectedNode) {
        self.node_ids.insert(node.id.clone());
        self.nodes.push(node);
    }

    fn push_edge(&mut self, edge: ProjectedEdge) {
        self.edge_ids.insert(edge.id.clone());
        self.edges.push(edge);
    }

    fn register_group(&mut self, group: &str) {
        if !self.groups.contains(group) {
            self.groups.insert(group.to_string());
        }
    }

    /// Remove edges whose source or target is not a projected node.
    fn drop_dangling_edges(&mut self) -> usize {
        let before = self.edges.len();
        let node_ids = &self.node_ids;
        self.edges
            .retain(|e| node_ids.contains(&e.source) && node_ids.contains(&e.target));
        before - self.edges.len()
    }

    fn finish(self) -> Projection {
        Projection {
            nodes: self.nodes,
            edges: self.edges,
            groups: self.groups.into_iter().map(|id| GroupNode { id }).collect(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
