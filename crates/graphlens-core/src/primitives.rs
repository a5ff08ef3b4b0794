//! # Engine Primitives
//!
//! Compiled-in constants of the GraphLens engine. These are fixed at build
//! time; everything that varies per deployment lives in the query registry or
//! the process settings.

/// Default for the `limit` query parameter when the caller supplies none.
pub const DEFAULT_LIMIT: i64 = 10;

/// Separator between the relationship identity and the child identity in a
/// synthetic drill-down identity (`<relId>_<nodeId>`).
///
/// Store element identities never contain this character.
pub const SYNTHETIC_SEPARATOR: char = '_';

/// Reserved key of the node-type keyed `neighbors` mapping used when the
/// clicked node's type has no dedicated query.
pub const DEFAULT_NEIGHBOR_KEY: &str = "_default";

/// Property used for node captions unless a query set overrides it.
pub const DEFAULT_CAPTION_PROPERTY: &str = "name";

/// Label given to nodes that carry no label at all.
pub const FALLBACK_NODE_LABEL: &str = "Node";

/// Query set used for drill-down when the caller names none.
pub const DEFAULT_DRILLDOWN_QUERY_SET: &str = "default_graph";

/// Fetches a single node by element identity.
pub const NODE_PROPERTIES_QUERY: &str = "MATCH (n) WHERE elementId(n) = $node_id RETURN n";

/// Fetches the property map of a single relationship by element identity.
pub const EDGE_PROPERTIES_QUERY: &str =
    "MATCH ()-[r]-() WHERE elementId(r) = $edge_id RETURN properties(r) LIMIT 1";
