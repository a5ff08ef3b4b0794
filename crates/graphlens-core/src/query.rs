//! # Query Kinds
//!
//! The four request kinds a query set can serve. The kind is chosen once per
//! request; there are no kind-to-kind transitions mid-request.

use crate::GraphLensError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Query kind selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// The query set's main graph query.
    Primary,
    /// Drill-down from one clicked node, dispatched on its node type.
    Neighbors,
    /// The paired tabular query.
    Table,
    /// Label/value series for charting.
    Chart,
}

impl QueryKind {
    /// Lower-case name used in messages and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Neighbors => "neighbors",
            Self::Table => "table",
            Self::Chart => "chart",
        }
    }

    /// Whether the result is projected with drill-down synthetic identities.
    #[must_use]
    pub const fn is_drilldown(self) -> bool {
        matches!(self, Self::Neighbors)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = GraphLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Self::Primary),
            "neighbors" => Ok(Self::Neighbors),
            "table" | "table_query" => Ok(Self::Table),
            "chart" => Ok(Self::Chart),
            other => Err(GraphLensError::NotFound(format!(
                "Unknown query type '{}'.",
                other
            ))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
