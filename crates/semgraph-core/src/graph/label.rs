//! Graph labels: coarse categories attached to nodes and edges.
//!
//! Labels power set-valued queries ("all group-by attribute nodes") without
//! scanning the whole graph. A node or edge may carry several labels; the
//! graph maintains label-to-member multimaps as structure is added.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of node and edge labels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GraphLabel {
    /// Nodes selectable as group-by attributes (dimensions, entity keys,
    /// time dimensions and their truncations, metric time).
    GroupByAttribute,
    /// Metric nodes usable as group-bys through a correlating entity.
    GroupByMetric,
    /// Metric nodes of any kind.
    Metric,
    /// Local and joined model nodes.
    Model,
    /// Entity join-hop nodes.
    Entity,
    /// Time-machinery nodes and edges (time dimensions, truncations,
    /// metric-time plumbing).
    Time,
    /// Edges that cross a model join.
    Join,
    /// Edges from a complex metric to its input metrics.
    Composition,
}

impl GraphLabel {
    pub fn name(&self) -> &'static str {
        match self {
            GraphLabel::GroupByAttribute => "group_by_attribute",
            GraphLabel::GroupByMetric => "group_by_metric",
            GraphLabel::Metric => "metric",
            GraphLabel::Model => "model",
            GraphLabel::Entity => "entity",
            GraphLabel::Time => "time",
            GraphLabel::Join => "join",
            GraphLabel::Composition => "composition",
        }
    }
}

impl fmt::Display for GraphLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
