//! Edge weight functions.
//!
//! The depth-first engine knows nothing about semantics -- every domain rule
//! (tag gating, first-edge restrictions, filter-driven pruning) lives in a
//! [`WeightFunction`]. Returning [`EdgeWeight::Infinite`] removes an edge from
//! consideration for the current path without affecting other paths.

use crate::filtering::{ElementFilter, GroupByItemProperty};
use crate::graph::edge::{ComputationMethod, EdgeTypeTag, SemanticGraphEdge};
use crate::graph::label::GraphLabel;
use crate::pathfind::path::TraversalPath;

/// Cost of crossing an entity join.
pub const JOIN_EDGE_WEIGHT: u64 = 2;
/// Cost of every other traversable edge.
pub const STEP_EDGE_WEIGHT: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeWeight {
    Finite(u64),
    Infinite,
}

impl EdgeWeight {
    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    pub fn finite(&self) -> Option<u64> {
        match self {
            Self::Finite(weight) => Some(*weight),
            Self::Infinite => None,
        }
    }
}

/// Prices an edge in the context of the path about to cross it.
pub trait WeightFunction {
    fn edge_weight<P: TraversalPath>(&self, path: &P, edge: &SemanticGraphEdge) -> EdgeWeight;
}

/// Every edge costs one. Used by tests and unconstrained reachability walks.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitWeight;

impl WeightFunction for UnitWeight {
    fn edge_weight<P: TraversalPath>(&self, _path: &P, _edge: &SemanticGraphEdge) -> EdgeWeight {
        EdgeWeight::Finite(1)
    }
}

/// The weight function for group-by searches out of metric source nodes.
///
/// Encodes the traversal rules: a metric-source edge is only usable as the
/// first edge of a path, an edge whose required tags the path does not provide
/// is impassable, and edges that can only lead to items the filter excludes
/// wholesale are pruned early. Joins are priced at [`JOIN_EDGE_WEIGHT`] so
/// the path budget bounds join depth tighter than plain step depth.
#[derive(Debug, Clone)]
pub struct AttributeSearchWeights {
    filter: ElementFilter,
    metric_targets: bool,
}

impl AttributeSearchWeights {
    /// Search for group-by attributes; metric nodes are dead ends.
    pub fn for_attributes(filter: ElementFilter) -> Self {
        Self { filter, metric_targets: false }
    }

    /// Search for group-by metrics; edges into metric nodes stay open.
    pub fn for_metrics(filter: ElementFilter) -> Self {
        Self { filter, metric_targets: true }
    }
}

impl WeightFunction for AttributeSearchWeights {
    fn edge_weight<P: TraversalPath>(&self, path: &P, edge: &SemanticGraphEdge) -> EdgeWeight {
        // A metric's source edge anchors the path; it never appears mid-path.
        if edge.ty == EdgeTypeTag::MetricSource && path.edge_count() > 0 {
            return EdgeWeight::Infinite;
        }
        if !path.satisfies(&edge.required_tags) {
            return EdgeWeight::Infinite;
        }
        if !self.metric_targets && edge.head.labels().contains(&GraphLabel::Metric) {
            return EdgeWeight::Infinite;
        }

        // Subtree prunes: everything past these edges carries the excluded
        // property, so the filter could never admit any of it.
        if self.filter.excludes(GroupByItemProperty::Joined)
            && edge.ty == EdgeTypeTag::EntityRelationship
        {
            return EdgeWeight::Infinite;
        }
        match &edge.computation {
            ComputationMethod::DateExtract { .. }
                if self.filter.excludes(GroupByItemProperty::DatePart) =>
            {
                return EdgeWeight::Infinite;
            }
            ComputationMethod::DateTrunc { granularity }
                if granularity.is_custom()
                    && self.filter.excludes(GroupByItemProperty::CustomGranularity) =>
            {
                return EdgeWeight::Infinite;
            }
            _ => {}
        }

        if edge.ty == EdgeTypeTag::EntityRelationship {
            EdgeWeight::Finite(JOIN_EDGE_WEIGHT)
        } else {
            EdgeWeight::Finite(STEP_EDGE_WEIGHT)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::SemanticGraphNode;
    use crate::graph::SemanticGraph;
    use crate::pathfind::path::NodeEdgePath;
    use semgraph_manifest::{
        DatePart, DimensionReference, EntityReference, ExpandedTimeGranularity, MetricReference,
        ModelReference, TimeGranularity,
    };

    fn model_node(name: &str) -> SemanticGraphNode {
        SemanticGraphNode::LocalModel { model: ModelReference::new(name) }
    }

    fn source_edge() -> SemanticGraphEdge {
        SemanticGraphEdge::new(
            SemanticGraphNode::SimpleMetric { metric: MetricReference::new("bookings") },
            model_node("bookings_source"),
            EdgeTypeTag::MetricSource,
            ComputationMethod::CoLocatedInModel { model: ModelReference::new("bookings_source") },
        )
    }

    fn join_edge() -> SemanticGraphEdge {
        SemanticGraphEdge::new(
            SemanticGraphNode::Entity { entity: EntityReference::new("listing") },
            SemanticGraphNode::JoinedModel { model: ModelReference::new("listings_latest") },
            EdgeTypeTag::EntityRelationship,
            ComputationMethod::JoinedViaEntity {
                entity: EntityReference::new("listing"),
                model: ModelReference::new("listings_latest"),
                validity: None,
            },
        )
    }

    fn seeded_path(graph: &SemanticGraph, node: SemanticGraphNode) -> NodeEdgePath {
        let handle = graph.node_handle(&node).unwrap();
        NodeEdgePath::starting_at(graph, handle)
    }

    #[test]
    fn metric_source_is_only_passable_as_first_edge() {
        let mut graph = SemanticGraph::empty();
        let source = graph.insert_edge(source_edge());
        let seed = graph.edge_tail(source).unwrap();

        let weights = AttributeSearchWeights::for_attributes(ElementFilter::new());
        let mut path = NodeEdgePath::starting_at(&graph, seed);
        assert!(!weights.edge_weight(&path, graph.edge(source).unwrap()).is_infinite());

        path.append_edge(&graph, source);
        assert!(weights.edge_weight(&path, graph.edge(source).unwrap()).is_infinite());
    }

    #[test]
    fn unsatisfied_required_tags_close_the_edge() {
        let mut graph = SemanticGraph::empty();
        let gated = SemanticGraphEdge::new(
            model_node("bookings_source"),
            SemanticGraphNode::TimeAttribute {
                source: crate::graph::node::TimeAttributeSource::TimeDimension {
                    dimension: DimensionReference::new("ds"),
                },
                access: crate::graph::node::TimeAccess::Granularity(
                    ExpandedTimeGranularity::from_standard(TimeGranularity::Month),
                ),
            },
            EdgeTypeTag::OneToOne,
            ComputationMethod::DateTrunc {
                granularity: ExpandedTimeGranularity::from_standard(TimeGranularity::Month),
            },
        )
        .requires(crate::graph::edge::TraversalTag::GrainQueryable(TimeGranularity::Month));
        let handle = graph.insert_edge(gated);

        let weights = AttributeSearchWeights::for_attributes(ElementFilter::new());
        let path = seeded_path(&graph, model_node("bookings_source"));
        assert!(weights.edge_weight(&path, graph.edge(handle).unwrap()).is_infinite());
    }

    #[test]
    fn metric_heads_are_dead_ends_unless_searching_for_metrics() {
        let mut graph = SemanticGraph::empty();
        let into_metric = SemanticGraphEdge::new(
            SemanticGraphNode::Entity { entity: EntityReference::new("listing") },
            SemanticGraphNode::SimpleMetric { metric: MetricReference::new("bookings") },
            EdgeTypeTag::AttributeSource,
            ComputationMethod::JoinedViaEntity {
                entity: EntityReference::new("listing"),
                model: ModelReference::new("bookings_source"),
                validity: None,
            },
        );
        let handle = graph.insert_edge(into_metric);
        let path = seeded_path(
            &graph,
            SemanticGraphNode::Entity { entity: EntityReference::new("listing") },
        );

        let attributes = AttributeSearchWeights::for_attributes(ElementFilter::new());
        assert!(attributes.edge_weight(&path, graph.edge(handle).unwrap()).is_infinite());

        let metrics = AttributeSearchWeights::for_metrics(ElementFilter::new());
        assert_eq!(
            metrics.edge_weight(&path, graph.edge(handle).unwrap()).finite(),
            Some(STEP_EDGE_WEIGHT),
        );
    }

    #[test]
    fn joins_cost_more_than_steps_and_can_be_pruned() {
        let mut graph = SemanticGraph::empty();
        let handle = graph.insert_edge(join_edge());
        let path = seeded_path(
            &graph,
            SemanticGraphNode::Entity { entity: EntityReference::new("listing") },
        );

        let open = AttributeSearchWeights::for_attributes(ElementFilter::new());
        assert_eq!(
            open.edge_weight(&path, graph.edge(handle).unwrap()).finite(),
            Some(JOIN_EDGE_WEIGHT),
        );

        let local_only = AttributeSearchWeights::for_attributes(
            ElementFilter::new().without_any_of([GroupByItemProperty::Joined]),
        );
        assert!(local_only.edge_weight(&path, graph.edge(handle).unwrap()).is_infinite());
    }

    #[test]
    fn excluded_date_parts_prune_extract_edges() {
        let mut graph = SemanticGraph::empty();
        let extract = SemanticGraphEdge::new(
            SemanticGraphNode::MetricTime,
            SemanticGraphNode::TimeAttribute {
                source: crate::graph::node::TimeAttributeSource::MetricTime,
                access: crate::graph::node::TimeAccess::DatePart(DatePart::Month),
            },
            EdgeTypeTag::OneToOne,
            ComputationMethod::DateExtract { date_part: DatePart::Month },
        );
        let handle = graph.insert_edge(extract);
        let path = seeded_path(&graph, SemanticGraphNode::MetricTime);

        let weights = AttributeSearchWeights::for_attributes(
            ElementFilter::new().without_any_of([GroupByItemProperty::DatePart]),
        );
        assert!(weights.edge_weight(&path, graph.edge(handle).unwrap()).is_infinite());
    }
}
