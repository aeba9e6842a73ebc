//! Graph construction from a manifest.
//!
//! Seven independent [`SubgraphGenerator`]s each emit the edges for one
//! category of semantic relationship; [`SemanticGraphBuilder::build`] runs
//! them in a fixed order and folds their edges into one graph. Folding is
//! additive and idempotent -- endpoints auto-register and duplicate edges
//! are no-ops, so generator output order never changes the resulting graph's
//! node set.

pub mod dimension;
pub mod entity;
pub mod metric;
pub mod time;

use semgraph_manifest::{ManifestError, ManifestObjectLookup};

use crate::error::GraphBuildError;
use crate::graph::edge::SemanticGraphEdge;
use crate::graph::node::SemanticGraphNode;
use crate::graph::{EdgeHandle, NodeHandle, SemanticGraph};

// Re-export commonly used types
pub use dimension::{CategoricalDimensionSubgraph, TimeDimensionSubgraph};
pub use entity::{EntityJoinSubgraph, EntityKeySubgraph};
pub use metric::{ComplexMetricSubgraph, SimpleMetricSubgraph};
pub use time::TimeEntitySubgraph;

/// One category of semantic relationship, expressed as edges.
///
/// Generators read only the manifest lookup; they never see the graph under
/// construction, so each can be tested in isolation against a manifest.
pub trait SubgraphGenerator {
    /// Stable name used in build logs.
    fn name(&self) -> &'static str;

    /// The edges this generator contributes for the manifest.
    fn generate(&self, lookup: &ManifestObjectLookup)
        -> Result<Vec<SemanticGraphEdge>, ManifestError>;
}

/// Accumulates nodes and edges into a [`SemanticGraph`].
///
/// Every structural change bumps the graph's revision counter; `finish`
/// freezes the result into an immutable, freely shareable graph.
#[derive(Debug)]
pub struct SemanticGraphBuilder {
    graph: SemanticGraph,
}

impl Default for SemanticGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticGraphBuilder {
    pub fn new() -> Self {
        Self { graph: SemanticGraph::empty() }
    }

    /// Registers a node, returning its handle. Idempotent per node value.
    pub fn add_node(&mut self, node: SemanticGraphNode) -> NodeHandle {
        self.graph.intern_node(node)
    }

    /// Adds an edge, interning both endpoints. Re-adding an edge with the
    /// same tail, type, and head returns the existing handle unchanged.
    pub fn add_edge(&mut self, edge: SemanticGraphEdge) -> EdgeHandle {
        self.graph.insert_edge(edge)
    }

    /// Folds a batch of edges into the graph.
    pub fn update(&mut self, edges: impl IntoIterator<Item = SemanticGraphEdge>) {
        for edge in edges {
            self.graph.insert_edge(edge);
        }
    }

    pub fn revision(&self) -> u64 {
        self.graph.revision()
    }

    pub fn graph(&self) -> &SemanticGraph {
        &self.graph
    }

    /// Freezes the builder into an immutable graph.
    pub fn finish(self) -> SemanticGraph {
        #[cfg(debug_assertions)]
        self.graph.assert_consistency();
        self.graph
    }

    /// Builds the full semantic graph for a manifest by running every
    /// generator in the fixed order.
    pub fn build(lookup: &ManifestObjectLookup) -> Result<SemanticGraph, GraphBuildError> {
        let generators: [&dyn SubgraphGenerator; 7] = [
            &CategoricalDimensionSubgraph,
            &EntityKeySubgraph,
            &EntityJoinSubgraph,
            &SimpleMetricSubgraph,
            &TimeDimensionSubgraph,
            &TimeEntitySubgraph,
            &ComplexMetricSubgraph,
        ];

        let started = std::time::Instant::now();
        let mut builder = Self::new();
        for generator in generators {
            let generator_started = std::time::Instant::now();
            let nodes_before = builder.graph.node_count();
            let edges_before = builder.graph.edge_count();

            let edges = generator.generate(lookup)?;
            let emitted = edges.len();
            builder.update(edges);

            tracing::debug!(
                "subgraph generator {} emitted {} edge(s): +{} node(s), +{} edge(s) in {:?}",
                generator.name(),
                emitted,
                builder.graph.node_count() - nodes_before,
                builder.graph.edge_count() - edges_before,
                generator_started.elapsed(),
            );
        }

        tracing::info!(
            "semantic graph built: {} node(s), {} edge(s) in {:?}",
            builder.graph.node_count(),
            builder.graph.edge_count(),
            started.elapsed(),
        );
        Ok(builder.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edge::{ComputationMethod, EdgeTypeTag};
    use crate::graph::node::{TimeAccess, TimeAttributeSource};
    use semgraph_manifest::{
        AggregationType, Dimension, DimensionReference, Entity, EntityReference, EntityType,
        ExpandedTimeGranularity, Measure, Metric, MetricReference, ModelDefaults, ModelReference,
        SemanticManifest, SemanticModel, TimeGranularity,
    };
    use std::sync::Arc;

    fn sample_edge(dimension: &str) -> SemanticGraphEdge {
        SemanticGraphEdge::new(
            SemanticGraphNode::LocalModel { model: ModelReference::new("bookings_source") },
            SemanticGraphNode::CategoricalDimensionAttribute {
                dimension: DimensionReference::new(dimension),
            },
            EdgeTypeTag::AttributeSource,
            ComputationMethod::CoLocatedInModel { model: ModelReference::new("bookings_source") },
        )
    }

    #[test]
    fn update_folds_edges_and_interns_endpoints() {
        let mut builder = SemanticGraphBuilder::new();
        builder.update([sample_edge("is_instant"), sample_edge("origin")]);
        let graph = builder.finish();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn revision_advances_only_on_structural_change() {
        let mut builder = SemanticGraphBuilder::new();
        builder.add_edge(sample_edge("is_instant"));
        let after_first = builder.revision();
        builder.add_edge(sample_edge("is_instant"));
        assert_eq!(builder.revision(), after_first);
        builder.add_edge(sample_edge("origin"));
        assert!(builder.revision() > after_first);
    }

    #[test]
    fn build_wires_the_bookings_graph_end_to_end() {
        let mut bookings = SemanticModel::new("bookings_source");
        bookings.defaults =
            ModelDefaults { agg_time_dimension: Some(DimensionReference::new("ds")) };
        bookings.entities.push(Entity::new("booking", EntityType::Primary));
        bookings.entities.push(Entity::new("listing", EntityType::Foreign));
        bookings.dimensions.push(Dimension::categorical("is_instant"));
        bookings.dimensions.push(Dimension::time("ds", TimeGranularity::Day));
        bookings.measures.push(Measure {
            create_metric: true,
            ..Measure::new("bookings", AggregationType::Sum)
        });

        let mut listings = SemanticModel::new("listings_latest");
        listings.entities.push(Entity::new("listing", EntityType::Primary));
        listings.dimensions.push(Dimension::categorical("country"));

        let manifest = SemanticManifest {
            semantic_models: vec![bookings, listings],
            metrics: vec![Metric::simple("bookings", "bookings")],
            ..SemanticManifest::default()
        };
        let lookup = ManifestObjectLookup::new(Arc::new(manifest));
        let graph = SemanticGraphBuilder::build(&lookup).unwrap();

        let metric = SemanticGraphNode::SimpleMetric { metric: MetricReference::new("bookings") };
        let source = SemanticGraphNode::LocalModel { model: ModelReference::new("bookings_source") };
        assert!(graph.contains_edge(&metric, EdgeTypeTag::MetricSource, &source));

        // Join leg onto the listings model through the shared entity.
        let listing = SemanticGraphNode::Entity { entity: EntityReference::new("listing") };
        let joined = SemanticGraphNode::JoinedModel { model: ModelReference::new("listings_latest") };
        assert!(graph.contains_edge(&listing, EdgeTypeTag::EntityRelationship, &joined));

        // Metric-time plumbing reaches the default spine's day attribute.
        let pivot = SemanticGraphNode::TimeDimension {
            model: ModelReference::new("bookings_source"),
            dimension: DimensionReference::new("ds"),
            granularity: TimeGranularity::Day,
        };
        assert!(graph.contains_edge(&pivot, EdgeTypeTag::OneToOne, &SemanticGraphNode::TimeEntity));
        assert!(graph.contains_edge(
            &SemanticGraphNode::TimeEntity,
            EdgeTypeTag::OneToOne,
            &SemanticGraphNode::MetricTime,
        ));
        let metric_time_day = SemanticGraphNode::TimeAttribute {
            source: TimeAttributeSource::MetricTime,
            access: TimeAccess::Granularity(ExpandedTimeGranularity::from_standard(
                TimeGranularity::Day,
            )),
        };
        assert!(graph.contains_edge(
            &SemanticGraphNode::MetricTime,
            EdgeTypeTag::OneToOne,
            &metric_time_day,
        ));

        // Building twice from the same manifest yields the same structure.
        let again = SemanticGraphBuilder::build(&lookup).unwrap();
        assert_eq!(graph.node_count(), again.node_count());
        assert_eq!(graph.edge_count(), again.edge_count());
    }
}
