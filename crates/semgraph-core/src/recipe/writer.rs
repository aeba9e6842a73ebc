//! The recipe-writing traversal path.
//!
//! [`AttributeRecipeWriterPath`] behaves exactly like
//! [`NodeEdgePath`](crate::pathfind::path::NodeEdgePath) but additionally
//! maintains a **recipe version stack**: seeding pushes one version (the seed
//! node's source steps); every append pushes exactly one more version (two
//! when the append bootstrapped an empty path), built from the previous
//! version plus the edge's steps plus the entered node's entry steps.
//! `pop_end` pops precisely what the last append pushed, so a pop after an
//! append restores the path byte for byte.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use smallvec::SmallVec;

use crate::graph::edge::TraversalTag;
use crate::graph::{EdgeHandle, NodeHandle, SemanticGraph};
use crate::pathfind::path::TraversalPath;
use crate::recipe::AttributeRecipe;

#[derive(Debug, Clone, PartialEq, Eq)]
struct WriterFrame {
    bootstrapped_tail: bool,
    versions_pushed: u8,
    tags_added: SmallVec<[TraversalTag; 2]>,
}

/// A traversal path that accumulates an [`AttributeRecipe`] as it grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRecipeWriterPath {
    nodes: SmallVec<[NodeHandle; 8]>,
    edges: SmallVec<[EdgeHandle; 8]>,
    tag_counts: BTreeMap<TraversalTag, u32>,
    versions: Vec<AttributeRecipe>,
    frames: Vec<WriterFrame>,
}

impl AttributeRecipeWriterPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recipe as of the current path end.
    pub fn latest_recipe(&self) -> Option<&AttributeRecipe> {
        self.versions.last()
    }

    /// The full version stack, oldest first.
    pub fn recipe_versions(&self) -> &[AttributeRecipe] {
        &self.versions
    }

    pub fn nodes(&self) -> &[NodeHandle] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeHandle] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl TraversalPath for AttributeRecipeWriterPath {
    fn starting_at(graph: &SemanticGraph, node: NodeHandle) -> Self {
        let mut path = Self::new();
        path.nodes.push(node);
        let recipe = match graph.node(node) {
            Some(value) => AttributeRecipe::from_steps(value.source_recipe_steps()),
            None => {
                debug_assert!(false, "starting_at with a stale node handle");
                AttributeRecipe::new()
            }
        };
        path.versions.push(recipe);
        path
    }

    fn last_node(&self) -> Option<NodeHandle> {
        self.nodes.last().copied()
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn contains_node(&self, node: NodeHandle) -> bool {
        self.nodes.contains(&node)
    }

    fn satisfies(&self, required: &BTreeSet<TraversalTag>) -> bool {
        required.iter().all(|tag| self.tag_counts.contains_key(tag))
    }

    fn append_edge(&mut self, graph: &SemanticGraph, edge: EdgeHandle) {
        let Some(payload) = graph.edge(edge) else {
            debug_assert!(false, "append_edge with a stale edge handle");
            return;
        };
        let Some((tail, head)) = graph.edge_endpoints(edge) else {
            return;
        };

        let bootstrapped_tail = self.nodes.is_empty();
        let mut versions_pushed: u8 = 1;
        if bootstrapped_tail {
            self.nodes.push(tail);
            let seed_recipe = match graph.node(tail) {
                Some(value) => AttributeRecipe::from_steps(value.source_recipe_steps()),
                None => AttributeRecipe::new(),
            };
            self.versions.push(seed_recipe);
            versions_pushed = 2;
        }

        self.edges.push(edge);
        self.nodes.push(head);

        let mut recipe = self.versions.last().cloned().unwrap_or_default();
        recipe.extend(payload.recipe_steps.iter().cloned());
        if let Some(head_value) = graph.node(head) {
            recipe.extend(head_value.entry_recipe_steps());
        }
        self.versions.push(recipe);

        let mut tags_added = SmallVec::new();
        for tag in &payload.provided_tags {
            *self.tag_counts.entry(tag.clone()).or_insert(0) += 1;
            tags_added.push(tag.clone());
        }
        self.frames.push(WriterFrame { bootstrapped_tail, versions_pushed, tags_added });
    }

    fn pop_end(&mut self) {
        match self.frames.pop() {
            Some(frame) => {
                self.edges.pop();
                self.nodes.pop();
                if frame.bootstrapped_tail {
                    self.nodes.pop();
                }
                let keep = self.versions.len().saturating_sub(frame.versions_pushed as usize);
                self.versions.truncate(keep);
                for tag in frame.tags_added {
                    if let Some(count) = self.tag_counts.get_mut(&tag) {
                        *count -= 1;
                        if *count == 0 {
                            self.tag_counts.remove(&tag);
                        }
                    }
                }
            }
            // Seed-only path: remove the seed node and its recipe version.
            None => {
                self.nodes.pop();
                self.versions.pop();
            }
        }
    }
}

impl fmt::Display for AttributeRecipeWriterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, node) in self.nodes.iter().enumerate() {
            if position > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edge::{ComputationMethod, EdgeTypeTag, SemanticGraphEdge};
    use crate::graph::node::SemanticGraphNode;
    use crate::recipe::step::AttributeRecipeStep;
    use proptest::prelude::*;
    use semgraph_manifest::{DimensionReference, MetricReference, ModelReference};

    fn metric(name: &str) -> SemanticGraphNode {
        SemanticGraphNode::SimpleMetric { metric: MetricReference::new(name) }
    }

    fn model(name: &str) -> SemanticGraphNode {
        SemanticGraphNode::LocalModel { model: ModelReference::new(name) }
    }

    fn dimension(name: &str) -> SemanticGraphNode {
        SemanticGraphNode::CategoricalDimensionAttribute {
            dimension: DimensionReference::new(name),
        }
    }

    /// Metric -> model -> dimension, with read steps on the source edge.
    fn fixture() -> (SemanticGraph, EdgeHandle, EdgeHandle) {
        let mut graph = SemanticGraph::empty();
        let source = SemanticGraphEdge::new(
            metric("bookings"),
            model("bookings_source"),
            EdgeTypeTag::MetricSource,
            ComputationMethod::CoLocatedInModel { model: ModelReference::new("bookings_source") },
        )
        .with_steps([AttributeRecipeStep::ReadModelSource {
            model: ModelReference::new("bookings_source"),
        }]);
        let source = graph.insert_edge(source);

        let attribute = SemanticGraphEdge::new(
            model("bookings_source"),
            dimension("is_instant"),
            EdgeTypeTag::AttributeSource,
            ComputationMethod::CoLocatedInModel { model: ModelReference::new("bookings_source") },
        );
        let attribute = graph.insert_edge(attribute);
        (graph, source, attribute)
    }

    #[test]
    fn seeding_pushes_source_steps_as_first_version() {
        let (graph, _, _) = fixture();
        let seed = graph.node_handle(&metric("bookings")).unwrap();
        let path = AttributeRecipeWriterPath::starting_at(&graph, seed);

        assert_eq!(path.recipe_versions().len(), 1);
        assert!(matches!(
            path.latest_recipe().unwrap().steps(),
            [AttributeRecipeStep::ReadMetricSource { .. }],
        ));
    }

    #[test]
    fn append_accumulates_edge_then_entry_steps() {
        let (graph, source, attribute) = fixture();
        let seed = graph.node_handle(&metric("bookings")).unwrap();
        let mut path = AttributeRecipeWriterPath::starting_at(&graph, seed);

        path.append_edge(&graph, source);
        path.append_edge(&graph, attribute);

        let steps = path.latest_recipe().unwrap().steps();
        assert!(matches!(
            steps,
            [
                AttributeRecipeStep::ReadMetricSource { .. },
                AttributeRecipeStep::ReadModelSource { .. },
                AttributeRecipeStep::SelectCategoricalDimension { .. },
            ],
        ));
        assert_eq!(path.latest_recipe().unwrap().indexed_dunder_name().as_deref(), Some("is_instant"));
        // One version per append on top of the seed version.
        assert_eq!(path.recipe_versions().len(), 3);
    }

    #[test]
    fn pop_exactly_inverts_append() {
        let (graph, source, attribute) = fixture();
        let seed = graph.node_handle(&metric("bookings")).unwrap();
        let mut path = AttributeRecipeWriterPath::starting_at(&graph, seed);
        path.append_edge(&graph, source);

        let before = path.clone();
        path.append_edge(&graph, attribute);
        path.pop_end();
        assert_eq!(path, before);
    }

    #[test]
    fn bootstrap_append_pushes_two_versions_and_pop_removes_both() {
        let (graph, source, _) = fixture();
        let mut path = AttributeRecipeWriterPath::new();

        path.append_edge(&graph, source);
        assert_eq!(path.node_count(), 2);
        assert_eq!(path.recipe_versions().len(), 2);

        path.pop_end();
        assert!(path.is_empty());
        assert_eq!(path, AttributeRecipeWriterPath::new());
    }

    #[test]
    fn pop_on_seed_only_path_removes_seed_version() {
        let (graph, _, _) = fixture();
        let seed = graph.node_handle(&metric("bookings")).unwrap();
        let mut path = AttributeRecipeWriterPath::starting_at(&graph, seed);
        path.pop_end();
        assert!(path.is_empty());
        assert!(path.recipe_versions().is_empty());
    }

    proptest! {
        /// Random interleavings of appends and pops never break the inverse
        /// law: after any append, one pop restores the previous state.
        #[test]
        fn append_then_pop_is_identity_along_random_walks(decisions in prop::collection::vec(0u8..4, 0..24)) {
            let (graph, source, _attribute) = fixture();
            let seed = graph.node_handle(&metric("bookings")).unwrap();
            let mut path = AttributeRecipeWriterPath::starting_at(&graph, seed);

            for decision in decisions {
                match decision {
                    // Walk forward along whichever edge leaves the path end.
                    0 | 1 => {
                        let Some(end) = path.last_node() else { break };
                        let Some(next) = graph.outgoing_edges(end).next() else { continue };
                        let before = path.clone();
                        path.append_edge(&graph, next);
                        let mut undone = path.clone();
                        undone.pop_end();
                        prop_assert_eq!(&undone, &before);
                    }
                    2 => {
                        if path.edge_count() > 0 {
                            path.pop_end();
                        }
                    }
                    _ => {
                        // Re-append from scratch if emptied.
                        if path.is_empty() {
                            path.append_edge(&graph, source);
                        }
                    }
                }
            }
        }
    }
}
