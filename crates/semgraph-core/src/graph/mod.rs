//! SemanticGraph: the queryable graph of manifest semantics.
//!
//! [`SemanticGraph`] stores nodes and edges in a petgraph `StableGraph` and
//! keeps two auxiliary structures in lockstep:
//!
//! - an **interning table** mapping node values to handles, so structural
//!   identity (value equality) degrades to cheap handle comparison on the
//!   traversal hot path;
//! - **label multimaps** from [`GraphLabel`] to member nodes/edges, powering
//!   set-valued queries such as "all group-by attribute nodes".
//!
//! All mutation happens through the builder in [`crate::build`]; a finished
//! graph is immutable and freely shareable across threads. A monotonically
//! increasing `revision` tracks structural changes -- it is a cache
//! invalidation token, never part of node identity.

pub mod edge;
pub mod label;
pub mod node;

use std::collections::HashMap;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};

use crate::graph::edge::{EdgeTypeTag, SemanticGraphEdge};
use crate::graph::label::GraphLabel;
use crate::graph::node::SemanticGraphNode;

/// Handle to a node in one particular graph. Not stable across builds; the
/// stable identity is the node value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeHandle(NodeIndex<u32>);

impl NodeHandle {
    pub fn index(&self) -> usize {
        self.0.index()
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0.index())
    }
}

impl From<NodeIndex<u32>> for NodeHandle {
    fn from(idx: NodeIndex<u32>) -> Self {
        NodeHandle(idx)
    }
}

impl From<NodeHandle> for NodeIndex<u32> {
    fn from(handle: NodeHandle) -> Self {
        handle.0
    }
}

/// Handle to an edge in one particular graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeHandle(EdgeIndex<u32>);

impl EdgeHandle {
    pub fn index(&self) -> usize {
        self.0.index()
    }
}

impl fmt::Display for EdgeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0.index())
    }
}

impl From<EdgeIndex<u32>> for EdgeHandle {
    fn from(idx: EdgeIndex<u32>) -> Self {
        EdgeHandle(idx)
    }
}

impl From<EdgeHandle> for EdgeIndex<u32> {
    fn from(handle: EdgeHandle) -> Self {
        handle.0
    }
}

/// The semantic graph.
#[derive(Debug, Clone)]
pub struct SemanticGraph {
    graph: StableGraph<SemanticGraphNode, SemanticGraphEdge, Directed, u32>,
    node_handles: HashMap<SemanticGraphNode, NodeIndex<u32>>,
    labeled_nodes: IndexMap<GraphLabel, IndexSet<NodeHandle>>,
    labeled_edges: IndexMap<GraphLabel, IndexSet<EdgeHandle>>,
    revision: u64,
}

impl SemanticGraph {
    pub(crate) fn empty() -> Self {
        SemanticGraph {
            graph: StableGraph::<SemanticGraphNode, SemanticGraphEdge, Directed, u32>::new(),
            node_handles: HashMap::new(),
            labeled_nodes: IndexMap::new(),
            labeled_edges: IndexMap::new(),
            revision: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Mutation (builder-only)
    // -----------------------------------------------------------------------

    /// Interns a node value: returns the existing handle when the value is
    /// already present, otherwise adds it. Adding bumps the revision.
    pub(crate) fn intern_node(&mut self, node: SemanticGraphNode) -> NodeHandle {
        if let Some(&idx) = self.node_handles.get(&node) {
            return NodeHandle(idx);
        }
        let labels = node.labels();
        let idx = self.graph.add_node(node.clone());
        self.node_handles.insert(node, idx);
        let handle = NodeHandle(idx);
        for &label in labels {
            self.labeled_nodes.entry(label).or_default().insert(handle);
        }
        self.revision += 1;
        handle
    }

    /// Inserts an edge, interning both endpoints. Re-inserting an edge with
    /// the same (tail, type, head) is a silent no-op returning the existing
    /// handle; only genuine additions bump the revision.
    pub(crate) fn insert_edge(&mut self, edge: SemanticGraphEdge) -> EdgeHandle {
        let tail = self.intern_node(edge.tail.clone());
        let head = self.intern_node(edge.head.clone());
        if let Some(existing) = self
            .graph
            .edges_connecting(tail.into(), head.into())
            .find(|e| e.weight().ty == edge.ty)
        {
            return EdgeHandle(existing.id());
        }
        let labels = edge.labels();
        let idx = self.graph.add_edge(tail.into(), head.into(), edge);
        let handle = EdgeHandle(idx);
        for &label in labels {
            self.labeled_edges.entry(label).or_default().insert(handle);
        }
        self.revision += 1;
        handle
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Structural-change counter. Grows with every genuine addition.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&SemanticGraphNode> {
        self.graph.node_weight(handle.into())
    }

    /// Looks up the handle a node value is interned at.
    pub fn node_handle(&self, node: &SemanticGraphNode) -> Option<NodeHandle> {
        self.node_handles.get(node).map(|&idx| NodeHandle(idx))
    }

    pub fn contains_node(&self, node: &SemanticGraphNode) -> bool {
        self.node_handles.contains_key(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &SemanticGraphNode)> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx).map(|node| (NodeHandle(idx), node)))
    }

    pub fn edge(&self, handle: EdgeHandle) -> Option<&SemanticGraphEdge> {
        self.graph.edge_weight(handle.into())
    }

    pub fn edge_endpoints(&self, handle: EdgeHandle) -> Option<(NodeHandle, NodeHandle)> {
        self.graph
            .edge_endpoints(handle.into())
            .map(|(tail, head)| (NodeHandle(tail), NodeHandle(head)))
    }

    pub fn edge_head(&self, handle: EdgeHandle) -> Option<NodeHandle> {
        self.graph.edge_endpoints(handle.into()).map(|(_, head)| NodeHandle(head))
    }

    pub fn edge_tail(&self, handle: EdgeHandle) -> Option<NodeHandle> {
        self.graph.edge_endpoints(handle.into()).map(|(tail, _)| NodeHandle(tail))
    }

    /// Edges leaving a node.
    pub fn outgoing_edges(&self, node: NodeHandle) -> impl Iterator<Item = EdgeHandle> + '_ {
        self.graph
            .edges_directed(node.into(), Direction::Outgoing)
            .map(|edge_ref| EdgeHandle(edge_ref.id()))
    }

    /// Edges arriving at a node.
    pub fn incoming_edges(&self, node: NodeHandle) -> impl Iterator<Item = EdgeHandle> + '_ {
        self.graph
            .edges_directed(node.into(), Direction::Incoming)
            .map(|edge_ref| EdgeHandle(edge_ref.id()))
    }

    /// Nodes carrying a label, in insertion order.
    pub fn nodes_with_label(&self, label: GraphLabel) -> impl Iterator<Item = NodeHandle> + '_ {
        self.labeled_nodes.get(&label).into_iter().flatten().copied()
    }

    /// Edges carrying a label, in insertion order.
    pub fn edges_with_label(&self, label: GraphLabel) -> impl Iterator<Item = EdgeHandle> + '_ {
        self.labeled_edges.get(&label).into_iter().flatten().copied()
    }

    /// Whether an edge with this (tail, type, head) already exists.
    pub fn contains_edge(
        &self,
        tail: &SemanticGraphNode,
        ty: EdgeTypeTag,
        head: &SemanticGraphNode,
    ) -> bool {
        match (self.node_handle(tail), self.node_handle(head)) {
            (Some(tail), Some(head)) => self
                .graph
                .edges_connecting(tail.into(), head.into())
                .any(|e| e.weight().ty == ty),
            _ => false,
        }
    }

    // -----------------------------------------------------------------------
    // Debug consistency assertion
    // -----------------------------------------------------------------------

    /// Verifies the interning table and label multimaps agree with graph
    /// storage. Only called in debug builds.
    #[cfg(debug_assertions)]
    pub(crate) fn assert_consistency(&self) {
        assert_eq!(
            self.node_handles.len(),
            self.graph.node_count(),
            "interning table out of sync with graph storage",
        );
        for (node, &idx) in &self.node_handles {
            assert_eq!(
                self.graph.node_weight(idx),
                Some(node),
                "interned handle points at a different node value",
            );
        }
        for (label, handles) in &self.labeled_nodes {
            for handle in handles {
                let node = self.node(*handle).expect("labeled node missing from graph");
                assert!(
                    node.labels().contains(label),
                    "node {node} indexed under label {label} it does not carry",
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edge::ComputationMethod;
    use semgraph_manifest::{DimensionReference, EntityReference, ModelReference};

    fn model_node(name: &str) -> SemanticGraphNode {
        SemanticGraphNode::LocalModel { model: ModelReference::new(name) }
    }

    fn dimension_node(name: &str) -> SemanticGraphNode {
        SemanticGraphNode::CategoricalDimensionAttribute {
            dimension: DimensionReference::new(name),
        }
    }

    fn attribute_edge(tail: SemanticGraphNode, head: SemanticGraphNode) -> SemanticGraphEdge {
        let model = ModelReference::new("bookings_source");
        SemanticGraphEdge::new(
            tail,
            head,
            EdgeTypeTag::AttributeSource,
            ComputationMethod::CoLocatedInModel { model },
        )
    }

    #[test]
    fn interning_same_value_adds_exactly_once() {
        let mut graph = SemanticGraph::empty();
        let first = graph.intern_node(dimension_node("is_instant"));
        let count_after_first = graph.node_count();
        let second = graph.intern_node(dimension_node("is_instant"));

        assert_eq!(first, second);
        assert_eq!(count_after_first, 1);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn insert_edge_registers_both_endpoints() {
        let mut graph = SemanticGraph::empty();
        graph.insert_edge(attribute_edge(model_node("bookings_source"), dimension_node("is_instant")));

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.contains_node(&model_node("bookings_source")));
        assert!(graph.contains_node(&dimension_node("is_instant")));
    }

    #[test]
    fn duplicate_edge_is_a_silent_noop() {
        let mut graph = SemanticGraph::empty();
        let first = graph.insert_edge(attribute_edge(
            model_node("bookings_source"),
            dimension_node("is_instant"),
        ));
        let revision = graph.revision();

        let second = graph.insert_edge(attribute_edge(
            model_node("bookings_source"),
            dimension_node("is_instant"),
        ));

        assert_eq!(first, second);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.revision(), revision);
    }

    #[test]
    fn same_endpoints_different_type_is_a_new_edge() {
        let mut graph = SemanticGraph::empty();
        graph.insert_edge(attribute_edge(model_node("a"), dimension_node("x")));

        let mut relationship = attribute_edge(model_node("a"), dimension_node("x"));
        relationship.ty = EdgeTypeTag::OneToOne;
        graph.insert_edge(relationship);

        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn label_multimap_tracks_nodes() {
        let mut graph = SemanticGraph::empty();
        graph.insert_edge(attribute_edge(model_node("a"), dimension_node("x")));
        graph.insert_edge(attribute_edge(model_node("a"), dimension_node("y")));

        let attrs: Vec<_> = graph.nodes_with_label(GraphLabel::GroupByAttribute).collect();
        assert_eq!(attrs.len(), 2);

        let models: Vec<_> = graph.nodes_with_label(GraphLabel::Model).collect();
        assert_eq!(models.len(), 1);

        assert_eq!(graph.nodes_with_label(GraphLabel::Metric).count(), 0);
    }

    #[test]
    fn label_multimap_tracks_edges() {
        let mut graph = SemanticGraph::empty();
        let entity = SemanticGraphNode::Entity { entity: EntityReference::new("listing") };
        let joined =
            SemanticGraphNode::JoinedModel { model: ModelReference::new("listings_source") };
        graph.insert_edge(SemanticGraphEdge::new(
            entity.clone(),
            joined,
            EdgeTypeTag::EntityRelationship,
            ComputationMethod::JoinedViaEntity {
                entity: EntityReference::new("listing"),
                model: ModelReference::new("listings_source"),
                validity: None,
            },
        ));

        assert_eq!(graph.edges_with_label(GraphLabel::Join).count(), 1);
        assert_eq!(graph.edges_with_label(GraphLabel::Composition).count(), 0);
    }

    #[test]
    fn revision_grows_with_structure() {
        let mut graph = SemanticGraph::empty();
        assert_eq!(graph.revision(), 0);

        graph.intern_node(model_node("a"));
        let after_node = graph.revision();
        assert!(after_node > 0);

        graph.insert_edge(attribute_edge(model_node("a"), dimension_node("x")));
        assert!(graph.revision() > after_node);
    }

    #[test]
    fn adjacency_iterators_see_inserted_edges() {
        let mut graph = SemanticGraph::empty();
        let edge = graph.insert_edge(attribute_edge(model_node("a"), dimension_node("x")));
        let model = graph.node_handle(&model_node("a")).unwrap();
        let dim = graph.node_handle(&dimension_node("x")).unwrap();

        let outgoing: Vec<_> = graph.outgoing_edges(model).collect();
        assert_eq!(outgoing, vec![edge]);
        let incoming: Vec<_> = graph.incoming_edges(dim).collect();
        assert_eq!(incoming, vec![edge]);
        assert_eq!(graph.edge_endpoints(edge), Some((model, dim)));
    }

    #[test]
    fn consistency_assertion_passes_on_built_graph() {
        let mut graph = SemanticGraph::empty();
        graph.insert_edge(attribute_edge(model_node("a"), dimension_node("x")));
        graph.insert_edge(attribute_edge(model_node("b"), dimension_node("x")));
        #[cfg(debug_assertions)]
        graph.assert_consistency();
    }
}
