//! Breadth-first reachability queries.
//!
//! Unlike [`find_paths_dfs`](crate::pathfind::dfs::find_paths_dfs), these do
//! not enumerate paths -- they answer set questions: which nodes lie on any
//! path between a source set and a target set, which targets are reachable
//! at all, and which edge labels such paths cross.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexSet;
use petgraph::Direction;

use crate::graph::label::GraphLabel;
use crate::graph::{NodeHandle, SemanticGraph};
use crate::pathfind::profile::TraversalProfile;

/// Outcome of a reachability query.
#[derive(Debug, Clone, Default)]
pub struct TraversalResult {
    /// Every node lying on some path between the source and target sets,
    /// both endpoints included.
    pub reachable_nodes: IndexSet<NodeHandle>,
    /// The subset of target nodes actually reached.
    pub reached_targets: IndexSet<NodeHandle>,
    /// Labels of every edge on a kept path.
    pub edge_labels: IndexSet<GraphLabel>,
    pub profile: TraversalProfile,
}

/// Nodes on any directed path from `sources` to `targets`.
pub fn find_descendants(
    graph: &SemanticGraph,
    sources: &[NodeHandle],
    targets: &HashSet<NodeHandle>,
) -> TraversalResult {
    between(graph, sources, targets, Direction::Outgoing)
}

/// Nodes on any directed path from `targets` to `sources` -- the mirror
/// query, walking incoming edges out of `sources`.
pub fn find_ancestors(
    graph: &SemanticGraph,
    sources: &[NodeHandle],
    targets: &HashSet<NodeHandle>,
) -> TraversalResult {
    between(graph, sources, targets, Direction::Incoming)
}

fn between(
    graph: &SemanticGraph,
    sources: &[NodeHandle],
    targets: &HashSet<NodeHandle>,
    direction: Direction,
) -> TraversalResult {
    let mut profile = TraversalProfile::new();
    let from_sources = closure(graph, sources.iter().copied(), direction, &mut profile);
    let from_targets =
        closure(graph, targets.iter().copied(), direction.opposite(), &mut profile);

    let reachable_nodes: IndexSet<NodeHandle> = from_sources
        .iter()
        .copied()
        .filter(|node| from_targets.contains(node))
        .collect();
    let reached_targets: IndexSet<NodeHandle> = from_sources
        .iter()
        .copied()
        .filter(|node| targets.contains(node))
        .collect();

    // An edge is on a kept path exactly when both of its endpoints are.
    let mut edge_labels = IndexSet::new();
    for &node in &reachable_nodes {
        for edge in graph.outgoing_edges(node) {
            let Some((_, head)) = graph.edge_endpoints(edge) else {
                continue;
            };
            if !reachable_nodes.contains(&head) {
                continue;
            }
            if let Some(payload) = graph.edge(edge) {
                edge_labels.extend(payload.labels().iter().copied());
            }
        }
    }

    TraversalResult { reachable_nodes, reached_targets, edge_labels, profile }
}

fn closure(
    graph: &SemanticGraph,
    seeds: impl Iterator<Item = NodeHandle>,
    direction: Direction,
    profile: &mut TraversalProfile,
) -> IndexSet<NodeHandle> {
    let mut seen: IndexSet<NodeHandle> =
        seeds.filter(|node| graph.node(*node).is_some()).collect();
    let mut queue: VecDeque<NodeHandle> = seen.iter().copied().collect();

    while let Some(node) = queue.pop_front() {
        profile.nodes_visited += 1;
        let edges: Vec<_> = match direction {
            Direction::Outgoing => graph.outgoing_edges(node).collect(),
            Direction::Incoming => graph.incoming_edges(node).collect(),
        };
        for edge in edges {
            profile.edges_examined += 1;
            let Some((tail, head)) = graph.edge_endpoints(edge) else {
                continue;
            };
            let next = match direction {
                Direction::Outgoing => head,
                Direction::Incoming => tail,
            };
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}
