//! Traversal paths.
//!
//! [`TraversalPath`] is the capability the pathfinder needs from a path:
//! seed, append an edge, pop the end, and answer membership/tag queries.
//! [`NodeEdgePath`] is the plain implementation; the recipe-writing variant
//! lives in [`crate::recipe::writer`].
//!
//! Appending and popping are exact inverses. Each append records a frame
//! (whether it bootstrapped the tail node, which tags it added) so `pop_end`
//! can restore the previous state precisely, including tag counts when
//! several edges provide the same tag.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use smallvec::SmallVec;

use crate::graph::edge::TraversalTag;
use crate::graph::{EdgeHandle, NodeHandle, SemanticGraph};

/// Capabilities the pathfinder requires of a path.
pub trait TraversalPath: Clone {
    /// A single-node path seeded at `node`.
    fn starting_at(graph: &SemanticGraph, node: NodeHandle) -> Self;

    /// The node the path currently ends at.
    fn last_node(&self) -> Option<NodeHandle>;

    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;

    fn contains_node(&self, node: NodeHandle) -> bool;

    /// Whether every required tag has been provided by some traversed edge.
    fn satisfies(&self, required: &BTreeSet<TraversalTag>) -> bool;

    /// Extends the path along `edge`. On an empty path this bootstraps the
    /// edge's tail first. Stale handles are a caller bug and are ignored.
    fn append_edge(&mut self, graph: &SemanticGraph, edge: EdgeHandle);

    /// Removes exactly what the last append (or the seed) added.
    fn pop_end(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PathFrame {
    bootstrapped_tail: bool,
    tags_added: SmallVec<[TraversalTag; 2]>,
}

/// A path of node and edge handles with tag bookkeeping and no recipes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeEdgePath {
    nodes: SmallVec<[NodeHandle; 8]>,
    edges: SmallVec<[EdgeHandle; 8]>,
    tag_counts: BTreeMap<TraversalTag, u32>,
    frames: Vec<PathFrame>,
}

impl NodeEdgePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[NodeHandle] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeHandle] {
        &self.edges
    }

    pub fn last_edge(&self) -> Option<EdgeHandle> {
        self.edges.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl TraversalPath for NodeEdgePath {
    fn starting_at(_graph: &SemanticGraph, node: NodeHandle) -> Self {
        let mut path = Self::new();
        path.nodes.push(node);
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
        if bootstrapped_tail {
            self.nodes.push(tail);
        }
        self.edges.push(edge);
        self.nodes.push(head);

        let mut tags_added = SmallVec::new();
        for tag in &payload.provided_tags {
            *self.tag_counts.entry(tag.clone()).or_insert(0) += 1;
            tags_added.push(tag.clone());
        }
        self.frames.push(PathFrame { bootstrapped_tail, tags_added });
    }

    fn pop_end(&mut self) {
        match self.frames.pop() {
            Some(frame) => {
                self.edges.pop();
                self.nodes.pop();
                if frame.bootstrapped_tail {
                    self.nodes.pop();
                }
                for tag in frame.tags_added {
                    if let Some(count) = self.tag_counts.get_mut(&tag) {
                        *count -= 1;
                        if *count == 0 {
                            self.tag_counts.remove(&tag);
                        }
                    }
                }
            }
            // Seed-only path: popping empties it.
            None => {
                self.nodes.pop();
            }
        }
    }
}

impl fmt::Display for NodeEdgePath {
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
