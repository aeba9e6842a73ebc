//! Lazy weighted depth-first path enumeration.
//!
//! [`find_paths_dfs`] returns an iterator that walks out of a seeded path and
//! yields a snapshot of the path every time it lands on a target node. The
//! walk is lazy -- callers that stop after the first few paths pay only for
//! the portion of the graph actually explored. All semantic gating lives in
//! the supplied [`WeightFunction`]; the engine itself only enforces the
//! weight budget, node revisit policy, and allow/deny sets.

use std::collections::HashSet;

use crate::graph::{EdgeHandle, NodeHandle, SemanticGraph};
use crate::pathfind::path::TraversalPath;
use crate::pathfind::profile::TraversalProfile;
use crate::pathfind::weight::{EdgeWeight, WeightFunction};

/// Default traversal budget. Joins cost two, plain steps one, so this allows
/// several joins plus the surrounding source/attribute steps.
pub const DEFAULT_MAX_PATH_WEIGHT: u64 = 12;

/// Knobs for a depth-first search.
#[derive(Debug, Clone)]
pub struct PathfinderOptions {
    /// Maximum total edge weight of any yielded path. The seed costs zero.
    pub max_path_weight: u64,
    /// Whether a path may visit the same node twice.
    pub allow_node_revisits: bool,
    /// When set, only these nodes may be entered.
    pub node_allow_set: Option<HashSet<NodeHandle>>,
    /// Nodes that may never be entered.
    pub node_deny_set: Option<HashSet<NodeHandle>>,
}

impl Default for PathfinderOptions {
    fn default() -> Self {
        Self {
            max_path_weight: DEFAULT_MAX_PATH_WEIGHT,
            allow_node_revisits: false,
            node_allow_set: None,
            node_deny_set: None,
        }
    }
}

impl PathfinderOptions {
    pub fn with_max_path_weight(mut self, max_path_weight: u64) -> Self {
        self.max_path_weight = max_path_weight;
        self
    }

    pub fn denying(mut self, nodes: impl IntoIterator<Item = NodeHandle>) -> Self {
        self.node_deny_set.get_or_insert_with(HashSet::new).extend(nodes);
        self
    }

    pub fn allowing_only(mut self, nodes: impl IntoIterator<Item = NodeHandle>) -> Self {
        self.node_allow_set.get_or_insert_with(HashSet::new).extend(nodes);
        self
    }
}

struct DfsFrame {
    edges: Vec<EdgeHandle>,
    cursor: usize,
    entry_cost: u64,
}

/// Depth-first path iterator. Yields one path snapshot per target hit.
pub struct DfsPathIterator<'g, P, W> {
    graph: &'g SemanticGraph,
    targets: HashSet<NodeHandle>,
    weight_fn: W,
    options: PathfinderOptions,
    path: P,
    spent: u64,
    frames: Vec<DfsFrame>,
    pending_start: bool,
    profile: TraversalProfile,
}

/// Enumerate all paths from `seed` to any node in `targets`, cheapest-first
/// in depth order. The seed path itself is yielded when its end is a target.
pub fn find_paths_dfs<'g, P, W>(
    graph: &'g SemanticGraph,
    seed: P,
    targets: HashSet<NodeHandle>,
    weight_fn: W,
    options: PathfinderOptions,
) -> DfsPathIterator<'g, P, W>
where
    P: TraversalPath + Clone,
    W: WeightFunction,
{
    DfsPathIterator {
        graph,
        targets,
        weight_fn,
        options,
        path: seed,
        spent: 0,
        frames: Vec::new(),
        pending_start: true,
        profile: TraversalProfile::new(),
    }
}

impl<P, W> DfsPathIterator<'_, P, W> {
    /// Work counters accumulated so far.
    pub fn profile(&self) -> TraversalProfile {
        self.profile
    }
}

impl<P, W> DfsPathIterator<'_, P, W>
where
    P: TraversalPath + Clone,
    W: WeightFunction,
{
    fn push_frame(&mut self, node: NodeHandle, entry_cost: u64) {
        let edges: Vec<EdgeHandle> = self.graph.outgoing_edges(node).collect();
        self.profile.nodes_visited += 1;
        self.frames.push(DfsFrame { edges, cursor: 0, entry_cost });
    }

    fn yield_current(&mut self) -> P {
        self.profile.paths_generated += 1;
        self.path.clone()
    }
}

impl<P, W> Iterator for DfsPathIterator<'_, P, W>
where
    P: TraversalPath + Clone,
    W: WeightFunction,
{
    type Item = P;

    fn next(&mut self) -> Option<P> {
        if self.pending_start {
            self.pending_start = false;
            let seed_node = self.path.last_node()?;
            self.push_frame(seed_node, 0);
            if self.targets.contains(&seed_node) {
                return Some(self.yield_current());
            }
        }

        loop {
            let next_edge = match self.frames.last_mut() {
                None => return None,
                Some(frame) if frame.cursor < frame.edges.len() => {
                    let edge = frame.edges[frame.cursor];
                    frame.cursor += 1;
                    Some(edge)
                }
                Some(_) => None,
            };

            let Some(edge) = next_edge else {
                // Current branch exhausted: retreat one step. The seed frame
                // has nothing beneath it, so popping it ends the iteration.
                if let Some(finished) = self.frames.pop() {
                    if self.frames.is_empty() {
                        return None;
                    }
                    self.path.pop_end();
                    self.spent = self.spent.saturating_sub(finished.entry_cost);
                }
                continue;
            };

            self.profile.edges_examined += 1;
            let Some((_, head)) = self.graph.edge_endpoints(edge) else {
                continue;
            };
            if let Some(deny) = &self.options.node_deny_set {
                if deny.contains(&head) {
                    continue;
                }
            }
            if let Some(allow) = &self.options.node_allow_set {
                if !allow.contains(&head) {
                    continue;
                }
            }
            if !self.options.allow_node_revisits && self.path.contains_node(head) {
                continue;
            }
            let Some(payload) = self.graph.edge(edge) else {
                continue;
            };
            let weight = match self.weight_fn.edge_weight(&self.path, payload) {
                EdgeWeight::Finite(weight) => weight,
                EdgeWeight::Infinite => continue,
            };
            if self.spent + weight > self.options.max_path_weight {
                continue;
            }

            self.path.append_edge(self.graph, edge);
            self.spent += weight;
            self.push_frame(head, weight);
            if self.targets.contains(&head) {
                return Some(self.yield_current());
            }
        }
    }
}
