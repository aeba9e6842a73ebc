//! Traversal work counters.

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Counters describing how much work a traversal performed.
///
/// Profiles are cheap to copy and compose with `+`; [`TraversalProfile::diff`]
/// subtracts a snapshot taken before a sub-traversal from one taken after it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalProfile {
    pub nodes_visited: u64,
    pub edges_examined: u64,
    pub paths_generated: u64,
}

impl TraversalProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// The work done since `earlier` was captured.
    pub fn diff(&self, earlier: &TraversalProfile) -> TraversalProfile {
        TraversalProfile {
            nodes_visited: self.nodes_visited.saturating_sub(earlier.nodes_visited),
            edges_examined: self.edges_examined.saturating_sub(earlier.edges_examined),
            paths_generated: self.paths_generated.saturating_sub(earlier.paths_generated),
        }
    }
}

impl Add for TraversalProfile {
    type Output = TraversalProfile;

    fn add(self, other: TraversalProfile) -> TraversalProfile {
        TraversalProfile {
            nodes_visited: self.nodes_visited + other.nodes_visited,
            edges_examined: self.edges_examined + other.edges_examined,
            paths_generated: self.paths_generated + other.paths_generated,
        }
    }
}

impl fmt::Display for TraversalProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} edges, {} paths",
            self.nodes_visited, self.edges_examined, self.paths_generated
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_subtracts_an_earlier_snapshot() {
        let earlier = TraversalProfile { nodes_visited: 3, edges_examined: 10, paths_generated: 1 };
        let later = TraversalProfile { nodes_visited: 8, edges_examined: 25, paths_generated: 4 };
        let delta = later.diff(&earlier);
        assert_eq!(delta.nodes_visited, 5);
        assert_eq!(delta.edges_examined, 15);
        assert_eq!(delta.paths_generated, 3);
    }

    #[test]
    fn diff_saturates_rather_than_underflowing() {
        let bigger = TraversalProfile { nodes_visited: 9, ..Default::default() };
        assert_eq!(TraversalProfile::new().diff(&bigger), TraversalProfile::new());
    }

    #[test]
    fn add_composes_counters() {
        let a = TraversalProfile { nodes_visited: 1, edges_examined: 2, paths_generated: 3 };
        let b = TraversalProfile { nodes_visited: 10, edges_examined: 20, paths_generated: 30 };
        let sum = a + b;
        assert_eq!(sum.nodes_visited, 11);
        assert_eq!(sum.edges_examined, 22);
        assert_eq!(sum.paths_generated, 33);
    }
}
