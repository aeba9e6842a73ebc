//! Graph traversal: lazy weighted DFS path enumeration, reachability
//! queries, and the weight functions that encode traversal semantics.

pub mod dfs;
pub mod path;
pub mod profile;
pub mod reach;
pub mod weight;

// Re-export commonly used types
pub use dfs::{find_paths_dfs, DfsPathIterator, PathfinderOptions, DEFAULT_MAX_PATH_WEIGHT};
pub use path::{NodeEdgePath, TraversalPath};
pub use profile::TraversalProfile;
pub use reach::{find_ancestors, find_descendants, TraversalResult};
pub use weight::{
    AttributeSearchWeights, EdgeWeight, UnitWeight, WeightFunction, JOIN_EDGE_WEIGHT,
    STEP_EDGE_WEIGHT,
};
