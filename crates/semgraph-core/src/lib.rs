pub mod build;
pub mod error;
pub mod filtering;
pub mod graph;
pub mod pathfind;
pub mod recipe;

// Re-export commonly used types
pub use build::{SemanticGraphBuilder, SubgraphGenerator};
pub use error::GraphBuildError;
pub use filtering::{ElementFilter, GroupByItemProperty};
pub use graph::edge::{ComputationMethod, EdgeTypeTag, SemanticGraphEdge, TraversalTag};
pub use graph::label::GraphLabel;
pub use graph::node::{SemanticGraphNode, TimeAccess, TimeAttributeSource};
pub use graph::{EdgeHandle, NodeHandle, SemanticGraph};
pub use pathfind::{
    find_ancestors, find_descendants, find_paths_dfs, AttributeSearchWeights, PathfinderOptions,
    TraversalPath, TraversalProfile, TraversalResult, DEFAULT_MAX_PATH_WEIGHT,
};
pub use recipe::step::AttributeRecipeStep;
pub use recipe::{AttributeRecipe, AttributeRecipeWriterPath};
