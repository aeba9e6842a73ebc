//! Semantic graph edges.
//!
//! An edge records how its head is computed from its tail (the computation
//! method), how expensive it is to traverse (via the edge-type tag the weight
//! functions price), the recipe steps a traversing path appends, and the
//! traversal tags gating it. Tag gating is what keeps time truncations
//! honest: a truncation edge requires a grain tag that only the matching
//! model-to-time-dimension edge provides, so a path cannot truncate to a
//! grain finer than its data.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use semgraph_manifest::{
    DatePart, DimensionReference, EntityReference, ExpandedTimeGranularity, ModelReference,
    TimeGranularity,
};

use crate::graph::label::GraphLabel;
use crate::graph::node::SemanticGraphNode;
use crate::recipe::step::{AttributeRecipeStep, ValidityWindowJoin};

/// The closed set of edge types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EdgeTypeTag {
    /// Metric to the model it reads. Only traversable as a path's first edge.
    MetricSource,
    /// Model to an attribute it exposes.
    AttributeSource,
    /// Structural one-to-one links (time plumbing).
    OneToOne,
    /// Model-to-entity and entity-to-model join legs.
    EntityRelationship,
    /// Complex metric to an input metric.
    ComposedOf,
}

impl EdgeTypeTag {
    pub fn kind(&self) -> &'static str {
        match self {
            EdgeTypeTag::MetricSource => "metric_source",
            EdgeTypeTag::AttributeSource => "attribute_source",
            EdgeTypeTag::OneToOne => "one_to_one",
            EdgeTypeTag::EntityRelationship => "entity_relationship",
            EdgeTypeTag::ComposedOf => "composed_of",
        }
    }

    /// Whether traversing this edge crosses a model join.
    pub fn is_join(&self) -> bool {
        matches!(self, EdgeTypeTag::EntityRelationship)
    }
}

/// How an edge's head is computed from its tail.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputationMethod {
    /// The head lives in the named model's source table.
    CoLocatedInModel { model: ModelReference },
    /// The head is reached by joining the named model through an entity key,
    /// restricted to an SCD validity window when present.
    JoinedViaEntity {
        entity: EntityReference,
        model: ModelReference,
        validity: Option<ValidityWindowJoin>,
    },
    /// The head is the tail truncated to a grain.
    DateTrunc { granularity: ExpandedTimeGranularity },
    /// The head is a date part extracted from the tail.
    DateExtract { date_part: DatePart },
    /// The head is the tail under its metric-time identity.
    MetricTimeIdentity,
    /// The head is an input of the tail metric.
    MetricComposition,
}

impl ComputationMethod {
    pub fn kind(&self) -> &'static str {
        match self {
            ComputationMethod::CoLocatedInModel { .. } => "co_located_in_model",
            ComputationMethod::JoinedViaEntity { .. } => "joined_via_entity",
            ComputationMethod::DateTrunc { .. } => "date_trunc",
            ComputationMethod::DateExtract { .. } => "date_extract",
            ComputationMethod::MetricTimeIdentity => "metric_time_identity",
            ComputationMethod::MetricComposition => "metric_composition",
        }
    }
}

/// Preconditions and facts carried along a path.
///
/// An edge may only be traversed once the path has accumulated all of the
/// edge's required tags; traversing it adds the edge's provided tags.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalTag {
    /// The path's time data supports queries at this standard grain.
    GrainQueryable(TimeGranularity),
    /// The path's time data supports queries at this custom calendar grain.
    CustomGrainQueryable(String),
    /// The path runs through the aggregation time dimension of its source
    /// measure. Model-scoped so a same-named dimension on another model
    /// cannot satisfy it.
    AggregationTimeDimension { model: ModelReference, dimension: DimensionReference },
}

impl fmt::Display for TraversalTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraversalTag::GrainQueryable(granularity) => {
                write!(f, "grain_queryable({granularity})")
            }
            TraversalTag::CustomGrainQueryable(name) => {
                write!(f, "custom_grain_queryable({name})")
            }
            TraversalTag::AggregationTimeDimension { model, dimension } => {
                write!(f, "aggregation_time_dimension({model}.{dimension})")
            }
        }
    }
}

/// A semantic graph edge. Endpoints are embedded by value; the graph also
/// tracks them structurally, auto-registering both as nodes on insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticGraphEdge {
    pub tail: SemanticGraphNode,
    pub head: SemanticGraphNode,
    pub ty: EdgeTypeTag,
    pub computation: ComputationMethod,
    pub required_tags: BTreeSet<TraversalTag>,
    pub provided_tags: BTreeSet<TraversalTag>,
    pub recipe_steps: SmallVec<[AttributeRecipeStep; 2]>,
}

impl SemanticGraphEdge {
    pub fn new(
        tail: SemanticGraphNode,
        head: SemanticGraphNode,
        ty: EdgeTypeTag,
        computation: ComputationMethod,
    ) -> Self {
        Self {
            tail,
            head,
            ty,
            computation,
            required_tags: BTreeSet::new(),
            provided_tags: BTreeSet::new(),
            recipe_steps: SmallVec::new(),
        }
    }

    pub fn requires(mut self, tag: TraversalTag) -> Self {
        self.required_tags.insert(tag);
        self
    }

    pub fn provides(mut self, tags: impl IntoIterator<Item = TraversalTag>) -> Self {
        self.provided_tags.extend(tags);
        self
    }

    pub fn with_steps(mut self, steps: impl IntoIterator<Item = AttributeRecipeStep>) -> Self {
        self.recipe_steps.extend(steps);
        self
    }

    /// Labels this edge carries in the graph's label multimap.
    pub fn labels(&self) -> &'static [GraphLabel] {
        match self.ty {
            EdgeTypeTag::EntityRelationship => &[GraphLabel::Join],
            EdgeTypeTag::ComposedOf => &[GraphLabel::Composition],
            EdgeTypeTag::OneToOne => &[GraphLabel::Time],
            EdgeTypeTag::MetricSource | EdgeTypeTag::AttributeSource => &[],
        }
    }
}

impl fmt::Display for SemanticGraphEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.tail, self.ty.kind(), self.head)
    }
}
