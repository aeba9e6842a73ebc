//! Semantic graph nodes.
//!
//! Node identity is structural: two nodes are the same node exactly when
//! their values are equal, and values embed only manifest references and
//! configuration. Identity is therefore stable across independent builds of
//! the same manifest, which is what lets resolution results cache across
//! processes. The graph interns values to handles; nothing here is a
//! singleton.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use semgraph_manifest::{
    DatePart, DimensionReference, EntityReference, ExpandedTimeGranularity, MetricReference,
    ModelReference, TimeGranularity,
};

use crate::graph::label::GraphLabel;
use crate::recipe::step::AttributeRecipeStep;

/// Element name of the virtual metric-time attribute.
pub const METRIC_TIME_ELEMENT_NAME: &str = "metric_time";

/// Where a time attribute's values come from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeAttributeSource {
    /// A configured time dimension, by name.
    TimeDimension { dimension: DimensionReference },
    /// The virtual metric-time column.
    MetricTime,
}

impl TimeAttributeSource {
    pub fn element_name(&self) -> &str {
        match self {
            TimeAttributeSource::TimeDimension { dimension } => dimension.as_str(),
            TimeAttributeSource::MetricTime => METRIC_TIME_ELEMENT_NAME,
        }
    }
}

/// How a time attribute narrows its source column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeAccess {
    Granularity(ExpandedTimeGranularity),
    DatePart(DatePart),
}

impl TimeAccess {
    /// The dunder-name suffix segment for this access.
    pub fn suffix(&self) -> &str {
        match self {
            TimeAccess::Granularity(granularity) => &granularity.name,
            TimeAccess::DatePart(date_part) => date_part.name(),
        }
    }
}

/// The closed set of semantic graph node kinds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticGraphNode {
    /// An entity usable as a join hop between models.
    Entity { entity: EntityReference },
    /// A model in source position (read directly by a metric).
    LocalModel { model: ModelReference },
    /// A model in joined position (reached through an entity).
    JoinedModel { model: ModelReference },
    /// A measure-backed metric (simple or cumulative). Also the node reached
    /// when the metric is used as a group-by.
    SimpleMetric { metric: MetricReference },
    /// A ratio or derived metric, composed of other metrics.
    ComplexMetric { metric: MetricReference },
    /// A categorical dimension column selectable as a group-by.
    CategoricalDimensionAttribute { dimension: DimensionReference },
    /// An entity key column selectable as a group-by.
    KeyAttribute { entity: EntityReference },
    /// A time dimension as configured on one model. Model-scoped because the
    /// grain and aggregation-time role are per model.
    TimeDimension {
        model: ModelReference,
        dimension: DimensionReference,
        granularity: TimeGranularity,
    },
    /// A time column narrowed to a grain or date part.
    TimeAttribute { source: TimeAttributeSource, access: TimeAccess },
    /// The hub tying aggregation-time dimensions to metric time.
    TimeEntity,
    /// The virtual metric-time element.
    MetricTime,
}

impl SemanticGraphNode {
    pub fn kind(&self) -> &'static str {
        match self {
            SemanticGraphNode::Entity { .. } => "entity",
            SemanticGraphNode::LocalModel { .. } => "local_model",
            SemanticGraphNode::JoinedModel { .. } => "joined_model",
            SemanticGraphNode::SimpleMetric { .. } => "simple_metric",
            SemanticGraphNode::ComplexMetric { .. } => "complex_metric",
            SemanticGraphNode::CategoricalDimensionAttribute { .. } => {
                "categorical_dimension_attribute"
            }
            SemanticGraphNode::KeyAttribute { .. } => "key_attribute",
            SemanticGraphNode::TimeDimension { .. } => "time_dimension",
            SemanticGraphNode::TimeAttribute { .. } => "time_attribute",
            SemanticGraphNode::TimeEntity => "time_entity",
            SemanticGraphNode::MetricTime => "metric_time",
        }
    }

    /// Labels this node carries in the graph's label multimap.
    pub fn labels(&self) -> &'static [GraphLabel] {
        match self {
            SemanticGraphNode::Entity { .. } => &[GraphLabel::Entity],
            SemanticGraphNode::LocalModel { .. } | SemanticGraphNode::JoinedModel { .. } => {
                &[GraphLabel::Model]
            }
            SemanticGraphNode::SimpleMetric { .. } => {
                &[GraphLabel::Metric, GraphLabel::GroupByMetric]
            }
            SemanticGraphNode::ComplexMetric { .. } => &[GraphLabel::Metric],
            SemanticGraphNode::CategoricalDimensionAttribute { .. }
            | SemanticGraphNode::KeyAttribute { .. } => &[GraphLabel::GroupByAttribute],
            SemanticGraphNode::TimeDimension { .. }
            | SemanticGraphNode::TimeAttribute { .. }
            | SemanticGraphNode::MetricTime => &[GraphLabel::Time, GraphLabel::GroupByAttribute],
            SemanticGraphNode::TimeEntity => &[GraphLabel::Time],
        }
    }

    /// Recipe steps contributed when a path starts at this node.
    pub fn source_recipe_steps(&self) -> SmallVec<[AttributeRecipeStep; 2]> {
        match self {
            SemanticGraphNode::SimpleMetric { metric }
            | SemanticGraphNode::ComplexMetric { metric } => {
                smallvec![AttributeRecipeStep::ReadMetricSource { metric: metric.clone() }]
            }
            SemanticGraphNode::LocalModel { model } => {
                smallvec![AttributeRecipeStep::ReadModelSource { model: model.clone() }]
            }
            _ => self.entry_recipe_steps(),
        }
    }

    /// Recipe steps contributed when a path enters this node through an edge.
    /// Metric nodes differ from their source role here: entered as a group-by
    /// target, they select their value instead of opening their source.
    pub fn entry_recipe_steps(&self) -> SmallVec<[AttributeRecipeStep; 2]> {
        match self {
            SemanticGraphNode::Entity { entity } => {
                smallvec![AttributeRecipeStep::AddEntityLink { entity: entity.clone() }]
            }
            SemanticGraphNode::SimpleMetric { metric } => {
                smallvec![AttributeRecipeStep::SelectMetricValue { metric: metric.clone() }]
            }
            SemanticGraphNode::CategoricalDimensionAttribute { dimension } => {
                smallvec![AttributeRecipeStep::SelectCategoricalDimension {
                    dimension: dimension.clone(),
                }]
            }
            SemanticGraphNode::KeyAttribute { entity } => {
                smallvec![AttributeRecipeStep::SelectEntityKey { entity: entity.clone() }]
            }
            SemanticGraphNode::TimeDimension { dimension, granularity, .. } => {
                smallvec![AttributeRecipeStep::SelectTimeDimension {
                    dimension: dimension.clone(),
                    granularity: *granularity,
                }]
            }
            SemanticGraphNode::MetricTime => smallvec![AttributeRecipeStep::SelectMetricTime],
            SemanticGraphNode::LocalModel { .. }
            | SemanticGraphNode::JoinedModel { .. }
            | SemanticGraphNode::ComplexMetric { .. }
            | SemanticGraphNode::TimeAttribute { .. }
            | SemanticGraphNode::TimeEntity => SmallVec::new(),
        }
    }

    /// The element name this node contributes to dunder names, when it is a
    /// selectable target.
    pub fn element_name(&self) -> Option<&str> {
        match self {
            SemanticGraphNode::CategoricalDimensionAttribute { dimension } => {
                Some(dimension.as_str())
            }
            SemanticGraphNode::KeyAttribute { entity } => Some(entity.as_str()),
            SemanticGraphNode::TimeDimension { dimension, .. } => Some(dimension.as_str()),
            SemanticGraphNode::TimeAttribute { source, .. } => Some(source.element_name()),
            SemanticGraphNode::MetricTime => Some(METRIC_TIME_ELEMENT_NAME),
            SemanticGraphNode::SimpleMetric { metric } => Some(metric.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for SemanticGraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticGraphNode::Entity { entity } => write!(f, "Entity({entity})"),
            SemanticGraphNode::LocalModel { model } => write!(f, "LocalModel({model})"),
            SemanticGraphNode::JoinedModel { model } => write!(f, "JoinedModel({model})"),
            SemanticGraphNode::SimpleMetric { metric } => write!(f, "SimpleMetric({metric})"),
            SemanticGraphNode::ComplexMetric { metric } => write!(f, "ComplexMetric({metric})"),
            SemanticGraphNode::CategoricalDimensionAttribute { dimension } => {
                write!(f, "CategoricalDimensionAttribute({dimension})")
            }
            SemanticGraphNode::KeyAttribute { entity } => write!(f, "KeyAttribute({entity})"),
            SemanticGraphNode::TimeDimension { model, dimension, granularity } => {
                write!(f, "TimeDimension({model}.{dimension}@{granularity})")
            }
            SemanticGraphNode::TimeAttribute { source, access } => {
                write!(f, "TimeAttribute({}@{})", source.element_name(), access.suffix())
            }
            SemanticGraphNode::TimeEntity => write!(f, "TimeEntity"),
            SemanticGraphNode::MetricTime => write!(f, "MetricTime"),
        }
    }
}
