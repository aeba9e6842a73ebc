//! Dimension subgraphs: categorical attributes and the time-dimension
//! machinery (grain truncation and date-part extraction).

use semgraph_manifest::{
    DatePart, ExpandedTimeGranularity, ManifestError, ManifestObjectLookup, SemanticModel,
};

use crate::build::SubgraphGenerator;
use crate::graph::edge::{ComputationMethod, EdgeTypeTag, SemanticGraphEdge, TraversalTag};
use crate::graph::node::{SemanticGraphNode, TimeAccess, TimeAttributeSource};
use crate::recipe::step::AttributeRecipeStep;

/// Both resolvable flavors of a model. Attributes hang off each so they are
/// reachable whether the model is the metric's source or a join target.
fn model_nodes(model: &SemanticModel) -> [SemanticGraphNode; 2] {
    [
        SemanticGraphNode::LocalModel { model: model.name.clone() },
        SemanticGraphNode::JoinedModel { model: model.name.clone() },
    ]
}

/// Emits `Model → CategoricalDimensionAttribute` edges.
pub struct CategoricalDimensionSubgraph;

impl SubgraphGenerator for CategoricalDimensionSubgraph {
    fn name(&self) -> &'static str {
        "categorical-dimension"
    }

    fn generate(
        &self,
        lookup: &ManifestObjectLookup,
    ) -> Result<Vec<SemanticGraphEdge>, ManifestError> {
        let mut edges = Vec::new();
        for model in lookup.semantic_models() {
            for dimension in model.categorical_dimensions() {
                let attribute = SemanticGraphNode::CategoricalDimensionAttribute {
                    dimension: dimension.name.clone(),
                };
                for model_node in model_nodes(model) {
                    edges.push(SemanticGraphEdge::new(
                        model_node,
                        attribute.clone(),
                        EdgeTypeTag::AttributeSource,
                        ComputationMethod::CoLocatedInModel { model: model.name.clone() },
                    ));
                }
            }
        }
        Ok(edges)
    }
}

/// Emits time-dimension pivots and their derived time attributes.
///
/// The `Model → TimeDimension` edge advertises which grains the dimension can
/// serve (every standard grain at or coarser than its configured grain, plus
/// custom spine grains whose base fits). The `TimeDimension → TimeAttribute`
/// edges then *require* the matching grain tag, so a truncation is only
/// traversable along paths that proved the grain is available.
pub struct TimeDimensionSubgraph;

impl SubgraphGenerator for TimeDimensionSubgraph {
    fn name(&self) -> &'static str {
        "time-dimension"
    }

    fn generate(
        &self,
        lookup: &ManifestObjectLookup,
    ) -> Result<Vec<SemanticGraphEdge>, ManifestError> {
        let spine = lookup.time_spine();
        let mut edges = Vec::new();

        for model in lookup.semantic_models() {
            for dimension in model.time_dimensions() {
                let grain = lookup.granularity_of(&model.name, dimension)?;
                let pivot = SemanticGraphNode::TimeDimension {
                    model: model.name.clone(),
                    dimension: dimension.name.clone(),
                    granularity: grain,
                };

                let mut provided: Vec<TraversalTag> =
                    grain.queryable_grains().map(TraversalTag::GrainQueryable).collect();
                for custom in &spine.custom_granularities {
                    if custom.base_granularity >= grain {
                        provided.push(TraversalTag::CustomGrainQueryable(custom.name.clone()));
                    }
                }
                for model_node in model_nodes(model) {
                    edges.push(
                        SemanticGraphEdge::new(
                            model_node,
                            pivot.clone(),
                            EdgeTypeTag::AttributeSource,
                            ComputationMethod::CoLocatedInModel { model: model.name.clone() },
                        )
                        .provides(provided.iter().cloned()),
                    );
                }

                // Truncations to standard grains at or coarser than the base.
                for target in grain.queryable_grains() {
                    let expanded = ExpandedTimeGranularity::from_standard(target);
                    edges.push(
                        SemanticGraphEdge::new(
                            pivot.clone(),
                            SemanticGraphNode::TimeAttribute {
                                source: TimeAttributeSource::TimeDimension {
                                    dimension: dimension.name.clone(),
                                },
                                access: TimeAccess::Granularity(expanded.clone()),
                            },
                            EdgeTypeTag::OneToOne,
                            ComputationMethod::DateTrunc { granularity: expanded.clone() },
                        )
                        .requires(TraversalTag::GrainQueryable(target))
                        .with_steps([AttributeRecipeStep::TruncateTime { granularity: expanded }]),
                    );
                }

                // Truncations to custom calendar grains defined on the spine.
                for custom in &spine.custom_granularities {
                    if custom.base_granularity < grain {
                        continue;
                    }
                    let expanded =
                        ExpandedTimeGranularity::custom(custom.name.clone(), custom.base_granularity);
                    edges.push(
                        SemanticGraphEdge::new(
                            pivot.clone(),
                            SemanticGraphNode::TimeAttribute {
                                source: TimeAttributeSource::TimeDimension {
                                    dimension: dimension.name.clone(),
                                },
                                access: TimeAccess::Granularity(expanded.clone()),
                            },
                            EdgeTypeTag::OneToOne,
                            ComputationMethod::DateTrunc { granularity: expanded.clone() },
                        )
                        .requires(TraversalTag::CustomGrainQueryable(custom.name.clone()))
                        .with_steps([AttributeRecipeStep::TruncateTime { granularity: expanded }]),
                    );
                }

                // Date parts the dimension's grain is fine enough to compute.
                for date_part in DatePart::ALL {
                    let minimum = date_part.minimum_queryable_granularity();
                    if minimum < grain {
                        continue;
                    }
                    edges.push(
                        SemanticGraphEdge::new(
                            pivot.clone(),
                            SemanticGraphNode::TimeAttribute {
                                source: TimeAttributeSource::TimeDimension {
                                    dimension: dimension.name.clone(),
                                },
                                access: TimeAccess::DatePart(date_part),
                            },
                            EdgeTypeTag::OneToOne,
                            ComputationMethod::DateExtract { date_part },
                        )
                        .requires(TraversalTag::GrainQueryable(minimum))
                        .with_steps([AttributeRecipeStep::ExtractDatePart { date_part }]),
                    );
                }
            }
        }
        Ok(edges)
    }
}
