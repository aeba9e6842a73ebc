//! Metric-time subgraph: the shared time entity and the spine attributes.

use semgraph_manifest::{DatePart, ExpandedTimeGranularity, ManifestError, ManifestObjectLookup};

use crate::build::SubgraphGenerator;
use crate::graph::edge::{ComputationMethod, EdgeTypeTag, SemanticGraphEdge, TraversalTag};
use crate::graph::node::{SemanticGraphNode, TimeAccess, TimeAttributeSource};
use crate::recipe::step::AttributeRecipeStep;

/// Funnels every time dimension into the `metric_time` pivot and fans the
/// pivot out at the spine's grains.
///
/// The funnel edge requires the `AggregationTimeDimension` tag that only the
/// owning metric's source edge provides, so `metric_time` always reads the
/// column a metric aggregates over and never some other time dimension that
/// happens to share a name. The fan-out edges re-require the grain tags
/// carried from the dimension's pivot edge, which keeps a coarse-grained
/// aggregation time from reaching finer spine attributes.
pub struct TimeEntitySubgraph;

impl SubgraphGenerator for TimeEntitySubgraph {
    fn name(&self) -> &'static str {
        "time-entity"
    }

    fn generate(
        &self,
        lookup: &ManifestObjectLookup,
    ) -> Result<Vec<SemanticGraphEdge>, ManifestError> {
        let mut edges = Vec::new();
        for model in lookup.semantic_models() {
            for dimension in model.time_dimensions() {
                let grain = lookup.granularity_of(&model.name, dimension)?;
                edges.push(
                    SemanticGraphEdge::new(
                        SemanticGraphNode::TimeDimension {
                            model: model.name.clone(),
                            dimension: dimension.name.clone(),
                            granularity: grain,
                        },
                        SemanticGraphNode::TimeEntity,
                        EdgeTypeTag::OneToOne,
                        ComputationMethod::MetricTimeIdentity,
                    )
                    .requires(TraversalTag::AggregationTimeDimension {
                        model: model.name.clone(),
                        dimension: dimension.name.clone(),
                    }),
                );
            }
        }
        // A manifest with no time dimensions has no metric time at all.
        if edges.is_empty() {
            return Ok(edges);
        }

        edges.push(SemanticGraphEdge::new(
            SemanticGraphNode::TimeEntity,
            SemanticGraphNode::MetricTime,
            EdgeTypeTag::OneToOne,
            ComputationMethod::MetricTimeIdentity,
        ));

        let spine = lookup.time_spine();
        for target in spine.base_granularity.queryable_grains() {
            let expanded = ExpandedTimeGranularity::from_standard(target);
            edges.push(
                SemanticGraphEdge::new(
                    SemanticGraphNode::MetricTime,
                    SemanticGraphNode::TimeAttribute {
                        source: TimeAttributeSource::MetricTime,
                        access: TimeAccess::Granularity(expanded.clone()),
                    },
                    EdgeTypeTag::OneToOne,
                    ComputationMethod::DateTrunc { granularity: expanded.clone() },
                )
                .requires(TraversalTag::GrainQueryable(target))
                .with_steps([AttributeRecipeStep::TruncateTime { granularity: expanded }]),
            );
        }
        for custom in &spine.custom_granularities {
            let expanded =
                ExpandedTimeGranularity::custom(custom.name.clone(), custom.base_granularity);
            edges.push(
                SemanticGraphEdge::new(
                    SemanticGraphNode::MetricTime,
                    SemanticGraphNode::TimeAttribute {
                        source: TimeAttributeSource::MetricTime,
                        access: TimeAccess::Granularity(expanded.clone()),
                    },
                    EdgeTypeTag::OneToOne,
                    ComputationMethod::DateTrunc { granularity: expanded.clone() },
                )
                .requires(TraversalTag::CustomGrainQueryable(custom.name.clone()))
                .with_steps([AttributeRecipeStep::TruncateTime { granularity: expanded }]),
            );
        }
        for date_part in DatePart::ALL {
            let minimum = date_part.minimum_queryable_granularity();
            if minimum < spine.base_granularity {
                continue;
            }
            edges.push(
                SemanticGraphEdge::new(
                    SemanticGraphNode::MetricTime,
                    SemanticGraphNode::TimeAttribute {
                        source: TimeAttributeSource::MetricTime,
                        access: TimeAccess::DatePart(date_part),
                    },
                    EdgeTypeTag::OneToOne,
                    ComputationMethod::DateExtract { date_part },
                )
                .requires(TraversalTag::GrainQueryable(minimum))
                .with_steps([AttributeRecipeStep::ExtractDatePart { date_part }]),
            );
        }
        Ok(edges)
    }
}
