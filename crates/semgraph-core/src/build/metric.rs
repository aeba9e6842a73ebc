//! Metric subgraphs: measure-backed metric sources and metric composition.

use semgraph_manifest::{ManifestError, ManifestObjectLookup};

use crate::build::SubgraphGenerator;
use crate::graph::edge::{ComputationMethod, EdgeTypeTag, SemanticGraphEdge, TraversalTag};
use crate::graph::node::SemanticGraphNode;
use crate::recipe::step::AttributeRecipeStep;

/// Emits source edges for measure-backed metrics (simple and cumulative),
/// plus the group-by-metric surface.
///
/// The `SimpleMetric → LocalModel` edge anchors every resolution path: its
/// steps read the model source and pin the aggregation time column, and it
/// provides the `AggregationTimeDimension` tag that later gates the
/// metric-time machinery. The reverse `Entity → SimpleMetric` edges let a
/// metric appear as a group-by item of another metric's query, correlated
/// back through the shared entity key.
pub struct SimpleMetricSubgraph;

impl SubgraphGenerator for SimpleMetricSubgraph {
    fn name(&self) -> &'static str {
        "simple-metric"
    }

    fn generate(
        &self,
        lookup: &ManifestObjectLookup,
    ) -> Result<Vec<SemanticGraphEdge>, ManifestError> {
        let mut edges = Vec::new();
        for metric in lookup.measure_backed_metrics() {
            let measure = metric
                .input_measure()
                .ok_or_else(|| ManifestError::MissingMeasureInput { metric: metric.name.clone() })?;
            let model = lookup.metric_source_model(metric)?;
            let (agg_model, agg_dimension) = lookup.aggregation_time_dimension(&measure.name)?;
            let agg_grain = lookup.granularity_of(&agg_model.name, agg_dimension)?;
            let metric_node = SemanticGraphNode::SimpleMetric { metric: metric.name.clone() };

            edges.push(
                SemanticGraphEdge::new(
                    metric_node.clone(),
                    SemanticGraphNode::LocalModel { model: model.name.clone() },
                    EdgeTypeTag::MetricSource,
                    ComputationMethod::CoLocatedInModel { model: model.name.clone() },
                )
                .provides([TraversalTag::AggregationTimeDimension {
                    model: agg_model.name.clone(),
                    dimension: agg_dimension.name.clone(),
                }])
                .with_steps([
                    AttributeRecipeStep::ReadModelSource { model: model.name.clone() },
                    AttributeRecipeStep::SetAggregationTimeSource {
                        dimension: agg_dimension.name.clone(),
                        granularity: agg_grain,
                    },
                ]),
            );

            for entity in &model.entities {
                edges.push(
                    SemanticGraphEdge::new(
                        SemanticGraphNode::Entity { entity: entity.name.clone() },
                        metric_node.clone(),
                        EdgeTypeTag::AttributeSource,
                        ComputationMethod::JoinedViaEntity {
                            entity: entity.name.clone(),
                            model: model.name.clone(),
                            validity: None,
                        },
                    )
                    .with_steps([AttributeRecipeStep::CorrelateSubquery {
                        entity: entity.name.clone(),
                    }]),
                );
            }
        }
        Ok(edges)
    }
}

/// Emits `ComplexMetric → input` composition edges for ratio and derived
/// metrics. Inputs that are themselves complex chain further.
pub struct ComplexMetricSubgraph;

impl SubgraphGenerator for ComplexMetricSubgraph {
    fn name(&self) -> &'static str {
        "complex-metric"
    }

    fn generate(
        &self,
        lookup: &ManifestObjectLookup,
    ) -> Result<Vec<SemanticGraphEdge>, ManifestError> {
        let mut edges = Vec::new();
        for metric in lookup.complex_metrics() {
            let complex_node = SemanticGraphNode::ComplexMetric { metric: metric.name.clone() };
            for input in metric.input_metrics() {
                let input_metric = lookup.metric(&input.name)?;
                let head = if input_metric.is_measure_backed() {
                    SemanticGraphNode::SimpleMetric { metric: input_metric.name.clone() }
                } else {
                    SemanticGraphNode::ComplexMetric { metric: input_metric.name.clone() }
                };
                edges.push(SemanticGraphEdge::new(
                    complex_node.clone(),
                    head,
                    EdgeTypeTag::ComposedOf,
                    ComputationMethod::MetricComposition,
                ));
            }
        }
        Ok(edges)
    }
}
