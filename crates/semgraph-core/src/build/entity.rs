//! Entity subgraphs: key attributes and the join fabric.

use semgraph_manifest::{ManifestError, ManifestObjectLookup, SemanticModel};

use crate::build::SubgraphGenerator;
use crate::graph::edge::{ComputationMethod, EdgeTypeTag, SemanticGraphEdge};
use crate::graph::node::SemanticGraphNode;
use crate::recipe::step::AttributeRecipeStep;
use crate::recipe::ValidityWindowJoin;

fn model_nodes(model: &SemanticModel) -> [SemanticGraphNode; 2] {
    [
        SemanticGraphNode::LocalModel { model: model.name.clone() },
        SemanticGraphNode::JoinedModel { model: model.name.clone() },
    ]
}

/// Emits `Model → KeyAttribute` edges for every entity key column.
pub struct EntityKeySubgraph;

impl SubgraphGenerator for EntityKeySubgraph {
    fn name(&self) -> &'static str {
        "entity-key"
    }

    fn generate(
        &self,
        lookup: &ManifestObjectLookup,
    ) -> Result<Vec<SemanticGraphEdge>, ManifestError> {
        let mut edges = Vec::new();
        for model in lookup.semantic_models() {
            for entity in &model.entities {
                let attribute = SemanticGraphNode::KeyAttribute { entity: entity.name.clone() };
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

/// Emits the join fabric: `Model → Entity` pivots plus `Entity → JoinedModel`
/// edges into every model the entity identifies.
///
/// The pivot edge is co-located (it only names the key column); the landing
/// edge carries the join recipe step, including the SCD validity window when
/// the target model declares one. Multi-hop joins arise from `JoinedModel`
/// fan-out; cycles are cut by the traversal's no-revisit rule, not here.
pub struct EntityJoinSubgraph;

impl SubgraphGenerator for EntityJoinSubgraph {
    fn name(&self) -> &'static str {
        "entity-join"
    }

    fn generate(
        &self,
        lookup: &ManifestObjectLookup,
    ) -> Result<Vec<SemanticGraphEdge>, ManifestError> {
        let mut edges = Vec::new();

        for model in lookup.semantic_models() {
            for entity in &model.entities {
                let pivot = SemanticGraphNode::Entity { entity: entity.name.clone() };
                for model_node in model_nodes(model) {
                    edges.push(SemanticGraphEdge::new(
                        model_node,
                        pivot.clone(),
                        EdgeTypeTag::EntityRelationship,
                        ComputationMethod::CoLocatedInModel { model: model.name.clone() },
                    ));
                }
            }
        }

        for entity_name in lookup.entity_names() {
            let pivot = SemanticGraphNode::Entity { entity: entity_name.clone() };
            for target_name in lookup.models_with_entity(entity_name) {
                let target = lookup.model(target_name)?;
                if !target.is_join_target_through(entity_name) {
                    continue;
                }
                let validity = scd_validity_window(target);
                edges.push(
                    SemanticGraphEdge::new(
                        pivot.clone(),
                        SemanticGraphNode::JoinedModel { model: target.name.clone() },
                        EdgeTypeTag::EntityRelationship,
                        ComputationMethod::JoinedViaEntity {
                            entity: entity_name.clone(),
                            model: target.name.clone(),
                            validity: validity.clone(),
                        },
                    )
                    .with_steps([AttributeRecipeStep::JoinModelViaEntity {
                        model: target.name.clone(),
                        entity: entity_name.clone(),
                        validity,
                    }]),
                );
            }
        }
        Ok(edges)
    }
}

/// The SCD validity window of a model, when both bounds are declared.
fn scd_validity_window(model: &SemanticModel) -> Option<ValidityWindowJoin> {
    let mut window_start = None;
    let mut window_end = None;
    for dimension in model.time_dimensions() {
        if let Some(params) = dimension.validity_params() {
            if params.is_start {
                window_start.get_or_insert_with(|| dimension.name.clone());
            }
            if params.is_end {
                window_end.get_or_insert_with(|| dimension.name.clone());
            }
        }
    }
    match (window_start, window_end) {
        (Some(window_start), Some(window_end)) => {
            Some(ValidityWindowJoin { window_start, window_end })
        }
        _ => None,
    }
}
