//! Attribute recipes: ordered computation steps for one group-by attribute.
//!
//! A finished recipe answers "how is this attribute computed from the
//! metric's source data" and doubles as the authority on the attribute's
//! **indexed dunder name**: entity links, then the element name, then an
//! optional time suffix, joined by `__`.

pub mod step;
pub mod writer;

use serde::{Deserialize, Serialize};

use semgraph_manifest::{EntityReference, ModelReference};

use crate::graph::node::METRIC_TIME_ELEMENT_NAME;
use crate::recipe::step::AttributeRecipeStep;

pub use step::ValidityWindowJoin;
pub use writer::AttributeRecipeWriterPath;

/// Separator between dunder-name segments.
pub const DUNDER: &str = "__";

/// An append-only list of attribute computation steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecipe {
    steps: Vec<AttributeRecipeStep>,
}

impl AttributeRecipe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: impl IntoIterator<Item = AttributeRecipeStep>) -> Self {
        Self { steps: steps.into_iter().collect() }
    }

    pub fn push(&mut self, step: AttributeRecipeStep) {
        self.steps.push(step);
    }

    pub fn extend(&mut self, steps: impl IntoIterator<Item = AttributeRecipeStep>) {
        self.steps.extend(steps);
    }

    pub fn steps(&self) -> &[AttributeRecipeStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Entity links accumulated so far, in traversal order.
    pub fn entity_links(&self) -> Vec<EntityReference> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                AttributeRecipeStep::AddEntityLink { entity } => Some(entity.clone()),
                _ => None,
            })
            .collect()
    }

    /// Models read or joined, in traversal order. The first entry is the
    /// source model, the rest are join targets.
    pub fn model_trail(&self) -> Vec<ModelReference> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                AttributeRecipeStep::ReadModelSource { model }
                | AttributeRecipeStep::JoinModelViaEntity { model, .. } => Some(model.clone()),
                _ => None,
            })
            .collect()
    }

    /// The model the selected element lives in.
    pub fn owning_model(&self) -> Option<&ModelReference> {
        self.steps.iter().rev().find_map(|step| match step {
            AttributeRecipeStep::ReadModelSource { model }
            | AttributeRecipeStep::JoinModelViaEntity { model, .. } => Some(model),
            _ => None,
        })
    }

    /// The element name selected by this recipe, if any select step ran.
    pub fn element_name(&self) -> Option<&str> {
        self.steps.iter().rev().find_map(|step| match step {
            AttributeRecipeStep::SelectCategoricalDimension { dimension } => {
                Some(dimension.as_str())
            }
            AttributeRecipeStep::SelectEntityKey { entity } => Some(entity.as_str()),
            AttributeRecipeStep::SelectTimeDimension { dimension, .. } => Some(dimension.as_str()),
            AttributeRecipeStep::SelectMetricTime => Some(METRIC_TIME_ELEMENT_NAME),
            AttributeRecipeStep::SelectMetricValue { metric } => Some(metric.as_str()),
            _ => None,
        })
    }

    /// Ordered dunder-name segments: entity links, element, optional time
    /// suffix. `None` until an element has been selected.
    pub fn name_segments(&self) -> Option<Vec<String>> {
        let mut links: Vec<String> = Vec::new();
        let mut element: Option<String> = None;
        let mut suffix: Option<String> = None;

        for step in &self.steps {
            match step {
                AttributeRecipeStep::AddEntityLink { entity } => links.push(entity.to_string()),
                AttributeRecipeStep::SelectCategoricalDimension { dimension } => {
                    element = Some(dimension.to_string());
                    suffix = None;
                }
                AttributeRecipeStep::SelectEntityKey { entity } => {
                    element = Some(entity.to_string());
                    suffix = None;
                }
                AttributeRecipeStep::SelectTimeDimension { dimension, .. } => {
                    element = Some(dimension.to_string());
                    suffix = None;
                }
                AttributeRecipeStep::SelectMetricTime => {
                    element = Some(METRIC_TIME_ELEMENT_NAME.to_string());
                    suffix = None;
                }
                AttributeRecipeStep::SelectMetricValue { metric } => {
                    element = Some(metric.to_string());
                    suffix = None;
                }
                AttributeRecipeStep::TruncateTime { granularity } => {
                    suffix = Some(granularity.name.clone());
                }
                AttributeRecipeStep::ExtractDatePart { date_part } => {
                    suffix = Some(date_part.name().to_string());
                }
                _ => {}
            }
        }

        let element = element?;
        let mut segments = links;
        segments.push(element);
        if let Some(suffix) = suffix {
            segments.push(suffix);
        }
        Some(segments)
    }

    /// The rendered dunder name, once an element has been selected.
    pub fn indexed_dunder_name(&self) -> Option<String> {
        self.name_segments().map(|segments| segments.join(DUNDER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semgraph_manifest::{
        DimensionReference, ExpandedTimeGranularity, MetricReference, TimeGranularity,
    };

    #[test]
    fn local_dimension_name() {
        let recipe = AttributeRecipe::from_steps([
            AttributeRecipeStep::ReadMetricSource { metric: MetricReference::new("bookings") },
            AttributeRecipeStep::ReadModelSource {
                model: ModelReference::new("bookings_source"),
            },
            AttributeRecipeStep::SelectCategoricalDimension {
                dimension: DimensionReference::new("is_instant"),
            },
        ]);
        assert_eq!(recipe.indexed_dunder_name().as_deref(), Some("is_instant"));
        assert!(recipe.entity_links().is_empty());
        assert_eq!(recipe.owning_model().unwrap().as_str(), "bookings_source");
    }

    #[test]
    fn joined_dimension_name_carries_link() {
        let recipe = AttributeRecipe::from_steps([
            AttributeRecipeStep::ReadModelSource {
                model: ModelReference::new("bookings_source"),
            },
            AttributeRecipeStep::AddEntityLink { entity: EntityReference::new("listing") },
            AttributeRecipeStep::JoinModelViaEntity {
                model: ModelReference::new("listings_source"),
                entity: EntityReference::new("listing"),
                validity: None,
            },
            AttributeRecipeStep::SelectCategoricalDimension {
                dimension: DimensionReference::new("country"),
            },
        ]);
        assert_eq!(recipe.indexed_dunder_name().as_deref(), Some("listing__country"));
        assert_eq!(
            recipe.model_trail().iter().map(ModelReference::as_str).collect::<Vec<_>>(),
            vec!["bookings_source", "listings_source"],
        );
        assert_eq!(recipe.owning_model().unwrap().as_str(), "listings_source");
    }

    #[test]
    fn time_suffix_appends_after_element() {
        let recipe = AttributeRecipe::from_steps([
            AttributeRecipeStep::SelectMetricTime,
            AttributeRecipeStep::TruncateTime {
                granularity: ExpandedTimeGranularity::from_standard(TimeGranularity::Day),
            },
        ]);
        assert_eq!(recipe.indexed_dunder_name().as_deref(), Some("metric_time__day"));
        assert_eq!(recipe.element_name(), Some("metric_time"));
    }

    #[test]
    fn name_is_absent_until_an_element_is_selected() {
        let recipe = AttributeRecipe::from_steps([
            AttributeRecipeStep::ReadModelSource {
                model: ModelReference::new("bookings_source"),
            },
            AttributeRecipeStep::AddEntityLink { entity: EntityReference::new("listing") },
        ]);
        assert_eq!(recipe.indexed_dunder_name(), None);
        assert_eq!(recipe.element_name(), None);
    }

    #[test]
    fn group_by_metric_name_links_through_entity() {
        let recipe = AttributeRecipe::from_steps([
            AttributeRecipeStep::ReadMetricSource { metric: MetricReference::new("views") },
            AttributeRecipeStep::ReadModelSource { model: ModelReference::new("views_source") },
            AttributeRecipeStep::AddEntityLink { entity: EntityReference::new("listing") },
            AttributeRecipeStep::CorrelateSubquery { entity: EntityReference::new("listing") },
            AttributeRecipeStep::SelectMetricValue { metric: MetricReference::new("bookings") },
        ]);
        assert_eq!(recipe.indexed_dunder_name().as_deref(), Some("listing__bookings"));
    }

    #[test]
    fn recipe_serde_roundtrip() {
        let recipe = AttributeRecipe::from_steps([AttributeRecipeStep::SelectMetricTime]);
        let json = serde_json::to_string(&recipe).unwrap();
        let back: AttributeRecipe = serde_json::from_str(&json).unwrap();
        assert_eq!(recipe, back);
    }
}
