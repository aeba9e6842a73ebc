//! Attribute recipe steps.
//!
//! A recipe is an ordered list of these steps; replayed against the metric's
//! source data, they compute one group-by attribute. Steps accumulate as a
//! path is traversed: edges contribute their stored steps, and the node a
//! path enters contributes its entry steps.

use serde::{Deserialize, Serialize};

use semgraph_manifest::{
    DatePart, DimensionReference, EntityReference, ExpandedTimeGranularity, MetricReference,
    ModelReference, TimeGranularity,
};

/// SCD validity-window columns applied when joining a windowed model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValidityWindowJoin {
    pub window_start: DimensionReference,
    pub window_end: DimensionReference,
}

/// One step in an attribute computation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeRecipeStep {
    /// Start from a metric's definition.
    ReadMetricSource { metric: MetricReference },
    /// Read a model's source table.
    ReadModelSource { model: ModelReference },
    /// Fix the aggregation time column for everything downstream.
    SetAggregationTimeSource { dimension: DimensionReference, granularity: TimeGranularity },
    /// Prefix the attribute name with an entity link.
    AddEntityLink { entity: EntityReference },
    /// Join another model through an entity key.
    JoinModelViaEntity {
        model: ModelReference,
        entity: EntityReference,
        validity: Option<ValidityWindowJoin>,
    },
    /// Select a categorical dimension column.
    SelectCategoricalDimension { dimension: DimensionReference },
    /// Select an entity key column.
    SelectEntityKey { entity: EntityReference },
    /// Select a time dimension column at its configured grain.
    SelectTimeDimension { dimension: DimensionReference, granularity: TimeGranularity },
    /// Select the virtual metric-time column.
    SelectMetricTime,
    /// Truncate the selected time column to a grain.
    TruncateTime { granularity: ExpandedTimeGranularity },
    /// Extract a date part from the selected time column.
    ExtractDatePart { date_part: DatePart },
    /// Select another metric's value, grouped in a correlated subquery.
    SelectMetricValue { metric: MetricReference },
    /// Correlate the metric subquery back to the outer query on an entity key.
    CorrelateSubquery { entity: EntityReference },
}

impl AttributeRecipeStep {
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeRecipeStep::ReadMetricSource { .. } => "read_metric_source",
            AttributeRecipeStep::ReadModelSource { .. } => "read_model_source",
            AttributeRecipeStep::SetAggregationTimeSource { .. } => "set_aggregation_time_source",
            AttributeRecipeStep::AddEntityLink { .. } => "add_entity_link",
            AttributeRecipeStep::JoinModelViaEntity { .. } => "join_model_via_entity",
            AttributeRecipeStep::SelectCategoricalDimension { .. } => {
                "select_categorical_dimension"
            }
            AttributeRecipeStep::SelectEntityKey { .. } => "select_entity_key",
            AttributeRecipeStep::SelectTimeDimension { .. } => "select_time_dimension",
            AttributeRecipeStep::SelectMetricTime => "select_metric_time",
            AttributeRecipeStep::TruncateTime { .. } => "truncate_time",
            AttributeRecipeStep::ExtractDatePart { .. } => "extract_date_part",
            AttributeRecipeStep::SelectMetricValue { .. } => "select_metric_value",
            AttributeRecipeStep::CorrelateSubquery { .. } => "correlate_subquery",
        }
    }

    /// Whether this step names the element the recipe ultimately selects.
    pub fn is_element_select(&self) -> bool {
        matches!(
            self,
            AttributeRecipeStep::SelectCategoricalDimension { .. }
                | AttributeRecipeStep::SelectEntityKey { .. }
                | AttributeRecipeStep::SelectTimeDimension { .. }
                | AttributeRecipeStep::SelectMetricTime
                | AttributeRecipeStep::SelectMetricValue { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_selects_are_classified() {
        assert!(AttributeRecipeStep::SelectMetricTime.is_element_select());
        assert!(AttributeRecipeStep::SelectEntityKey {
            entity: EntityReference::new("listing"),
        }
        .is_element_select());
        assert!(!AttributeRecipeStep::AddEntityLink {
            entity: EntityReference::new("listing"),
        }
        .is_element_select());
        assert!(!AttributeRecipeStep::TruncateTime {
            granularity: ExpandedTimeGranularity::from_standard(TimeGranularity::Day),
        }
        .is_element_select());
    }

    #[test]
    fn step_serde_roundtrip() {
        let step = AttributeRecipeStep::JoinModelViaEntity {
            model: ModelReference::new("listings_source"),
            entity: EntityReference::new("listing"),
            validity: None,
        };
        let json = serde_json::to_string(&step).unwrap();
        let back: AttributeRecipeStep = serde_json::from_str(&json).unwrap();
        assert_eq!(step, back);
    }
}
