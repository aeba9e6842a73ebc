//! Model elements: entities, dimensions, and measures.
//!
//! These are the validated shapes handed over by the upstream manifest
//! pipeline. The resolution core only reads them; all structural validation
//! (unique names, dangling references) has already happened.

use serde::{Deserialize, Serialize};

use crate::refs::{DimensionReference, EntityReference, MeasureReference};
use crate::time::TimeGranularity;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// How an entity column relates to the rows of its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Unique and non-null for every row.
    Primary,
    /// Unique but possibly null.
    Unique,
    /// Unique per validity window (slowly changing dimensions).
    Natural,
    /// References rows of some other model.
    Foreign,
}

impl EntityType {
    /// Whether a join may land on a model through an entity of this type.
    /// Joining onto a foreign key would fan out, so only keys that identify
    /// rows are join targets.
    pub fn is_join_target(&self) -> bool {
        matches!(self, EntityType::Primary | EntityType::Unique | EntityType::Natural)
    }
}

/// An entity column within a semantic model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: EntityReference,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default)]
    pub expr: Option<String>,
}

impl Entity {
    pub fn new(name: impl Into<EntityReference>, entity_type: EntityType) -> Self {
        Self { name: name.into(), entity_type, expr: None }
    }
}

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

/// Dimension flavors: plain categorical columns or time columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionType {
    Categorical,
    Time,
}

/// Marks a time dimension as the start or end column of an SCD validity
/// window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityParams {
    #[serde(default)]
    pub is_start: bool,
    #[serde(default)]
    pub is_end: bool,
}

/// Extra configuration carried by time dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDimensionParams {
    pub time_granularity: TimeGranularity,
    #[serde(default)]
    pub validity_params: Option<ValidityParams>,
}

/// A dimension column within a semantic model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: DimensionReference,
    #[serde(rename = "type")]
    pub dimension_type: DimensionType,
    #[serde(default)]
    pub type_params: Option<TimeDimensionParams>,
    #[serde(default)]
    pub expr: Option<String>,
}

impl Dimension {
    pub fn categorical(name: impl Into<DimensionReference>) -> Self {
        Self {
            name: name.into(),
            dimension_type: DimensionType::Categorical,
            type_params: None,
            expr: None,
        }
    }

    pub fn time(name: impl Into<DimensionReference>, granularity: TimeGranularity) -> Self {
        Self {
            name: name.into(),
            dimension_type: DimensionType::Time,
            type_params: Some(TimeDimensionParams {
                time_granularity: granularity,
                validity_params: None,
            }),
            expr: None,
        }
    }

    pub fn is_time(&self) -> bool {
        self.dimension_type == DimensionType::Time
    }

    /// Configured grain, present on every validated time dimension.
    pub fn time_granularity(&self) -> Option<TimeGranularity> {
        self.type_params.as_ref().map(|p| p.time_granularity)
    }

    /// Whether this dimension bounds an SCD validity window.
    pub fn validity_params(&self) -> Option<ValidityParams> {
        self.type_params.as_ref().and_then(|p| p.validity_params)
    }
}

// ---------------------------------------------------------------------------
// Measures
// ---------------------------------------------------------------------------

/// Aggregation applied to a measure's expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationType {
    Sum,
    Min,
    Max,
    Average,
    CountDistinct,
    SumBoolean,
    Count,
    Percentile,
    Median,
}

/// A measure within a semantic model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    pub name: MeasureReference,
    pub agg: AggregationType,
    /// Overrides the model default when set.
    #[serde(default)]
    pub agg_time_dimension: Option<DimensionReference>,
    #[serde(default)]
    pub create_metric: bool,
    #[serde(default)]
    pub expr: Option<String>,
}

impl Measure {
    pub fn new(name: impl Into<MeasureReference>, agg: AggregationType) -> Self {
        Self {
            name: name.into(),
            agg,
            agg_time_dimension: None,
            create_metric: false,
            expr: None,
        }
    }
}
