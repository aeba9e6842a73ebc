//! Manifest lookup errors.
//!
//! Uses `thiserror` for structured, matchable variants. Every variant here
//! signals a broken validated-manifest assumption; callers propagate them as
//! internal errors rather than recovering.

use thiserror::Error;

use crate::metric::MetricType;
use crate::refs::{
    DimensionReference, EntityReference, MeasureReference, MetricReference, ModelReference,
};

/// Errors produced by manifest loading and the object lookup.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest JSON failed to deserialize.
    #[error("invalid manifest json: {reason}")]
    InvalidManifestJson { reason: String },

    /// A metric name was not found in the manifest.
    #[error("metric not found: '{name}'")]
    MetricNotFound { name: MetricReference },

    /// A semantic model name was not found in the manifest.
    #[error("semantic model not found: '{name}'")]
    ModelNotFound { name: ModelReference },

    /// A measure name was not found in any semantic model.
    #[error("measure not found: '{name}'")]
    MeasureNotFound { name: MeasureReference },

    /// An entity name was not found in the named model.
    #[error("entity '{name}' not found in model '{model}'")]
    EntityNotFound { model: ModelReference, name: EntityReference },

    /// A dimension name was not found in the named model.
    #[error("dimension '{name}' not found in model '{model}'")]
    DimensionNotFound { model: ModelReference, name: DimensionReference },

    /// A time dimension is missing its configured granularity.
    #[error("time dimension '{dimension}' in model '{model}' has no granularity")]
    MissingTimeGranularity { model: ModelReference, dimension: DimensionReference },

    /// Neither the measure nor its model names an aggregation time dimension.
    #[error("measure '{measure}' in model '{model}' has no aggregation time dimension")]
    MissingAggregationTimeDimension { model: ModelReference, measure: MeasureReference },

    /// A measure-backed metric has no input measure.
    #[error("metric '{metric}' has no input measure")]
    MissingMeasureInput { metric: MetricReference },

    /// An operation requiring a measure-backed metric was given another type.
    #[error("metric '{metric}' has unsupported type '{metric_type}' here")]
    UnsupportedMetricType { metric: MetricReference, metric_type: MetricType },
}
