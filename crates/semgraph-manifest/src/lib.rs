pub mod elements;
pub mod error;
pub mod lookup;
pub mod manifest;
pub mod metric;
pub mod model;
pub mod refs;
pub mod time;

// Re-export commonly used types
pub use elements::{
    AggregationType, Dimension, DimensionType, Entity, EntityType, Measure, TimeDimensionParams,
    ValidityParams,
};
pub use error::ManifestError;
pub use lookup::ManifestObjectLookup;
pub use manifest::{ProjectConfiguration, SemanticManifest};
pub use metric::{Metric, MetricInput, MetricInputMeasure, MetricType, MetricTypeParams};
pub use model::{ModelDefaults, SemanticModel};
pub use refs::{
    DimensionReference, EntityReference, MeasureReference, MetricReference, ModelReference,
};
pub use time::{CustomGranularity, DatePart, ExpandedTimeGranularity, TimeGranularity, TimeSpine};
