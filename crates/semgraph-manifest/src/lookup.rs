//! Indexed, read-only view over a semantic manifest.
//!
//! The lookup is built once per manifest and shared by every component that
//! needs to resolve names: subgraph generators read it exclusively, and
//! validation workers can each build their own from the shared `Arc`.
//! Indexes use `IndexMap` so iteration order matches manifest order, which
//! keeps downstream graph construction deterministic.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::elements::{Dimension, Entity};
use crate::error::ManifestError;
use crate::manifest::SemanticManifest;
use crate::metric::Metric;
use crate::model::SemanticModel;
use crate::refs::{EntityReference, MeasureReference, MetricReference, ModelReference};
use crate::time::{TimeGranularity, TimeSpine};

/// Read-only name indexes over a validated manifest.
#[derive(Debug, Clone)]
pub struct ManifestObjectLookup {
    manifest: Arc<SemanticManifest>,
    models_by_name: IndexMap<ModelReference, usize>,
    metrics_by_name: IndexMap<MetricReference, usize>,
    measure_owners: IndexMap<MeasureReference, ModelReference>,
    entity_models: IndexMap<EntityReference, Vec<ModelReference>>,
}

impl ManifestObjectLookup {
    /// Builds the indexes. The manifest is validated upstream, so duplicate
    /// names do not occur; if they did, the first definition would win.
    pub fn new(manifest: Arc<SemanticManifest>) -> Self {
        let mut models_by_name = IndexMap::new();
        let mut measure_owners = IndexMap::new();
        let mut entity_models: IndexMap<EntityReference, Vec<ModelReference>> = IndexMap::new();

        for (position, model) in manifest.semantic_models.iter().enumerate() {
            models_by_name.entry(model.name.clone()).or_insert(position);
            for measure in &model.measures {
                measure_owners.entry(measure.name.clone()).or_insert_with(|| model.name.clone());
            }
            for entity in &model.entities {
                entity_models.entry(entity.name.clone()).or_default().push(model.name.clone());
            }
        }

        let mut metrics_by_name = IndexMap::new();
        for (position, metric) in manifest.metrics.iter().enumerate() {
            metrics_by_name.entry(metric.name.clone()).or_insert(position);
        }

        Self { manifest, models_by_name, metrics_by_name, measure_owners, entity_models }
    }

    pub fn manifest(&self) -> &SemanticManifest {
        &self.manifest
    }

    // -----------------------------------------------------------------------
    // Iteration, in manifest order
    // -----------------------------------------------------------------------

    pub fn semantic_models(&self) -> impl Iterator<Item = &SemanticModel> {
        self.manifest.semantic_models.iter()
    }

    pub fn metrics(&self) -> impl Iterator<Item = &Metric> {
        self.manifest.metrics.iter()
    }

    /// Metrics that aggregate a measure directly (simple and cumulative).
    pub fn measure_backed_metrics(&self) -> impl Iterator<Item = &Metric> {
        self.metrics().filter(|m| m.is_measure_backed())
    }

    /// Metrics composed of other metrics (ratio and derived).
    pub fn complex_metrics(&self) -> impl Iterator<Item = &Metric> {
        self.metrics().filter(|m| !m.is_measure_backed())
    }

    // -----------------------------------------------------------------------
    // Point lookups
    // -----------------------------------------------------------------------

    pub fn model(&self, name: &ModelReference) -> Result<&SemanticModel, ManifestError> {
        self.models_by_name
            .get(name)
            .map(|&position| &self.manifest.semantic_models[position])
            .ok_or_else(|| ManifestError::ModelNotFound { name: name.clone() })
    }

    pub fn metric(&self, name: &MetricReference) -> Result<&Metric, ManifestError> {
        self.metrics_by_name
            .get(name)
            .map(|&position| &self.manifest.metrics[position])
            .ok_or_else(|| ManifestError::MetricNotFound { name: name.clone() })
    }

    /// The model that defines a measure.
    pub fn measure_owner(&self, name: &MeasureReference) -> Result<&SemanticModel, ManifestError> {
        let model_name = self
            .measure_owners
            .get(name)
            .ok_or_else(|| ManifestError::MeasureNotFound { name: name.clone() })?;
        self.model(model_name)
    }

    /// Models containing an entity with this name, in manifest order.
    pub fn models_with_entity(&self, entity: &EntityReference) -> &[ModelReference] {
        self.entity_models.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every distinct entity name across the manifest, in first-seen order.
    pub fn entity_names(&self) -> impl Iterator<Item = &EntityReference> {
        self.entity_models.keys()
    }

    pub fn entity_in_model(
        &self,
        model: &ModelReference,
        entity: &EntityReference,
    ) -> Result<&Entity, ManifestError> {
        self.model(model)?.entity(entity).ok_or_else(|| ManifestError::EntityNotFound {
            model: model.clone(),
            name: entity.clone(),
        })
    }

    // -----------------------------------------------------------------------
    // Derived facts
    // -----------------------------------------------------------------------

    /// The source model of a measure-backed metric.
    pub fn metric_source_model(&self, metric: &Metric) -> Result<&SemanticModel, ManifestError> {
        if !metric.is_measure_backed() {
            return Err(ManifestError::UnsupportedMetricType {
                metric: metric.name.clone(),
                metric_type: metric.metric_type,
            });
        }
        let measure = metric
            .input_measure()
            .ok_or_else(|| ManifestError::MissingMeasureInput { metric: metric.name.clone() })?;
        self.measure_owner(&measure.name)
    }

    /// The aggregation time dimension of a measure: the per-measure override
    /// when present, otherwise the model default.
    pub fn aggregation_time_dimension(
        &self,
        measure: &MeasureReference,
    ) -> Result<(&SemanticModel, &Dimension), ManifestError> {
        let model = self.measure_owner(measure)?;
        let measure_def = model.measure(measure).ok_or_else(|| ManifestError::MeasureNotFound {
            name: measure.clone(),
        })?;
        let dimension_name = measure_def
            .agg_time_dimension
            .as_ref()
            .or(model.defaults.agg_time_dimension.as_ref())
            .ok_or_else(|| ManifestError::MissingAggregationTimeDimension {
                model: model.name.clone(),
                measure: measure.clone(),
            })?;
        let dimension =
            model.dimension(dimension_name).ok_or_else(|| ManifestError::DimensionNotFound {
                model: model.name.clone(),
                name: dimension_name.clone(),
            })?;
        Ok((model, dimension))
    }

    /// The configured grain of a time dimension.
    pub fn granularity_of(
        &self,
        model: &ModelReference,
        dimension: &Dimension,
    ) -> Result<TimeGranularity, ManifestError> {
        dimension.time_granularity().ok_or_else(|| ManifestError::MissingTimeGranularity {
            model: model.clone(),
            dimension: dimension.name.clone(),
        })
    }

    /// The effective time spine (day-grained when unconfigured).
    pub fn time_spine(&self) -> TimeSpine {
        self.manifest.time_spine()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{AggregationType, Dimension, Entity, EntityType, Measure};
    use crate::model::ModelDefaults;
    use crate::refs::DimensionReference;

    fn fixture_lookup() -> ManifestObjectLookup {
        let mut bookings = SemanticModel::new("bookings_source");
        bookings.defaults =
            ModelDefaults { agg_time_dimension: Some(DimensionReference::new("ds")) };
        bookings.entities.push(Entity::new("booking", EntityType::Primary));
        bookings.entities.push(Entity::new("listing", EntityType::Foreign));
        bookings.dimensions.push(Dimension::categorical("is_instant"));
        bookings.dimensions.push(Dimension::time("ds", TimeGranularity::Day));
        bookings.measures.push(Measure {
            create_metric: true,
            ..Measure::new("bookings", AggregationType::Sum)
        });
        bookings.measures.push(Measure {
            agg_time_dimension: Some(DimensionReference::new("paid_at")),
            ..Measure::new("payments", AggregationType::Sum)
        });
        bookings.dimensions.push(Dimension::time("paid_at", TimeGranularity::Day));

        let mut listings = SemanticModel::new("listings_source");
        listings.entities.push(Entity::new("listing", EntityType::Primary));
        listings.dimensions.push(Dimension::categorical("country"));

        let manifest = SemanticManifest {
            semantic_models: vec![bookings, listings],
            metrics: vec![Metric::simple("bookings", "bookings")],
            ..SemanticManifest::default()
        };
        ManifestObjectLookup::new(Arc::new(manifest))
    }

    #[test]
    fn model_and_metric_lookups() {
        let lookup = fixture_lookup();
        assert!(lookup.model(&ModelReference::new("bookings_source")).is_ok());
        assert!(matches!(
            lookup.model(&ModelReference::new("absent")),
            Err(ManifestError::ModelNotFound { .. }),
        ));
        assert!(lookup.metric(&MetricReference::new("bookings")).is_ok());
        assert!(matches!(
            lookup.metric(&MetricReference::new("absent")),
            Err(ManifestError::MetricNotFound { .. }),
        ));
    }

    #[test]
    fn measure_owner_resolves_defining_model() {
        let lookup = fixture_lookup();
        let owner = lookup.measure_owner(&MeasureReference::new("bookings")).unwrap();
        assert_eq!(owner.name.as_str(), "bookings_source");
    }

    #[test]
    fn entity_index_spans_models() {
        let lookup = fixture_lookup();
        let models = lookup.models_with_entity(&EntityReference::new("listing"));
        let names: Vec<_> = models.iter().map(ModelReference::as_str).collect();
        assert_eq!(names, vec!["bookings_source", "listings_source"]);
        assert!(lookup.models_with_entity(&EntityReference::new("absent")).is_empty());
    }

    #[test]
    fn aggregation_time_dimension_falls_back_to_model_default() {
        let lookup = fixture_lookup();
        let (model, dimension) =
            lookup.aggregation_time_dimension(&MeasureReference::new("bookings")).unwrap();
        assert_eq!(model.name.as_str(), "bookings_source");
        assert_eq!(dimension.name.as_str(), "ds");
    }

    #[test]
    fn aggregation_time_dimension_prefers_measure_override() {
        let lookup = fixture_lookup();
        let (_, dimension) =
            lookup.aggregation_time_dimension(&MeasureReference::new("payments")).unwrap();
        assert_eq!(dimension.name.as_str(), "paid_at");
    }

    #[test]
    fn metric_source_model_rejects_complex_metrics() {
        let lookup = fixture_lookup();
        let ratio = Metric::ratio("rate", "bookings", "payments");
        assert!(matches!(
            lookup.metric_source_model(&ratio),
            Err(ManifestError::UnsupportedMetricType { .. }),
        ));
    }

    #[test]
    fn metric_source_model_resolves_measure_owner() {
        let lookup = fixture_lookup();
        let metric = lookup.metric(&MetricReference::new("bookings")).unwrap().clone();
        let model = lookup.metric_source_model(&metric).unwrap();
        assert_eq!(model.name.as_str(), "bookings_source");
    }
}
