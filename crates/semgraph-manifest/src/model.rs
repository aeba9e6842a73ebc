//! Semantic models: named collections of entities, dimensions, and measures
//! over one source table.

use serde::{Deserialize, Serialize};

use crate::elements::{Dimension, Entity, EntityType, Measure};
use crate::refs::{DimensionReference, EntityReference, MeasureReference, ModelReference};

/// Model-level defaults applied to measures that do not override them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefaults {
    #[serde(default)]
    pub agg_time_dimension: Option<DimensionReference>,
}

/// A semantic model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticModel {
    pub name: ModelReference,
    #[serde(default)]
    pub defaults: ModelDefaults,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub measures: Vec<Measure>,
}

impl SemanticModel {
    pub fn new(name: impl Into<ModelReference>) -> Self {
        Self {
            name: name.into(),
            defaults: ModelDefaults::default(),
            entities: Vec::new(),
            dimensions: Vec::new(),
            measures: Vec::new(),
        }
    }

    pub fn entity(&self, name: &EntityReference) -> Option<&Entity> {
        self.entities.iter().find(|e| &e.name == name)
    }

    pub fn dimension(&self, name: &DimensionReference) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| &d.name == name)
    }

    pub fn measure(&self, name: &MeasureReference) -> Option<&Measure> {
        self.measures.iter().find(|m| &m.name == name)
    }

    /// The primary entity, when the model declares one.
    pub fn primary_entity(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.entity_type == EntityType::Primary)
    }

    pub fn categorical_dimensions(&self) -> impl Iterator<Item = &Dimension> {
        self.dimensions.iter().filter(|d| !d.is_time())
    }

    pub fn time_dimensions(&self) -> impl Iterator<Item = &Dimension> {
        self.dimensions.iter().filter(|d| d.is_time())
    }

    /// Whether a join may land on this model through `entity`.
    pub fn is_join_target_through(&self, entity: &EntityReference) -> bool {
        self.entity(entity).is_some_and(|e| e.entity_type.is_join_target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::AggregationType;
    use crate::time::TimeGranularity;

    fn bookings_model() -> SemanticModel {
        let mut model = SemanticModel::new("bookings_source");
        model.entities.push(Entity::new("booking", EntityType::Primary));
        model.entities.push(Entity::new("listing", EntityType::Foreign));
        model.dimensions.push(Dimension::categorical("is_instant"));
        model.dimensions.push(Dimension::time("ds", TimeGranularity::Day));
        model.measures.push(Measure::new("bookings", AggregationType::Sum));
        model
    }

    #[test]
    fn lookups_by_name() {
        let model = bookings_model();
        assert!(model.entity(&EntityReference::new("listing")).is_some());
        assert!(model.entity(&EntityReference::new("guest")).is_none());
        assert!(model.dimension(&DimensionReference::new("ds")).is_some());
        assert!(model.measure(&MeasureReference::new("bookings")).is_some());
    }

    #[test]
    fn primary_entity_found() {
        let model = bookings_model();
        assert_eq!(model.primary_entity().unwrap().name.as_str(), "booking");
    }

    #[test]
    fn dimension_partition_by_type() {
        let model = bookings_model();
        let categorical: Vec<_> =
            model.categorical_dimensions().map(|d| d.name.as_str()).collect();
        let time: Vec<_> = model.time_dimensions().map(|d| d.name.as_str()).collect();
        assert_eq!(categorical, vec!["is_instant"]);
        assert_eq!(time, vec!["ds"]);
    }

    #[test]
    fn join_target_requires_identifying_entity() {
        let model = bookings_model();
        assert!(model.is_join_target_through(&EntityReference::new("booking")));
        assert!(!model.is_join_target_through(&EntityReference::new("listing")));
        assert!(!model.is_join_target_through(&EntityReference::new("absent")));
    }
}
