//! Group-by item properties and the element filter applied during resolution.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A classification of a resolved group-by item.
///
/// Properties are derived from the recipe that produced an item, never stored
/// on graph nodes -- the same attribute node can resolve as `Local` for one
/// metric and `Joined` for another.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GroupByItemProperty {
    /// Available directly on the metric's source model.
    Local,
    /// Reached through at least one entity join.
    Joined,
    /// Reached through two or more entity joins.
    MultiHop,
    /// An entity key attribute.
    Entity,
    /// A metric usable as a group-by item.
    Metric,
    /// The model-independent aggregation time attribute.
    MetricTime,
    /// A calendar part extracted from a time attribute.
    DatePart,
    /// A time attribute truncated to a coarser grain than its source.
    DerivedTimeGranularity,
    /// A time attribute truncated to a custom calendar grain.
    CustomGranularity,
}

impl GroupByItemProperty {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Joined => "joined",
            Self::MultiHop => "multi_hop",
            Self::Entity => "entity",
            Self::Metric => "metric",
            Self::MetricTime => "metric_time",
            Self::DatePart => "date_part",
            Self::DerivedTimeGranularity => "derived_time_granularity",
            Self::CustomGranularity => "custom_granularity",
        }
    }
}

/// Admission rules applied to candidate group-by items.
///
/// An empty filter admits everything. `element_names` is an allowlist on the
/// bare element name (no entity links, no time suffix); the property sets
/// match against the properties derived from the item's recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementFilter {
    pub element_names: Option<BTreeSet<String>>,
    pub with_any_of: BTreeSet<GroupByItemProperty>,
    pub without_any_of: BTreeSet<GroupByItemProperty>,
}

impl ElementFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            element_names: Some(names.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn with_any_of(mut self, properties: impl IntoIterator<Item = GroupByItemProperty>) -> Self {
        self.with_any_of.extend(properties);
        self
    }

    pub fn without_any_of(
        mut self,
        properties: impl IntoIterator<Item = GroupByItemProperty>,
    ) -> Self {
        self.without_any_of.extend(properties);
        self
    }

    /// True when the filter can never admit an item with `property`.
    pub fn excludes(&self, property: GroupByItemProperty) -> bool {
        self.without_any_of.contains(&property)
    }

    /// Whether an item with this element name and property set passes.
    pub fn admits(&self, element_name: &str, properties: &BTreeSet<GroupByItemProperty>) -> bool {
        if let Some(names) = &self.element_names {
            if !names.contains(element_name) {
                return false;
            }
        }
        if !self.with_any_of.is_empty() && self.with_any_of.is_disjoint(properties) {
            return false;
        }
        self.without_any_of.is_disjoint(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(items: &[GroupByItemProperty]) -> BTreeSet<GroupByItemProperty> {
        items.iter().copied().collect()
    }

    #[test]
    fn empty_filter_admits_everything() {
        let filter = ElementFilter::new();
        assert!(filter.admits("country", &properties(&[GroupByItemProperty::Joined])));
        assert!(filter.admits("metric_time", &properties(&[GroupByItemProperty::MetricTime])));
    }

    #[test]
    fn name_allowlist_rejects_other_elements() {
        let filter = ElementFilter::named(["country"]);
        assert!(filter.admits("country", &properties(&[GroupByItemProperty::Local])));
        assert!(!filter.admits("is_instant", &properties(&[GroupByItemProperty::Local])));
    }

    #[test]
    fn with_any_of_requires_an_overlap() {
        let filter = ElementFilter::new().with_any_of([GroupByItemProperty::MetricTime]);
        assert!(filter.admits("metric_time", &properties(&[GroupByItemProperty::MetricTime])));
        assert!(!filter.admits("country", &properties(&[GroupByItemProperty::Local])));
    }

    #[test]
    fn without_any_of_rejects_on_overlap() {
        let filter = ElementFilter::new().without_any_of([GroupByItemProperty::MultiHop]);
        assert!(filter.admits(
            "country",
            &properties(&[GroupByItemProperty::Joined]),
        ));
        assert!(!filter.admits(
            "home_state",
            &properties(&[GroupByItemProperty::Joined, GroupByItemProperty::MultiHop]),
        ));
        assert!(filter.excludes(GroupByItemProperty::MultiHop));
    }

    #[test]
    fn property_serde_uses_snake_case() {
        let json = serde_json::to_string(&GroupByItemProperty::DerivedTimeGranularity).unwrap();
        assert_eq!(json, "\"derived_time_granularity\"");
    }
}
