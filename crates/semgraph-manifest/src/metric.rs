//! Metric definitions.
//!
//! Simple and cumulative metrics are measure-backed: they aggregate a single
//! measure and therefore have a source model. Ratio and derived metrics are
//! composed from other metrics and bottom out in measure-backed leaves.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::refs::{MeasureReference, MetricReference};
use crate::time::TimeGranularity;

/// The closed set of supported metric types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Simple,
    Ratio,
    Cumulative,
    Derived,
}

impl MetricType {
    /// Whether metrics of this type aggregate a measure directly.
    pub fn is_measure_backed(&self) -> bool {
        matches!(self, MetricType::Simple | MetricType::Cumulative)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MetricType::Simple => "simple",
            MetricType::Ratio => "ratio",
            MetricType::Cumulative => "cumulative",
            MetricType::Derived => "derived",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A measure consumed by a measure-backed metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricInputMeasure {
    pub name: MeasureReference,
}

impl MetricInputMeasure {
    pub fn new(name: impl Into<MeasureReference>) -> Self {
        Self { name: name.into() }
    }
}

/// A metric consumed by a ratio or derived metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricInput {
    pub name: MetricReference,
}

impl MetricInput {
    pub fn new(name: impl Into<MetricReference>) -> Self {
        Self { name: name.into() }
    }
}

/// Type-specific metric parameters. Which fields are populated depends on
/// the metric type; the upstream validator enforces the pairing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricTypeParams {
    #[serde(default)]
    pub measure: Option<MetricInputMeasure>,
    #[serde(default)]
    pub numerator: Option<MetricInput>,
    #[serde(default)]
    pub denominator: Option<MetricInput>,
    #[serde(default)]
    pub metrics: Vec<MetricInput>,
    /// Cumulative accumulation window, opaque to the resolution core.
    #[serde(default)]
    pub window: Option<String>,
    #[serde(default)]
    pub grain_to_date: Option<TimeGranularity>,
}

/// A metric definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub name: MetricReference,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    #[serde(default)]
    pub type_params: MetricTypeParams,
}

impl Metric {
    pub fn simple(name: impl Into<MetricReference>, measure: impl Into<MeasureReference>) -> Self {
        Self {
            name: name.into(),
            metric_type: MetricType::Simple,
            type_params: MetricTypeParams {
                measure: Some(MetricInputMeasure::new(measure)),
                ..MetricTypeParams::default()
            },
        }
    }

    pub fn ratio(
        name: impl Into<MetricReference>,
        numerator: impl Into<MetricReference>,
        denominator: impl Into<MetricReference>,
    ) -> Self {
        Self {
            name: name.into(),
            metric_type: MetricType::Ratio,
            type_params: MetricTypeParams {
                numerator: Some(MetricInput::new(numerator)),
                denominator: Some(MetricInput::new(denominator)),
                ..MetricTypeParams::default()
            },
        }
    }

    pub fn derived(
        name: impl Into<MetricReference>,
        inputs: impl IntoIterator<Item = MetricReference>,
    ) -> Self {
        Self {
            name: name.into(),
            metric_type: MetricType::Derived,
            type_params: MetricTypeParams {
                metrics: inputs.into_iter().map(|name| MetricInput { name }).collect(),
                ..MetricTypeParams::default()
            },
        }
    }

    pub fn is_measure_backed(&self) -> bool {
        self.metric_type.is_measure_backed()
    }

    /// The measure aggregated by a measure-backed metric.
    pub fn input_measure(&self) -> Option<&MetricInputMeasure> {
        self.type_params.measure.as_ref()
    }

    /// The metrics a ratio or derived metric is composed of, in definition
    /// order (numerator before denominator).
    pub fn input_metrics(&self) -> Vec<&MetricInput> {
        match self.metric_type {
            MetricType::Simple | MetricType::Cumulative => Vec::new(),
            MetricType::Ratio => self
                .type_params
                .numerator
                .iter()
                .chain(self.type_params.denominator.iter())
                .collect(),
            MetricType::Derived => self.type_params.metrics.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_metric_is_measure_backed() {
        let metric = Metric::simple("bookings", "bookings");
        assert!(metric.is_measure_backed());
        assert_eq!(metric.input_measure().unwrap().name.as_str(), "bookings");
        assert!(metric.input_metrics().is_empty());
    }

    #[test]
    fn ratio_inputs_order_numerator_first() {
        let metric = Metric::ratio("bookings_per_view", "bookings", "views");
        assert!(!metric.is_measure_backed());
        let inputs: Vec<_> = metric.input_metrics().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(inputs, vec!["bookings", "views"]);
    }

    #[test]
    fn derived_inputs_preserve_definition_order() {
        let metric = Metric::derived(
            "net_bookings",
            vec![MetricReference::new("bookings"), MetricReference::new("cancellations")],
        );
        let inputs: Vec<_> = metric.input_metrics().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(inputs, vec!["bookings", "cancellations"]);
    }

    #[test]
    fn metric_serde_roundtrip() {
        let metric = Metric::ratio("rate", "hits", "requests");
        let json = serde_json::to_string(&metric).unwrap();
        let back: Metric = serde_json::from_str(&json).unwrap();
        assert_eq!(metric, back);
    }

    #[test]
    fn metric_type_serde_uses_snake_case() {
        assert_eq!(serde_json::to_string(&MetricType::Cumulative).unwrap(), "\"cumulative\"");
    }
}
