//! Time granularities, date parts, and time-spine configuration.
//!
//! `TimeGranularity` is the closed set of standard grains. Its derived `Ord`
//! follows variant order, so `Day < Month < Year` -- coarser grains compare
//! greater. Custom calendar grains (fiscal quarters and the like) are named
//! grains anchored to a standard base; `ExpandedTimeGranularity` covers both.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Standard time granularities, finest to coarsest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TimeGranularity {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeGranularity {
    /// All standard grains, finest to coarsest.
    pub const ALL: [TimeGranularity; 11] = [
        TimeGranularity::Nanosecond,
        TimeGranularity::Microsecond,
        TimeGranularity::Millisecond,
        TimeGranularity::Second,
        TimeGranularity::Minute,
        TimeGranularity::Hour,
        TimeGranularity::Day,
        TimeGranularity::Week,
        TimeGranularity::Month,
        TimeGranularity::Quarter,
        TimeGranularity::Year,
    ];

    /// Lowercase grain name as it appears in dunder-name suffixes.
    pub fn name(&self) -> &'static str {
        match self {
            TimeGranularity::Nanosecond => "nanosecond",
            TimeGranularity::Microsecond => "microsecond",
            TimeGranularity::Millisecond => "millisecond",
            TimeGranularity::Second => "second",
            TimeGranularity::Minute => "minute",
            TimeGranularity::Hour => "hour",
            TimeGranularity::Day => "day",
            TimeGranularity::Week => "week",
            TimeGranularity::Month => "month",
            TimeGranularity::Quarter => "quarter",
            TimeGranularity::Year => "year",
        }
    }

    /// Standard grains at or coarser than `self`, finest first.
    pub fn queryable_grains(&self) -> impl Iterator<Item = TimeGranularity> + '_ {
        Self::ALL.into_iter().filter(move |g| g >= self)
    }
}

impl fmt::Display for TimeGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A granularity by name: either a standard grain or a custom calendar grain
/// anchored to a standard base.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExpandedTimeGranularity {
    pub name: String,
    pub base_granularity: TimeGranularity,
}

impl ExpandedTimeGranularity {
    pub fn from_standard(granularity: TimeGranularity) -> Self {
        Self { name: granularity.name().to_owned(), base_granularity: granularity }
    }

    pub fn custom(name: impl Into<String>, base_granularity: TimeGranularity) -> Self {
        Self { name: name.into(), base_granularity }
    }

    /// True when this is a named custom grain rather than a standard one.
    pub fn is_custom(&self) -> bool {
        self.name != self.base_granularity.name()
    }
}

impl fmt::Display for ExpandedTimeGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Date parts extractable from a time column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DatePart {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Dow,
    Doy,
}

impl DatePart {
    pub const ALL: [DatePart; 7] = [
        DatePart::Year,
        DatePart::Quarter,
        DatePart::Month,
        DatePart::Week,
        DatePart::Day,
        DatePart::Dow,
        DatePart::Doy,
    ];

    /// Lowercase part name as it appears in dunder-name suffixes.
    pub fn name(&self) -> &'static str {
        match self {
            DatePart::Year => "year",
            DatePart::Quarter => "quarter",
            DatePart::Month => "month",
            DatePart::Week => "week",
            DatePart::Day => "day",
            DatePart::Dow => "dow",
            DatePart::Doy => "doy",
        }
    }

    /// Coarsest source grain from which this part is still extractable.
    /// Extracting the day-of-week from monthly data is meaningless, so `Dow`
    /// requires daily or finer data.
    pub fn minimum_queryable_granularity(&self) -> TimeGranularity {
        match self {
            DatePart::Year => TimeGranularity::Year,
            DatePart::Quarter => TimeGranularity::Quarter,
            DatePart::Month => TimeGranularity::Month,
            DatePart::Week => TimeGranularity::Week,
            DatePart::Day | DatePart::Dow | DatePart::Doy => TimeGranularity::Day,
        }
    }
}

impl fmt::Display for DatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A custom calendar grain defined on the time spine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomGranularity {
    pub name: String,
    pub base_granularity: TimeGranularity,
}

/// Time-spine configuration: the base grain metric time is materialized at,
/// plus any custom calendar grains defined on the spine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpine {
    pub base_granularity: TimeGranularity,
    #[serde(default)]
    pub custom_granularities: Vec<CustomGranularity>,
}

impl TimeSpine {
    pub fn with_base(base_granularity: TimeGranularity) -> Self {
        Self { base_granularity, custom_granularities: Vec::new() }
    }
}

impl Default for TimeSpine {
    fn default() -> Self {
        Self::with_base(TimeGranularity::Day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granularity_orders_fine_to_coarse() {
        assert!(TimeGranularity::Day < TimeGranularity::Month);
        assert!(TimeGranularity::Month < TimeGranularity::Year);
        assert!(TimeGranularity::Nanosecond < TimeGranularity::Second);
    }

    #[test]
    fn queryable_grains_start_at_self() {
        let grains: Vec<_> = TimeGranularity::Day.queryable_grains().collect();
        assert_eq!(
            grains,
            vec![
                TimeGranularity::Day,
                TimeGranularity::Week,
                TimeGranularity::Month,
                TimeGranularity::Quarter,
                TimeGranularity::Year,
            ],
        );
    }

    #[test]
    fn expanded_granularity_detects_custom() {
        let standard = ExpandedTimeGranularity::from_standard(TimeGranularity::Month);
        assert!(!standard.is_custom());
        assert_eq!(standard.name, "month");

        let fiscal = ExpandedTimeGranularity::custom("fiscal_quarter", TimeGranularity::Day);
        assert!(fiscal.is_custom());
    }

    #[test]
    fn date_part_minimum_granularities() {
        assert_eq!(DatePart::Year.minimum_queryable_granularity(), TimeGranularity::Year);
        assert_eq!(DatePart::Dow.minimum_queryable_granularity(), TimeGranularity::Day);
        assert_eq!(DatePart::Week.minimum_queryable_granularity(), TimeGranularity::Week);
    }

    #[test]
    fn granularity_serde_uses_snake_case() {
        let json = serde_json::to_string(&TimeGranularity::Quarter).unwrap();
        assert_eq!(json, "\"quarter\"");
        let back: TimeGranularity = serde_json::from_str("\"day\"").unwrap();
        assert_eq!(back, TimeGranularity::Day);
    }

    #[test]
    fn time_spine_defaults_to_day() {
        let spine = TimeSpine::default();
        assert_eq!(spine.base_granularity, TimeGranularity::Day);
        assert!(spine.custom_granularities.is_empty());
    }
}
