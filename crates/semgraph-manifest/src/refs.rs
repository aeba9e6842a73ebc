//! Reference newtypes for manifest objects.
//!
//! All references are distinct newtype wrappers over `String`, providing type
//! safety so that a `ModelReference` cannot be accidentally used where a
//! `MetricReference` is expected. Graph nodes embed these references as their
//! identity, so every newtype is hashable and totally ordered.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! reference_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(name.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name)
            }
        }
    };
}

reference_newtype!(
    /// Name of a semantic model.
    ModelReference
);

reference_newtype!(
    /// Name of a metric.
    MetricReference
);

reference_newtype!(
    /// Name of an entity column within one or more semantic models.
    EntityReference
);

reference_newtype!(
    /// Name of a dimension within a semantic model.
    DimensionReference
);

reference_newtype!(
    /// Name of a measure. Measure names are unique across the manifest.
    MeasureReference
);
