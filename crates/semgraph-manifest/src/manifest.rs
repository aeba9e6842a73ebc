//! The semantic manifest root.
//!
//! A `SemanticManifest` is the validated output of the upstream parsing and
//! validation pipeline, handed to the resolution core as a whole. The core
//! never mutates it; shared ownership is via `Arc`.

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;
use crate::metric::Metric;
use crate::model::SemanticModel;
use crate::time::TimeSpine;

/// Project-wide configuration attached to the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfiguration {
    /// Absent means a plain day-grained spine with no custom grains.
    #[serde(default)]
    pub time_spine: Option<TimeSpine>,
}

/// The validated semantic manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticManifest {
    #[serde(default)]
    pub semantic_models: Vec<SemanticModel>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub project_configuration: ProjectConfiguration,
}

impl SemanticManifest {
    /// Parses a manifest from its JSON wire form.
    pub fn from_json_str(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json).map_err(|source| ManifestError::InvalidManifestJson {
            reason: source.to_string(),
        })
    }

    /// The effective time spine, defaulting to a day-grained one.
    pub fn time_spine(&self) -> TimeSpine {
        self.project_configuration.time_spine.clone().unwrap_or_default()
    }
}
