//! Graph construction errors.

use semgraph_manifest::ManifestError;
use thiserror::Error;

/// Errors surfaced while building a semantic graph from a manifest.
///
/// The manifest is validated upstream, so every variant here points at an
/// internal inconsistency between the lookup indexes and the manifest rather
/// than at user input.
#[derive(Debug, Error)]
pub enum GraphBuildError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}
