//! hn-anatomy: anatomical input schema, vessel records and geometry catalog.

pub mod catalog;
pub mod schema;
pub mod vessel;

pub use catalog::{
    CatalogConfig, GeometryCatalog, SegmentGeometry, SkipReason, SkippedEntry, VariantGate,
    VesselSpec, circle_of_willis_gates, sanitize_id,
};
pub use schema::*;
pub use vessel::{Discretization, GeometrySource, Material, Vessel, VesselKind};

use std::path::Path;

pub type AnatomyResult<T> = Result<T, AnatomyError>;

#[derive(thiserror::Error, Debug)]
pub enum AnatomyError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> AnatomyResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| AnatomyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| AnatomyError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_features(path: &Path) -> AnatomyResult<FeatureMap> {
    load_json(path)
}

pub fn load_landmarks(path: &Path) -> AnatomyResult<LandmarkMap> {
    load_json(path)
}

pub fn load_variants(path: &Path) -> AnatomyResult<VariantMap> {
    load_json(path)
}

/// Load the feature document and, when given, its companion documents.
pub fn load_input(
    features: &Path,
    landmarks: Option<&Path>,
    variants: Option<&Path>,
) -> AnatomyResult<AnatomyInput> {
    let mut input = AnatomyInput::new(load_features(features)?);
    if let Some(path) = landmarks {
        input = input.with_landmarks(load_landmarks(path)?);
    }
    if let Some(path) = variants {
        input = input.with_variants(load_variants(path)?);
    }
    Ok(input)
}
