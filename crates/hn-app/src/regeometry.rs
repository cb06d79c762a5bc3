//! Patient-specific re-geometry of a baseline model.
//!
//! A baseline model directory is kept as-is except for the vessel rows a
//! [`SegmentMapping`] names: those get the radius and length of the mapped
//! patient segment. Topology, heart and outlet circuits are carried over
//! byte-for-byte.

use std::path::Path;

use hn_anatomy::GeometryCatalog;
use hn_core::Real;
use hn_model::{GeometryOverride, ValidationReport};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::pipeline::EmitOutcome;

/// One measured segment and the baseline vessels it replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMapping {
    /// Feature group (label id).
    pub group: String,
    pub segment: String,
    /// Baseline vessel ids. Several vessels share the segment length in
    /// proportion to their baseline lengths.
    pub vessels: Vec<String>,
}

impl SegmentMapping {
    pub fn new(group: &str, segment: &str, vessels: &[&str]) -> Self {
        Self {
            group: group.to_string(),
            segment: segment.to_string(),
            vessels: vessels.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Outcome of a re-geometry pass written to disk.
#[derive(Debug, Clone)]
pub struct RegeometryOutcome {
    /// Baseline vessel ids whose geometry was replaced, sorted.
    pub updated: Vec<String>,
    pub emitted: EmitOutcome,
    pub report: ValidationReport,
}

/// Circle-of-Willis segments onto the vessel ids of the 1D reference body
/// network. The basilar artery spans two reference vessels.
pub fn circle_of_willis_mapping() -> Vec<SegmentMapping> {
    vec![
        SegmentMapping::new("1", "BA", &["A56", "A59"]),
        SegmentMapping::new("2", "P1", &["A60"]),
        SegmentMapping::new("3", "P1", &["A61"]),
        SegmentMapping::new("8", "Pcom", &["A62"]),
        SegmentMapping::new("9", "Pcom", &["A63"]),
        SegmentMapping::new("2", "P2", &["A64"]),
        SegmentMapping::new("3", "P2", &["A65"]),
        SegmentMapping::new("11", "A1", &["A68"]),
        SegmentMapping::new("12", "A1", &["A69"]),
        SegmentMapping::new("11", "A2", &["A76"]),
        SegmentMapping::new("12", "A2", &["A78"]),
        SegmentMapping::new("10", "Acom", &["A77"]),
        SegmentMapping::new("5", "MCA", &["A70"]),
        SegmentMapping::new("7", "MCA", &["A73"]),
    ]
}

/// Load a mapping list from YAML (or JSON, which YAML accepts).
pub fn load_mapping(path: &Path) -> AppResult<Vec<SegmentMapping>> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::MappingFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content)
        .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
}

/// Geometry overrides for every mapped vessel.
///
/// Diameter is twice the segment radius and the wall is the catalog's wall
/// fraction of it. When a segment spans several vessels and all their
/// baseline lengths are known, the segment length is split by those lengths;
/// otherwise evenly.
pub fn overrides_for(
    catalog: &GeometryCatalog,
    mapping: &[SegmentMapping],
    baseline_length: impl Fn(&str) -> Option<Real>,
) -> Vec<GeometryOverride> {
    let config = catalog.config();
    let mut overrides = Vec::new();
    for m in mapping {
        if m.vessels.is_empty() {
            warn!(group = %m.group, segment = %m.segment, "mapping without vessels ignored");
            continue;
        }
        let g = catalog.segment_geometry(&m.group, &m.segment);
        let diameter = g.radius * 2.0;
        let thickness = g.radius * config.wall_fraction;

        let known: Option<Vec<Real>> = m.vessels.iter().map(|id| baseline_length(id)).collect();
        let total: Real = known.iter().flatten().sum();
        for (k, id) in m.vessels.iter().enumerate() {
            let share = match &known {
                Some(lengths) if total > 0.0 => lengths[k] / total,
                _ => 1.0 / m.vessels.len() as Real,
            };
            let length = g.length * share;
            overrides.push(GeometryOverride {
                id: id.clone(),
                start_diameter: Some(diameter),
                end_diameter: Some(diameter),
                start_thickness: Some(thickness),
                end_thickness: Some(thickness),
                length: Some(length),
                divisions: Some(config.discretization.points(length)),
            });
        }
    }
    overrides
}

#[cfg(test)]
mod tests {
    use super::*;
    use hn_anatomy::{AnatomyInput, CatalogConfig};
    use hn_core::units::to_mm;
    use serde_json::json;

    fn catalog() -> GeometryCatalog {
        let input = AnatomyInput::new(
            serde_json::from_value(json!({
                "1": { "BA": { "start": 1, "end": 2, "radius": { "median": 1.5 }, "length": 30.0 } }
            }))
            .unwrap(),
        );
        GeometryCatalog::from_input(&input, CatalogConfig::default())
    }

    #[test]
    fn split_follows_baseline_lengths() {
        let mapping = [SegmentMapping::new("1", "BA", &["A56", "A59"])];
        let lengths = |id: &str| match id {
            "A56" => Some(0.01),
            "A59" => Some(0.02),
            _ => None,
        };
        let o = overrides_for(&catalog(), &mapping, lengths);
        assert_eq!(o.len(), 2);
        assert!((to_mm(o[0].length.unwrap()) - 10.0).abs() < 1e-9);
        assert!((to_mm(o[1].length.unwrap()) - 20.0).abs() < 1e-9);
        assert!((to_mm(o[0].start_diameter.unwrap()) - 3.0).abs() < 1e-9);
        assert!((to_mm(o[0].start_thickness.unwrap()) - 0.15).abs() < 1e-9);
        assert_eq!(o[1].divisions, Some(5));
    }

    #[test]
    fn unknown_baseline_length_splits_evenly() {
        let mapping = [SegmentMapping::new("1", "BA", &["A56", "A59"])];
        let o = overrides_for(&catalog(), &mapping, |_| None);
        assert!((to_mm(o[0].length.unwrap()) - 15.0).abs() < 1e-9);
        assert!((to_mm(o[1].length.unwrap()) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn unmeasured_segment_uses_fallback() {
        let mapping = [SegmentMapping::new("10", "Acom", &["A77"])];
        let o = overrides_for(&catalog(), &mapping, |_| Some(0.003));
        let fallback = CatalogConfig::default();
        assert_eq!(o[0].length, Some(fallback.fallback_length));
        assert_eq!(o[0].start_diameter, Some(fallback.fallback_radius * 2.0));
    }

    #[test]
    fn mapping_reads_from_yaml() {
        let parsed: Vec<SegmentMapping> =
            serde_yaml::from_str("- group: '1'\n  segment: BA\n  vessels: [A56, A59]\n").unwrap();
        assert_eq!(parsed, vec![SegmentMapping::new("1", "BA", &["A56", "A59"])]);
        assert_eq!(circle_of_willis_mapping().len(), 14);
    }
}
