//! Geometry catalog: raw millimeter measurements to SI vessel records.
//!
//! The catalog never fails. Missing or unusable measurements are replaced by
//! the configured fallback geometry, logged, and flagged on the resulting
//! record as [`GeometrySource::Fallback`].

use std::collections::BTreeMap;

use hn_core::units::{Length, mm};
use hn_core::{Real, is_usable};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::schema::{AnatomyInput, RadiusStatistic, RawSegment, decode_records};
use crate::vessel::{Discretization, GeometrySource, Material, Vessel, VesselKind};

/// Optional branch that only exists when the patient's variant map says so.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantGate {
    /// Variant map section, e.g. `posterior`.
    pub section: String,
    /// Flag inside the section, e.g. `R-P1`.
    pub flag: String,
    /// Feature group the branch is measured in.
    pub group: String,
    /// Vessel name inside the group.
    pub vessel: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub radius_statistic: RadiusStatistic,
    /// Wall thickness as a fraction of the radius.
    pub wall_fraction: Real,
    pub fallback_radius: Length,
    pub fallback_length: Length,
    /// Smallest radius written out. Geometry is emitted in metres with six
    /// decimals, so radii and walls under a few micrometres would round to
    /// zero.
    pub min_radius: Length,
    pub discretization: Discretization,
    pub material: Material,
    /// Prepended to numeric node keys.
    pub node_prefix: String,
    /// Case-insensitive name fragments marking bifurcation meta-entries.
    pub meta_entry_patterns: Vec<String>,
    pub variant_gates: Vec<VariantGate>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            radius_statistic: RadiusStatistic::Median,
            wall_fraction: 0.10,
            fallback_radius: mm(1.5),
            fallback_length: mm(10.0),
            min_radius: mm(0.05),
            discretization: Discretization::default(),
            material: Material::default(),
            node_prefix: "N".to_string(),
            meta_entry_patterns: vec!["bifurcation".to_string()],
            variant_gates: Vec::new(),
        }
    }
}

/// Radius and length of one measured segment, in SI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentGeometry {
    pub radius: Length,
    pub length: Length,
    pub source: GeometrySource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Describes a bifurcation point, not a measurable segment.
    MetaEntry,
    /// Branch flagged absent (or not listed) in the variant map.
    VariantAbsent,
    /// Record has no start/end node, or a label with no usable characters.
    NoEndpoints,
    /// Record could not be decoded at all.
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub group: String,
    pub vessel: String,
    pub reason: SkipReason,
}

/// Everything needed to mint a vessel from a radius and a length.
#[derive(Debug, Clone)]
pub struct VesselSpec {
    pub id: String,
    pub name: String,
    pub start_node: String,
    pub end_node: String,
    pub radius: Length,
    pub length: Length,
    pub divisions: u32,
    pub kind: VesselKind,
    pub source: GeometrySource,
}

/// Normalized vessel set plus a `(group, vessel)` geometry index.
#[derive(Debug, Clone)]
pub struct GeometryCatalog {
    config: CatalogConfig,
    vessels: Vec<Vessel>,
    segments: BTreeMap<(String, String), SegmentGeometry>,
    skipped: Vec<SkippedEntry>,
}

impl GeometryCatalog {
    /// Normalize every measured segment of `input`.
    pub fn from_input(input: &AnatomyInput, config: CatalogConfig) -> Self {
        let mut catalog = Self {
            config,
            vessels: Vec::new(),
            segments: BTreeMap::new(),
            skipped: Vec::new(),
        };

        for (group, vessels) in &input.features {
            for (vessel_name, value) in vessels {
                if catalog.is_meta_entry(vessel_name) {
                    debug!(group = %group, vessel = %vessel_name, "skipping meta-entry");
                    catalog.skip(group, vessel_name, SkipReason::MetaEntry);
                    continue;
                }

                let records = decode_records(value);
                let gated_out = catalog.gated_out(input, group, vessel_name);
                let multi = records.len() > 1;

                for (k, record) in records.into_iter().enumerate() {
                    let raw = match record {
                        Ok(raw) => raw,
                        Err(e) => {
                            warn!(
                                group = %group,
                                vessel = %vessel_name,
                                error = %e,
                                "MissingGeometryData: malformed segment record skipped"
                            );
                            catalog.skip(group, vessel_name, SkipReason::Malformed);
                            continue;
                        }
                    };

                    let geometry = catalog.resolve(group, vessel_name, &raw);
                    catalog
                        .segments
                        .entry((group.clone(), vessel_name.clone()))
                        .or_insert(geometry);

                    if gated_out {
                        continue;
                    }

                    let prefix = &catalog.config.node_prefix;
                    let ends = raw
                        .endpoints()
                        .and_then(|(s, e)| Some((s.to_node_id(prefix)?, e.to_node_id(prefix)?)));
                    let Some((start_node, end_node)) = ends else {
                        warn!(
                            group = %group,
                            vessel = %vessel_name,
                            "MissingGeometryData: segment without usable endpoints skipped"
                        );
                        catalog.skip(group, vessel_name, SkipReason::NoEndpoints);
                        continue;
                    };

                    let id = if multi {
                        format!("{}_{}_{}", sanitize_id(vessel_name), group, k + 1)
                    } else {
                        format!("{}_{}", sanitize_id(vessel_name), group)
                    };
                    let spec = VesselSpec {
                        id,
                        name: display_name(vessel_name),
                        start_node,
                        end_node,
                        radius: geometry.radius,
                        length: geometry.length,
                        divisions: catalog.config.discretization.points(geometry.length),
                        kind: VesselKind::Anatomical,
                        source: geometry.source,
                    };
                    let vessel = catalog.make_vessel(spec);
                    catalog.vessels.push(vessel);
                }

                if gated_out {
                    debug!(group = %group, vessel = %vessel_name, "branch absent in variant map");
                    catalog.skip(group, vessel_name, SkipReason::VariantAbsent);
                }
            }
        }

        catalog
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn vessels(&self) -> &[Vessel] {
        &self.vessels
    }

    pub fn into_vessels(self) -> Vec<Vessel> {
        self.vessels
    }

    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    /// Geometry of the first record of `group`/`vessel`, or the fallback.
    pub fn segment_geometry(&self, group: &str, vessel: &str) -> SegmentGeometry {
        match self.segments.get(&(group.to_string(), vessel.to_string())) {
            Some(g) => *g,
            None => {
                warn!(
                    group = %group,
                    vessel = %vessel,
                    "MissingGeometryData: no measured segment, using fallback geometry"
                );
                self.fallback()
            }
        }
    }

    /// Build a vessel with diameter `2r` and wall thickness `wall_fraction * r`.
    pub fn make_vessel(&self, spec: VesselSpec) -> Vessel {
        let diameter = spec.radius * 2.0;
        let thickness = spec.radius * self.config.wall_fraction;
        Vessel {
            id: spec.id,
            name: spec.name,
            start_node: spec.start_node,
            end_node: spec.end_node,
            start_diameter: diameter,
            end_diameter: diameter,
            start_thickness: thickness,
            end_thickness: thickness,
            length: spec.length,
            divisions: spec.divisions.max(1),
            material: self.config.material,
            kind: spec.kind,
            source: spec.source,
        }
    }

    fn fallback(&self) -> SegmentGeometry {
        SegmentGeometry {
            radius: self.config.fallback_radius,
            length: self.config.fallback_length,
            source: GeometrySource::Fallback,
        }
    }

    fn resolve(&self, group: &str, vessel: &str, raw: &RawSegment) -> SegmentGeometry {
        let radius_mm = raw
            .radius
            .as_ref()
            .and_then(|r| r.pick(self.config.radius_statistic))
            .filter(|r| is_usable(*r));
        let length_mm = raw.length.filter(|l| is_usable(*l));

        let mut geometry = match (radius_mm, length_mm) {
            (Some(r), Some(l)) => SegmentGeometry {
                radius: mm(r),
                length: mm(l),
                source: GeometrySource::Measured,
            },
            (r, l) => {
                warn!(
                    group = %group,
                    vessel = %vessel,
                    radius_missing = r.is_none(),
                    length_missing = l.is_none(),
                    "MissingGeometryData: substituting fallback geometry"
                );
                SegmentGeometry {
                    radius: r.map(mm).unwrap_or(self.config.fallback_radius),
                    length: l.map(mm).unwrap_or(self.config.fallback_length),
                    source: GeometrySource::Fallback,
                }
            }
        };

        if geometry.radius < self.config.min_radius {
            warn!(
                group = %group,
                vessel = %vessel,
                radius_mm = hn_core::units::to_mm(geometry.radius),
                floor_mm = hn_core::units::to_mm(self.config.min_radius),
                "radius below the emittable floor, raised"
            );
            geometry.radius = self.config.min_radius;
        }
        geometry
    }

    fn is_meta_entry(&self, vessel_name: &str) -> bool {
        let lower = vessel_name.to_lowercase();
        self.config
            .meta_entry_patterns
            .iter()
            .any(|p| !p.is_empty() && lower.contains(&p.to_lowercase()))
    }

    fn gated_out(&self, input: &AnatomyInput, group: &str, vessel: &str) -> bool {
        let Some(variants) = input.variants.as_ref() else {
            return false;
        };
        self.config
            .variant_gates
            .iter()
            .filter(|g| g.group == group && g.vessel == vessel)
            .any(|g| {
                !variants
                    .get(&g.section)
                    .and_then(|flags| flags.get(&g.flag))
                    .copied()
                    .unwrap_or(false)
            })
    }

    fn skip(&mut self, group: &str, vessel: &str, reason: SkipReason) {
        self.skipped.push(SkippedEntry {
            group: group.to_string(),
            vessel: vessel.to_string(),
            reason,
        });
    }
}

/// Optional Circle-of-Willis branches: posterior P1/Pcom and anterior A1/Acom.
pub fn circle_of_willis_gates() -> Vec<VariantGate> {
    [
        ("posterior", "R-P1", "2", "P1"),
        ("posterior", "L-P1", "3", "P1"),
        ("posterior", "R-Pcom", "8", "Pcom"),
        ("posterior", "L-Pcom", "9", "Pcom"),
        ("anterior", "R-A1", "11", "A1"),
        ("anterior", "L-A1", "12", "A1"),
        ("anterior", "Acom", "10", "Acom"),
    ]
    .into_iter()
    .map(|(section, flag, group, vessel)| VariantGate {
        section: section.to_string(),
        flag: flag.to_string(),
        group: group.to_string(),
        vessel: vessel.to_string(),
    })
    .collect()
}

/// Identifier-safe form of an anatomical name: no CSV delimiters, quotes
/// or whitespace.
pub fn sanitize_id(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '"') && !c.is_control())
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn display_name(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, ',' | '"') || c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}
