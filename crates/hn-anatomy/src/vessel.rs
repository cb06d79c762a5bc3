//! Typed vessel records consumed by the graph builder and the emitter.

use hn_core::units::Length;
use hn_core::{HnError, HnResult, Real, ensure_positive};
use serde::{Deserialize, Serialize};

/// Material coefficients attached to every 1D vessel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub elastance_1: Real,
    pub res_start: Real,
    pub res_end: Real,
    pub visc_fact: Real,
    pub k1: Real,
    pub k2: Real,
    pub k3: Real,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            elastance_1: 5.0e5,
            res_start: 0.0,
            res_end: 0.0,
            visc_fact: 2.75,
            k1: 2.0e6,
            k2: -2253.0,
            k3: 8.65e4,
        }
    }
}

/// Where a vessel's geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometrySource {
    Measured,
    Fallback,
}

/// Anatomical segment or synthetic connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VesselKind {
    Anatomical,
    Connector,
}

/// A 1D arterial segment: an edge between two named nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Vessel {
    pub id: String,
    pub name: String,
    pub start_node: String,
    pub end_node: String,
    pub start_diameter: Length,
    pub end_diameter: Length,
    pub start_thickness: Length,
    pub end_thickness: Length,
    pub length: Length,
    /// Spatial subdivision count for the 1D solver.
    pub divisions: u32,
    pub material: Material,
    pub kind: VesselKind,
    pub source: GeometrySource,
}

impl Vessel {
    /// Enforce the positivity and distinct-endpoint invariants.
    pub fn check(&self) -> HnResult<()> {
        ensure_positive(self.start_diameter.value, "start diameter")?;
        ensure_positive(self.end_diameter.value, "end diameter")?;
        ensure_positive(self.start_thickness.value, "start thickness")?;
        ensure_positive(self.end_thickness.value, "end thickness")?;
        ensure_positive(self.length.value, "length")?;
        if self.divisions == 0 {
            return Err(HnError::NonPositive {
                what: "discretization count",
                value: 0.0,
            });
        }
        if self.start_node == self.end_node {
            return Err(HnError::Invariant {
                what: format!(
                    "vessel '{}' starts and ends at node '{}'",
                    self.id, self.start_node
                ),
            });
        }
        Ok(())
    }

    /// Endpoint diameter at `node`, if the vessel touches it.
    pub fn diameter_at(&self, node: &str) -> Option<Length> {
        if self.start_node == node {
            Some(self.start_diameter)
        } else if self.end_node == node {
            Some(self.end_diameter)
        } else {
            None
        }
    }

    pub fn touches(&self, node: &str) -> bool {
        self.start_node == node || self.end_node == node
    }

    /// The endpoint opposite `node`.
    pub fn other_end(&self, node: &str) -> Option<&str> {
        if self.start_node == node {
            Some(&self.end_node)
        } else if self.end_node == node {
            Some(&self.start_node)
        } else {
            None
        }
    }
}

/// Spatial discretization rule: roughly one point per `mm_per_point`,
/// never below `min_points`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discretization {
    pub min_points: u32,
    pub mm_per_point: Real,
}

impl Default for Discretization {
    fn default() -> Self {
        Self {
            min_points: 5,
            mm_per_point: 5.0,
        }
    }
}

impl Discretization {
    pub fn points(&self, length: Length) -> u32 {
        let min = self.min_points.max(1);
        if !(self.mm_per_point > 0.0) {
            return min;
        }
        let raw = (hn_core::units::to_mm(length) / self.mm_per_point).floor();
        if raw.is_finite() && raw > min as Real {
            raw.min(u32::MAX as Real) as u32
        } else {
            min
        }
    }
}
