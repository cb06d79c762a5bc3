//! Closed-form lumped parameters from vessel geometry.
//!
//! - Poiseuille resistance: `R = 8 μ L / (π r⁴)`
//! - Thin-wall compliance: `C = π r³ / (2 E h)`, `h = wall_fraction · r`
//! - Inertance: `L = ρ L / (π r²)`, scaled by `inertance_scale` after clamping
//!
//! Radius and length are clamped to their minimums before use, and every
//! result is clamped to its floor, so degenerate geometry never produces
//! infinite or zero parameters.

use std::f64::consts::PI;

use hn_anatomy::Vessel;
use hn_core::units::Length;
use hn_core::{Real, mean};
use tracing::warn;

use crate::params::WindkesselParams;

/// The four circuit parameters of one outlet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindkesselValues {
    pub r_proximal: Real,
    pub r_distal: Real,
    pub compliance: Real,
    pub inertance: Real,
}

impl WindkesselValues {
    pub fn from_geometry(params: &WindkesselParams, radius: Length, length: Length) -> Self {
        let r_total = total_resistance(params, radius, length);
        let (r_proximal, r_distal) = split_resistance(params, r_total);
        Self {
            r_proximal,
            r_distal,
            compliance: compliance(params, radius),
            inertance: inertance(params, radius, length),
        }
    }

    pub fn r_total(&self) -> Real {
        self.r_proximal + self.r_distal
    }
}

fn clamp_radius(params: &WindkesselParams, radius: Length) -> Real {
    let r = radius.value;
    if r.is_finite() {
        r.max(params.min_radius.value)
    } else {
        params.min_radius.value
    }
}

fn clamp_length(params: &WindkesselParams, length: Length) -> Real {
    let l = length.value;
    if l.is_finite() {
        l.max(params.min_length.value)
    } else {
        params.min_length.value
    }
}

fn floor(value: Real, min: Real) -> Real {
    if value.is_finite() {
        value.max(min)
    } else {
        min
    }
}

/// `max(8 μ L / (π r⁴), R_min)`.
pub fn total_resistance(params: &WindkesselParams, radius: Length, length: Length) -> Real {
    let r = clamp_radius(params, radius);
    let l = clamp_length(params, length);
    floor(8.0 * params.viscosity.value * l / (PI * r.powi(4)), params.r_min)
}

/// Proximal and distal shares of `r_total`, each floored at `R_min`.
pub fn split_resistance(params: &WindkesselParams, r_total: Real) -> (Real, Real) {
    let f = params.proximal_fraction;
    (
        floor(f * r_total, params.r_min),
        floor((1.0 - f) * r_total, params.r_min),
    )
}

/// `max(π r³ / (2 E h), C_min)`, or `C_min` when the wall has no thickness.
pub fn compliance(params: &WindkesselParams, radius: Length) -> Real {
    let r = clamp_radius(params, radius);
    let h = params.wall_fraction * r;
    if !(h > 0.0) {
        return params.c_min;
    }
    floor(PI * r.powi(3) / (2.0 * params.wall_modulus.value * h), params.c_min)
}

/// `max(ρ L / (π r²), L_min) · inertance_scale`.
pub fn inertance(params: &WindkesselParams, radius: Length, length: Length) -> Real {
    let r = clamp_radius(params, radius);
    let l = clamp_length(params, length);
    let area = PI * r * r;
    let raw = if area > 0.0 {
        floor(params.density.value * l / area, params.l_min)
    } else {
        params.l_min
    };
    raw * params.inertance_scale
}

/// Averaged geometry at one outlet node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutletGeometry {
    pub radius: Length,
    pub length: Length,
    /// Vessel endpoints averaged.
    pub samples: usize,
    /// At least one endpoint radius or length was raised to its minimum.
    pub clamped: bool,
    /// No incident geometry; the fallback radius and length were used.
    pub fallback: bool,
}

impl OutletGeometry {
    /// Mean radius (half the endpoint diameter) and mean length over every
    /// endpoint of `vessels` touching `node`.
    pub fn average<'a, I>(node: &str, vessels: I, params: &WindkesselParams) -> Self
    where
        I: IntoIterator<Item = &'a Vessel>,
    {
        let mut radii = Vec::new();
        let mut lengths = Vec::new();
        let mut clamped = false;

        for vessel in vessels {
            let Some(diameter) = vessel.diameter_at(node) else {
                continue;
            };
            let r = diameter.value * 0.5;
            let l = vessel.length.value;
            if !(r >= params.min_radius.value) || !(l >= params.min_length.value) {
                clamped = true;
            }
            radii.push(clamp_radius(params, diameter * 0.5));
            lengths.push(clamp_length(params, vessel.length));
        }

        let samples = radii.len();
        match (mean(radii), mean(lengths)) {
            (Some(r), Some(l)) => {
                if clamped {
                    warn!(
                        node = %node,
                        "DegenerateGeometryWarning: outlet radius or length raised to minimum"
                    );
                }
                Self {
                    radius: hn_core::units::m(r),
                    length: hn_core::units::m(l),
                    samples,
                    clamped,
                    fallback: false,
                }
            }
            _ => {
                warn!(
                    node = %node,
                    "MissingGeometryData: outlet has no incident vessels, using fallback geometry"
                );
                Self {
                    radius: params.fallback_radius,
                    length: params.fallback_length,
                    samples: 0,
                    clamped: false,
                    fallback: true,
                }
            }
        }
    }

    pub fn values(&self, params: &WindkesselParams) -> WindkesselValues {
        WindkesselValues::from_geometry(params, self.radius, self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hn_core::units::{m, mm};

    fn close(a: Real, b: Real) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
    }

    #[test]
    fn poiseuille_reference_value() {
        let p = WindkesselParams::default();
        let r: Real = 1.0e-3;
        let l = 0.02;
        let expected = 8.0 * 0.0035 * l / (PI * r.powi(4));
        assert!(close(total_resistance(&p, m(r), m(l)), expected));
    }

    #[test]
    fn split_follows_fraction() {
        let p = WindkesselParams::default();
        let (prox, dist) = split_resistance(&p, 1.0e9);
        assert!(close(prox, 3.0e8));
        assert!(close(dist, 7.0e8));
        let (prox, dist) = split_resistance(&p, 1.0e6);
        assert_eq!(prox, p.r_min);
        assert_eq!(dist, p.r_min);
    }

    #[test]
    fn compliance_reference_value() {
        let p = WindkesselParams::default();
        let r: Real = 2.0e-3;
        let expected = PI * r.powi(3) / (2.0 * 4.0e6 * 0.1 * r);
        assert!(close(compliance(&p, m(r)), expected));
    }

    #[test]
    fn inertance_is_scaled_after_clamp() {
        let p = WindkesselParams::default();
        let r: Real = 1.0e-3;
        let l = 0.02;
        let expected = 1060.0 * l / (PI * r * r) * 0.25;
        assert!(close(inertance(&p, m(r), m(l)), expected));
        // Very wide and short: clamped raw value, then scaled.
        assert!(close(inertance(&p, m(1.0), mm(1.0)), p.l_min * 0.25));
    }

    #[test]
    fn averaging_uses_endpoint_diameters() {
        use hn_anatomy::{GeometrySource, Material, VesselKind};
        let p = WindkesselParams::default();
        let v = Vessel {
            id: "v".into(),
            name: "v".into(),
            start_node: "A".into(),
            end_node: "B".into(),
            start_diameter: mm(4.0),
            end_diameter: mm(2.0),
            start_thickness: mm(0.2),
            end_thickness: mm(0.1),
            length: mm(30.0),
            divisions: 6,
            material: Material::default(),
            kind: VesselKind::Anatomical,
            source: GeometrySource::Measured,
        };
        let g = OutletGeometry::average("B", [&v], &p);
        assert_eq!(g.samples, 1);
        assert!(close(g.radius.value, 1.0e-3));
        assert!(close(g.length.value, 0.03));
        assert!(!g.clamped && !g.fallback);
    }

    #[test]
    fn averaging_without_vessels_falls_back() {
        let p = WindkesselParams::default();
        let g = OutletGeometry::average("X", std::iter::empty(), &p);
        assert!(g.fallback);
        assert_eq!(g.radius, p.fallback_radius);
        assert_eq!(g.length, p.fallback_length);
    }
}
