//! Physical constants and clamps injected into the synthesizer.

use hn_core::units::constants::{
    BLOOD_DENSITY_KG_M3, BLOOD_VISCOSITY_PA_S, REFERENCE_PRESSURE_PA, WALL_MODULUS_PA,
};
use hn_core::units::{Density, DynVisc, Length, Pressure, kg_per_m3, mm, pa, pa_s};
use hn_core::{Real, is_usable};

use crate::error::{WindkesselError, WindkesselResult};

/// Immutable parameter set for the closed-form Windkessel relations.
///
/// Resistances are in Pa·s/m³, compliance in m³/Pa, inertance in Pa·s²/m³.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindkesselParams {
    pub viscosity: DynVisc,
    pub density: Density,
    /// Young's modulus of the arterial wall.
    pub wall_modulus: Pressure,
    /// Wall thickness `h = wall_fraction * r`.
    pub wall_fraction: Real,
    /// Share of the total resistance placed proximally.
    pub proximal_fraction: Real,
    /// Damping factor applied to the clamped inertance.
    pub inertance_scale: Real,
    pub r_min: Real,
    pub c_min: Real,
    pub l_min: Real,
    pub min_radius: Length,
    pub min_length: Length,
    /// Used when an outlet has no incident geometry.
    pub fallback_radius: Length,
    pub fallback_length: Length,
    /// Initial condition written for every circuit node.
    pub initial_pressure: Pressure,
}

impl Default for WindkesselParams {
    fn default() -> Self {
        Self {
            viscosity: pa_s(BLOOD_VISCOSITY_PA_S),
            density: kg_per_m3(BLOOD_DENSITY_KG_M3),
            wall_modulus: pa(WALL_MODULUS_PA),
            wall_fraction: 0.10,
            proximal_fraction: 0.30,
            inertance_scale: 0.25,
            r_min: 1.0e6,
            c_min: 1.0e-12,
            l_min: 1.0e5,
            min_radius: mm(0.25),
            min_length: mm(1.0),
            fallback_radius: mm(1.0),
            fallback_length: mm(20.0),
            initial_pressure: pa(REFERENCE_PRESSURE_PA),
        }
    }
}

impl WindkesselParams {
    pub fn check(&self) -> WindkesselResult<()> {
        positive(self.viscosity.value, "viscosity")?;
        positive(self.density.value, "density")?;
        positive(self.wall_modulus.value, "wall modulus")?;
        positive(self.r_min, "minimum resistance")?;
        positive(self.c_min, "minimum compliance")?;
        positive(self.l_min, "minimum inertance")?;
        positive(self.inertance_scale, "inertance scale")?;
        positive(self.min_radius.value, "minimum radius")?;
        positive(self.min_length.value, "minimum length")?;
        positive(self.fallback_radius.value, "fallback radius")?;
        positive(self.fallback_length.value, "fallback length")?;
        positive(self.initial_pressure.value, "initial pressure")?;
        fraction(self.proximal_fraction, "proximal fraction")?;
        if !(self.wall_fraction.is_finite() && self.wall_fraction >= 0.0) {
            return Err(WindkesselError::InvalidParameter {
                what: "wall fraction",
                value: self.wall_fraction,
            });
        }
        Ok(())
    }
}

fn positive(value: Real, what: &'static str) -> WindkesselResult<()> {
    if is_usable(value) {
        Ok(())
    } else {
        Err(WindkesselError::InvalidParameter { what, value })
    }
}

fn fraction(value: Real, what: &'static str) -> WindkesselResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(WindkesselError::FractionOutOfRange { what, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let p = WindkesselParams::default();
        assert!(p.check().is_ok());
        assert!((p.min_radius.value - 2.5e-4).abs() < 1e-15);
        assert!((p.fallback_length.value - 0.02).abs() < 1e-15);
    }

    #[test]
    fn rejects_bad_fraction() {
        let p = WindkesselParams {
            proximal_fraction: 1.2,
            ..WindkesselParams::default()
        };
        assert!(matches!(
            p.check(),
            Err(WindkesselError::FractionOutOfRange { .. })
        ));
    }

    #[test]
    fn zero_wall_fraction_is_allowed() {
        let p = WindkesselParams {
            wall_fraction: 0.0,
            ..WindkesselParams::default()
        };
        assert!(p.check().is_ok());
    }
}
