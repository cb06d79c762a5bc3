// hn-core/src/units.rs

use uom::si::f64::{
    DynamicViscosity as UomDynamicViscosity, Length as UomLength, MassDensity as UomMassDensity,
    Pressure as UomPressure,
};

// Public canonical unit types (SI, f64)
pub type DynVisc = UomDynamicViscosity;
pub type Length = UomLength;
pub type Density = UomMassDensity;
pub type Pressure = UomPressure;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

/// Anatomical measurements arrive in millimeters.
#[inline]
pub fn mm(v: f64) -> Length {
    use uom::si::length::millimeter;
    Length::new::<millimeter>(v)
}

#[inline]
pub fn pa_s(v: f64) -> DynVisc {
    use uom::si::dynamic_viscosity::pascal_second;
    DynVisc::new::<pascal_second>(v)
}

#[inline]
pub fn kg_per_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

/// Length expressed in millimeters.
#[inline]
pub fn to_mm(l: Length) -> f64 {
    use uom::si::length::millimeter;
    l.get::<millimeter>()
}

pub mod constants {
    /// Whole-blood dynamic viscosity.
    pub const BLOOD_VISCOSITY_PA_S: f64 = 0.0035;
    /// Whole-blood density.
    pub const BLOOD_DENSITY_KG_M3: f64 = 1060.0;
    /// Arterial wall Young's modulus.
    pub const WALL_MODULUS_PA: f64 = 4.0e6;
    /// Reference (atmospheric) pressure used for initial conditions.
    pub const REFERENCE_PRESSURE_PA: f64 = 1.0e5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _p = pa(101_325.0);
        let _l = m(2.0);
        let _mu = pa_s(constants::BLOOD_VISCOSITY_PA_S);
        let _rho = kg_per_m3(constants::BLOOD_DENSITY_KG_M3);
    }

    #[test]
    fn millimeters_convert_to_meters() {
        let l = mm(12.5);
        assert!((l.value - 0.0125).abs() < 1e-15);
        assert!((to_mm(l) - 12.5).abs() < 1e-12);
    }
}
