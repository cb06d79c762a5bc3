//! Error types for boundary circuit synthesis.

use hn_core::HnError;
use thiserror::Error;

/// Only the configuration can be wrong; degenerate geometry is clamped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindkesselError {
    #[error("Invalid Windkessel parameter {what}: {value}")]
    InvalidParameter { what: &'static str, value: f64 },

    #[error("Fraction {what} must lie in [0, 1], got {value}")]
    FractionOutOfRange { what: &'static str, value: f64 },

    #[error("Circuit naming collision: {what}")]
    NamingCollision { what: String },
}

pub type WindkesselResult<T> = Result<T, WindkesselError>;

impl From<WindkesselError> for HnError {
    fn from(e: WindkesselError) -> Self {
        match e {
            WindkesselError::InvalidParameter { what, value } => {
                HnError::NonPositive { what, value }
            }
            WindkesselError::FractionOutOfRange { what, .. } => HnError::InvalidArg { what },
            WindkesselError::NamingCollision { what } => HnError::Invariant { what },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WindkesselError::InvalidParameter {
            what: "viscosity",
            value: -1.0,
        };
        assert!(err.to_string().contains("viscosity"));
    }

    #[test]
    fn error_conversion() {
        let err = WindkesselError::FractionOutOfRange {
            what: "proximal fraction",
            value: 1.5,
        };
        let hn: HnError = err.into();
        assert!(matches!(hn, HnError::InvalidArg { .. }));
    }
}
