//! hn-windkessel: boundary circuit synthesis for hemonet.
//!
//! Provides:
//! - An injected physical parameter set with clamps
//! - Closed-form resistance, compliance and inertance relations
//! - A lumped circuit model shared by outlet terminations and the heart
//! - Termination classifiers (systemic vs. coronary topology)
//! - The synthesizer producing one circuit per outlet node
//!
//! # Example
//!
//! ```
//! use hn_core::units::mm;
//! use hn_windkessel::{WindkesselParams, WindkesselValues};
//!
//! let params = WindkesselParams::default();
//! let v = WindkesselValues::from_geometry(&params, mm(1.0), mm(20.0));
//! assert!(v.r_proximal < v.r_distal);
//! assert!(v.compliance >= params.c_min);
//! ```

pub mod circuit;
pub mod classify;
pub mod error;
pub mod heart;
pub mod params;
pub mod physics;
pub mod synth;

// Re-exports
pub use circuit::{
    BoundaryCircuit, CircuitEdge, CircuitKind, CircuitNaming, CircuitNode, EdgeKind,
    LumpedCircuit, NodeKind,
};
pub use classify::{AlwaysSystemic, CoronaryNameHeuristic, OutletContext, TerminationClassifier};
pub use error::{WindkesselError, WindkesselResult};
pub use heart::{DEFAULT_HEART_ID, DEFAULT_HEART_INTERFACE, default_heart};
pub use params::WindkesselParams;
pub use physics::{OutletGeometry, WindkesselValues};
pub use synth::Synthesizer;
