//! hn-model: model aggregate, artifact emitter and validator.

pub mod emit;
pub mod format;
pub mod hash;
pub mod model;
pub mod parse;
pub mod symbols;
pub mod validate;

pub use emit::{Artifact, ArtifactSet, render, rewrite_geometry};
pub use hash::digest;
pub use model::{GeometryOverride, Interface, InterfaceRole, Model, RunSettings};
pub use symbols::SymbolTable;
pub use validate::{
    ArtifactSource, DirSource, Finding, FindingKind, Severity, ValidationReport,
    ValidatorOptions, validate_dir, validate_source,
};

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Duplicate {kind} identifier: {id}")]
    DuplicateIdentifier { kind: &'static str, id: String },

    #[error("Node '{node}' of circuit '{circuit}' shadows a network node")]
    CircuitNodeShadowsNetwork { circuit: String, node: String },

    #[error("Inlet node '{node}' is not a network node")]
    UnknownInlet { node: String },

    #[error("Vessel not found: {id}")]
    UnknownVessel { id: String },

    #[error("Invalid geometry override for '{id}': {reason}")]
    InvalidOverride { id: String, reason: String },

    #[error("Invalid circuit: {0}")]
    Circuit(#[from] hn_windkessel::WindkesselError),

    #[error("{kind} identifier {id:?} cannot be written to a CSV row")]
    UnsafeIdentifier { kind: &'static str, id: String },

    #[error("Invalid vessel '{id}': {reason}")]
    InvalidVessel { id: String, reason: String },
}
