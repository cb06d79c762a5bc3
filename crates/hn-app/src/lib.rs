//! hn-app: application layer for hemonet.
//!
//! Wires the catalog, graph, synthesizer, emitter and validator into one
//! [`Pipeline`] driven by a YAML [`PipelineConfig`], and unifies their
//! errors into [`AppError`]. The pipeline also re-geometrizes an existing
//! model directory from patient measurements. Front ends (the CLI) only
//! talk to this crate.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod regeometry;

pub use config::{
    CatalogSection, ClassifierSection, ConnectorSection, InletSection, PipelineConfig,
    WindkesselSection, load_yaml, save_yaml,
};
pub use error::{AppError, AppResult};
pub use pipeline::{BuildOutcome, EmitOutcome, Pipeline, RunOutcome};
pub use regeometry::{
    RegeometryOutcome, SegmentMapping, circle_of_willis_mapping, load_mapping,
};
