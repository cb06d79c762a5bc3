//! Application-layer error types.

use std::path::PathBuf;

use hn_graph::GraphError;
use hn_model::{ModelError, ValidationReport};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config {path}: {source}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    ConfigFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read mapping {path}: {source}")]
    MappingFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Baseline {dir} has no {artifact}")]
    MissingBaseline { dir: PathBuf, artifact: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Anatomy input error: {0}")]
    Anatomy(String),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Boundary circuit error: {0}")]
    Windkessel(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Model is not solver-ready: {} finding(s)", .report.findings.len())]
    NotSolverReady { report: Box<ValidationReport> },
}

impl From<hn_anatomy::AnatomyError> for AppError {
    fn from(err: hn_anatomy::AnatomyError) -> Self {
        AppError::Anatomy(err.to_string())
    }
}

impl From<hn_windkessel::WindkesselError> for AppError {
    fn from(err: hn_windkessel::WindkesselError) -> Self {
        AppError::Windkessel(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
