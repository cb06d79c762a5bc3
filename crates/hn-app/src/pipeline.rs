//! End-to-end generation pipeline.
//!
//! Catalog, connector augmentation, graph build, inlet partition, circuit
//! synthesis, model assembly, emission and validation. Each stage is a plain
//! function call; the three policy points (inlet choice, connector rules,
//! termination classifier) are owned here and can be replaced.
//!
//! Re-geometry reuses the catalog and the emitter's row rewriter on a
//! model that already exists, in memory or on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hn_anatomy::{AnatomyInput, GeometryCatalog, SkippedEntry, Vessel};
use hn_graph::{
    ConnectorReport, ConnectorRule, GraphBuilder, InletPolicy, Partition, partition,
    synthesize_connectors,
};
use hn_model::format::{artifact_id, artifact_name};
use hn_model::parse::parse_geometry;
use hn_model::{
    ArtifactSet, ArtifactSource, DirSource, Model, ValidationReport, render, rewrite_geometry,
};
use hn_windkessel::{Synthesizer, TerminationClassifier, default_heart};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::{AppError, AppResult};
use crate::regeometry::{RegeometryOutcome, SegmentMapping, overrides_for};

/// Result of the build stages, before anything touches disk.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub model: Model,
    pub partition: Partition,
    pub connectors: ConnectorReport,
    /// Catalog entries that produced no vessel.
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Debug, Clone)]
pub struct EmitOutcome {
    pub artifacts: ArtifactSet,
    pub paths: Vec<PathBuf>,
    pub digest: String,
}

/// A build that was emitted and validated solver-ready.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub build: BuildOutcome,
    pub emitted: EmitOutcome,
    pub report: ValidationReport,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    inlet: Arc<dyn InletPolicy>,
    connectors: Vec<ConnectorRule>,
    classifier: Arc<dyn TerminationClassifier>,
}

impl Pipeline {
    /// Checks the configuration and takes the strategies it describes.
    pub fn new(config: PipelineConfig) -> AppResult<Self> {
        config.check()?;
        Ok(Self {
            inlet: config.inlet.policy(),
            connectors: config.connectors.rules.clone(),
            classifier: config.windkessel.classifier.classifier(),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn inlet_policy(&self) -> &dyn InletPolicy {
        self.inlet.as_ref()
    }

    pub fn connector_rules(&self) -> &[ConnectorRule] {
        &self.connectors
    }

    pub fn classifier(&self) -> &dyn TerminationClassifier {
        self.classifier.as_ref()
    }

    pub fn with_inlet_policy(mut self, policy: impl InletPolicy + 'static) -> Self {
        self.inlet = Arc::new(policy);
        self
    }

    pub fn with_connector_rules(mut self, rules: Vec<ConnectorRule>) -> Self {
        self.connectors = rules;
        self
    }

    pub fn with_classifier(mut self, classifier: impl TerminationClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Anatomical input to a validated, in-memory model.
    pub fn build_model(&self, input: &AnatomyInput) -> AppResult<BuildOutcome> {
        let catalog = GeometryCatalog::from_input(input, self.config.catalog_config());
        info!(
            vessels = catalog.vessels().len(),
            skipped = catalog.skipped().len(),
            "geometry catalog built"
        );

        let (extra, report) = synthesize_connectors(
            &catalog,
            input,
            &self.connectors,
            &self.config.connector_config(),
        );

        let skipped = catalog.skipped().to_vec();
        let mut vessels = catalog.into_vessels();
        vessels.extend(extra);

        let (model, partition) = self.assemble(vessels)?;
        Ok(BuildOutcome {
            model,
            partition,
            connectors: report,
            skipped,
        })
    }

    /// Same as [`Pipeline::build_model`] for an already-normalized vessel list.
    pub fn build_from_vessels(&self, vessels: Vec<Vessel>) -> AppResult<BuildOutcome> {
        let (model, partition) = self.assemble(vessels)?;
        Ok(BuildOutcome {
            model,
            partition,
            connectors: ConnectorReport::default(),
            skipped: Vec::new(),
        })
    }

    fn assemble(&self, vessels: Vec<Vessel>) -> AppResult<(Model, Partition)> {
        let mut builder = GraphBuilder::new();
        builder.add_vessels(vessels);
        let graph = builder.build()?;
        graph.ensure_connected()?;
        info!(
            vessels = graph.vessels().len(),
            nodes = graph.node_count(),
            "vessel graph built"
        );

        let split = partition(&graph, self.inlet.as_ref())?;
        info!(
            policy = self.inlet.name(),
            inlet = %split.inlet.node,
            rule = ?split.inlet.rule,
            outlets = split.outlets.len(),
            "inlet/outlet partition"
        );

        let synth = Synthesizer::new(
            self.config.windkessel_params(),
            self.config.naming.clone(),
            Arc::clone(&self.classifier),
        )?;
        let circuits = synth.synthesize(&graph, &split.outlets);
        debug!(classifier = self.classifier.name(), "boundary circuits synthesized");

        let model = Model::new(
            self.config.network_id.clone(),
            graph.into_vessels(),
            split.inlet.clone(),
            default_heart(),
            circuits,
            self.config.run.clone(),
        )?;
        Ok((model, split))
    }

    /// Render `model` and write every artifact into `dir`.
    pub fn emit(&self, model: &Model, dir: &Path) -> AppResult<EmitOutcome> {
        let artifacts = render(model)?;
        let paths = artifacts.write_to(dir)?;
        let digest = artifacts.digest();
        info!(
            dir = %dir.display(),
            artifacts = artifacts.len(),
            digest = %digest,
            "artifacts written"
        );
        Ok(EmitOutcome {
            artifacts,
            paths,
            digest,
        })
    }

    /// Standalone diagnostic over an artifact directory.
    pub fn validate_dir(&self, dir: &Path) -> ValidationReport {
        hn_model::validate_dir(dir, &self.config.validation)
    }

    /// Build, emit and validate. Refuses promotion when the emitted
    /// artifacts are not solver-ready.
    pub fn run(&self, input: &AnatomyInput, dir: &Path) -> AppResult<RunOutcome> {
        let build = self.build_model(input)?;
        let emitted = self.emit(&build.model, dir)?;
        let report = self.ready_report(dir)?;
        Ok(RunOutcome {
            build,
            emitted,
            report,
        })
    }

    /// New in-memory model with the mapped vessels resized from `input`.
    pub fn regeometry_model(
        &self,
        model: &Model,
        input: &AnatomyInput,
        mapping: &[SegmentMapping],
    ) -> AppResult<Model> {
        let catalog = GeometryCatalog::from_input(input, self.config.catalog_config());
        let overrides = overrides_for(&catalog, mapping, |id| {
            model.vessel(id).map(|v| v.length.value)
        });
        Ok(model.with_vessel_geometry(&overrides)?)
    }

    /// Copy the `.csv` artifacts of `baseline` into `out`, resizing the
    /// mapped vessels of the geometry artifact, then validate `out`.
    ///
    /// Every other artifact, and every other row of the geometry artifact,
    /// is written back unchanged. `out` may be `baseline` itself.
    pub fn regeometry(
        &self,
        baseline: &Path,
        input: &AnatomyInput,
        mapping: &[SegmentMapping],
        out: &Path,
    ) -> AppResult<RegeometryOutcome> {
        let geometry_name = artifact_name(&self.config.network_id);
        let source = DirSource::new(baseline);
        let mut artifacts = ArtifactSet::new();
        for name in source.names()? {
            if artifact_id(&name).is_none() {
                continue;
            }
            if let Some(content) = source.read(&name)? {
                artifacts.push(name, content)?;
            }
        }
        let Some(geometry) = artifacts.get(&geometry_name).map(|a| a.content.clone()) else {
            return Err(AppError::MissingBaseline {
                dir: baseline.to_path_buf(),
                artifact: geometry_name,
            });
        };
        info!(
            baseline = %baseline.display(),
            artifacts = artifacts.len(),
            "baseline model loaded"
        );

        let doc = parse_geometry(&geometry);
        if !doc.malformed.is_empty() {
            warn!(rows = doc.malformed.len(), "baseline geometry has malformed rows");
        }
        let catalog = GeometryCatalog::from_input(input, self.config.catalog_config());
        let overrides = overrides_for(&catalog, mapping, |id| {
            doc.vessels.iter().find(|v| v.id == id).map(|v| v.length)
        });
        let rewritten = rewrite_geometry(&geometry, &overrides)?;
        artifacts.replace(&geometry_name, rewritten);

        let mut updated: Vec<String> = overrides.into_iter().map(|o| o.id).collect();
        updated.sort();
        info!(vessels = updated.len(), "vessel geometry replaced");

        let paths = artifacts.write_to(out)?;
        let digest = artifacts.digest();
        let report = self.ready_report(out)?;
        Ok(RegeometryOutcome {
            updated,
            emitted: EmitOutcome {
                artifacts,
                paths,
                digest,
            },
            report,
        })
    }

    fn ready_report(&self, dir: &Path) -> AppResult<ValidationReport> {
        let report = self.validate_dir(dir);
        if !report.is_solver_ready() {
            warn!(findings = report.findings.len(), "model is not solver-ready");
            return Err(AppError::NotSolverReady {
                report: Box::new(report),
            });
        }
        info!(warnings = report.findings.len(), "model is solver-ready");
        Ok(report)
    }
}
