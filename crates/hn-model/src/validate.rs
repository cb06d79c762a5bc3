//! Model validator.
//!
//! Re-reads emitted artifacts through an [`ArtifactSource`], builds a
//! [`SymbolTable`] once and runs every cross-reference check against it.
//! The validator never fails and never writes: every problem becomes a
//! [`Finding`] in the returned [`ValidationReport`].

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hn_graph::{NodeIndex, connected_components};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::emit::ArtifactSet;
use crate::format::{artifact_id, artifact_name};
use crate::parse::{Malformed, parse_circuit, parse_geometry, parse_topology};
use crate::symbols::{DeclSite, SymbolTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    /// Blocks promotion to solver-ready.
    Error,
    /// The model cannot be simulated at all.
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FindingKind {
    DanglingNodeReference,
    UnusedDeclaredNode,
    MissingCircuitArtifact,
    OrphanCircuitArtifact,
    InterfaceNodeMismatch,
    DuplicateDeclaration,
    DisconnectedNetwork,
    MissingArtifact,
    MalformedArtifact,
}

impl FindingKind {
    pub fn severity(&self) -> Severity {
        match self {
            FindingKind::UnusedDeclaredNode => Severity::Warning,
            FindingKind::DisconnectedNetwork | FindingKind::MissingArtifact => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    /// Node, circuit, vessel or artifact the finding is about.
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {:?} {}", self.severity, self.kind, self.subject)?;
        if let Some(a) = &self.artifact {
            write!(f, " ({})", a)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Every finding of one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Artifacts that were read.
    pub artifacts: Vec<String>,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    /// No `Error` or `Fatal` finding.
    pub fn is_solver_ready(&self) -> bool {
        self.findings.iter().all(|f| f.severity == Severity::Warning)
    }

    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }

    pub fn count(&self, kind: FindingKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn count_severity(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    fn push(&mut self, kind: FindingKind, subject: &str, artifact: Option<&str>, message: String) {
        self.findings.push(Finding {
            kind,
            severity: kind.severity(),
            subject: subject.to_string(),
            artifact: artifact.map(str::to_string),
            message,
        });
    }

    fn push_malformed(&mut self, artifact: &str, rows: &[Malformed]) {
        for m in rows {
            self.push(
                FindingKind::MalformedArtifact,
                artifact,
                Some(artifact),
                format!("line {}: {}", m.line, m.reason),
            );
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} artifacts checked, {} fatal, {} errors, {} warnings",
            self.artifacts.len(),
            self.count_severity(Severity::Fatal),
            self.count_severity(Severity::Error),
            self.count_severity(Severity::Warning)
        )?;
        for finding in &self.findings {
            writeln!(f, "  {}", finding)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    pub topology_file: String,
    /// Network artifact id assumed when the topology names none.
    pub default_network: String,
    /// Pure 0D helper nodes exempt from the unused-node check.
    pub exempt_nodes: BTreeSet<String>,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            topology_file: crate::format::TOPOLOGY_FILE.to_string(),
            default_network: "arterial".to_string(),
            exempt_nodes: BTreeSet::new(),
        }
    }
}

/// Read-only access to a set of named artifacts.
pub trait ArtifactSource {
    /// Artifact names, sorted.
    fn names(&self) -> io::Result<Vec<String>>;

    /// Content of `name`, `None` when absent.
    fn read(&self, name: &str) -> io::Result<Option<String>>;
}

/// Artifacts stored as files in one directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArtifactSource for DirSource {
    fn names(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.dir.join(name)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl ArtifactSource for ArtifactSet {
    fn names(&self) -> io::Result<Vec<String>> {
        let mut names: Vec<String> = self.iter().map(|a| a.name.clone()).collect();
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> io::Result<Option<String>> {
        Ok(self.get(name).map(|a| a.content.clone()))
    }
}

/// Validate the artifacts stored in `dir`.
pub fn validate_dir(dir: &Path, options: &ValidatorOptions) -> ValidationReport {
    validate_source(&DirSource::new(dir), options)
}

/// Validate any artifact source.
pub fn validate_source(source: &dyn ArtifactSource, options: &ValidatorOptions) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut table = SymbolTable::new();

    let names = match source.names() {
        Ok(names) => names,
        Err(e) => {
            report.push(
                FindingKind::MissingArtifact,
                &options.topology_file,
                None,
                format!("artifacts cannot be listed: {}", e),
            );
            return finish(report);
        }
    };

    let topology_file = options.topology_file.as_str();
    let Some(topology) = read(source, topology_file, &mut report) else {
        return finish(report);
    };
    let topology = parse_topology(&topology);
    report.push_malformed(topology_file, &topology.malformed);
    report.artifacts.push(topology_file.to_string());
    table.add_topology(&topology);

    let mut network_files: BTreeSet<String> = topology
        .networks
        .iter()
        .map(|n| artifact_name(&n.name))
        .collect();
    if network_files.is_empty() {
        network_files.insert(artifact_name(&options.default_network));
    }
    let mut geometry_files = Vec::new();
    for file in &network_files {
        if let Some(content) = read(source, file, &mut report) {
            let doc = parse_geometry(&content);
            report.push_malformed(file, &doc.malformed);
            report.artifacts.push(file.clone());
            table.add_geometry(&doc);
            geometry_files.push(file.clone());
        }
    }

    for name in &names {
        if name == topology_file || network_files.contains(name) {
            continue;
        }
        let Some(id) = artifact_id(name) else {
            continue;
        };
        if let Some(content) = read(source, name, &mut report) {
            let doc = parse_circuit(&content);
            report.push_malformed(name, &doc.malformed);
            report.artifacts.push(name.clone());
            table.add_circuit(id, name, &doc);
        }
    }

    debug!(
        nodes = table.nodes().count(),
        circuits = table.circuits().count(),
        vessels = table.vessel_count(),
        "symbol table built"
    );

    check_nodes(&table, topology_file, &geometry_files, options, &mut report);
    check_circuits(&table, topology_file, &mut report);
    check_duplicates(&table, &topology, &mut report);
    if !geometry_files.is_empty() {
        check_connectivity(&table, &mut report);
    }

    finish(report)
}

fn read(source: &dyn ArtifactSource, name: &str, report: &mut ValidationReport) -> Option<String> {
    match source.read(name) {
        Ok(Some(content)) => Some(content),
        Ok(None) => {
            report.push(
                FindingKind::MissingArtifact,
                name,
                Some(name),
                "artifact not found".to_string(),
            );
            None
        }
        Err(e) => {
            report.push(
                FindingKind::MissingArtifact,
                name,
                Some(name),
                format!("artifact unreadable: {}", e),
            );
            None
        }
    }
}

fn finish(report: ValidationReport) -> ValidationReport {
    if report.is_solver_ready() {
        info!(warnings = report.findings.len(), "model is solver-ready");
    } else {
        warn!(
            fatal = report.count_severity(Severity::Fatal),
            errors = report.count_severity(Severity::Error),
            "model is not solver-ready"
        );
    }
    report
}

fn check_nodes(
    table: &SymbolTable,
    topology_file: &str,
    geometry_files: &[String],
    options: &ValidatorOptions,
    report: &mut ValidationReport,
) {
    for (name, symbol) in table.nodes() {
        if symbol.is_used() {
            let mut missing: Vec<&str> = Vec::new();
            if !symbol.is_declared_in(DeclSite::Topology) {
                missing.push(topology_file);
            }
            if !geometry_files.is_empty() && !symbol.is_declared_in(DeclSite::Geometry) {
                missing.extend(geometry_files.iter().map(String::as_str));
            }
            if !missing.is_empty() {
                report.push(
                    FindingKind::DanglingNodeReference,
                    name,
                    missing.first().copied(),
                    format!(
                        "used by vessel(s) {} but not declared in {}",
                        symbol.used_by.join(", "),
                        missing.join(", ")
                    ),
                );
            }
        } else if !options.exempt_nodes.contains(name) {
            report.push(
                FindingKind::UnusedDeclaredNode,
                name,
                None,
                "declared or coupled but not used by any vessel".to_string(),
            );
        }
    }
}

fn check_circuits(table: &SymbolTable, topology_file: &str, report: &mut ValidationReport) {
    for (id, circuit) in table.circuits() {
        let referenced = !circuit.couplings.is_empty() || circuit.declared_in_geometry;
        match &circuit.artifact {
            None if referenced => report.push(
                FindingKind::MissingCircuitArtifact,
                id,
                None,
                format!("referenced but {} does not exist", artifact_name(id)),
            ),
            None => {}
            Some(artifact) if circuit.couplings.is_empty() => report.push(
                FindingKind::OrphanCircuitArtifact,
                id,
                Some(artifact),
                format!("not coupled in {}", topology_file),
            ),
            Some(artifact) => {
                for (main, local) in &circuit.couplings {
                    if !circuit.declares_local(local) {
                        report.push(
                            FindingKind::InterfaceNodeMismatch,
                            id,
                            Some(artifact),
                            format!(
                                "coupling of '{}' names local node '{}', which the circuit does not declare",
                                main, local
                            ),
                        );
                    }
                }
            }
        }
    }
}

fn check_duplicates(
    table: &SymbolTable,
    topology: &crate::parse::TopologyDoc,
    report: &mut ValidationReport,
) {
    for (id, rows) in table.vessels() {
        if rows.len() > 1 {
            report.push(
                FindingKind::DuplicateDeclaration,
                id,
                None,
                format!("vessel id appears {} times", rows.len()),
            );
        }
    }
    for (name, symbol) in table.nodes() {
        for (site, count) in &symbol.declared {
            if *count > 1 {
                report.push(
                    FindingKind::DuplicateDeclaration,
                    name,
                    None,
                    format!("node declared {} times in the {:?} artifact", count, site),
                );
            }
        }
    }
    for (id, circuit) in table.circuits() {
        if circuit.couplings.len() > 1 {
            report.push(
                FindingKind::DuplicateDeclaration,
                id,
                None,
                format!("circuit coupled {} times", circuit.couplings.len()),
            );
        }
        for (local, count) in &circuit.local_nodes {
            if *count > 1 {
                report.push(
                    FindingKind::DuplicateDeclaration,
                    id,
                    circuit.artifact.as_deref(),
                    format!("local node '{}' declared {} times", local, count),
                );
            }
        }
    }
    let mut seen = BTreeSet::new();
    for row in &topology.couplings {
        if !seen.insert(row.main_node.as_str()) {
            report.push(
                FindingKind::DuplicateDeclaration,
                &row.main_node,
                None,
                format!("network node coupled to more than one circuit (line {})", row.line),
            );
        }
    }
}

fn check_connectivity(table: &SymbolTable, report: &mut ValidationReport) {
    let nodes = table.network_nodes();
    if nodes.is_empty() {
        report.push(
            FindingKind::DisconnectedNetwork,
            "network",
            None,
            "no vessels".to_string(),
        );
        return;
    }

    let index = NodeIndex::from_names(&nodes);
    let edges = table
        .vessels()
        .flat_map(|(_, rows)| rows.iter())
        .filter_map(|(a, b)| Some((index.get(a)?, index.get(b)?)));
    let components = connected_components(index.len(), edges);

    let inlet = table.inlet();
    match inlet {
        Some(node) if index.get(node).is_none() => report.push(
            FindingKind::DisconnectedNetwork,
            node,
            None,
            "inlet node is not on any vessel".to_string(),
        ),
        None => report.push(
            FindingKind::DisconnectedNetwork,
            "network",
            None,
            "no inlet coupling found".to_string(),
        ),
        _ => {}
    }

    if components.len() > 1 {
        let inlet_idx = inlet.and_then(|n| index.get(n));
        for component in &components {
            if inlet_idx.is_some_and(|i| component.contains(&i)) {
                continue;
            }
            let first = component.first().map(|&i| index.name(i)).unwrap_or("?");
            report.push(
                FindingKind::DisconnectedNetwork,
                first,
                None,
                format!(
                    "{} node(s) unreachable from the inlet ({} components in total)",
                    component.len(),
                    components.len()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities() {
        assert_eq!(FindingKind::UnusedDeclaredNode.severity(), Severity::Warning);
        assert_eq!(FindingKind::DanglingNodeReference.severity(), Severity::Error);
        assert_eq!(FindingKind::DisconnectedNetwork.severity(), Severity::Fatal);
        assert!(Severity::Fatal > Severity::Error);
    }

    #[test]
    fn warnings_alone_are_solver_ready() {
        let mut report = ValidationReport::default();
        report.push(FindingKind::UnusedDeclaredNode, "X", None, "unused".into());
        assert!(report.is_solver_ready());
        report.push(FindingKind::OrphanCircuitArtifact, "p9", None, "orphan".into());
        assert!(!report.is_solver_ready());
    }

    #[test]
    fn missing_topology_is_fatal() {
        let report = validate_source(&ArtifactSet::new(), &ValidatorOptions::default());
        assert_eq!(report.count(FindingKind::MissingArtifact), 1);
        assert!(!report.is_solver_ready());
    }
}
