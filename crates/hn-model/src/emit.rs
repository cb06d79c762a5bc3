//! Model emitter: renders a [`Model`] into interlinked CSV artifacts.
//!
//! Artifacts are rendered fully in memory first; writing is a separate step
//! that goes through a temporary file and a rename per artifact.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use hn_windkessel::LumpedCircuit;
use tracing::{debug, info};

use crate::format::{TOPOLOGY_FILE, artifact_id, artifact_name, fixed, plain, sci};
use crate::model::{GeometryOverride, Model};
use crate::{ModelError, ModelResult};

const GEOMETRY_HEADER: &str = "type,ID,name,start_node,end_node,start_diameter[SI],end_diameter[SI],start_thickness[SI],end_thickness[SI],length[SI],division_points,elastance_1[SI],res_start[SI],res_end[SI],visc_fact[1],k1[SI],k2[SI],k3[SI]";
const DECLARATION_HEADER: &str = "type,ID,name,valami,parameter,file name";
const COUPLING_HEADER: &str = "type,name,main node,model node";
const EDGE_SECTION: &str = "data of edges";
const NODE_SECTION: &str = "data of nodes";
const NODE_HEADER: &str = "type,name,initial condition [SI]";

/// Significant digits after the point for scientific values.
const SCI_DIGITS: usize = 3;

/// First geometry column of a vessel row (start diameter).
const GEOMETRY_COL: usize = 5;
const DIVISIONS_COL: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub content: String,
}

/// Rendered artifacts in emission order: topology, geometry, heart, outlets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact; a second artifact with the same name is rejected.
    pub fn push(&mut self, name: impl Into<String>, content: String) -> ModelResult<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(ModelError::DuplicateIdentifier {
                kind: "artifact",
                id: name,
            });
        }
        self.artifacts.push(Artifact { name, content });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    /// Swap the content of `name` in place, keeping its position.
    pub fn replace(&mut self, name: &str, content: String) -> Option<String> {
        let artifact = self.artifacts.iter_mut().find(|a| a.name == name)?;
        Some(std::mem::replace(&mut artifact.content, content))
    }

    pub fn remove(&mut self, name: &str) -> Option<Artifact> {
        let pos = self.artifacts.iter().position(|a| a.name == name)?;
        Some(self.artifacts.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.artifacts.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// SHA-256 over names and contents, hex encoded.
    pub fn digest(&self) -> String {
        crate::hash::digest(self)
    }

    /// Write every artifact into `dir`, creating it if needed.
    ///
    /// Each file is written to `<name>.tmp` and renamed into place, so a
    /// reader never observes a partially written artifact. The directory
    /// belongs to the model: `.csv` files from an earlier emission that are
    /// not part of this set are removed afterwards.
    pub fn write_to(&self, dir: &Path) -> ModelResult<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.artifacts.len());
        for artifact in &self.artifacts {
            let path = dir.join(&artifact.name);
            let tmp = dir.join(format!("{}.tmp", artifact.name));
            if let Err(e) = fs::write(&tmp, artifact.content.as_bytes()) {
                let _ = fs::remove_file(&tmp);
                return Err(e.into());
            }
            if let Err(e) = fs::rename(&tmp, &path) {
                let _ = fs::remove_file(&tmp);
                return Err(e.into());
            }
            debug!(path = %path.display(), bytes = artifact.content.len(), "artifact written");
            written.push(path);
        }
        let pruned = self.prune_stale(dir)?;
        info!(
            dir = %dir.display(),
            artifacts = written.len(),
            pruned = pruned.len(),
            "model emitted"
        );
        Ok(written)
    }

    /// Remove `.csv` artifacts (and leftover temporaries) in `dir` that this
    /// set does not contain.
    fn prune_stale(&self, dir: &Path) -> ModelResult<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let stale = match name.strip_suffix(".tmp") {
                Some(base) => artifact_id(base).is_some(),
                None => artifact_id(&name).is_some() && self.get(&name).is_none(),
            };
            if stale {
                fs::remove_file(entry.path())?;
                debug!(path = %entry.path().display(), "stale artifact removed");
                removed.push(entry.path());
            }
        }
        Ok(removed)
    }
}

/// Render all artifacts of `model`.
pub fn render(model: &Model) -> ModelResult<ArtifactSet> {
    let mut set = ArtifactSet::new();
    set.push(TOPOLOGY_FILE, render_topology(model))?;
    set.push(artifact_name(model.network_id()), render_geometry(model))?;
    for circuit in model.circuits() {
        set.push(artifact_name(&circuit.id), render_circuit(circuit))?;
    }
    Ok(set)
}

/// Vessel table followed by the node/interface declaration block.
pub fn render_geometry(model: &Model) -> String {
    let mut out = String::new();
    line(&mut out, GEOMETRY_HEADER);
    for v in model.vessels() {
        let m = &v.material;
        let row = [
            "vis_f".to_string(),
            v.id.clone(),
            v.name.clone(),
            v.start_node.clone(),
            v.end_node.clone(),
            fixed(v.start_diameter.value),
            fixed(v.end_diameter.value),
            fixed(v.start_thickness.value),
            fixed(v.end_thickness.value),
            fixed(v.length.value),
            v.divisions.to_string(),
            sci(m.elastance_1, SCI_DIGITS),
            sci(m.res_start, SCI_DIGITS),
            sci(m.res_end, SCI_DIGITS),
            sci(m.visc_fact, SCI_DIGITS),
            sci(m.k1, SCI_DIGITS),
            sci(m.k2, SCI_DIGITS),
            sci(m.k3, SCI_DIGITS),
        ];
        line(&mut out, &row.join(","));
    }
    out.push('\n');

    line(&mut out, DECLARATION_HEADER);
    line(&mut out, &format!("heart,{},0,,", model.heart().id));
    for node in model.nodes() {
        line(&mut out, &format!("node,{},0,,", node));
    }
    for c in model.outlets() {
        line(&mut out, &format!("perif,{},0,,", c.circuit.id));
    }
    out
}

/// Run block, network row, coupling rows and node declarations.
pub fn render_topology(model: &Model) -> String {
    let run = model.run();
    let mut out = String::new();
    line(&mut out, &format!("run,{}", run.direction));
    line(&mut out, &format!("time,{}", plain(run.duration_s)));
    line(&mut out, &format!("material,{}", run.material));
    line(&mut out, &format!("solver,{}", run.solver));
    out.push('\n');

    line(&mut out, COUPLING_HEADER);
    let mut moc = format!("moc,{}", model.network_id());
    for node in model.nodes() {
        moc.push_str(&format!(",{},{}", node, node));
    }
    line(&mut out, &moc);
    out.push('\n');

    for row in model.coupling_table() {
        line(
            &mut out,
            &format!("lumped,{},{},{}", row.circuit, row.network_node, row.local_node),
        );
    }
    out.push('\n');

    for node in model.nodes() {
        line(&mut out, &format!("node,{}", node));
    }
    out
}

/// Two-section circuit table: edges, then nodes.
pub fn render_circuit(circuit: &LumpedCircuit) -> String {
    let columns = circuit.parameter_columns();
    let mut out = String::new();
    line(&mut out, EDGE_SECTION);
    let mut header =
        String::from("type,name,node start,node end,initial condition [SI]");
    for _ in 0..columns {
        header.push_str(",parameter [SI]");
    }
    line(&mut out, &header);
    for e in &circuit.edges {
        let mut row = format!(
            "{},{},{},{},{}",
            e.kind.as_str(),
            e.name,
            e.start,
            e.end,
            sci(e.initial, SCI_DIGITS)
        );
        for p in &e.parameters {
            row.push(',');
            row.push_str(&sci(*p, SCI_DIGITS));
        }
        line(&mut out, &row);
    }
    out.push('\n');

    line(&mut out, NODE_SECTION);
    line(&mut out, NODE_HEADER);
    for n in &circuit.nodes {
        line(
            &mut out,
            &format!("{},{},{}", n.kind.as_str(), n.name, sci(n.initial, SCI_DIGITS)),
        );
    }
    out
}

/// Rewrite the geometry columns of selected `vis_f` rows of an existing
/// geometry artifact.
///
/// Only the diameter, thickness, length and division columns of overridden
/// vessels change; every other byte of `content` is kept, line endings
/// included.
pub fn rewrite_geometry(content: &str, overrides: &[GeometryOverride]) -> ModelResult<String> {
    let mut pending: BTreeMap<&str, &GeometryOverride> = BTreeMap::new();
    for o in overrides {
        o.check()?;
        if pending.insert(o.id.as_str(), o).is_some() {
            return Err(ModelError::DuplicateIdentifier {
                kind: "override",
                id: o.id.clone(),
            });
        }
    }

    let mut out = String::with_capacity(content.len());
    for raw in content.split_inclusive('\n') {
        let body = raw.trim_end_matches(['\r', '\n']);
        let ending = &raw[body.len()..];
        let fields: Vec<&str> = body.split(',').collect();
        let target = match (fields.first(), fields.get(1)) {
            (Some(tag), Some(id)) if tag.trim() == "vis_f" => pending.remove(id.trim()),
            _ => None,
        };
        let Some(o) = target else {
            out.push_str(raw);
            continue;
        };
        if fields.len() <= DIVISIONS_COL {
            return Err(ModelError::InvalidOverride {
                id: o.id.clone(),
                reason: format!("vessel row has only {} columns", fields.len()),
            });
        }

        let mut row: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        let geometry = [
            o.start_diameter,
            o.end_diameter,
            o.start_thickness,
            o.end_thickness,
            o.length,
        ];
        for (col, value) in (GEOMETRY_COL..).zip(geometry) {
            if let Some(v) = value {
                row[col] = fixed(v.value);
            }
        }
        if let Some(n) = o.divisions {
            row[DIVISIONS_COL] = n.to_string();
        }
        debug!(vessel = %o.id, "geometry row rewritten");
        out.push_str(&row.join(","));
        out.push_str(ending);
    }

    if let Some(id) = pending.keys().next() {
        return Err(ModelError::UnknownVessel { id: id.to_string() });
    }
    Ok(out)
}

fn line(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::path_model;
    use hn_core::units::mm;

    #[test]
    fn artifact_names_in_order() {
        let set = render(&path_model()).unwrap();
        assert_eq!(
            set.names(),
            vec!["main.csv", "arterial.csv", "heart_kim_lit.csv", "p1.csv"]
        );
    }

    #[test]
    fn topology_layout() {
        let text = render_topology(&path_model());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(&lines[..4], &["run,forward", "time,10", "material,linear", "solver,maccormack"]);
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "type,name,main node,model node");
        assert_eq!(lines[6], "moc,arterial,A,A,B,B,C,C");
        assert_eq!(lines[8], "lumped,heart_kim_lit,A,aorta");
        assert_eq!(lines[9], "lumped,p1,C,n1");
        assert_eq!(&lines[11..], &["node,A", "node,B", "node,C"]);
    }

    #[test]
    fn geometry_layout() {
        let text = render_geometry(&path_model());
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("type,ID,name,start_node"));
        assert_eq!(
            lines[1],
            "vis_f,AB,AB,A,B,0.004000,0.003000,0.000200,0.000150,0.025000,5,5.000e+05,0.000e+00,0.000e+00,2.750e+00,2.000e+06,-2.253e+03,8.650e+04"
        );
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "type,ID,name,valami,parameter,file name");
        assert_eq!(lines[5], "heart,heart_kim_lit,0,,");
        assert_eq!(lines[6], "node,A,0,,");
        assert_eq!(lines.last(), Some(&"perif,p1,0,,"));
    }

    #[test]
    fn circuit_layout() {
        let model = path_model();
        let text = render_circuit(&model.outlets()[0].circuit);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "data of edges");
        assert!(lines[2].starts_with("resistor,R0,n1,P1,0.000e+00,"));
        assert_eq!(lines[6], "");
        assert_eq!(lines[7], "data of nodes");
        assert_eq!(lines[9], "node,n1,1.000e+05");
        assert_eq!(lines[11], "ground,g,1.000e+05");
    }

    #[test]
    fn heart_gets_two_parameter_columns() {
        let model = path_model();
        let text = render_circuit(model.heart());
        assert!(text.lines().nth(1).unwrap().ends_with("parameter [SI],parameter [SI]"));
        assert!(text.contains("elastance,E_lv,g1,p_LA3,0.000e+00,2.670e+08,8.000e+06"));
    }

    #[test]
    fn rewrite_touches_only_overridden_geometry() {
        let original = render_geometry(&path_model()).replace('\n', "\r\n");
        let o = GeometryOverride::new("BC").diameter(mm(5.0)).length(mm(12.0));
        let o = GeometryOverride {
            divisions: Some(7),
            ..o
        };
        let rewritten = rewrite_geometry(&original, &[o]).unwrap();

        let before: Vec<&str> = original.split("\r\n").collect();
        let after: Vec<&str> = rewritten.split("\r\n").collect();
        assert_eq!(before.len(), after.len());
        let changed: Vec<usize> = (0..before.len()).filter(|&i| before[i] != after[i]).collect();
        assert_eq!(changed, vec![2]);
        assert!(after[2].starts_with("vis_f,BC,BC,B,C,0.005000,0.005000,0.000200,0.000150,0.012000,7,"));
        assert_eq!(
            after[2].split(',').skip(11).collect::<Vec<_>>(),
            before[2].split(',').skip(11).collect::<Vec<_>>()
        );
    }

    #[test]
    fn rewrite_rejects_unknown_or_vanishing_values() {
        let original = render_geometry(&path_model());
        assert!(matches!(
            rewrite_geometry(&original, &[GeometryOverride::new("ZZ").length(mm(3.0))]),
            Err(ModelError::UnknownVessel { .. })
        ));
        assert!(matches!(
            rewrite_geometry(&original, &[GeometryOverride::new("AB").diameter(mm(1.0e-4))]),
            Err(ModelError::InvalidOverride { .. })
        ));
        let twice = [GeometryOverride::new("AB"), GeometryOverride::new("AB")];
        assert!(matches!(
            rewrite_geometry(&original, &twice),
            Err(ModelError::DuplicateIdentifier { .. })
        ));
    }

    #[test]
    fn replace_keeps_order() {
        let mut set = render(&path_model()).unwrap();
        let old = set.replace("arterial.csv", "x".into()).unwrap();
        assert!(old.starts_with("type,ID"));
        assert_eq!(set.names()[1], "arterial.csv");
        assert_eq!(set.get("arterial.csv").unwrap().content, "x");
        assert!(set.replace("absent.csv", String::new()).is_none());
    }

    #[test]
    fn duplicate_artifact_names_rejected() {
        let mut set = ArtifactSet::new();
        set.push("a.csv", String::new()).unwrap();
        assert!(set.push("a.csv", String::new()).is_err());
    }

    #[test]
    fn rewrite_removes_stale_artifacts_only() {
        let dir = std::env::temp_dir().join("hn_model_emit_prune");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("p7.csv"), "data of edges\n").unwrap();
        fs::write(dir.join("p1.csv.tmp"), "partial").unwrap();
        fs::write(dir.join("notes.txt"), "keep me").unwrap();

        let set = render(&path_model()).unwrap();
        set.write_to(&dir).unwrap();

        let mut names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["arterial.csv", "heart_kim_lit.csv", "main.csv", "notes.txt", "p1.csv"]
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_leaves_no_temporaries() {
        let dir = std::env::temp_dir().join("hn_model_emit_write");
        let _ = fs::remove_dir_all(&dir);
        let set = render(&path_model()).unwrap();
        let written = set.write_to(&dir).unwrap();
        assert_eq!(written.len(), 4);
        let names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".tmp")));
        assert_eq!(
            fs::read_to_string(dir.join("main.csv")).unwrap(),
            set.get("main.csv").unwrap().content
        );
        let _ = fs::remove_dir_all(&dir);
    }
}
