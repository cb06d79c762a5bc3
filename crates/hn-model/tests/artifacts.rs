//! Emitter and validator integration tests.

use hn_anatomy::{GeometrySource, Material, Vessel, VesselKind};
use hn_core::units::mm;
use hn_graph::{FixedInlet, GraphBuilder, partition};
use hn_model::parse::{parse_circuit, parse_topology};
use hn_model::*;
use hn_windkessel::{Synthesizer, default_heart};

fn vessel(id: &str, start: &str, end: &str, d_mm: f64) -> Vessel {
    Vessel {
        id: id.into(),
        name: id.into(),
        start_node: start.into(),
        end_node: end.into(),
        start_diameter: mm(d_mm),
        end_diameter: mm(d_mm),
        start_thickness: mm(0.1 * d_mm),
        end_thickness: mm(0.1 * d_mm),
        length: mm(20.0),
        divisions: 5,
        material: Material::default(),
        kind: VesselKind::Anatomical,
        source: GeometrySource::Measured,
    }
}

/// Y-shaped tree: inlet N1, bifurcation N2, outlets N3 and N4.
fn tree_model() -> Model {
    let mut builder = GraphBuilder::new();
    builder.add_vessels([
        vessel("trunk", "N1", "N2", 5.0),
        vessel("left", "N2", "N3", 3.0),
        vessel("right", "N2", "N4", 3.5),
    ]);
    let graph = builder.build().unwrap();
    let split = partition(&graph, &FixedInlet::new("N1")).unwrap();
    let outlets = Synthesizer::default().synthesize(&graph, &split.outlets);
    Model::new(
        "arterial",
        graph.into_vessels(),
        split.inlet,
        default_heart(),
        outlets,
        RunSettings::default(),
    )
    .unwrap()
}

fn replace(set: &mut ArtifactSet, name: &str, content: String) {
    set.remove(name);
    set.push(name, content).unwrap();
}

#[test]
fn rendering_is_byte_identical() {
    let a = render(&tree_model()).unwrap();
    let b = render(&tree_model()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.digest(), b.digest());
}

#[test]
fn emitted_model_validates_clean() {
    let set = render(&tree_model()).unwrap();
    let report = validate_source(&set, &ValidatorOptions::default());
    assert!(report.findings.is_empty(), "{}", report);
    assert!(report.is_solver_ready());
    assert_eq!(report.artifacts.len(), 5);
}

#[test]
fn coupling_local_nodes_exist_in_circuits() {
    let set = render(&tree_model()).unwrap();
    let topology = parse_topology(&set.get("main.csv").unwrap().content);
    assert_eq!(topology.couplings.len(), 3);
    for row in &topology.couplings {
        let circuit = set
            .get(&format!("{}.csv", row.circuit))
            .expect("circuit artifact");
        let doc = parse_circuit(&circuit.content);
        assert!(
            doc.nodes.iter().any(|n| n.name == row.model_node),
            "{} lacks {}",
            row.circuit,
            row.model_node
        );
    }
}

#[test]
fn two_dangling_nodes_are_both_reported() {
    let mut set = render(&tree_model()).unwrap();
    let main = set.get("main.csv").unwrap().content.clone();
    let stripped: String = main
        .lines()
        .filter(|l| *l != "node,N3" && *l != "node,N4")
        .map(|l| format!("{}\n", l))
        .collect();
    replace(&mut set, "main.csv", stripped);

    let report = validate_source(&set, &ValidatorOptions::default());
    let dangling: Vec<&str> = report
        .of_kind(FindingKind::DanglingNodeReference)
        .map(|f| f.subject.as_str())
        .collect();
    assert_eq!(dangling, vec!["N3", "N4"]);
    assert!(!report.is_solver_ready());
}

#[test]
fn missing_and_orphan_circuits() {
    let mut set = render(&tree_model()).unwrap();
    set.remove("p2.csv");
    set.push("p9.csv", "data of nodes\nnode,n1,1e5\n".to_string())
        .unwrap();

    let report = validate_source(&set, &ValidatorOptions::default());
    let missing: Vec<&str> = report
        .of_kind(FindingKind::MissingCircuitArtifact)
        .map(|f| f.subject.as_str())
        .collect();
    let orphan: Vec<&str> = report
        .of_kind(FindingKind::OrphanCircuitArtifact)
        .map(|f| f.subject.as_str())
        .collect();
    assert_eq!(missing, vec!["p2"]);
    assert_eq!(orphan, vec!["p9"]);
}

#[test]
fn interface_mismatch_is_reported() {
    let mut set = render(&tree_model()).unwrap();
    let p1 = set.get("p1.csv").unwrap().content.replace("n1", "m1");
    replace(&mut set, "p1.csv", p1);

    let report = validate_source(&set, &ValidatorOptions::default());
    assert_eq!(report.count(FindingKind::InterfaceNodeMismatch), 1);
}

#[test]
fn detached_vessel_is_fatal() {
    let mut set = render(&tree_model()).unwrap();
    let geometry = set.get("arterial.csv").unwrap().content.clone();
    let mut lines: Vec<String> = geometry.lines().map(str::to_string).collect();
    lines.insert(
        1,
        "vis_f,island,island,X1,X2,0.002,0.002,0.0002,0.0002,0.01,5,5.000e+05,0,0,2.75,2e6,-2253,8.65e4"
            .to_string(),
    );
    lines.push("node,X1,0,,".to_string());
    lines.push("node,X2,0,,".to_string());
    replace(&mut set, "arterial.csv", lines.join("\n"));

    let report = validate_source(&set, &ValidatorOptions::default());
    let disconnected: Vec<&Finding> = report.of_kind(FindingKind::DisconnectedNetwork).collect();
    assert_eq!(disconnected.len(), 1);
    assert_eq!(disconnected[0].subject, "X1");
    assert_eq!(disconnected[0].severity, Severity::Fatal);
}

#[test]
fn unused_nodes_warn_unless_exempt() {
    let mut set = render(&tree_model()).unwrap();
    let main = format!("{}node,helper\n", set.get("main.csv").unwrap().content);
    replace(&mut set, "main.csv", main);

    let report = validate_source(&set, &ValidatorOptions::default());
    assert_eq!(report.count(FindingKind::UnusedDeclaredNode), 1);
    assert!(report.is_solver_ready());

    let options = ValidatorOptions {
        exempt_nodes: ["helper".to_string()].into_iter().collect(),
        ..ValidatorOptions::default()
    };
    assert!(validate_source(&set, &options).findings.is_empty());
}

#[test]
fn validate_directory_after_write() {
    let dir = std::env::temp_dir().join("hn_model_validate_dir");
    let _ = std::fs::remove_dir_all(&dir);
    let set = render(&tree_model()).unwrap();
    set.write_to(&dir).unwrap();

    let report = validate_dir(&dir, &ValidatorOptions::default());
    assert!(report.is_solver_ready(), "{}", report);

    std::fs::remove_file(dir.join("arterial.csv")).unwrap();
    let report = validate_dir(&dir, &ValidatorOptions::default());
    assert_eq!(report.count(FindingKind::MissingArtifact), 1);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn regeometry_changes_only_targeted_rows() {
    let base = tree_model();
    let next = base
        .with_vessel_geometry(&[GeometryOverride::new("left").diameter(mm(2.0))])
        .unwrap();
    let a = render(&base).unwrap();
    let b = render(&next).unwrap();
    assert_eq!(a.get("main.csv"), b.get("main.csv"));
    assert_eq!(a.get("p1.csv"), b.get("p1.csv"));
    assert_ne!(a.get("arterial.csv"), b.get("arterial.csv"));
}
