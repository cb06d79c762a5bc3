//! Integration tests for hn-graph.

use std::collections::HashMap;

use hn_anatomy::{GeometrySource, Material, Vessel, VesselKind};
use hn_core::units::mm;
use hn_graph::{
    AnatomicalInlet, FixedInlet, GraphBuilder, GraphError, InletRule, NodeRole, partition,
};
use proptest::prelude::*;

fn vessel(id: &str, name: &str, start: &str, end: &str, diameter_mm: f64) -> Vessel {
    Vessel {
        id: id.into(),
        name: name.into(),
        start_node: start.into(),
        end_node: end.into(),
        start_diameter: mm(diameter_mm),
        end_diameter: mm(diameter_mm),
        start_thickness: mm(0.1 * diameter_mm),
        end_thickness: mm(0.1 * diameter_mm),
        length: mm(10.0),
        divisions: 5,
        material: Material::default(),
        kind: VesselKind::Anatomical,
        source: GeometrySource::Measured,
    }
}

#[test]
fn connector_joins_two_subtrees() {
    // Anterior: A1 - A2 - A3, posterior: P1 - P2.
    let anatomical = vec![
        vessel("a1", "anterior 1", "A1", "A2", 3.0),
        vessel("a2", "anterior 2", "A2", "A3", 2.0),
        vessel("p1", "posterior 1", "P1", "P2", 2.5),
    ];

    let mut split = GraphBuilder::new();
    split.add_vessels(anatomical.clone());
    let split = split.build().unwrap();
    assert_eq!(split.component_count(), 2);
    assert!(matches!(
        split.ensure_connected(),
        Err(GraphError::Disconnected { components: 2, .. })
    ));

    let mut joined = GraphBuilder::new();
    joined
        .add_vessels(anatomical)
        .add_vessel(vessel("conn", "connector", "A2", "P1", 1.0));
    let joined = joined.build().unwrap();
    assert_eq!(joined.component_count(), 1);
    assert!(joined.ensure_connected().is_ok());
}

#[test]
fn empty_network_is_rejected() {
    let graph = GraphBuilder::new().build().unwrap();
    assert_eq!(graph.ensure_connected(), Err(GraphError::EmptyNetwork));
}

#[test]
fn path_partition_with_fixed_inlet() {
    let mut builder = GraphBuilder::new();
    builder.add_vessels([
        vessel("AB", "AB", "A", "B", 3.0),
        vessel("BC", "BC", "B", "C", 2.0),
    ]);
    let graph = builder.build().unwrap();

    let split = partition(&graph, &FixedInlet::new("A")).unwrap();
    assert_eq!(split.inlet.node, "A");
    assert_eq!(split.inlet.rule, InletRule::Fixed);
    assert!(split.inlet.terminal);
    assert_eq!(split.outlets, vec!["C".to_string()]);
    assert_eq!(graph.role("B"), Some(NodeRole::Interior));
}

#[test]
fn absent_inlet_is_fatal() {
    let mut builder = GraphBuilder::new();
    builder.add_vessel(vessel("AB", "AB", "A", "B", 3.0));
    let graph = builder.build().unwrap();
    assert!(matches!(
        partition(&graph, &FixedInlet::new("Z")),
        Err(GraphError::InvalidInletSelection { .. })
    ));
}

#[test]
fn non_terminal_inlet_is_flagged_but_used() {
    let mut builder = GraphBuilder::new();
    builder.add_vessels([
        vessel("AB", "AB", "A", "B", 3.0),
        vessel("BC", "BC", "B", "C", 2.0),
    ]);
    let graph = builder.build().unwrap();
    let split = partition(&graph, &FixedInlet::new("B")).unwrap();
    assert!(!split.inlet.terminal);
    assert_eq!(split.outlets, vec!["A".to_string(), "C".to_string()]);
}

#[test]
fn anatomical_tiers_in_order() {
    let base = vec![
        vessel("v1", "R-VA", "V0", "J", 3.0),
        vessel("v2", "R-ICA", "I0", "J", 4.0),
        vessel("v3", "Basilar", "J", "T", 6.0),
    ];

    let mut builder = GraphBuilder::new();
    builder.add_vessels(base.clone());
    let graph = builder.build().unwrap();
    let choice = partition(&graph, &AnatomicalInlet::default()).unwrap();
    assert_eq!(choice.inlet.rule, InletRule::InternalCarotid);
    assert_eq!(choice.inlet.node, "I0");

    let mut builder = GraphBuilder::new();
    builder
        .add_vessels(base)
        .add_vessel(vessel("v4", "Left Common Carotid", "C0", "I0", 5.0));
    let graph = builder.build().unwrap();
    let choice = partition(&graph, &AnatomicalInlet::default()).unwrap();
    assert_eq!(choice.inlet.rule, InletRule::Extracranial);
    assert_eq!(choice.inlet.node, "C0");
    assert_eq!(choice.inlet.vessel.as_deref(), Some("v4"));
}

#[test]
fn largest_diameter_fallback_is_deterministic() {
    let mut builder = GraphBuilder::new();
    builder.add_vessels([
        vessel("x", "seg x", "X0", "J", 2.0),
        vessel("y", "seg y", "Y0", "J", 4.0),
        vessel("z", "seg z", "Z0", "J", 4.0),
    ]);
    let graph = builder.build().unwrap();
    for _ in 0..3 {
        let split = partition(&graph, &AnatomicalInlet::default()).unwrap();
        assert_eq!(split.inlet.rule, InletRule::LargestDiameter);
        assert_eq!(split.inlet.node, "Y0");
        assert_eq!(split.outlets, vec!["X0".to_string(), "Z0".to_string()]);
    }
}

fn edges_strategy() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..12, 0u8..12), 1..40)
        .prop_map(|edges| edges.into_iter().filter(|(a, b)| a != b).collect())
}

proptest! {
    #[test]
    fn degree_equals_endpoint_count(edges in edges_strategy()) {
        let vessels: Vec<Vessel> = edges
            .iter()
            .enumerate()
            .map(|(k, (a, b))| vessel(&format!("v{k}"), "seg", &format!("N{a}"), &format!("N{b}"), 2.0))
            .collect();

        let mut expected: HashMap<String, usize> = HashMap::new();
        for v in &vessels {
            *expected.entry(v.start_node.clone()).or_default() += 1;
            *expected.entry(v.end_node.clone()).or_default() += 1;
        }

        let mut builder = GraphBuilder::new();
        builder.add_vessels(vessels);
        let graph = builder.build().unwrap();

        prop_assert_eq!(graph.node_count(), expected.len());
        for (node, count) in &expected {
            prop_assert_eq!(graph.degree(node), Some(*count));
        }
        let terminals: Vec<&str> = graph.terminal_nodes();
        for node in terminals {
            prop_assert_eq!(expected[node], 1);
        }
    }

    #[test]
    fn outlets_are_terminals_minus_inlet(edges in edges_strategy()) {
        prop_assume!(!edges.is_empty());
        let vessels: Vec<Vessel> = edges
            .iter()
            .enumerate()
            .map(|(k, (a, b))| vessel(&format!("v{k}"), "seg", &format!("N{a}"), &format!("N{b}"), 1.0 + k as f64))
            .collect();
        let mut builder = GraphBuilder::new();
        builder.add_vessels(vessels);
        let graph = builder.build().unwrap();

        let split = partition(&graph, &AnatomicalInlet::default()).unwrap();
        prop_assert!(graph.contains_node(&split.inlet.node));

        let mut rest: Vec<String> = graph
            .terminal_nodes()
            .into_iter()
            .filter(|n| *n != split.inlet.node)
            .map(str::to_string)
            .collect();
        rest.sort();
        prop_assert_eq!(rest, split.outlets);
    }
}
