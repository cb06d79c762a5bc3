//! Lumped (0D) circuit model shared by boundary circuits and the heart.

use std::collections::BTreeSet;

use hn_core::Real;
use serde::{Deserialize, Serialize};

use crate::error::{WindkesselError, WindkesselResult};
use crate::physics::{OutletGeometry, WindkesselValues};

/// Element type tag as understood by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Resistor,
    Capacitor,
    Inductor,
    ResistorCoronary,
    CapacitorCoronary,
    Voltage,
    Diode,
    Elastance,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Resistor => "resistor",
            EdgeKind::Capacitor => "capacitor",
            EdgeKind::Inductor => "inductor",
            EdgeKind::ResistorCoronary => "resistor_coronary",
            EdgeKind::CapacitorCoronary => "capacitor_coronary",
            EdgeKind::Voltage => "voltage",
            EdgeKind::Diode => "diode",
            EdgeKind::Elastance => "elastance",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Some(match tag {
            "resistor" => EdgeKind::Resistor,
            "capacitor" => EdgeKind::Capacitor,
            "inductor" => EdgeKind::Inductor,
            "resistor_coronary" => EdgeKind::ResistorCoronary,
            "capacitor_coronary" => EdgeKind::CapacitorCoronary,
            "voltage" => EdgeKind::Voltage,
            "diode" => EdgeKind::Diode,
            "elastance" => EdgeKind::Elastance,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Node,
    Ground,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Node => "node",
            NodeKind::Ground => "ground",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "node" => Some(NodeKind::Node),
            "ground" => Some(NodeKind::Ground),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircuitEdge {
    pub kind: EdgeKind,
    pub name: String,
    pub start: String,
    pub end: String,
    pub initial: Real,
    /// One value for most elements; elastance carries two.
    pub parameters: Vec<Real>,
}

impl CircuitEdge {
    pub fn new(kind: EdgeKind, name: &str, start: &str, end: &str, parameters: &[Real]) -> Self {
        Self {
            kind,
            name: name.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            initial: 0.0,
            parameters: parameters.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircuitNode {
    pub kind: NodeKind,
    pub name: String,
    /// Initial pressure, Pa.
    pub initial: Real,
}

impl CircuitNode {
    pub fn node(name: &str, initial: Real) -> Self {
        Self {
            kind: NodeKind::Node,
            name: name.to_string(),
            initial,
        }
    }

    pub fn ground(name: &str, initial: Real) -> Self {
        Self {
            kind: NodeKind::Ground,
            name: name.to_string(),
            initial,
        }
    }
}

/// A named 0D sub-model with one interface node coupled to the network.
#[derive(Debug, Clone, PartialEq)]
pub struct LumpedCircuit {
    pub id: String,
    /// Local node name coupled to the 1D network.
    pub interface: String,
    pub edges: Vec<CircuitEdge>,
    pub nodes: Vec<CircuitNode>,
}

impl LumpedCircuit {
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.name.as_str())
    }

    pub fn declares(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name == name)
    }

    /// Largest parameter count over all edges (at least one).
    pub fn parameter_columns(&self) -> usize {
        self.edges
            .iter()
            .map(|e| e.parameters.len())
            .max()
            .unwrap_or(1)
            .max(1)
    }

    /// Interface declared, node names unique, every edge endpoint declared.
    pub fn check(&self) -> WindkesselResult<()> {
        let mut seen = BTreeSet::new();
        for node in &self.nodes {
            if !seen.insert(node.name.as_str()) {
                return Err(WindkesselError::NamingCollision {
                    what: format!("circuit '{}' declares node '{}' twice", self.id, node.name),
                });
            }
        }
        if !seen.contains(self.interface.as_str()) {
            return Err(WindkesselError::NamingCollision {
                what: format!(
                    "circuit '{}' does not declare its interface node '{}'",
                    self.id, self.interface
                ),
            });
        }
        for edge in &self.edges {
            for end in [&edge.start, &edge.end] {
                if !seen.contains(end.as_str()) {
                    return Err(WindkesselError::NamingCollision {
                        what: format!(
                            "edge '{}' of circuit '{}' uses undeclared node '{}'",
                            edge.name, self.id, end
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Boundary circuit topology variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitKind {
    /// Proximal resistor, then distal resistor, capacitor and inductor to ground.
    Systemic,
    /// Two resistors and a capacitor, no inertance.
    Coronary,
}

/// Identifiers used when minting boundary circuits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitNaming {
    /// Circuit ids are `<prefix><k>`, k starting at 1.
    pub prefix: String,
    pub interface: String,
    pub systemic_mid: String,
    pub coronary_mid: String,
    pub ground: String,
}

impl Default for CircuitNaming {
    fn default() -> Self {
        Self {
            prefix: "p".to_string(),
            interface: "n1".to_string(),
            systemic_mid: "P1".to_string(),
            coronary_mid: "n2".to_string(),
            ground: "g".to_string(),
        }
    }
}

impl CircuitNaming {
    pub fn circuit_id(&self, k: usize) -> String {
        format!("{}{}", self.prefix, k)
    }

    pub fn check(&self) -> WindkesselResult<()> {
        let names = [
            &self.interface,
            &self.systemic_mid,
            &self.coronary_mid,
            &self.ground,
        ];
        if names.iter().any(|n| n.trim().is_empty()) || self.prefix.trim().is_empty() {
            return Err(WindkesselError::NamingCollision {
                what: "circuit names must not be empty".to_string(),
            });
        }
        let unique: BTreeSet<&String> = [&self.interface, &self.systemic_mid, &self.ground]
            .into_iter()
            .collect();
        let unique_cor: BTreeSet<&String> = [&self.interface, &self.coronary_mid, &self.ground]
            .into_iter()
            .collect();
        if unique.len() != 3 || unique_cor.len() != 3 {
            return Err(WindkesselError::NamingCollision {
                what: "interface, intermediate and ground nodes must differ".to_string(),
            });
        }
        Ok(())
    }

    pub fn systemic(&self, id: &str, v: &WindkesselValues, p0: Real) -> LumpedCircuit {
        let (iface, mid, g) = (&self.interface, &self.systemic_mid, &self.ground);
        LumpedCircuit {
            id: id.to_string(),
            interface: iface.clone(),
            edges: vec![
                CircuitEdge::new(EdgeKind::Resistor, "R0", iface, mid, &[v.r_proximal]),
                CircuitEdge::new(EdgeKind::Resistor, "R2", mid, g, &[v.r_distal]),
                CircuitEdge::new(EdgeKind::Capacitor, "C1", mid, g, &[v.compliance]),
                CircuitEdge::new(EdgeKind::Inductor, "L1", mid, g, &[v.inertance]),
            ],
            nodes: vec![
                CircuitNode::node(iface, p0),
                CircuitNode::node(mid, p0),
                CircuitNode::ground(g, p0),
            ],
        }
    }

    pub fn coronary(&self, id: &str, v: &WindkesselValues, p0: Real) -> LumpedCircuit {
        let (iface, mid, g) = (&self.interface, &self.coronary_mid, &self.ground);
        LumpedCircuit {
            id: id.to_string(),
            interface: iface.clone(),
            edges: vec![
                CircuitEdge::new(EdgeKind::ResistorCoronary, "R1", iface, mid, &[v.r_proximal]),
                CircuitEdge::new(EdgeKind::ResistorCoronary, "R2", mid, g, &[v.r_distal]),
                CircuitEdge::new(EdgeKind::CapacitorCoronary, "C", mid, g, &[v.compliance]),
            ],
            nodes: vec![
                CircuitNode::node(iface, p0),
                CircuitNode::node(mid, p0),
                CircuitNode::ground(g, p0),
            ],
        }
    }
}

/// Windkessel termination of one outlet node.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCircuit {
    /// Network node the circuit terminates.
    pub outlet: String,
    pub kind: CircuitKind,
    pub geometry: OutletGeometry,
    pub values: WindkesselValues,
    pub circuit: LumpedCircuit,
}

impl BoundaryCircuit {
    pub fn id(&self) -> &str {
        &self.circuit.id
    }

    pub fn interface(&self) -> &str {
        &self.circuit.interface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> WindkesselValues {
        WindkesselValues {
            r_proximal: 3.0e8,
            r_distal: 7.0e8,
            compliance: 1.0e-10,
            inertance: 2.0e6,
        }
    }

    #[test]
    fn systemic_topology() {
        let c = CircuitNaming::default().systemic("p1", &values(), 1.0e5);
        assert!(c.check().is_ok());
        assert_eq!(c.interface, "n1");
        assert_eq!(c.edges.len(), 4);
        assert_eq!(c.edges[0].start, "n1");
        assert_eq!(c.edges[0].end, "P1");
        assert!(c.edges[1..].iter().all(|e| e.start == "P1" && e.end == "g"));
        assert_eq!(c.node_names().collect::<Vec<_>>(), vec!["n1", "P1", "g"]);
    }

    #[test]
    fn coronary_has_no_inductor() {
        let c = CircuitNaming::default().coronary("p2", &values(), 1.0e5);
        assert!(c.check().is_ok());
        assert_eq!(c.edges.len(), 3);
        assert!(c.edges.iter().all(|e| e.kind != EdgeKind::Inductor));
        assert!(c.declares("n2"));
    }

    #[test]
    fn naming_rejects_collisions() {
        let naming = CircuitNaming {
            systemic_mid: "n1".into(),
            ..CircuitNaming::default()
        };
        assert!(naming.check().is_err());
    }

    #[test]
    fn undeclared_edge_node_is_caught() {
        let mut c = CircuitNaming::default().systemic("p1", &values(), 1.0e5);
        c.edges[1].end = "gx".into();
        assert!(c.check().is_err());
    }

    #[test]
    fn edge_tags_roundtrip() {
        for kind in [
            EdgeKind::Resistor,
            EdgeKind::Capacitor,
            EdgeKind::Inductor,
            EdgeKind::ResistorCoronary,
            EdgeKind::CapacitorCoronary,
            EdgeKind::Voltage,
            EdgeKind::Diode,
            EdgeKind::Elastance,
        ] {
            assert_eq!(EdgeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EdgeKind::parse("transistor"), None);
    }
}
