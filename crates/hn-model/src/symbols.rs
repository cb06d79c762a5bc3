//! Symbol table over re-parsed artifacts.
//!
//! Node and circuit identifiers are the only links between the artifacts.
//! The table records, for every identifier, where it is used, declared and
//! coupled, so each validator check is a query instead of a re-scan.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::parse::{CircuitDoc, GeometryDoc, TopologyDoc};

/// Artifact kind that declares a network node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclSite {
    Topology,
    Geometry,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSymbol {
    /// Vessel ids with an endpoint at this node.
    pub used_by: Vec<String>,
    /// Declaration count per site.
    pub declared: BTreeMap<DeclSite, usize>,
    /// Circuits and networks coupling to this node.
    pub coupled_to: Vec<String>,
}

impl NodeSymbol {
    pub fn is_used(&self) -> bool {
        !self.used_by.is_empty()
    }

    pub fn is_declared_in(&self, site: DeclSite) -> bool {
        self.declared.get(&site).copied().unwrap_or(0) > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircuitSymbol {
    /// `(main node, model node)` per coupling row.
    pub couplings: Vec<(String, String)>,
    /// Named by a `heart` or `perif` row of the geometry artifact.
    pub declared_in_geometry: bool,
    pub is_heart: bool,
    /// Name of the artifact holding the circuit, when present.
    pub artifact: Option<String>,
    /// Local node name to declaration count.
    pub local_nodes: BTreeMap<String, usize>,
}

impl CircuitSymbol {
    pub fn declares_local(&self, node: &str) -> bool {
        self.local_nodes.contains_key(node)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    nodes: BTreeMap<String, NodeSymbol>,
    circuits: BTreeMap<String, CircuitSymbol>,
    /// Vessel id to every `(start, end)` row carrying it.
    vessels: BTreeMap<String, Vec<(String, String)>>,
    networks: BTreeSet<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_topology(&mut self, doc: &TopologyDoc) {
        for (name, _) in &doc.nodes {
            *self
                .node_mut(name)
                .declared
                .entry(DeclSite::Topology)
                .or_default() += 1;
        }
        for net in &doc.networks {
            self.networks.insert(net.name.clone());
            for (main, model) in &net.pairs {
                self.node_mut(main).coupled_to.push(net.name.clone());
                if model != main {
                    self.node_mut(model).coupled_to.push(net.name.clone());
                }
            }
        }
        for row in &doc.couplings {
            self.node_mut(&row.main_node)
                .coupled_to
                .push(row.circuit.clone());
            self.circuit_mut(&row.circuit)
                .couplings
                .push((row.main_node.clone(), row.model_node.clone()));
        }
    }

    pub fn add_geometry(&mut self, doc: &GeometryDoc) {
        for v in &doc.vessels {
            self.vessels
                .entry(v.id.clone())
                .or_default()
                .push((v.start.clone(), v.end.clone()));
            self.node_mut(&v.start).used_by.push(v.id.clone());
            self.node_mut(&v.end).used_by.push(v.id.clone());
        }
        for (name, _) in &doc.nodes {
            *self
                .node_mut(name)
                .declared
                .entry(DeclSite::Geometry)
                .or_default() += 1;
        }
        for id in &doc.hearts {
            let c = self.circuit_mut(id);
            c.declared_in_geometry = true;
            c.is_heart = true;
        }
        for id in &doc.periphery {
            self.circuit_mut(id).declared_in_geometry = true;
        }
    }

    pub fn add_circuit(&mut self, id: &str, artifact: &str, doc: &CircuitDoc) {
        let c = self.circuit_mut(id);
        c.artifact = Some(artifact.to_string());
        for node in &doc.nodes {
            *c.local_nodes.entry(node.name.clone()).or_default() += 1;
        }
    }

    fn node_mut(&mut self, name: &str) -> &mut NodeSymbol {
        self.nodes.entry(name.to_string()).or_default()
    }

    fn circuit_mut(&mut self, id: &str) -> &mut CircuitSymbol {
        self.circuits.entry(id.to_string()).or_default()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodeSymbol)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn node(&self, name: &str) -> Option<&NodeSymbol> {
        self.nodes.get(name)
    }

    pub fn circuits(&self) -> impl Iterator<Item = (&str, &CircuitSymbol)> {
        self.circuits.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn circuit(&self, id: &str) -> Option<&CircuitSymbol> {
        self.circuits.get(id)
    }

    pub fn vessels(&self) -> impl Iterator<Item = (&str, &[(String, String)])> {
        self.vessels.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn vessel_count(&self) -> usize {
        self.vessels.values().map(Vec::len).sum()
    }

    pub fn networks(&self) -> &BTreeSet<String> {
        &self.networks
    }

    /// Main node coupled to the heart circuit, or to the first coupled
    /// circuit when no heart is declared.
    pub fn inlet(&self) -> Option<&str> {
        let heart = self
            .circuits
            .values()
            .find(|c| c.is_heart && !c.couplings.is_empty());
        heart
            .or_else(|| self.circuits.values().find(|c| !c.couplings.is_empty()))
            .and_then(|c| c.couplings.first())
            .map(|(main, _)| main.as_str())
    }

    /// Nodes touched by at least one vessel, sorted.
    pub fn network_nodes(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, s)| s.is_used())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}
