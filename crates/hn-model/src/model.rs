//! The model aggregate: vessels, nodes, inlet coupling and outlet circuits.
//!
//! A `Model` is validated once on construction and never patched in place.
//! Re-geometry of a subset of vessels goes through
//! [`Model::with_vessel_geometry`], which returns a new model.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use hn_anatomy::Vessel;
use hn_core::units::Length;
use hn_graph::InletSelection;
use hn_windkessel::{BoundaryCircuit, LumpedCircuit};
use serde::{Deserialize, Serialize};

use crate::format::fixed;
use crate::{ModelError, ModelResult};

/// Run-level block of the topology artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub direction: String,
    pub duration_s: f64,
    pub material: String,
    pub solver: String,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            direction: "forward".to_string(),
            duration_s: 10.0,
            material: "linear".to_string(),
            solver: "maccormack".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceRole {
    Inlet,
    Outlet,
}

/// One coupling-table row: network node to a circuit's local node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub role: InterfaceRole,
    pub circuit: String,
    pub network_node: String,
    pub local_node: String,
}

/// Replacement geometry for one vessel; `None` keeps the baseline value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryOverride {
    pub id: String,
    pub start_diameter: Option<Length>,
    pub end_diameter: Option<Length>,
    pub start_thickness: Option<Length>,
    pub end_thickness: Option<Length>,
    pub length: Option<Length>,
    pub divisions: Option<u32>,
}

impl GeometryOverride {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Same diameter at both ends.
    pub fn diameter(mut self, d: Length) -> Self {
        self.start_diameter = Some(d);
        self.end_diameter = Some(d);
        self
    }

    pub fn length(mut self, l: Length) -> Self {
        self.length = Some(l);
        self
    }

    /// Every replacement value must be positive and survive the six-decimal
    /// geometry format.
    pub fn check(&self) -> ModelResult<()> {
        let lengths = [
            ("start diameter", self.start_diameter),
            ("end diameter", self.end_diameter),
            ("start thickness", self.start_thickness),
            ("end thickness", self.end_thickness),
            ("length", self.length),
        ];
        for (what, value) in lengths {
            let Some(value) = value else { continue };
            let written = fixed(value.value).parse::<f64>().unwrap_or(0.0);
            if !(written > 0.0) {
                return Err(ModelError::InvalidOverride {
                    id: self.id.clone(),
                    reason: format!("{} {} m is not a positive geometry value", what, value.value),
                });
            }
        }
        if self.divisions == Some(0) {
            return Err(ModelError::InvalidOverride {
                id: self.id.clone(),
                reason: "zero division points".to_string(),
            });
        }
        Ok(())
    }

    fn apply(&self, v: &mut Vessel) {
        if let Some(d) = self.start_diameter {
            v.start_diameter = d;
        }
        if let Some(d) = self.end_diameter {
            v.end_diameter = d;
        }
        if let Some(t) = self.start_thickness {
            v.start_thickness = t;
        }
        if let Some(t) = self.end_thickness {
            v.end_thickness = t;
        }
        if let Some(l) = self.length {
            v.length = l;
        }
        if let Some(n) = self.divisions {
            v.divisions = n;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    network_id: String,
    /// Sorted by id.
    vessels: Vec<Vessel>,
    /// Sorted, unique.
    nodes: Vec<String>,
    inlet: InletSelection,
    heart: LumpedCircuit,
    /// Sorted by outlet node.
    outlets: Vec<BoundaryCircuit>,
    run: RunSettings,
}

impl Model {
    /// Assemble and validate a model.
    ///
    /// Fails on duplicate vessel or circuit ids, an inlet that is not a
    /// network node, a circuit that is not self-consistent, or a circuit
    /// node name equal to a network node name.
    pub fn new(
        network_id: impl Into<String>,
        mut vessels: Vec<Vessel>,
        inlet: InletSelection,
        heart: LumpedCircuit,
        mut outlets: Vec<BoundaryCircuit>,
        run: RunSettings,
    ) -> ModelResult<Self> {
        let network_id = network_id.into();
        vessels.sort_by(|a, b| a.id.cmp(&b.id));
        outlets.sort_by(|a, b| a.outlet.cmp(&b.outlet));

        ensure_csv_safe("network", &network_id)?;
        let mut ids = HashSet::new();
        for v in &vessels {
            ensure_csv_safe("vessel", &v.id)?;
            ensure_csv_safe("node", &v.start_node)?;
            ensure_csv_safe("node", &v.end_node)?;
            if !v.name.is_empty() {
                ensure_csv_safe("vessel name", v.name.trim())?;
            }
            if !ids.insert(v.id.as_str()) {
                return Err(ModelError::DuplicateIdentifier {
                    kind: "vessel",
                    id: v.id.clone(),
                });
            }
            v.check().map_err(|e| ModelError::InvalidVessel {
                id: v.id.clone(),
                reason: e.to_string(),
            })?;
        }

        let nodes: Vec<String> = vessels
            .iter()
            .flat_map(|v| [v.start_node.clone(), v.end_node.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if nodes.binary_search(&inlet.node).is_err() {
            return Err(ModelError::UnknownInlet {
                node: inlet.node.clone(),
            });
        }

        let mut circuit_ids: HashSet<&str> = HashSet::new();
        circuit_ids.insert(network_id.as_str());
        let mut outlet_nodes: HashSet<&str> = HashSet::new();
        let circuits = std::iter::once(&heart).chain(outlets.iter().map(|c| &c.circuit));
        for circuit in circuits {
            ensure_csv_safe("circuit", &circuit.id)?;
            if !circuit_ids.insert(circuit.id.as_str()) {
                return Err(ModelError::DuplicateIdentifier {
                    kind: "circuit",
                    id: circuit.id.clone(),
                });
            }
            circuit.check()?;
            if let Some(node) = circuit
                .node_names()
                .find(|n| nodes.binary_search_by(|x| x.as_str().cmp(n)).is_ok())
            {
                return Err(ModelError::CircuitNodeShadowsNetwork {
                    circuit: circuit.id.clone(),
                    node: node.to_string(),
                });
            }
        }
        for c in &outlets {
            if !outlet_nodes.insert(c.outlet.as_str()) {
                return Err(ModelError::DuplicateIdentifier {
                    kind: "outlet",
                    id: c.outlet.clone(),
                });
            }
            if nodes.binary_search(&c.outlet).is_err() {
                return Err(ModelError::InvalidVessel {
                    id: c.circuit.id.clone(),
                    reason: format!("outlet node '{}' is not a network node", c.outlet),
                });
            }
        }

        Ok(Self {
            network_id,
            vessels,
            nodes,
            inlet,
            heart,
            outlets,
            run,
        })
    }

    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    pub fn vessels(&self) -> &[Vessel] {
        &self.vessels
    }

    pub fn vessel(&self, id: &str) -> Option<&Vessel> {
        self.vessels
            .binary_search_by(|v| v.id.as_str().cmp(id))
            .ok()
            .map(|i| &self.vessels[i])
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn inlet(&self) -> &InletSelection {
        &self.inlet
    }

    pub fn heart(&self) -> &LumpedCircuit {
        &self.heart
    }

    pub fn outlets(&self) -> &[BoundaryCircuit] {
        &self.outlets
    }

    pub fn run(&self) -> &RunSettings {
        &self.run
    }

    /// Heart first, then outlet circuits.
    pub fn circuits(&self) -> impl Iterator<Item = &LumpedCircuit> {
        std::iter::once(&self.heart).chain(self.outlets.iter().map(|c| &c.circuit))
    }

    /// Inlet row, then one row per outlet.
    pub fn coupling_table(&self) -> Vec<Interface> {
        let mut rows = Vec::with_capacity(self.outlets.len() + 1);
        rows.push(Interface {
            role: InterfaceRole::Inlet,
            circuit: self.heart.id.clone(),
            network_node: self.inlet.node.clone(),
            local_node: self.heart.interface.clone(),
        });
        rows.extend(self.outlets.iter().map(|c| Interface {
            role: InterfaceRole::Outlet,
            circuit: c.circuit.id.clone(),
            network_node: c.outlet.clone(),
            local_node: c.circuit.interface.clone(),
        }));
        rows
    }

    /// New model with selected vessels' geometry replaced.
    ///
    /// Boundary circuits are carried over from the baseline unchanged.
    pub fn with_vessel_geometry(&self, overrides: &[GeometryOverride]) -> ModelResult<Model> {
        let mut by_id: BTreeMap<&str, &GeometryOverride> = BTreeMap::new();
        for o in overrides {
            o.check()?;
            if self.vessel(&o.id).is_none() {
                return Err(ModelError::UnknownVessel { id: o.id.clone() });
            }
            if by_id.insert(o.id.as_str(), o).is_some() {
                return Err(ModelError::DuplicateIdentifier {
                    kind: "override",
                    id: o.id.clone(),
                });
            }
        }

        let mut next = self.clone();
        for v in &mut next.vessels {
            if let Some(o) = by_id.get(v.id.as_str()) {
                o.apply(v);
                v.check().map_err(|e| ModelError::InvalidOverride {
                    id: v.id.clone(),
                    reason: e.to_string(),
                })?;
            }
        }
        Ok(next)
    }
}

/// Identifiers are written unquoted into comma-separated rows and read back
/// trimmed, so they must be non-empty and free of delimiters, quotes, line
/// breaks and surrounding whitespace.
fn ensure_csv_safe(kind: &'static str, id: &str) -> ModelResult<()> {
    let unsafe_char = id.chars().any(|c| matches!(c, ',' | '"') || c.is_control());
    if id.is_empty() || unsafe_char || id.trim() != id {
        return Err(ModelError::UnsafeIdentifier {
            kind,
            id: id.to_string(),
        });
    }
    Ok(())
}
