//! Graph builder for incremental construction.

use std::collections::HashSet;

use hn_anatomy::Vessel;
use tracing::debug;

use crate::error::GraphError;
use crate::graph::VesselGraph;
use crate::indexing::NodeIndex;

/// Collects vessels and validates them into an immutable [`VesselGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    vessels: Vec<Vessel>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vessel(&mut self, vessel: Vessel) -> &mut Self {
        self.vessels.push(vessel);
        self
    }

    pub fn add_vessels<I>(&mut self, vessels: I) -> &mut Self
    where
        I: IntoIterator<Item = Vessel>,
    {
        self.vessels.extend(vessels);
        self
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    /// Validate every vessel, then index nodes and count degrees.
    ///
    /// Connectivity is not enforced here; see [`VesselGraph::ensure_connected`].
    pub fn build(self) -> Result<VesselGraph, GraphError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for vessel in &self.vessels {
            if !seen.insert(vessel.id.as_str()) {
                return Err(GraphError::DuplicateVessel {
                    id: vessel.id.clone(),
                });
            }
            if vessel.start_node == vessel.end_node {
                return Err(GraphError::SelfLoop {
                    vessel: vessel.id.clone(),
                    node: vessel.start_node.clone(),
                });
            }
            vessel.check().map_err(|e| GraphError::InvalidVessel {
                id: vessel.id.clone(),
                reason: e.to_string(),
            })?;
        }

        let index = NodeIndex::from_vessels(&self.vessels);
        let mut degree = vec![0usize; index.len()];
        let mut incident: Vec<Vec<usize>> = vec![Vec::new(); index.len()];

        for (k, vessel) in self.vessels.iter().enumerate() {
            for node in [&vessel.start_node, &vessel.end_node] {
                let i = index.idx(node)?;
                degree[i] += 1;
                incident[i].push(k);
            }
        }

        debug!(
            vessels = self.vessels.len(),
            nodes = index.len(),
            "vessel graph built"
        );

        Ok(VesselGraph {
            vessels: self.vessels,
            index,
            degree,
            incident,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hn_anatomy::{GeometrySource, Material, VesselKind};
    use hn_core::units::mm;

    pub(crate) fn vessel(id: &str, start: &str, end: &str, diameter_mm: f64) -> Vessel {
        Vessel {
            id: id.into(),
            name: id.into(),
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
    fn builder_basic() {
        let mut builder = GraphBuilder::new();
        builder
            .add_vessel(vessel("V1", "A", "B", 3.0))
            .add_vessel(vessel("V2", "B", "C", 2.0));
        assert_eq!(builder.len(), 2);

        let graph = builder.build().unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.degree("A"), Some(1));
        assert_eq!(graph.degree("B"), Some(2));
        assert_eq!(graph.terminal_nodes(), vec!["A", "C"]);
        assert_eq!(graph.incident_vessels("B").len(), 2);
    }

    #[test]
    fn builder_rejects_duplicates() {
        let mut builder = GraphBuilder::new();
        builder.add_vessels([vessel("V1", "A", "B", 3.0), vessel("V1", "B", "C", 3.0)]);
        assert_eq!(
            builder.build().unwrap_err(),
            GraphError::DuplicateVessel { id: "V1".into() }
        );
    }

    #[test]
    fn builder_rejects_self_loop() {
        let mut builder = GraphBuilder::new();
        builder.add_vessel(vessel("V1", "A", "A", 3.0));
        assert!(matches!(
            builder.build(),
            Err(GraphError::SelfLoop { .. })
        ));
    }

    #[test]
    fn builder_rejects_degenerate_geometry() {
        let mut v = vessel("V1", "A", "B", 3.0);
        v.length = mm(0.0);
        let mut builder = GraphBuilder::new();
        builder.add_vessel(v);
        assert!(matches!(
            builder.build(),
            Err(GraphError::InvalidVessel { .. })
        ));
    }

    #[test]
    fn parallel_vessels_count_twice() {
        let mut builder = GraphBuilder::new();
        builder.add_vessels([vessel("V1", "A", "B", 3.0), vessel("V2", "A", "B", 3.0)]);
        let graph = builder.build().unwrap();
        assert_eq!(graph.degree("A"), Some(2));
        assert!(graph.terminal_nodes().is_empty());
    }
}
