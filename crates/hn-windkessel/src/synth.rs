//! Boundary circuit synthesizer.

use std::sync::Arc;

use hn_anatomy::Vessel;
use hn_graph::VesselGraph;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::circuit::{BoundaryCircuit, CircuitKind, CircuitNaming};
use crate::classify::{CoronaryNameHeuristic, OutletContext, TerminationClassifier};
use crate::error::WindkesselResult;
use crate::params::WindkesselParams;
use crate::physics::OutletGeometry;

/// Derives one Windkessel termination per outlet node.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    params: WindkesselParams,
    naming: CircuitNaming,
    classifier: Arc<dyn TerminationClassifier>,
}

impl Synthesizer {
    /// Validates the parameter set and naming once, up front.
    pub fn new(
        params: WindkesselParams,
        naming: CircuitNaming,
        classifier: Arc<dyn TerminationClassifier>,
    ) -> WindkesselResult<Self> {
        params.check()?;
        naming.check()?;
        Ok(Self {
            params,
            naming,
            classifier,
        })
    }

    pub fn params(&self) -> &WindkesselParams {
        &self.params
    }

    pub fn naming(&self) -> &CircuitNaming {
        &self.naming
    }

    /// Circuits for `outlets`, ids `<prefix>1..` in sorted outlet order.
    ///
    /// Outlets are independent, so they are computed in parallel; the result
    /// is sorted by outlet name before returning.
    pub fn synthesize(&self, graph: &VesselGraph, outlets: &[String]) -> Vec<BoundaryCircuit> {
        let mut sorted: Vec<&String> = outlets.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut circuits: Vec<BoundaryCircuit> = sorted
            .par_iter()
            .enumerate()
            .map(|(k, outlet)| {
                let incident = graph.incident_vessels(outlet);
                self.synthesize_one(outlet, &self.naming.circuit_id(k + 1), &incident)
            })
            .collect();
        circuits.sort_by(|a, b| a.outlet.cmp(&b.outlet));

        let coronary = circuits
            .iter()
            .filter(|c| c.kind == CircuitKind::Coronary)
            .count();
        info!(
            outlets = circuits.len(),
            coronary,
            classifier = self.classifier.name(),
            "boundary circuits synthesized"
        );
        circuits
    }

    /// One circuit from the endpoints of `vessels` touching `outlet`.
    pub fn synthesize_one(&self, outlet: &str, id: &str, vessels: &[&Vessel]) -> BoundaryCircuit {
        let geometry = OutletGeometry::average(outlet, vessels.iter().copied(), &self.params);
        let values = geometry.values(&self.params);
        let kind = self.classifier.classify(&OutletContext {
            outlet,
            circuit_id: id,
            interface: &self.naming.interface,
            vessels,
        });
        let p0 = self.params.initial_pressure.value;
        let circuit = match kind {
            CircuitKind::Systemic => self.naming.systemic(id, &values, p0),
            CircuitKind::Coronary => self.naming.coronary(id, &values, p0),
        };

        debug!(
            outlet = %outlet,
            circuit = %id,
            kind = ?kind,
            radius_m = geometry.radius.value,
            length_m = geometry.length.value,
            r_total = values.r_total(),
            "boundary circuit"
        );

        BoundaryCircuit {
            outlet: outlet.to_string(),
            kind,
            geometry,
            values,
            circuit,
        }
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self {
            params: WindkesselParams::default(),
            naming: CircuitNaming::default(),
            classifier: Arc::new(CoronaryNameHeuristic::default()),
        }
    }
}
