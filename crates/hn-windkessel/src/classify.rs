//! Termination classifiers: which circuit topology an outlet receives.

use hn_anatomy::Vessel;
use hn_graph::name_matches;

use crate::circuit::CircuitKind;

/// What a classifier may look at for one outlet.
#[derive(Debug, Clone, Copy)]
pub struct OutletContext<'a> {
    pub outlet: &'a str,
    pub circuit_id: &'a str,
    pub interface: &'a str,
    pub vessels: &'a [&'a Vessel],
}

/// Strategy choosing the boundary circuit topology.
pub trait TerminationClassifier: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    fn classify(&self, ctx: &OutletContext<'_>) -> CircuitKind;
}

/// Every outlet gets the systemic three-element circuit.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSystemic;

impl TerminationClassifier for AlwaysSystemic {
    fn name(&self) -> &str {
        "always-systemic"
    }

    fn classify(&self, _ctx: &OutletContext<'_>) -> CircuitKind {
        CircuitKind::Systemic
    }
}

/// Coronary when the circuit id, interface node, outlet node or any incident
/// vessel name mentions one of the keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoronaryNameHeuristic {
    pub keywords: Vec<String>,
}

impl Default for CoronaryNameHeuristic {
    fn default() -> Self {
        Self {
            keywords: ["coronary", "cor", "heart"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl TerminationClassifier for CoronaryNameHeuristic {
    fn name(&self) -> &str {
        "coronary-name"
    }

    fn classify(&self, ctx: &OutletContext<'_>) -> CircuitKind {
        let labels = [ctx.circuit_id, ctx.interface, ctx.outlet]
            .into_iter()
            .chain(ctx.vessels.iter().map(|v| v.name.as_str()));
        for label in labels {
            if self.keywords.iter().any(|k| name_matches(label, k)) {
                return CircuitKind::Coronary;
            }
        }
        CircuitKind::Systemic
    }
}
