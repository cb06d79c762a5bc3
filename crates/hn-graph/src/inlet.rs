//! Inlet selection strategies and the inlet/outlet partition.

use hn_anatomy::Vessel;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GraphError;
use crate::graph::VesselGraph;

/// Which rule designated the inlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InletRule {
    Fixed,
    Extracranial,
    InternalCarotid,
    Vertebral,
    LargestDiameter,
}

/// Raw policy output before terminal-ness is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InletChoice {
    pub node: String,
    pub rule: InletRule,
    /// Vessel whose start node was taken, for heuristic rules.
    pub vessel: Option<String>,
}

/// The designated inlet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InletSelection {
    pub node: String,
    pub rule: InletRule,
    pub vessel: Option<String>,
    /// False when the node has degree other than one. Still used.
    pub terminal: bool,
}

/// Strategy that designates the single inlet node of a graph.
pub trait InletPolicy: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    fn choose(&self, graph: &VesselGraph) -> Result<InletChoice, GraphError>;
}

/// Explicitly configured inlet node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedInlet {
    pub node: String,
}

impl FixedInlet {
    pub fn new(node: impl Into<String>) -> Self {
        Self { node: node.into() }
    }
}

impl InletPolicy for FixedInlet {
    fn name(&self) -> &str {
        "fixed"
    }

    fn choose(&self, graph: &VesselGraph) -> Result<InletChoice, GraphError> {
        if !graph.contains_node(&self.node) {
            return Err(GraphError::InvalidInletSelection {
                node: Some(self.node.clone()),
                reason: "node does not appear in any vessel".to_string(),
            });
        }
        Ok(InletChoice {
            node: self.node.clone(),
            rule: InletRule::Fixed,
            vessel: None,
        })
    }
}

/// One tier of the anatomical naming heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InletTier {
    pub rule: InletRule,
    pub keywords: Vec<String>,
}

impl InletTier {
    pub fn new(rule: InletRule, keywords: &[&str]) -> Self {
        Self {
            rule,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered name heuristic; the first tier with a matching vessel wins,
/// otherwise the start node of the widest vessel is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnatomicalInlet {
    pub tiers: Vec<InletTier>,
}

impl Default for AnatomicalInlet {
    fn default() -> Self {
        Self {
            tiers: vec![
                InletTier::new(
                    InletRule::Extracranial,
                    &["extracranial", "common carotid", "cca"],
                ),
                InletTier::new(InletRule::InternalCarotid, &["internal carotid", "ica"]),
                InletTier::new(InletRule::Vertebral, &["vertebral", "va"]),
            ],
        }
    }
}

impl AnatomicalInlet {
    pub fn with_tiers(tiers: Vec<InletTier>) -> Self {
        Self { tiers }
    }
}

impl InletPolicy for AnatomicalInlet {
    fn name(&self) -> &str {
        "anatomical"
    }

    fn choose(&self, graph: &VesselGraph) -> Result<InletChoice, GraphError> {
        let vessels = graph.vessels();

        for tier in &self.tiers {
            let hit = vessels.iter().find(|v| {
                tier.keywords
                    .iter()
                    .any(|k| name_matches(&v.name, k) || name_matches(&v.id, k))
            });
            if let Some(v) = hit {
                debug!(rule = ?tier.rule, vessel = %v.id, "inlet matched by name");
                return Ok(choice(v, tier.rule));
            }
        }

        let mut widest: Option<&Vessel> = None;
        for v in vessels {
            match widest {
                Some(w) if v.start_diameter <= w.start_diameter => {}
                _ => widest = Some(v),
            }
        }
        widest
            .map(|v| choice(v, InletRule::LargestDiameter))
            .ok_or_else(|| GraphError::InvalidInletSelection {
                node: None,
                reason: "vessel set is empty".to_string(),
            })
    }
}

fn choice(vessel: &Vessel, rule: InletRule) -> InletChoice {
    InletChoice {
        node: vessel.start_node.clone(),
        rule,
        vessel: Some(vessel.id.clone()),
    }
}

/// Case-insensitive keyword match.
///
/// Short single-word keywords (`cca`, `va`) must equal a whole token of the
/// name, so `va` does not fire on `valve`. Longer keywords match as substrings.
pub fn name_matches(name: &str, keyword: &str) -> bool {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return false;
    }
    let name = name.to_lowercase();
    if keyword.len() <= 3 && !keyword.contains(' ') {
        name.split(|c: char| !c.is_alphanumeric())
            .any(|token| token == keyword)
    } else {
        name.contains(&keyword)
    }
}

/// Inlet plus every other terminal node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub inlet: InletSelection,
    /// Sorted.
    pub outlets: Vec<String>,
}

/// Apply `policy` and split the terminal nodes into inlet and outlets.
pub fn partition(graph: &VesselGraph, policy: &dyn InletPolicy) -> Result<Partition, GraphError> {
    let choice = policy.choose(graph)?;
    if !graph.contains_node(&choice.node) {
        return Err(GraphError::InvalidInletSelection {
            node: Some(choice.node),
            reason: "node does not appear in any vessel".to_string(),
        });
    }

    let degree = graph.degree(&choice.node).unwrap_or(0);
    let terminal = degree == 1;
    if !terminal {
        warn!(
            node = %choice.node,
            degree,
            policy = policy.name(),
            "inlet node is not terminal; using it anyway"
        );
    }

    let outlets: Vec<String> = graph
        .terminal_nodes()
        .into_iter()
        .filter(|n| *n != choice.node)
        .map(str::to_string)
        .collect();

    debug!(inlet = %choice.node, outlets = outlets.len(), "inlet/outlet partition");

    Ok(Partition {
        inlet: InletSelection {
            node: choice.node,
            rule: choice.rule,
            vessel: choice.vessel,
            terminal,
        },
        outlets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_keywords_are_token_exact() {
        assert!(name_matches("R-ICA", "ica"));
        assert!(name_matches("L VA", "va"));
        assert!(!name_matches("valve", "va"));
        assert!(!name_matches("Pica", "ica"));
    }

    #[test]
    fn long_keywords_are_substrings() {
        assert!(name_matches("Left Common Carotid Artery", "common carotid"));
        assert!(name_matches("vertebral_L", "vertebral"));
        assert!(!name_matches("basilar", "vertebral"));
    }

    #[test]
    fn empty_keyword_never_matches() {
        assert!(!name_matches("anything", "  "));
    }
}
