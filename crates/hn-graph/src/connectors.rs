//! Connectivity augmentation with short synthetic connector vessels.
//!
//! Raw anatomical segments often leave the network in disjoint pieces (the
//! anterior and posterior sub-trees of the Circle of Willis, for example).
//! Each [`ConnectorRule`] names two landmarks to join and the measured vessel
//! whose radius the connector borrows. Every rule either adds exactly one
//! vessel or is recorded as skipped in the [`ConnectorReport`].

use hn_anatomy::{AnatomyInput, GeometryCatalog, Vessel, VesselKind, VesselSpec};
use hn_core::units::{Length, mm};
use hn_core::Real;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Landmark lookup key: `(group, label)` in the landmark mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkRef {
    pub group: String,
    pub label: String,
}

impl LandmarkRef {
    pub fn new(group: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            label: label.into(),
        }
    }
}

impl std::fmt::Display for LandmarkRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.group, self.label)
    }
}

/// Measured segment key: `(group, vessel name)` in the feature mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRef {
    pub group: String,
    pub vessel: String,
}

impl SegmentRef {
    pub fn new(group: impl Into<String>, vessel: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            vessel: vessel.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorRule {
    /// Vessel id of the connector.
    pub id: String,
    /// Display name of the connector.
    pub name: String,
    pub from: LandmarkRef,
    pub to: LandmarkRef,
    /// Segment whose radius the connector borrows.
    pub radius_from: SegmentRef,
}

impl ConnectorRule {
    pub fn new(
        id: &str,
        name: &str,
        from: (&str, &str),
        to: (&str, &str),
        radius_from: (&str, &str),
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            from: LandmarkRef::new(from.0, from.1),
            to: LandmarkRef::new(to.0, to.1),
            radius_from: SegmentRef::new(radius_from.0, radius_from.1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorConfig {
    /// Fixed connector length, and the floor for landmark distances.
    pub length: Length,
    pub divisions: u32,
    /// Use the Euclidean landmark distance when both landmarks carry
    /// coordinates.
    pub use_landmark_distance: bool,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            length: mm(1.0),
            divisions: 1,
            use_landmark_distance: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorSkip {
    MissingLandmark(LandmarkRef),
    /// The landmark id has no usable characters.
    UnusableNodeId(LandmarkRef),
    /// Both landmarks resolve to the same node.
    IdenticalEndpoints(String),
    /// The connector id is already taken.
    DuplicateId,
}

impl std::fmt::Display for ConnectorSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectorSkip::MissingLandmark(l) => write!(f, "landmark {} not found", l),
            ConnectorSkip::UnusableNodeId(l) => write!(f, "landmark {} has an empty node id", l),
            ConnectorSkip::IdenticalEndpoints(n) => write!(f, "both ends resolve to {}", n),
            ConnectorSkip::DuplicateId => write!(f, "vessel id already in use"),
        }
    }
}

/// Audit trail of one augmentation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectorReport {
    /// Ids of connectors added, in rule order.
    pub added: Vec<String>,
    pub skipped: Vec<(String, ConnectorSkip)>,
}

impl ConnectorReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Resolve `rules` against the landmark mapping and mint connector vessels.
///
/// Connector ids colliding with catalog vessels (or earlier connectors) are
/// skipped, so the result can be appended to the catalog vessels safely.
pub fn synthesize_connectors(
    catalog: &GeometryCatalog,
    input: &AnatomyInput,
    rules: &[ConnectorRule],
    config: &ConnectorConfig,
) -> (Vec<Vessel>, ConnectorReport) {
    let prefix = &catalog.config().node_prefix;
    let mut taken: std::collections::HashSet<String> =
        catalog.vessels().iter().map(|v| v.id.clone()).collect();
    let mut vessels = Vec::new();
    let mut report = ConnectorReport::default();

    for rule in rules {
        let from = input.landmark(&rule.from.group, &rule.from.label);
        let to = input.landmark(&rule.to.group, &rule.to.label);
        let (from, to) = match (from, to) {
            (Some(f), Some(t)) => (f, t),
            (None, _) => {
                skip(&mut report, rule, ConnectorSkip::MissingLandmark(rule.from.clone()));
                continue;
            }
            (_, None) => {
                skip(&mut report, rule, ConnectorSkip::MissingLandmark(rule.to.clone()));
                continue;
            }
        };

        let (start, end) = match (from.id.to_node_id(prefix), to.id.to_node_id(prefix)) {
            (Some(s), Some(e)) => (s, e),
            (None, _) => {
                skip(&mut report, rule, ConnectorSkip::UnusableNodeId(rule.from.clone()));
                continue;
            }
            (_, None) => {
                skip(&mut report, rule, ConnectorSkip::UnusableNodeId(rule.to.clone()));
                continue;
            }
        };
        if start == end {
            skip(&mut report, rule, ConnectorSkip::IdenticalEndpoints(start));
            continue;
        }
        if taken.contains(&rule.id) {
            skip(&mut report, rule, ConnectorSkip::DuplicateId);
            continue;
        }

        let geometry = catalog.segment_geometry(&rule.radius_from.group, &rule.radius_from.vessel);
        let length = if config.use_landmark_distance {
            distance_mm(from.coords.as_deref(), to.coords.as_deref())
                .map(mm)
                .filter(|d| *d > config.length)
                .unwrap_or(config.length)
        } else {
            config.length
        };

        debug!(
            connector = %rule.id,
            start = %start,
            end = %end,
            radius_mm = hn_core::units::to_mm(geometry.radius),
            "adding connector"
        );

        let vessel = catalog.make_vessel(VesselSpec {
            id: rule.id.clone(),
            name: rule.name.clone(),
            start_node: start,
            end_node: end,
            radius: geometry.radius,
            length,
            divisions: config.divisions,
            kind: VesselKind::Connector,
            source: geometry.source,
        });
        taken.insert(rule.id.clone());
        report.added.push(rule.id.clone());
        vessels.push(vessel);
    }

    info!(
        added = report.added.len(),
        skipped = report.skipped.len(),
        "connector augmentation finished"
    );
    (vessels, report)
}

fn skip(report: &mut ConnectorReport, rule: &ConnectorRule, reason: ConnectorSkip) {
    warn!(connector = %rule.id, reason = %reason, "connector skipped");
    report.skipped.push((rule.id.clone(), reason));
}

fn distance_mm(a: Option<&[Real]>, b: Option<&[Real]>) -> Option<Real> {
    let (a, b) = (a?, b?);
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let d = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<Real>()
        .sqrt();
    d.is_finite().then_some(d)
}

/// Circle-of-Willis closure: basilar tip to both PCAs, P1 to Pcom, Pcom to
/// ICA, and ICA bifurcation to MCA and A1.
pub fn circle_of_willis_rules() -> Vec<ConnectorRule> {
    vec![
        ConnectorRule::new(
            "BA_to_RPCA",
            "BA_conn",
            ("1", "BA bifurcation"),
            ("1", "R-PCA boundary"),
            ("1", "BA"),
        ),
        ConnectorRule::new(
            "BA_to_LPCA",
            "BA_conn",
            ("1", "BA bifurcation"),
            ("1", "L-PCA boundary"),
            ("1", "BA"),
        ),
        ConnectorRule::new(
            "P1R_to_Pcom",
            "Pcom_conn",
            ("2", "Pcom bifurcation"),
            ("8", "PCA boundary"),
            ("2", "P1"),
        ),
        ConnectorRule::new(
            "P1L_to_Pcom",
            "Pcom_conn",
            ("3", "Pcom bifurcation"),
            ("9", "PCA boundary"),
            ("3", "P1"),
        ),
        ConnectorRule::new(
            "PcomR_to_ICA",
            "Pcom_conn",
            ("8", "PCA boundary"),
            ("4", "Pcom bifurcation"),
            ("8", "Pcom"),
        ),
        ConnectorRule::new(
            "PcomL_to_ICA",
            "Pcom_conn",
            ("9", "PCA boundary"),
            ("6", "Pcom bifurcation"),
            ("9", "Pcom"),
        ),
        ConnectorRule::new(
            "ICA_R_to_MCA",
            "ICA_MCA_conn",
            ("4", "ICA bifurcation"),
            ("4", "MCA boundary"),
            ("5", "MCA"),
        ),
        ConnectorRule::new(
            "ICA_L_to_MCA",
            "ICA_MCA_conn",
            ("6", "ICA bifurcation"),
            ("6", "MCA boundary"),
            ("7", "MCA"),
        ),
        ConnectorRule::new(
            "ICA_R_to_A1",
            "ICA_A1_conn",
            ("4", "ICA bifurcation"),
            ("4", "ACA boundary"),
            ("11", "A1"),
        ),
        ConnectorRule::new(
            "ICA_L_to_A1",
            "ICA_A1_conn",
            ("6", "ICA bifurcation"),
            ("6", "ACA boundary"),
            ("12", "A1"),
        ),
    ]
}
