//! Raw anatomical input definitions.
//!
//! The measurement pipeline hands us three JSON documents per patient:
//! segment features (radius/length per vessel), anatomical landmark nodes and
//! variant flags for optional branches. All are nested maps keyed first by
//! anatomical group (label id) and then by vessel or landmark name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::sanitize_id;

/// `group -> vessel name -> record | [records]`.
///
/// Records stay as raw JSON so a single malformed entry cannot reject the
/// whole document; the catalog decodes them one at a time.
pub type FeatureMap = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

/// `group -> landmark label -> [landmarks]`.
pub type LandmarkMap = BTreeMap<String, BTreeMap<String, Vec<Landmark>>>;

/// `section -> branch flag -> present`.
pub type VariantMap = BTreeMap<String, BTreeMap<String, bool>>;

/// Node key as it appears in the measurement files.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeKey {
    Index(u64),
    Label(String),
}

impl NodeKey {
    /// Network node identifier; numeric keys get `prefix` prepended and
    /// labels are made CSV-safe. `None` when a label has nothing left.
    pub fn to_node_id(&self, prefix: &str) -> Option<String> {
        let id = match self {
            NodeKey::Index(i) => format!("{prefix}{i}"),
            NodeKey::Label(s) => sanitize_id(s),
        };
        (!id.is_empty()).then_some(id)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Index(i) => write!(f, "{i}"),
            NodeKey::Label(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentEnds {
    pub start: NodeKey,
    pub end: NodeKey,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadiusStats {
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub median: Option<f64>,
}

/// One measured segment. Every field is optional; gaps are resolved by the
/// catalog's fallback policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    #[serde(default)]
    pub segment: Option<SegmentEnds>,
    #[serde(default)]
    pub start: Option<NodeKey>,
    #[serde(default)]
    pub end: Option<NodeKey>,
    #[serde(default)]
    pub radius: Option<RadiusStats>,
    /// Length in millimeters.
    #[serde(default)]
    pub length: Option<f64>,
}

impl RawSegment {
    /// Endpoints, preferring the nested `segment` block.
    pub fn endpoints(&self) -> Option<(&NodeKey, &NodeKey)> {
        if let Some(seg) = &self.segment {
            return Some((&seg.start, &seg.end));
        }
        match (&self.start, &self.end) {
            (Some(s), Some(e)) => Some((s, e)),
            _ => None,
        }
    }
}

/// Anatomical landmark (bifurcation or boundary point).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: NodeKey,
    /// Image-space coordinates in millimeters.
    #[serde(default)]
    pub coords: Option<Vec<f64>>,
}

/// Which statistic of the radius distribution to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusStatistic {
    Mean,
    #[default]
    Median,
}

impl RadiusStats {
    /// Preferred statistic, or the other one when it is missing.
    pub fn pick(&self, stat: RadiusStatistic) -> Option<f64> {
        match stat {
            RadiusStatistic::Mean => self.mean.or(self.median),
            RadiusStatistic::Median => self.median.or(self.mean),
        }
    }
}

/// Everything the geometry catalog consumes for one patient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnatomyInput {
    pub features: FeatureMap,
    pub landmarks: Option<LandmarkMap>,
    pub variants: Option<VariantMap>,
}

impl AnatomyInput {
    pub fn new(features: FeatureMap) -> Self {
        Self {
            features,
            landmarks: None,
            variants: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: LandmarkMap) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    pub fn with_variants(mut self, variants: VariantMap) -> Self {
        self.variants = Some(variants);
        self
    }

    /// First landmark registered under `group`/`label`.
    pub fn landmark(&self, group: &str, label: &str) -> Option<&Landmark> {
        self.landmarks
            .as_ref()?
            .get(group)?
            .get(label)?
            .first()
    }
}

/// Decode the records stored under one vessel name (a single object or a list).
pub fn decode_records(value: &serde_json::Value) -> Vec<Result<RawSegment, serde_json::Error>> {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| serde_json::from_value(item.clone()))
            .collect(),
        other => vec![serde_json::from_value(other.clone())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_key_accepts_numbers_and_strings() {
        let keys: Vec<NodeKey> = serde_json::from_str(r#"[15, "n3"]"#).unwrap();
        assert_eq!(keys[0].to_node_id("N").as_deref(), Some("N15"));
        assert_eq!(keys[1].to_node_id("N").as_deref(), Some("n3"));
    }

    #[test]
    fn node_labels_are_csv_safe() {
        let keys: Vec<NodeKey> = serde_json::from_str(r#"["L,2", " R ICA ", "", " , ", "a\"b"]"#).unwrap();
        let ids: Vec<Option<String>> = keys.iter().map(|k| k.to_node_id("N")).collect();
        assert_eq!(
            ids,
            vec![Some("L2".to_string()), Some("R_ICA".to_string()), None, None, Some("ab".to_string())]
        );
    }

    #[test]
    fn endpoints_prefer_segment_block() {
        let seg: RawSegment = serde_json::from_str(
            r#"{"segment": {"start": 1, "end": 2}, "start": 8, "end": 9, "length": 4.0}"#,
        )
        .unwrap();
        let (s, e) = seg.endpoints().unwrap();
        assert_eq!(s, &NodeKey::Index(1));
        assert_eq!(e, &NodeKey::Index(2));
    }

    #[test]
    fn radius_statistic_falls_back_to_other() {
        let stats = RadiusStats {
            mean: Some(1.2),
            median: None,
        };
        assert_eq!(stats.pick(RadiusStatistic::Median), Some(1.2));
    }

    #[test]
    fn decode_single_and_list() {
        let one = serde_json::json!({"start": 1, "end": 2});
        let many = serde_json::json!([{"start": 1, "end": 2}, {"radius": "bad"}]);
        assert_eq!(decode_records(&one).len(), 1);
        let decoded = decode_records(&many);
        assert!(decoded[0].is_ok());
        assert!(decoded[1].is_err());
    }
}
