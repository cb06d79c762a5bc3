//! Stable indexing of string-keyed nodes.
//!
//! Node names are sorted once so that every index-based structure built on
//! top (degree tables, components) iterates in lexicographic order.

use std::collections::HashMap;

use hn_anatomy::Vessel;

use crate::error::GraphError;

/// Bidirectional mapping between node names and contiguous indices (0..N).
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    /// Sorted, unique node names (index -> name).
    names: Vec<String>,

    /// Reverse lookup: name -> index.
    lookup: HashMap<String, usize>,
}

impl NodeIndex {
    /// Build from any collection of names; duplicates are collapsed.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = names.into_iter().map(|s| s.as_ref().to_string()).collect();
        names.sort();
        names.dedup();

        let lookup = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();

        Self { names, lookup }
    }

    /// Every endpoint of every vessel.
    pub fn from_vessels(vessels: &[Vessel]) -> Self {
        Self::from_names(
            vessels
                .iter()
                .flat_map(|v| [v.start_node.as_str(), v.end_node.as_str()]),
        )
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// Contiguous index for a node name.
    pub fn idx(&self, name: &str) -> Result<usize, GraphError> {
        self.get(name).ok_or_else(|| GraphError::UnknownNode {
            node: name.to_string(),
        })
    }

    /// Node name for a contiguous index (panics if out of bounds).
    pub fn name(&self, i: usize) -> &str {
        &self.names[i]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
