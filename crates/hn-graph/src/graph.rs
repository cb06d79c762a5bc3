//! Core graph data structures.

use hn_anatomy::Vessel;

use crate::components::connected_components;
use crate::error::GraphError;
use crate::indexing::NodeIndex;

/// Role of a node, derived from its degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// Two or more incident vessel endpoints.
    Interior,
    /// Exactly one incident vessel endpoint.
    Terminal,
}

impl NodeRole {
    pub fn from_degree(degree: usize) -> Self {
        if degree == 1 {
            NodeRole::Terminal
        } else {
            NodeRole::Interior
        }
    }
}

/// Immutable undirected multigraph of vessels over named nodes.
///
/// Built via [`crate::GraphBuilder`].
#[derive(Debug, Clone)]
pub struct VesselGraph {
    pub(crate) vessels: Vec<Vessel>,
    pub(crate) index: NodeIndex,
    /// Degree per node index.
    pub(crate) degree: Vec<usize>,
    /// Incident vessel positions per node index (a vessel appears once per
    /// endpoint touching the node).
    pub(crate) incident: Vec<Vec<usize>>,
}

impl VesselGraph {
    pub fn vessels(&self) -> &[Vessel] {
        &self.vessels
    }

    pub fn into_vessels(self) -> Vec<Vessel> {
        self.vessels
    }

    pub fn index(&self) -> &NodeIndex {
        &self.index
    }

    /// Node names in lexicographic order.
    pub fn node_names(&self) -> &[String] {
        self.index.names()
    }

    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.index.get(name).is_some()
    }

    pub fn degree(&self, name: &str) -> Option<usize> {
        self.index.get(name).map(|i| self.degree[i])
    }

    pub fn role(&self, name: &str) -> Option<NodeRole> {
        self.degree(name).map(NodeRole::from_degree)
    }

    /// Nodes of degree exactly one, sorted.
    pub fn terminal_nodes(&self) -> Vec<&str> {
        self.index
            .names()
            .iter()
            .enumerate()
            .filter(|(i, _)| self.degree[*i] == 1)
            .map(|(_, n)| n.as_str())
            .collect()
    }

    /// Vessels touching `name`, once per touching endpoint.
    pub fn incident_vessels(&self, name: &str) -> Vec<&Vessel> {
        match self.index.get(name) {
            Some(i) => self.incident[i].iter().map(|&k| &self.vessels[k]).collect(),
            None => Vec::new(),
        }
    }

    /// Connected components as sorted node-name lists.
    pub fn components(&self) -> Vec<Vec<&str>> {
        let edges = self.vessels.iter().filter_map(|v| {
            Some((self.index.get(&v.start_node)?, self.index.get(&v.end_node)?))
        });
        connected_components(self.index.len(), edges)
            .into_iter()
            .map(|c| c.into_iter().map(|i| self.index.name(i)).collect())
            .collect()
    }

    pub fn component_count(&self) -> usize {
        self.components().len()
    }

    /// Fail unless the network is a single connected component.
    pub fn ensure_connected(&self) -> Result<(), GraphError> {
        if self.vessels.is_empty() {
            return Err(GraphError::EmptyNetwork);
        }
        let components = self.components();
        if components.len() == 1 {
            return Ok(());
        }
        Err(GraphError::Disconnected {
            components: components.len(),
            detached: components
                .iter()
                .skip(1)
                .filter_map(|c| c.first().map(|n| n.to_string()))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_from_degree() {
        assert_eq!(NodeRole::from_degree(1), NodeRole::Terminal);
        assert_eq!(NodeRole::from_degree(2), NodeRole::Interior);
        assert_eq!(NodeRole::from_degree(3), NodeRole::Interior);
    }
}
