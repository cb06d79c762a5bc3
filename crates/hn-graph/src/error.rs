//! Graph-specific error types.

use hn_core::HnError;

/// Graph construction and structural errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two vessels share an identifier.
    DuplicateVessel { id: String },

    /// A vessel starts and ends at the same node.
    SelfLoop { vessel: String, node: String },

    /// A vessel violates the positivity invariants.
    InvalidVessel { id: String, reason: String },

    /// Node name not present in the graph.
    UnknownNode { node: String },

    /// The configured or detected inlet cannot be used.
    InvalidInletSelection { node: Option<String>, reason: String },

    /// More than one connected component remains.
    Disconnected {
        components: usize,
        /// First node (sorted) of every component except the one holding the
        /// smallest node name.
        detached: Vec<String>,
    },

    /// No vessels at all.
    EmptyNetwork,
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::DuplicateVessel { id } => {
                write!(f, "Vessel id '{}' is declared more than once", id)
            }
            GraphError::SelfLoop { vessel, node } => {
                write!(f, "Vessel '{}' starts and ends at node '{}'", vessel, node)
            }
            GraphError::InvalidVessel { id, reason } => {
                write!(f, "Vessel '{}' is invalid: {}", id, reason)
            }
            GraphError::UnknownNode { node } => {
                write!(f, "Node '{}' is not part of the vessel graph", node)
            }
            GraphError::InvalidInletSelection { node, reason } => match node {
                Some(node) => write!(f, "Invalid inlet selection '{}': {}", node, reason),
                None => write!(f, "Invalid inlet selection: {}", reason),
            },
            GraphError::Disconnected {
                components,
                detached,
            } => {
                write!(
                    f,
                    "Vessel network has {} connected components (detached pieces start at: {})",
                    components,
                    detached.join(", ")
                )
            }
            GraphError::EmptyNetwork => write!(f, "Vessel network is empty"),
        }
    }
}

impl std::error::Error for GraphError {}

impl From<GraphError> for HnError {
    fn from(err: GraphError) -> Self {
        HnError::Invariant {
            what: err.to_string(),
        }
    }
}
