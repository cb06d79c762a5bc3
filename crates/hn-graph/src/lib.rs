//! hn-graph: vessel network layer for hemonet.
//!
//! Provides:
//! - Undirected vessel multigraph over string-keyed nodes, with degree and role
//! - Incremental graph builder with validation
//! - Connected components and the single-component check
//! - Inlet selection strategies and the inlet/outlet partition
//! - Connector augmentation between anatomical landmarks
//!
//! # Example
//!
//! ```
//! use hn_anatomy::{GeometrySource, Material, Vessel, VesselKind};
//! use hn_core::units::mm;
//! use hn_graph::{FixedInlet, GraphBuilder, partition};
//!
//! let segment = |id: &str, a: &str, b: &str| Vessel {
//!     id: id.into(),
//!     name: id.into(),
//!     start_node: a.into(),
//!     end_node: b.into(),
//!     start_diameter: mm(3.0),
//!     end_diameter: mm(3.0),
//!     start_thickness: mm(0.15),
//!     end_thickness: mm(0.15),
//!     length: mm(10.0),
//!     divisions: 5,
//!     material: Material::default(),
//!     kind: VesselKind::Anatomical,
//!     source: GeometrySource::Measured,
//! };
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_vessels([segment("AB", "A", "B"), segment("BC", "B", "C")]);
//! let graph = builder.build().unwrap();
//! graph.ensure_connected().unwrap();
//!
//! let split = partition(&graph, &FixedInlet::new("A")).unwrap();
//! assert_eq!(split.outlets, vec!["C".to_string()]);
//! ```

pub mod builder;
pub mod components;
pub mod connectors;
pub mod error;
pub mod graph;
pub mod indexing;
pub mod inlet;

// Re-exports for ergonomics
pub use builder::GraphBuilder;
pub use components::connected_components;
pub use connectors::{
    ConnectorConfig, ConnectorReport, ConnectorRule, ConnectorSkip, LandmarkRef, SegmentRef,
    circle_of_willis_rules, synthesize_connectors,
};
pub use error::GraphError;
pub use graph::{NodeRole, VesselGraph};
pub use indexing::NodeIndex;
pub use inlet::{
    AnatomicalInlet, FixedInlet, InletChoice, InletPolicy, InletRule, InletSelection, InletTier,
    Partition, name_matches, partition,
};

pub type GraphResult<T> = Result<T, GraphError>;
