#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

//! Core graph types consumed by the lattix minibatch samplers.
//!
//! - [`NodeType`] / [`EdgeType`] - typed keys; an edge type is the canonical
//!   `(src_type, relation, dst_type)` triple
//! - [`GraphView`] - read-only access the samplers depend on
//! - [`HeteroGraph`] - in-memory graph implementing [`GraphView`]
//!
//! # Homogeneous vs Heterogeneous Graphs
//!
//! | Type | Nodes | Edges | Use Case |
//! |------|-------|-------|----------|
//! | Homogeneous | One type | One type | Citation networks, social graphs |
//! | Heterogeneous | Multiple types | Multiple types | Knowledge graphs, recommendation |
//!
//! A homogeneous graph is simply a [`HeteroGraph`] with one node type and one
//! edge type; nothing downstream special-cases it.
//!
//! # Example
//!
//! ```rust
//! use lattix_core::{EdgeType, GraphView, HeteroGraph};
//!
//! let follow = EdgeType::new("user", "follow", "user");
//! let g = HeteroGraph::from_edges(&follow, &[(0, 1), (0, 2), (1, 2)]);
//!
//! let incoming = g.neighbors_of(&follow, &[2]).unwrap();
//! assert_eq!(incoming.len(), 2);
//! ```

mod error;
pub mod hetero;
pub mod view;

pub use error::{Error, Result};
pub use hetero::{EdgeId, EdgeStore, EdgeType, HeteroGraph, HeteroGraphStats, NodeId, NodeType};
pub use view::{GraphView, Neighbor, Subgraph, SubgraphEdges};
