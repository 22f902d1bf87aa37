//! Error types for lattix-core.

use thiserror::Error;

/// Error type for graph view queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Node type is not part of the graph schema.
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    /// Edge type is not part of the graph schema.
    #[error("unknown edge type: {0}")]
    UnknownEdgeType(String),

    /// Node id outside `0..node_count` for its type.
    #[error("node {id} out of range for type {ty} ({count} nodes)")]
    NodeOutOfRange {
        /// Node type name.
        ty: String,
        /// Offending id.
        id: usize,
        /// Number of nodes of that type.
        count: usize,
    },

    /// Edge id outside `0..edge_count` for its type.
    #[error("edge {id} out of range for type {ty} ({count} edges)")]
    EdgeOutOfRange {
        /// Canonical edge type (`src:rel:dst`).
        ty: String,
        /// Offending id.
        id: usize,
        /// Number of edges of that type.
        count: usize,
    },

    /// Edge type string is not of the form `src:relation:dst`.
    #[error("invalid edge type `{0}`, expected src:relation:dst")]
    ParseEdgeType(String),
}

/// Result type for graph view queries.
pub type Result<T> = std::result::Result<T, Error>;
