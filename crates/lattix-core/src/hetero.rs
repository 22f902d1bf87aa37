//! Heterogeneous graph support.
//!
//! This module provides the typed identifiers shared by every sampler
//! ([`NodeType`], [`EdgeType`]) and an in-memory [`HeteroGraph`] with
//! integer node ids per type and dense edge ids per edge type.
//!
//! # Example
//!
//! ```rust
//! use lattix_core::hetero::{EdgeType, HeteroGraph, NodeType};
//!
//! let mut hg = HeteroGraph::new();
//!
//! let buys = EdgeType::new("user", "buys", "item");
//! hg.add_nodes("user", 2);
//! hg.add_edge(&buys, 0, 0);
//! hg.add_edge(&buys, 1, 0);
//!
//! assert_eq!(hg.num_node_types(), 2);
//! assert_eq!(hg.num_edges(&buys), 2);
//! assert_eq!(hg.num_nodes(&NodeType::new("item")), 1);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Node id within a specific node type.
pub type NodeId = usize;

/// Edge id within a specific edge type.
pub type EdgeId = usize;

/// A node type identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeType(pub String);

impl NodeType {
    /// Create a new node type.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the type name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Into<String>> From<S> for NodeType {
    fn from(s: S) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An edge type identifier, represented as (src_type, relation, dst_type).
///
/// This is the "canonical" edge type representation used in PyG and DGL.
/// It serializes as the string `src:relation:dst` so it can key JSON maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EdgeType {
    /// Source node type.
    pub src_type: NodeType,
    /// Relation name.
    pub relation: String,
    /// Destination node type.
    pub dst_type: NodeType,
}

impl EdgeType {
    /// Create a new edge type.
    pub fn new(
        src_type: impl Into<NodeType>,
        relation: impl Into<String>,
        dst_type: impl Into<NodeType>,
    ) -> Self {
        Self {
            src_type: src_type.into(),
            relation: relation.into(),
            dst_type: dst_type.into(),
        }
    }

    /// Get the reverse edge type (for undirected edges).
    pub fn reverse(&self) -> Self {
        Self {
            src_type: self.dst_type.clone(),
            relation: format!("rev_{}", self.relation),
            dst_type: self.src_type.clone(),
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.src_type, self.relation, self.dst_type)
    }
}

impl FromStr for EdgeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(src), Some(rel), Some(dst), None)
                if !src.is_empty() && !rel.is_empty() && !dst.is_empty() =>
            {
                Ok(Self::new(src, rel, dst))
            }
            _ => Err(Error::ParseEdgeType(s.to_string())),
        }
    }
}

impl From<EdgeType> for String {
    fn from(et: EdgeType) -> Self {
        et.to_string()
    }
}

impl TryFrom<String> for EdgeType {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Edge storage for a specific edge type (COO format plus an in-edge index).
///
/// Edge ids are positions in `src`/`dst`. `in_edges[v]` lists the ids of
/// the edges ending at `v`, ascending.
#[derive(Debug, Clone, Default)]
pub struct EdgeStore {
    /// Source node ids.
    pub src: Vec<NodeId>,
    /// Destination node ids.
    pub dst: Vec<NodeId>,
    in_edges: Vec<Vec<EdgeId>>,
}

impl EdgeStore {
    /// Create an empty edge store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.src.len()
    }

    /// Add an edge, returning its id.
    pub fn add_edge(&mut self, src: NodeId, dst: NodeId) -> EdgeId {
        let eid = self.src.len();
        self.src.push(src);
        self.dst.push(dst);
        if self.in_edges.len() <= dst {
            self.in_edges.resize_with(dst + 1, Vec::new);
        }
        self.in_edges[dst].push(eid);
        eid
    }

    /// Ids of the edges whose destination is `dst`.
    pub fn in_edges(&self, dst: NodeId) -> &[EdgeId] {
        self.in_edges.get(dst).map_or(&[][..], Vec::as_slice)
    }

    /// Endpoints of edge `eid`.
    pub fn endpoints(&self, eid: EdgeId) -> Option<(NodeId, NodeId)> {
        Some((*self.src.get(eid)?, *self.dst.get(eid)?))
    }

    /// Iterate over (src, dst) pairs in edge-id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.src.iter().copied().zip(self.dst.iter().copied())
    }
}

/// A heterogeneous graph with typed nodes and edges.
///
/// Nodes are identified by `(type, id)` with ids dense in `0..num_nodes`.
/// Stores are keyed by ordered maps, so type iteration is deterministic.
#[derive(Debug, Clone, Default)]
pub struct HeteroGraph {
    /// Node counts by type.
    node_counts: BTreeMap<NodeType, usize>,
    /// Edges by type.
    edge_stores: BTreeMap<EdgeType, EdgeStore>,
}

impl HeteroGraph {
    /// Create an empty heterogeneous graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph holding a single edge type.
    pub fn from_edges(edge_type: &EdgeType, edges: &[(NodeId, NodeId)]) -> Self {
        let mut hg = Self::new();
        hg.add_edge_type(edge_type);
        for &(src, dst) in edges {
            hg.add_edge(edge_type, src, dst);
        }
        hg
    }

    /// Number of node types.
    pub fn num_node_types(&self) -> usize {
        self.node_counts.len()
    }

    /// Number of edge types.
    pub fn num_edge_types(&self) -> usize {
        self.edge_stores.len()
    }

    /// Get all node types.
    pub fn node_types(&self) -> impl Iterator<Item = &NodeType> {
        self.node_counts.keys()
    }

    /// Get all edge types.
    pub fn edge_types(&self) -> impl Iterator<Item = &EdgeType> {
        self.edge_stores.keys()
    }

    /// Append `n` nodes of the given type, returning their id range.
    pub fn add_nodes(&mut self, node_type: impl Into<NodeType>, n: usize) -> Range<NodeId> {
        let count = self.node_counts.entry(node_type.into()).or_insert(0);
        let start = *count;
        *count += n;
        start..*count
    }

    /// Register an edge type (and its node types) without adding edges.
    pub fn add_edge_type(&mut self, edge_type: &EdgeType) {
        self.node_counts.entry(edge_type.src_type.clone()).or_insert(0);
        self.node_counts.entry(edge_type.dst_type.clone()).or_insert(0);
        self.edge_stores.entry(edge_type.clone()).or_default();
    }

    /// Add an edge of the given type, returning its id.
    ///
    /// Grows the endpoint node types so both endpoints exist.
    pub fn add_edge(&mut self, edge_type: &EdgeType, src: NodeId, dst: NodeId) -> EdgeId {
        self.ensure_node(&edge_type.src_type, src);
        self.ensure_node(&edge_type.dst_type, dst);
        self.edge_stores
            .entry(edge_type.clone())
            .or_default()
            .add_edge(src, dst)
    }

    /// Add bidirectional edge (adds reverse edge automatically).
    pub fn add_edge_bidirectional(
        &mut self,
        edge_type: &EdgeType,
        src: NodeId,
        dst: NodeId,
    ) -> (EdgeId, EdgeId) {
        let fwd = self.add_edge(edge_type, src, dst);
        let rev = self.add_edge(&edge_type.reverse(), dst, src);
        (fwd, rev)
    }

    fn ensure_node(&mut self, node_type: &NodeType, id: NodeId) {
        let count = self.node_counts.entry(node_type.clone()).or_insert(0);
        if *count <= id {
            *count = id + 1;
        }
    }

    /// Get edge store for a type.
    pub fn edge_store(&self, edge_type: &EdgeType) -> Option<&EdgeStore> {
        self.edge_stores.get(edge_type)
    }

    /// Number of nodes of a given type.
    pub fn num_nodes(&self, node_type: &NodeType) -> usize {
        self.node_counts.get(node_type).copied().unwrap_or(0)
    }

    /// Number of edges of a given type.
    pub fn num_edges(&self, edge_type: &EdgeType) -> usize {
        self.edge_stores
            .get(edge_type)
            .map(|s| s.num_edges())
            .unwrap_or(0)
    }

    /// Total number of nodes across all types.
    pub fn total_nodes(&self) -> usize {
        self.node_counts.values().sum()
    }

    /// Total number of edges across all types.
    pub fn total_edges(&self) -> usize {
        self.edge_stores.values().map(|s| s.num_edges()).sum()
    }
}

/// Statistics for a heterogeneous graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeteroGraphStats {
    /// Number of node types.
    pub num_node_types: usize,
    /// Number of edge types.
    pub num_edge_types: usize,
    /// Total nodes.
    pub total_nodes: usize,
    /// Total edges.
    pub total_edges: usize,
    /// Nodes per type.
    pub nodes_by_type: BTreeMap<String, usize>,
    /// Edges per type, keyed by canonical `src:rel:dst`.
    pub edges_by_type: BTreeMap<String, usize>,
}

impl HeteroGraph {
    /// Get statistics about the graph.
    pub fn stats(&self) -> HeteroGraphStats {
        HeteroGraphStats {
            num_node_types: self.num_node_types(),
            num_edge_types: self.num_edge_types(),
            total_nodes: self.total_nodes(),
            total_edges: self.total_edges(),
            nodes_by_type: self
                .node_counts
                .iter()
                .map(|(t, &n)| (t.0.clone(), n))
                .collect(),
            edges_by_type: self
                .edge_stores
                .iter()
                .map(|(t, s)| (t.to_string(), s.num_edges()))
                .collect(),
        }
    }
}
