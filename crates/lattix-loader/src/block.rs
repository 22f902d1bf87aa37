//! Blocks: one bipartite layer of a GNN computation graph.
//!
//! A block has its own local id space. For every node type the source
//! sequence starts with exactly the destination sequence, in the same order,
//! followed by the nodes that only feed messages in:
//!
//! ```text
//! src: [ d0 d1 d2 | n0 n1 ]     local 0..3 are "self", 3..5 are new neighbors
//! dst: [ d0 d1 d2 ]
//! ```
//!
//! Downstream feature gathers rely on this positionally
//! (`h_dst = h_src[..num_dst]`), so the prefix order is a hard contract.

use crate::error::{Error, Result};
use crate::frontier::Frontier;
use crate::sampler::SampledLayer;
use lattix_core::{EdgeId, EdgeType, GraphView, NodeId, NodeType};
use std::collections::BTreeMap;

/// Edges of one type in block-local indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockEdges {
    /// Local source indices.
    pub src: Vec<usize>,
    /// Local destination indices.
    pub dst: Vec<usize>,
    /// Graph-global edge ids, parallel to `src`/`dst`.
    pub eids: Vec<EdgeId>,
}

impl BlockEdges {
    /// Number of edges.
    pub fn len(&self) -> usize {
        self.eids.len()
    }

    /// Whether there are no edges.
    pub fn is_empty(&self) -> bool {
        self.eids.is_empty()
    }
}

/// A sampled bipartite layer with local ids and graph-global back-references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    src_nodes: BTreeMap<NodeType, Vec<NodeId>>,
    dst_nodes: BTreeMap<NodeType, Vec<NodeId>>,
    edges: BTreeMap<EdgeType, BlockEdges>,
}

impl Block {
    /// Build a block from a frontier and the edges sampled for it.
    ///
    /// Every node type and edge type of the graph gets an entry, empty or not.
    pub fn build<G: GraphView + ?Sized>(
        graph: &G,
        frontier: &Frontier,
        layer: &SampledLayer,
    ) -> Result<Self> {
        let mut dst = frontier.clone();
        for ty in graph.node_types() {
            dst.ensure_type(&ty);
        }
        let mut src = dst.clone();

        let mut edges = BTreeMap::new();
        for etype in graph.edge_types() {
            let sampled = layer.edges(&etype);
            let dst_set = dst.get(&etype.dst_type);
            let mut local = BlockEdges {
                src: Vec::with_capacity(sampled.len()),
                dst: Vec::with_capacity(sampled.len()),
                eids: Vec::with_capacity(sampled.len()),
            };
            for e in sampled {
                let v = dst_set.and_then(|s| s.get(e.dst)).ok_or_else(|| {
                    Error::InconsistentGraph {
                        layer: None,
                        etype: etype.clone(),
                        reason: format!("sampled edge {} ends at {} outside the frontier", e.eid, e.dst),
                    }
                })?;
                local.src.push(src.insert(&etype.src_type, e.src));
                local.dst.push(v);
                local.eids.push(e.eid);
            }
            edges.insert(etype, local);
        }

        Ok(Self {
            src_nodes: src.to_map(),
            dst_nodes: dst.to_map(),
            edges,
        })
    }

    /// Source node ids of a type, in local order.
    pub fn src_nodes(&self, ty: &NodeType) -> &[NodeId] {
        self.src_nodes.get(ty).map_or(&[][..], Vec::as_slice)
    }

    /// Destination node ids of a type, in local order.
    pub fn dst_nodes(&self, ty: &NodeType) -> &[NodeId] {
        self.dst_nodes.get(ty).map_or(&[][..], Vec::as_slice)
    }

    /// All source node sets.
    pub fn src_map(&self) -> &BTreeMap<NodeType, Vec<NodeId>> {
        &self.src_nodes
    }

    /// All destination node sets.
    pub fn dst_map(&self) -> &BTreeMap<NodeType, Vec<NodeId>> {
        &self.dst_nodes
    }

    /// Number of source nodes of a type.
    pub fn num_src_nodes(&self, ty: &NodeType) -> usize {
        self.src_nodes(ty).len()
    }

    /// Number of destination nodes of a type.
    pub fn num_dst_nodes(&self, ty: &NodeType) -> usize {
        self.dst_nodes(ty).len()
    }

    /// Source nodes beyond the destination prefix.
    pub fn input_only_nodes(&self, ty: &NodeType) -> &[NodeId] {
        &self.src_nodes(ty)[self.num_dst_nodes(ty)..]
    }

    /// Node types carried by the block.
    pub fn node_types(&self) -> impl Iterator<Item = &NodeType> {
        self.src_nodes.keys()
    }

    /// Edge types carried by the block.
    pub fn edge_types(&self) -> impl Iterator<Item = &EdgeType> {
        self.edges.keys()
    }

    /// Local edges of a type.
    pub fn edges(&self, etype: &EdgeType) -> Option<&BlockEdges> {
        self.edges.get(etype)
    }

    /// Number of edges of a type.
    pub fn num_edges(&self, etype: &EdgeType) -> usize {
        self.edges.get(etype).map_or(0, BlockEdges::len)
    }

    /// Total edges across types.
    pub fn total_edges(&self) -> usize {
        self.edges.values().map(BlockEdges::len).sum()
    }

    /// Edges of a type mapped back to graph-global `(src, dst, eid)`.
    pub fn global_edges(&self, etype: &EdgeType) -> Vec<(NodeId, NodeId, EdgeId)> {
        let Some(local) = self.edges.get(etype) else {
            return Vec::new();
        };
        let src = self.src_nodes(&etype.src_type);
        let dst = self.dst_nodes(&etype.dst_type);
        local
            .src
            .iter()
            .zip(&local.dst)
            .zip(&local.eids)
            .map(|((&u, &v), &eid)| (src[u], dst[v], eid))
            .collect()
    }
}
