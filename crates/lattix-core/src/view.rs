//! Read-only graph access for minibatch samplers.
//!
//! [`GraphView`] is the only surface the sampling pipeline sees. Any storage
//! engine can implement it; [`HeteroGraph`] is the in-memory implementation.
//! Implementations must not mutate through `&self`: samplers share one view
//! across worker threads without locking.

use crate::error::{Error, Result};
use crate::hetero::{EdgeId, EdgeStore, EdgeType, HeteroGraph, NodeId, NodeType};
use std::collections::{BTreeMap, HashMap};

/// One incoming edge as seen from its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Neighbor {
    /// Source node id.
    pub src: NodeId,
    /// Destination node id.
    pub dst: NodeId,
    /// Edge id within its edge type.
    pub eid: EdgeId,
}

/// Edges of one type inside a [`Subgraph`], in subgraph-local indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubgraphEdges {
    /// Local source indices.
    pub src: Vec<usize>,
    /// Local destination indices.
    pub dst: Vec<usize>,
    /// Graph-global edge ids.
    pub eids: Vec<EdgeId>,
}

/// An induced subgraph with local indices and graph-global back-references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subgraph {
    /// Kept nodes per type; position is the local index.
    pub nodes: BTreeMap<NodeType, Vec<NodeId>>,
    /// Induced edges per type.
    pub edges: BTreeMap<EdgeType, SubgraphEdges>,
}

/// Read-only typed multi-relational graph.
pub trait GraphView {
    /// All node types, ordered.
    fn node_types(&self) -> Vec<NodeType>;

    /// All edge types, ordered.
    fn edge_types(&self) -> Vec<EdgeType>;

    /// Number of nodes of a type.
    fn node_count(&self, node_type: &NodeType) -> Result<usize>;

    /// Number of edges of a type.
    fn edge_count(&self, edge_type: &EdgeType) -> Result<usize>;

    /// Incoming edges of every id in `dst_ids`.
    ///
    /// Grouped by destination in the order given; within one destination
    /// edges come in ascending edge-id order.
    fn neighbors_of(&self, edge_type: &EdgeType, dst_ids: &[NodeId]) -> Result<Vec<Neighbor>>;

    /// Source and destination ids of the given edges.
    fn edge_endpoints(
        &self,
        edge_type: &EdgeType,
        eids: &[EdgeId],
    ) -> Result<(Vec<NodeId>, Vec<NodeId>)>;

    /// Whether at least one edge `src -> dst` of the type exists.
    fn has_edge_between(&self, edge_type: &EdgeType, src: NodeId, dst: NodeId) -> Result<bool>;

    /// Number of incoming edges of `dst`.
    fn in_degree(&self, edge_type: &EdgeType, dst: NodeId) -> Result<usize>;

    /// Subgraph induced by the given node sets.
    fn subgraph_by_nodes(&self, nodes: &BTreeMap<NodeType, Vec<NodeId>>) -> Result<Subgraph>;
}

impl HeteroGraph {
    fn store(&self, edge_type: &EdgeType) -> Result<&EdgeStore> {
        self.edge_store(edge_type)
            .ok_or_else(|| Error::UnknownEdgeType(edge_type.to_string()))
    }

    fn check_node(&self, node_type: &NodeType, id: NodeId) -> Result<()> {
        let count = self.node_count(node_type)?;
        if id >= count {
            return Err(Error::NodeOutOfRange {
                ty: node_type.to_string(),
                id,
                count,
            });
        }
        Ok(())
    }
}

impl GraphView for HeteroGraph {
    fn node_types(&self) -> Vec<NodeType> {
        HeteroGraph::node_types(self).cloned().collect()
    }

    fn edge_types(&self) -> Vec<EdgeType> {
        HeteroGraph::edge_types(self).cloned().collect()
    }

    fn node_count(&self, node_type: &NodeType) -> Result<usize> {
        if HeteroGraph::node_types(self).any(|t| t == node_type) {
            Ok(self.num_nodes(node_type))
        } else {
            Err(Error::UnknownNodeType(node_type.to_string()))
        }
    }

    fn edge_count(&self, edge_type: &EdgeType) -> Result<usize> {
        Ok(self.store(edge_type)?.num_edges())
    }

    fn neighbors_of(&self, edge_type: &EdgeType, dst_ids: &[NodeId]) -> Result<Vec<Neighbor>> {
        let store = self.store(edge_type)?;
        let mut out = Vec::new();
        for &dst in dst_ids {
            self.check_node(&edge_type.dst_type, dst)?;
            out.extend(store.in_edges(dst).iter().map(|&eid| Neighbor {
                src: store.src[eid],
                dst,
                eid,
            }));
        }
        Ok(out)
    }

    fn edge_endpoints(
        &self,
        edge_type: &EdgeType,
        eids: &[EdgeId],
    ) -> Result<(Vec<NodeId>, Vec<NodeId>)> {
        let store = self.store(edge_type)?;
        let mut src = Vec::with_capacity(eids.len());
        let mut dst = Vec::with_capacity(eids.len());
        for &eid in eids {
            let (u, v) = store.endpoints(eid).ok_or_else(|| Error::EdgeOutOfRange {
                ty: edge_type.to_string(),
                id: eid,
                count: store.num_edges(),
            })?;
            src.push(u);
            dst.push(v);
        }
        Ok((src, dst))
    }

    fn has_edge_between(&self, edge_type: &EdgeType, src: NodeId, dst: NodeId) -> Result<bool> {
        let store = self.store(edge_type)?;
        Ok(store.in_edges(dst).iter().any(|&eid| store.src[eid] == src))
    }

    fn in_degree(&self, edge_type: &EdgeType, dst: NodeId) -> Result<usize> {
        let store = self.store(edge_type)?;
        self.check_node(&edge_type.dst_type, dst)?;
        Ok(store.in_edges(dst).len())
    }

    fn subgraph_by_nodes(&self, nodes: &BTreeMap<NodeType, Vec<NodeId>>) -> Result<Subgraph> {
        let mut kept: BTreeMap<NodeType, Vec<NodeId>> = BTreeMap::new();
        let mut local: BTreeMap<&NodeType, HashMap<NodeId, usize>> = BTreeMap::new();
        for (ty, ids) in nodes {
            let index = local.entry(ty).or_default();
            let order = kept.entry(ty.clone()).or_default();
            for &id in ids {
                self.check_node(ty, id)?;
                if !index.contains_key(&id) {
                    index.insert(id, order.len());
                    order.push(id);
                }
            }
        }

        let mut edges = BTreeMap::new();
        for edge_type in HeteroGraph::edge_types(self) {
            let store = self.store(edge_type)?;
            let (Some(src_index), Some(dst_index)) =
                (local.get(&edge_type.src_type), local.get(&edge_type.dst_type))
            else {
                continue;
            };
            let mut induced = SubgraphEdges::default();
            for (eid, (u, v)) in store.iter().enumerate() {
                if let (Some(&lu), Some(&lv)) = (src_index.get(&u), dst_index.get(&v)) {
                    induced.src.push(lu);
                    induced.dst.push(lv);
                    induced.eids.push(eid);
                }
            }
            edges.insert(edge_type.clone(), induced);
        }

        Ok(Subgraph { nodes: kept, edges })
    }
}
