//! Pair graphs: the label structure of edge and link prediction minibatches.
//!
//! A pair graph holds exactly the seed edges over exactly their endpoints.
//! In link mode the negative pair graph is built over the same node
//! universe, so positive and negative scores line up node for node.

use crate::error::Result;
use crate::frontier::Frontier;
use lattix_core::{EdgeId, EdgeType, GraphView, NodeId, NodeType};
use std::collections::BTreeMap;

/// Seed edges of one type with their graph-global endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedEdges {
    /// Edge ids.
    pub eids: Vec<EdgeId>,
    /// Source ids, parallel to `eids`.
    pub src: Vec<NodeId>,
    /// Destination ids, parallel to `eids`.
    pub dst: Vec<NodeId>,
}

impl SeedEdges {
    /// Look up the endpoints of `eids`.
    pub fn resolve<G: GraphView + ?Sized>(graph: &G, etype: &EdgeType, eids: Vec<EdgeId>) -> Result<Self> {
        let (src, dst) = graph.edge_endpoints(etype, &eids)?;
        Ok(Self { eids, src, dst })
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.eids.len()
    }

    /// Whether there are no edges.
    pub fn is_empty(&self) -> bool {
        self.eids.is_empty()
    }
}

/// Synthesized non-edges of one type, graph-global endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NegativeEdges {
    /// Source ids.
    pub src: Vec<NodeId>,
    /// Destination ids.
    pub dst: Vec<NodeId>,
}

impl NegativeEdges {
    /// Number of edges.
    pub fn len(&self) -> usize {
        self.src.len()
    }

    /// Whether there are no edges.
    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }
}

/// Edges of one type in pair-graph local indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairEdges {
    /// Local source indices.
    pub src: Vec<usize>,
    /// Local destination indices.
    pub dst: Vec<usize>,
    /// Graph-global edge ids; `None` for synthesized negatives.
    pub eids: Option<Vec<EdgeId>>,
}

impl PairEdges {
    /// Number of edges.
    pub fn len(&self) -> usize {
        self.src.len()
    }

    /// Whether there are no edges.
    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }
}

/// Minimal graph over seed endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairGraph {
    nodes: BTreeMap<NodeType, Vec<NodeId>>,
    edges: BTreeMap<EdgeType, PairEdges>,
}

impl PairGraph {
    /// Node ids of a type, in local order.
    pub fn nodes(&self, ty: &NodeType) -> &[NodeId] {
        self.nodes.get(ty).map_or(&[][..], Vec::as_slice)
    }

    /// All node sets.
    pub fn node_map(&self) -> &BTreeMap<NodeType, Vec<NodeId>> {
        &self.nodes
    }

    /// Local edges of a type.
    pub fn edges(&self, etype: &EdgeType) -> Option<&PairEdges> {
        self.edges.get(etype)
    }

    /// Edge types carried (every type of the graph).
    pub fn edge_types(&self) -> impl Iterator<Item = &EdgeType> {
        self.edges.keys()
    }

    /// Number of edges of a type.
    pub fn num_edges(&self, etype: &EdgeType) -> usize {
        self.edges.get(etype).map_or(0, PairEdges::len)
    }

    /// Graph-global edge ids of a type; empty for negative graphs.
    pub fn eids(&self, etype: &EdgeType) -> &[EdgeId] {
        self.edges
            .get(etype)
            .and_then(|e| e.eids.as_deref())
            .unwrap_or(&[])
    }

    /// Edges of a type as graph-global `(src, dst)` pairs.
    pub fn global_edges(&self, etype: &EdgeType) -> Vec<(NodeId, NodeId)> {
        let Some(local) = self.edges.get(etype) else {
            return Vec::new();
        };
        let src = self.nodes(&etype.src_type);
        let dst = self.nodes(&etype.dst_type);
        local
            .src
            .iter()
            .zip(&local.dst)
            .map(|(&u, &v)| (src[u], dst[v]))
            .collect()
    }
}

/// Build the positive pair graph and, when negatives are given, a negative
/// pair graph over the identical node universe.
pub fn build_pair_graphs<G: GraphView + ?Sized>(
    graph: &G,
    seeds: &BTreeMap<EdgeType, SeedEdges>,
    negatives: Option<&BTreeMap<EdgeType, NegativeEdges>>,
) -> (PairGraph, Option<PairGraph>) {
    let mut universe = Frontier::new();
    for ty in graph.node_types() {
        universe.ensure_type(&ty);
    }

    // Every positive endpoint precedes every negative-only endpoint.
    let mut pos_edges = BTreeMap::new();
    for etype in graph.edge_types() {
        let mut local = PairEdges {
            eids: Some(Vec::new()),
            ..PairEdges::default()
        };
        if let Some(s) = seeds.get(&etype) {
            for (&u, &v) in s.src.iter().zip(&s.dst) {
                local.src.push(universe.insert(&etype.src_type, u));
                local.dst.push(universe.insert(&etype.dst_type, v));
            }
            local.eids = Some(s.eids.clone());
        }
        pos_edges.insert(etype, local);
    }

    let mut neg_edges = BTreeMap::new();
    if let Some(negs) = negatives {
        for etype in graph.edge_types() {
            let mut local = PairEdges::default();
            if let Some(n) = negs.get(&etype) {
                for (&u, &v) in n.src.iter().zip(&n.dst) {
                    local.src.push(universe.insert(&etype.src_type, u));
                    local.dst.push(universe.insert(&etype.dst_type, v));
                }
            }
            neg_edges.insert(etype, local);
        }
    }

    let nodes = universe.to_map();
    let neg = negatives.map(|_| PairGraph {
        nodes: nodes.clone(),
        edges: neg_edges,
    });
    (
        PairGraph {
            nodes,
            edges: pos_edges,
        },
        neg,
    )
}
