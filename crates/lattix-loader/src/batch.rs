//! Whole-graph batching for graph-level tasks.
//!
//! Unrelated to neighbor sampling: a batch of small, independent graphs is
//! concatenated into one disjoint-union [`HeteroGraph`]. Node ids of graph
//! `i` are shifted by the node counts of graphs `0..i`, per node type, and
//! every node remembers which graph it came from.

use lattix_core::{EdgeType, HeteroGraph, NodeType};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A disjoint union of graphs plus their labels.
#[derive(Debug, Clone)]
pub struct BatchedGraph<L> {
    /// The concatenated graph.
    pub graph: HeteroGraph,
    /// Origin graph index of every node, per type.
    pub graph_ids: BTreeMap<NodeType, Vec<usize>>,
    /// Node count of each input graph, per type.
    pub batch_num_nodes: BTreeMap<NodeType, Vec<usize>>,
    /// Edge count of each input graph, per type.
    pub batch_num_edges: BTreeMap<EdgeType, Vec<usize>>,
    /// Labels in input order.
    pub labels: Vec<L>,
}

impl<L> BatchedGraph<L> {
    /// Number of graphs in the batch.
    pub fn batch_size(&self) -> usize {
        self.labels.len()
    }

    /// Offset added to node ids of graph `index` for type `ty`.
    pub fn node_offset(&self, ty: &NodeType, index: usize) -> usize {
        self.batch_num_nodes
            .get(ty)
            .map_or(0, |counts| counts.iter().take(index).sum())
    }
}

/// Batches whole graphs; stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphCollator;

impl GraphCollator {
    /// Create a collator.
    ///
    /// ```
    /// use lattix_core::{EdgeType, HeteroGraph};
    /// use lattix_loader::GraphCollator;
    ///
    /// let bond = EdgeType::new("atom", "bond", "atom");
    /// let a = HeteroGraph::from_edges(&bond, &[(0, 1)]);
    /// let b = HeteroGraph::from_edges(&bond, &[(1, 0)]);
    ///
    /// let batch = GraphCollator::new().collate(&[(a, 0.5), (b, 1.5)]);
    /// assert_eq!(batch.batch_size(), 2);
    /// assert_eq!(batch.graph.num_edges(&bond), 2);
    /// ```
    pub fn new() -> Self {
        Self
    }

    /// Concatenate `samples` into one graph, stacking labels in order.
    ///
    /// The union of node and edge types across the batch is present in the
    /// result; a graph lacking a type contributes zero of it.
    pub fn collate<L: Clone>(&self, samples: &[(HeteroGraph, L)]) -> BatchedGraph<L> {
        let node_types: BTreeSet<NodeType> = samples
            .iter()
            .flat_map(|(g, _)| g.node_types().cloned())
            .collect();
        let edge_types: BTreeSet<EdgeType> = samples
            .iter()
            .flat_map(|(g, _)| g.edge_types().cloned())
            .collect();

        let mut graph = HeteroGraph::new();
        let mut graph_ids: BTreeMap<NodeType, Vec<usize>> = BTreeMap::new();
        let mut batch_num_nodes: BTreeMap<NodeType, Vec<usize>> = BTreeMap::new();
        let mut batch_num_edges: BTreeMap<EdgeType, Vec<usize>> = BTreeMap::new();
        for ty in &node_types {
            graph.add_nodes(ty.clone(), 0);
            graph_ids.insert(ty.clone(), Vec::new());
            batch_num_nodes.insert(ty.clone(), Vec::with_capacity(samples.len()));
        }
        for et in &edge_types {
            graph.add_edge_type(et);
            batch_num_edges.insert(et.clone(), Vec::with_capacity(samples.len()));
        }

        let mut labels = Vec::with_capacity(samples.len());
        for (index, (g, label)) in samples.iter().enumerate() {
            let mut offsets = BTreeMap::new();
            for ty in &node_types {
                let n = g.num_nodes(ty);
                let range = graph.add_nodes(ty.clone(), n);
                offsets.insert(ty, range.start);
                if let Some(ids) = graph_ids.get_mut(ty) {
                    ids.extend(std::iter::repeat(index).take(n));
                }
                if let Some(counts) = batch_num_nodes.get_mut(ty) {
                    counts.push(n);
                }
            }
            for et in &edge_types {
                let src_off = offsets.get(&et.src_type).copied().unwrap_or(0);
                let dst_off = offsets.get(&et.dst_type).copied().unwrap_or(0);
                let mut m = 0;
                if let Some(store) = g.edge_store(et) {
                    for (u, v) in store.iter() {
                        graph.add_edge(et, u + src_off, v + dst_off);
                    }
                    m = store.num_edges();
                }
                if let Some(counts) = batch_num_edges.get_mut(et) {
                    counts.push(m);
                }
            }
            labels.push(label.clone());
        }

        debug!(
            graphs = samples.len(),
            nodes = graph.total_nodes(),
            edges = graph.total_edges(),
            "batched graphs"
        );
        BatchedGraph {
            graph,
            graph_ids,
            batch_num_nodes,
            batch_num_edges,
            labels,
        }
    }
}
