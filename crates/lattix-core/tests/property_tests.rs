//! Property-based tests for the graph view.
//!
//! These tests verify invariants that should hold for any heterogeneous graph:
//! - In-edge index consistency with the COO arrays
//! - Neighbor grouping and ordering
//! - Subgraph edges staying inside the induced node set

use lattix_core::{EdgeType, GraphView, HeteroGraph, NodeType};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};

fn link() -> EdgeType {
    EdgeType::new("node", "link", "node")
}

fn arb_edges() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0usize..30, 0usize..30), 0..100)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn in_degrees_sum_to_edge_count(edges in arb_edges()) {
        let g = HeteroGraph::from_edges(&link(), &edges);
        let n = g.num_nodes(&NodeType::new("node"));

        let total: usize = (0..n).map(|v| g.in_degree(&link(), v).unwrap()).sum();
        prop_assert_eq!(total, edges.len());
    }

    #[test]
    fn neighbors_follow_request_order(
        edges in arb_edges(),
        dsts in prop::collection::vec(0usize..30, 1..10),
    ) {
        let mut g = HeteroGraph::from_edges(&link(), &edges);
        let have = g.num_nodes(&NodeType::new("node"));
        g.add_nodes("node", 30usize.saturating_sub(have));

        let mut unique = Vec::new();
        let mut seen = HashSet::new();
        for d in dsts {
            if seen.insert(d) {
                unique.push(d);
            }
        }

        let neighbors = g.neighbors_of(&link(), &unique).unwrap();
        let order: Vec<usize> = neighbors.iter().map(|n| n.dst).collect();
        let mut expected = Vec::new();
        for &d in &unique {
            expected.extend(std::iter::repeat(d).take(g.in_degree(&link(), d).unwrap()));
        }
        prop_assert_eq!(order, expected);

        for w in neighbors.windows(2) {
            if w[0].dst == w[1].dst {
                prop_assert!(w[0].eid < w[1].eid);
            }
        }
        for nb in &neighbors {
            prop_assert_eq!(edges[nb.eid], (nb.src, nb.dst));
        }
    }

    #[test]
    fn subgraph_is_induced(
        edges in arb_edges(),
        keep in prop::collection::btree_set(0usize..30, 0..15),
    ) {
        let mut g = HeteroGraph::from_edges(&link(), &edges);
        let have = g.num_nodes(&NodeType::new("node"));
        g.add_nodes("node", 30usize.saturating_sub(have));

        let mut nodes = BTreeMap::new();
        nodes.insert(NodeType::new("node"), keep.iter().copied().collect::<Vec<_>>());
        let sub = g.subgraph_by_nodes(&nodes).unwrap();

        let expected = edges
            .iter()
            .filter(|(u, v)| keep.contains(u) && keep.contains(v))
            .count();
        let got = sub.edges.get(&link()).map_or(0, |e| e.eids.len());
        prop_assert_eq!(got, expected);
    }
}
