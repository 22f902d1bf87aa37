//! Collators shared across worker threads over one read-only graph.

use lattix_core::{EdgeType, HeteroGraph, NodeType};
use lattix_loader::{CollatorConfig, EdgeCollator, NegativeSampler, NodeCollator, ReverseTables};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use rayon::prelude::*;
use std::collections::BTreeMap;

fn ring(n: usize) -> (HeteroGraph, EdgeType) {
    let cites = EdgeType::new("paper", "cites", "paper");
    let edges: Vec<_> = (0..n)
        .flat_map(|i| [(i, (i + 1) % n), (i, (i + 7) % n), ((i + 3) % n, i)])
        .collect();
    (HeteroGraph::from_edges(&cites, &edges), cites)
}

#[test]
fn parallel_node_batches_match_sequential() {
    let (g, _) = ring(200);
    let mut nids = BTreeMap::new();
    nids.insert(NodeType::new("paper"), (0..200).collect::<Vec<_>>());
    let config = CollatorConfig::default().with_uniform_fanouts(&[3, 2]);
    let collator = NodeCollator::new(&g, &nids, &config).unwrap();

    let indices: Vec<usize> = (0..collator.dataset_len()).collect();
    let batches: Vec<&[usize]> = indices.chunks(16).collect();

    // One independently seeded stream per batch.
    let run = |(i, chunk): (usize, &&[usize])| {
        let mut rng = XorShiftRng::seed_from_u64(i as u64);
        collator.collate_with_rng(chunk, &mut rng).unwrap()
    };
    let parallel: Vec<_> = batches.par_iter().enumerate().map(run).collect();
    let sequential: Vec<_> = batches.iter().enumerate().map(run).collect();

    assert_eq!(parallel, sequential);
    let total: usize = parallel
        .iter()
        .map(|b| b.output_nodes[&NodeType::new("paper")].len())
        .sum();
    assert_eq!(total, 200);
}

#[test]
fn parallel_link_batches_succeed() {
    let (g, cites) = ring(100);
    let mut eids = BTreeMap::new();
    eids.insert(cites.clone(), (0..g.num_edges(&cites)).collect::<Vec<_>>());
    let config = CollatorConfig::default()
        .with_uniform_fanouts(&[2, 2])
        .with_negative_sampler(NegativeSampler::uniform(1).with_unique(true));
    let collator = EdgeCollator::new(&g, &eids, &config, ReverseTables::new()).unwrap();

    let indices: Vec<usize> = (0..collator.dataset_len()).collect();
    let results: Vec<_> = indices
        .par_chunks(32)
        .map(|chunk| collator.collate(chunk))
        .collect();

    for batch in results {
        let batch = batch.unwrap();
        let neg = batch.neg_graph.as_ref().unwrap();
        assert_eq!(neg.node_map(), batch.pair_graph.node_map());
    }
}
