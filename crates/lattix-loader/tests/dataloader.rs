//! End-to-end minibatch checks over a small homogeneous graph and a small
//! heterogeneous graph, in node, edge and link mode.
//!
//! Every minibatch is checked for:
//! - destination-prefix layout of every block
//! - chain continuity between consecutive blocks
//! - every block edge existing in the graph with matching endpoints
//! - input/output node sets matching the first/last block
//! - exclusion of seed edges (and reverses) where configured
//! - negative graph sharing the positive graph's node universe

use lattix_core::{EdgeId, EdgeType, GraphView, HeteroGraph, NodeId, NodeType};
use lattix_loader::{
    Block, CollatorConfig, ConfigError, EdgeCollator, EdgeMiniBatch, Error, ExcludeMode, Fanout,
    LayerFanout, NegativeSampler, NodeCollator, ReverseTables,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};

const SRC: [usize; 5] = [0, 0, 0, 1, 1];
const DST: [usize; 5] = [1, 2, 3, 3, 4];

fn user() -> NodeType {
    NodeType::new("user")
}

fn game() -> NodeType {
    NodeType::new("game")
}

fn follow() -> EdgeType {
    EdgeType::new("user", "follow", "user")
}

fn followed_by() -> EdgeType {
    EdgeType::new("user", "followed-by", "user")
}

fn play() -> EdgeType {
    EdgeType::new("user", "play", "game")
}

fn played_by() -> EdgeType {
    EdgeType::new("game", "played-by", "user")
}

/// Forward edges get ids 0..5, their reverses 5..10, in one edge type.
fn homo_graph() -> (HeteroGraph, ReverseTables) {
    let mut g = HeteroGraph::new();
    for (&u, &v) in SRC.iter().zip(&DST) {
        g.add_edge(&follow(), u, v);
    }
    for (&u, &v) in SRC.iter().zip(&DST) {
        g.add_edge(&follow(), v, u);
    }
    let tables = ReverseTables::new().with_reverse_eids(follow(), vec![5, 6, 7, 8, 9, 0, 1, 2, 3, 4]);
    (g, tables)
}

fn hetero_graph() -> (HeteroGraph, ReverseTables) {
    let mut g = HeteroGraph::new();
    for (&u, &v) in SRC.iter().zip(&DST) {
        g.add_edge(&follow(), u, v);
        g.add_edge(&followed_by(), v, u);
    }
    for (u, v) in [(0, 0), (1, 1), (1, 2), (3, 0), (5, 2)] {
        g.add_edge(&play(), u, v);
        g.add_edge(&played_by(), v, u);
    }

    let mut reverse = BTreeMap::new();
    reverse.insert(follow(), followed_by());
    reverse.insert(followed_by(), follow());
    reverse.insert(play(), played_by());
    reverse.insert(played_by(), play());
    (g, ReverseTables::new().with_reverse_etypes(reverse))
}

fn all_nodes(g: &HeteroGraph) -> BTreeMap<NodeType, Vec<NodeId>> {
    g.node_types()
        .map(|ty| (ty.clone(), (0..g.num_nodes(ty)).collect()))
        .collect()
}

fn all_edges(g: &HeteroGraph) -> BTreeMap<EdgeType, Vec<EdgeId>> {
    g.edge_types()
        .map(|et| (et.clone(), (0..g.num_edges(et)).collect()))
        .collect()
}

fn samplers(g: &HeteroGraph) -> Vec<Vec<LayerFanout>> {
    let per_type: BTreeMap<String, Fanout> = g
        .edge_types()
        .enumerate()
        .map(|(i, et)| {
            let f = if i % 2 == 0 { Fanout::Uniform(1) } else { Fanout::All };
            (et.to_string(), f)
        })
        .collect();
    vec![
        vec![LayerFanout::Scalar(Fanout::Uniform(2)); 2],
        vec![LayerFanout::PerType(per_type.clone()), LayerFanout::PerType(per_type)],
        vec![LayerFanout::Scalar(Fanout::All); 2],
    ]
}

fn check_blocks(g: &HeteroGraph, blocks: &[Block]) {
    for block in blocks {
        for ty in block.node_types() {
            let src = block.src_nodes(ty);
            let dst = block.dst_nodes(ty);
            assert!(src.len() >= dst.len());
            assert_eq!(&src[..dst.len()], dst, "destination prefix broken for {ty}");
            let unique: HashSet<_> = src.iter().collect();
            assert_eq!(unique.len(), src.len(), "duplicate source node for {ty}");
        }
        for et in block.edge_types() {
            let edges = block.global_edges(et);
            let eids: Vec<EdgeId> = edges.iter().map(|&(_, _, e)| e).collect();
            let (src, dst) = g.edge_endpoints(et, &eids).unwrap();
            for (i, &(u, v, _)) in edges.iter().enumerate() {
                assert_eq!((u, v), (src[i], dst[i]), "block edge disagrees with graph");
                assert!(g.has_edge_between(et, u, v).unwrap());
            }
        }
    }
    for pair in blocks.windows(2) {
        assert_eq!(pair[0].dst_map(), pair[1].src_map(), "block chain broken");
    }
}

fn block_eids(blocks: &[Block], et: &EdgeType) -> HashSet<EdgeId> {
    blocks
        .iter()
        .filter_map(|b| b.edges(et))
        .flat_map(|e| e.eids.iter().copied())
        .collect()
}

fn block_pairs(blocks: &[Block], et: &EdgeType) -> HashSet<(NodeId, NodeId)> {
    blocks
        .iter()
        .flat_map(|b| b.global_edges(et))
        .map(|(u, v, _)| (u, v))
        .collect()
}

fn check_exclusion(batch: &EdgeMiniBatch, mode: ExcludeMode, tables: &ReverseTables) {
    for et in batch.pair_graph.edge_types() {
        let seeds = batch.pair_graph.eids(et);
        let present = block_eids(&batch.blocks, et);
        match mode {
            ExcludeMode::None => {}
            ExcludeMode::SelfEdges | ExcludeMode::ReverseTypes => {
                assert!(seeds.iter().all(|e| !present.contains(e)));
            }
            ExcludeMode::ReverseId => {
                let reverse = &tables.reverse_eids.as_ref().unwrap()[et];
                for &e in seeds {
                    assert!(!present.contains(&e));
                    assert!(!present.contains(&reverse[e]));
                }
            }
        }
        if mode == ExcludeMode::ReverseTypes {
            let rev = &tables.reverse_etypes.as_ref().unwrap()[et];
            let rev_pairs = block_pairs(&batch.blocks, rev);
            for (u, v) in batch.pair_graph.global_edges(et) {
                assert!(!rev_pairs.contains(&(v, u)), "reverse of {u}->{v} leaked");
            }
        }
    }
}

#[test]
fn node_mode_all_samplers() {
    for (g, _) in [homo_graph(), hetero_graph()] {
        let nids = all_nodes(&g);
        for fanouts in samplers(&g) {
            let config = CollatorConfig::default().with_fanouts(fanouts).with_seed(0);
            let collator = NodeCollator::new(&g, &nids, &config).unwrap();
            let indices: Vec<usize> = (0..collator.dataset_len()).collect();

            let mut covered: BTreeMap<NodeType, BTreeSet<NodeId>> = BTreeMap::new();
            for chunk in indices.chunks(2) {
                let batch = collator.collate(chunk).unwrap();
                assert_eq!(batch.blocks.len(), 2);
                check_blocks(&g, &batch.blocks);
                assert_eq!(&batch.input_nodes, batch.blocks[0].src_map());
                assert_eq!(&batch.output_nodes, batch.blocks[1].dst_map());

                for (ty, ids) in &batch.output_nodes {
                    let idx = batch.seed_indices.get(ty).map_or(&[][..], Vec::as_slice);
                    assert_eq!(ids.len(), idx.len());
                    for (&id, &i) in ids.iter().zip(idx) {
                        assert_eq!(collator.seed_at(i), Some((ty, id)));
                    }
                    covered.entry(ty.clone()).or_default().extend(ids);
                }
            }

            for (ty, ids) in &nids {
                let expected: BTreeSet<_> = ids.iter().copied().collect();
                assert_eq!(covered.get(ty).cloned().unwrap_or_default(), expected);
            }
        }
    }
}

#[test]
fn edge_mode_all_exclusions() {
    for (g, tables) in [homo_graph(), hetero_graph()] {
        let eids = all_edges(&g);
        let modes: Vec<ExcludeMode> = if tables.reverse_eids.is_some() {
            vec![ExcludeMode::None, ExcludeMode::SelfEdges, ExcludeMode::ReverseId]
        } else {
            vec![ExcludeMode::None, ExcludeMode::SelfEdges, ExcludeMode::ReverseTypes]
        };
        for fanouts in samplers(&g) {
            for &mode in &modes {
                let config = CollatorConfig::default()
                    .with_fanouts(fanouts.clone())
                    .with_exclude(mode)
                    .with_seed(1);
                let collator = EdgeCollator::new(&g, &eids, &config, tables.clone()).unwrap();
                let indices: Vec<usize> = (0..collator.dataset_len()).collect();

                for chunk in indices.chunks(2) {
                    let batch = collator.collate(chunk).unwrap();
                    assert!(!batch.is_link());
                    check_blocks(&g, &batch.blocks);
                    assert_eq!(&batch.input_nodes, batch.blocks[0].src_map());
                    assert_eq!(batch.blocks[1].dst_map(), batch.pair_graph.node_map());

                    let num_seeds: usize = batch.seed_indices.values().map(Vec::len).sum();
                    assert_eq!(num_seeds, chunk.len());
                    for et in batch.pair_graph.edge_types() {
                        let seeds = batch.pair_graph.eids(et);
                        let (src, dst) = g.edge_endpoints(et, seeds).unwrap();
                        let expected: Vec<_> = src.into_iter().zip(dst).collect();
                        assert_eq!(batch.pair_graph.global_edges(et), expected);
                    }
                    check_exclusion(&batch, mode, &tables);
                }
            }
        }
    }
}

#[test]
fn link_mode_negatives_align() {
    for (g, tables) in [homo_graph(), hetero_graph()] {
        let eids = all_edges(&g);
        let mode = if tables.reverse_eids.is_some() {
            ExcludeMode::ReverseId
        } else {
            ExcludeMode::ReverseTypes
        };
        for fanouts in samplers(&g) {
            let config = CollatorConfig::default()
                .with_fanouts(fanouts)
                .with_exclude(mode)
                .with_negative_sampler(NegativeSampler::uniform(2))
                .with_seed(2);
            let collator = EdgeCollator::new(&g, &eids, &config, tables.clone()).unwrap();
            let indices: Vec<usize> = (0..collator.dataset_len()).collect();

            for chunk in indices.chunks(2) {
                let batch = collator.collate(chunk).unwrap();
                assert!(batch.is_link());
                check_blocks(&g, &batch.blocks);
                check_exclusion(&batch, mode, &tables);

                let neg = batch.neg_graph.as_ref().unwrap();
                assert_eq!(neg.node_map(), batch.pair_graph.node_map());
                assert_eq!(batch.blocks[1].dst_map(), neg.node_map());
                for et in batch.pair_graph.edge_types() {
                    let pos = batch.pair_graph.global_edges(et);
                    let negs = neg.global_edges(et);
                    assert_eq!(negs.len(), 2 * pos.len());
                    // Destination corruption keeps each seed's source.
                    for (i, &(u, _)) in negs.iter().enumerate() {
                        assert_eq!(u, pos[i / 2].0);
                    }
                }
            }
        }
    }
}

#[test]
fn two_hop_scenario_on_small_graph() {
    let g = HeteroGraph::from_edges(&follow(), &[(0, 1), (0, 2), (0, 3), (1, 3), (1, 4)]);
    let mut nids = BTreeMap::new();
    nids.insert(user(), vec![3]);
    let config = CollatorConfig::default().with_uniform_fanouts(&[2, 2]).with_seed(42);
    let collator = NodeCollator::new(&g, &nids, &config).unwrap();

    let batch = collator.collate(&[0]).unwrap();
    let last = &batch.blocks[1];
    assert_eq!(last.dst_nodes(&user()), &[3]);
    let src: BTreeSet<_> = last.src_nodes(&user()).iter().copied().collect();
    assert_eq!(src, BTreeSet::from([0, 1, 3]));

    // One-hop in-neighbors of {3, 0, 1} are {0, 1}: nothing new appears.
    let first: BTreeSet<_> = batch.blocks[0].src_nodes(&user()).iter().copied().collect();
    assert_eq!(first, BTreeSet::from([0, 1, 3]));
}

#[test]
fn seeded_collate_is_reproducible() {
    let (g, tables) = hetero_graph();
    let eids = all_edges(&g);
    for fanouts in samplers(&g) {
        let config = CollatorConfig::default()
            .with_fanouts(fanouts)
            .with_exclude(ExcludeMode::ReverseTypes)
            .with_negative_sampler(NegativeSampler::degree_weighted(3, 0.75))
            .with_seed(99);
        let collator = EdgeCollator::new(&g, &eids, &config, tables.clone()).unwrap();
        assert_eq!(
            collator.collate(&[0, 5, 11]).unwrap(),
            collator.collate(&[0, 5, 11]).unwrap()
        );
    }
}

#[test]
fn empty_neighborhood_is_not_an_error() {
    // User 5 follows nobody and is followed by nobody; it only plays game 2.
    let (g, _) = hetero_graph();
    let mut nids = BTreeMap::new();
    nids.insert(user(), vec![5]);
    nids.insert(game(), vec![]);
    let config = CollatorConfig::default().with_full_neighbors(3);
    let collator = NodeCollator::new(&g, &nids, &config).unwrap();

    let batch = collator.collate(&[0]).unwrap();
    assert_eq!(batch.blocks.len(), 3);
    check_blocks(&g, &batch.blocks);
    let last = &batch.blocks[2];
    assert_eq!(last.num_edges(&follow()), 0);
    assert_eq!(last.num_edges(&followed_by()), 0);
    assert_eq!(last.global_edges(&played_by()), vec![(2, 5, 4)]);
    assert_eq!(last.src_nodes(&game()), &[2]);
}

#[test]
fn asymmetric_reverse_types_fail_the_batch() {
    let (g, _) = hetero_graph();
    let mut reverse = BTreeMap::new();
    reverse.insert(follow(), followed_by());
    let tables = ReverseTables::new().with_reverse_etypes(reverse);
    let config = CollatorConfig::default().with_exclude(ExcludeMode::ReverseTypes);
    let collator = EdgeCollator::new(&g, &all_edges(&g), &config, tables).unwrap();

    let err = collator.collate(&[0]).unwrap_err();
    assert!(matches!(err, Error::InconsistentGraph { layer: None, .. }));
}

#[test]
fn reverse_id_table_of_wrong_length_is_rejected() {
    let (g, _) = homo_graph();
    let tables = ReverseTables::new().with_reverse_eids(follow(), vec![1, 0]);
    let config = CollatorConfig::default().with_exclude(ExcludeMode::ReverseId);
    let err = EdgeCollator::new(&g, &all_edges(&g), &config, tables).unwrap_err();
    assert_eq!(
        err,
        Error::Config(ConfigError::ReverseTableLength {
            etype: follow(),
            expected: 10,
            got: 2,
        })
    );
}

#[test]
fn missing_reverse_tables_are_rejected() {
    let (g, _) = hetero_graph();
    let config = CollatorConfig::default().with_exclude(ExcludeMode::ReverseId);
    let err = EdgeCollator::new(&g, &all_edges(&g), &config, ReverseTables::new()).unwrap_err();
    assert_eq!(err, Error::Config(ConfigError::MissingReverseEids));
}

#[test]
fn unknown_fanout_key_is_rejected() {
    let (g, _) = hetero_graph();
    let mut per_type = BTreeMap::new();
    per_type.insert("likes".to_string(), Fanout::All);
    let config = CollatorConfig::default().with_fanouts(vec![LayerFanout::PerType(per_type)]);
    let err = NodeCollator::new(&g, &all_nodes(&g), &config).unwrap_err();
    assert_eq!(
        err,
        Error::Config(ConfigError::UnknownEdgeType {
            layer: 0,
            key: "likes".to_string(),
        })
    );
}

#[test]
fn empty_fanout_schedule_is_rejected() {
    let (g, _) = homo_graph();
    let config = CollatorConfig::default().with_fanouts(Vec::new());
    let err = NodeCollator::new(&g, &all_nodes(&g), &config).unwrap_err();
    assert_eq!(err, Error::Config(ConfigError::EmptyFanoutSchedule));
}
