//! Minibatch collators.
//!
//! A collator is built once per dataset and then called once per batch of
//! seed indices. Indices point into the seed universe given at construction
//! (flattened in node/edge type order), so an outer driver only needs
//! [`NodeCollator::dataset_len`] to shuffle and partition an epoch.
//!
//! Per batch, sampling runs from the output layer back toward the input:
//!
//! ```text
//! seeds ─► frontier_L ─sample/exclude/build─► block_L ─src─► frontier_{L-1} ─► … ─► block_1
//! ```
//!
//! and the blocks are returned input side first.
//!
//! Collators only borrow the graph and never mutate anything, so one
//! collator can be shared by any number of worker threads. Each worker
//! should pass its own RNG to `collate_with_rng` when it needs independent,
//! reproducible streams.

use crate::block::Block;
use crate::config::CollatorConfig;
use crate::error::{ConfigError, Result};
use crate::exclude::{ExcludeMode, ExcludedEdges, Exclusion, ReverseTables};
use crate::frontier::Frontier;
use crate::negative::PreparedNegatives;
use crate::pair::{build_pair_graphs, PairGraph, SeedEdges};
use crate::sampler::LayerPlan;
use lattix_core::{EdgeId, EdgeType, GraphView, NodeId, NodeType};
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;
use tracing::{debug, debug_span, trace};

/// Output of [`NodeCollator::collate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMiniBatch {
    /// Source nodes of the first block: whose features to load.
    pub input_nodes: BTreeMap<NodeType, Vec<NodeId>>,
    /// Seed nodes, deduplicated; destination nodes of the last block.
    pub output_nodes: BTreeMap<NodeType, Vec<NodeId>>,
    /// Universe positions of `output_nodes`, element for element.
    pub seed_indices: BTreeMap<NodeType, Vec<usize>>,
    /// Blocks, input side first.
    pub blocks: Vec<Block>,
}

/// Output of [`EdgeCollator::collate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMiniBatch {
    /// Source nodes of the first block.
    pub input_nodes: BTreeMap<NodeType, Vec<NodeId>>,
    /// Seed edges over their endpoints; its nodes are the last block's
    /// destinations.
    pub pair_graph: PairGraph,
    /// Negative edges over the same nodes as `pair_graph` (link mode only).
    pub neg_graph: Option<PairGraph>,
    /// Universe positions of the pair graph's edges, element for element.
    pub seed_indices: BTreeMap<EdgeType, Vec<usize>>,
    /// Blocks, input side first.
    pub blocks: Vec<Block>,
}

impl EdgeMiniBatch {
    /// Whether this is a link prediction minibatch.
    pub fn is_link(&self) -> bool {
        self.neg_graph.is_some()
    }

    /// Destination nodes of the last block (= pair graph nodes).
    pub fn output_nodes(&self) -> &BTreeMap<NodeType, Vec<NodeId>> {
        self.pair_graph.node_map()
    }
}

/// Flatten a per-type id map into an indexable universe, checking bounds and
/// uniqueness.
fn flatten_universe<K, F>(ids: &BTreeMap<K, Vec<usize>>, count: F) -> Result<Vec<(K, usize)>>
where
    K: Clone + Display,
    F: Fn(&K) -> lattix_core::Result<usize>,
{
    let mut universe = Vec::with_capacity(ids.values().map(Vec::len).sum());
    for (ty, list) in ids {
        let n = count(ty).map_err(|e| match e {
            lattix_core::Error::UnknownNodeType(_) | lattix_core::Error::UnknownEdgeType(_) => {
                ConfigError::UnknownSeedType(ty.to_string()).into()
            }
            other => crate::error::Error::from(other),
        })?;
        let mut seen = HashSet::with_capacity(list.len());
        for &id in list {
            if id >= n {
                return Err(ConfigError::SeedIdOutOfRange {
                    ty: ty.to_string(),
                    id,
                    count: n,
                }
                .into());
            }
            if !seen.insert(id) {
                return Err(ConfigError::DuplicateSeed {
                    ty: ty.to_string(),
                    id,
                }
                .into());
            }
            universe.push((ty.clone(), id));
        }
    }
    Ok(universe)
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Generator for one batch: the configured seed folded with the batch
/// indices, so a batch reproduces and distinct batches draw independently.
fn batch_rng(seed: Option<u64>, indices: &[usize]) -> XorShiftRng {
    match seed {
        Some(s) => {
            let mixed = indices
                .iter()
                .fold(splitmix64(s), |h, &i| splitmix64(h ^ i as u64));
            XorShiftRng::seed_from_u64(mixed)
        }
        None => XorShiftRng::seed_from_u64(rand::random()),
    }
}

fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(ConfigError::SeedOutOfRange { index, len }.into());
    }
    Ok(())
}

/// Run the layer loop from the output side back to the input side.
///
/// Blocks are collected locally and only returned once every layer built.
fn sample_blocks<G, R>(
    graph: &G,
    plans: &[LayerPlan],
    seeds: Frontier,
    excluded: &ExcludedEdges,
    rng: &mut R,
) -> Result<Vec<Block>>
where
    G: GraphView + ?Sized,
    R: Rng + ?Sized,
{
    let mut blocks = Vec::with_capacity(plans.len());
    let mut frontier = seeds;
    for (idx, plan) in plans.iter().enumerate().rev() {
        let mut layer = plan
            .sample(graph, &frontier, rng)
            .map_err(|e| e.at_layer(idx))?;
        let sampled = layer.num_edges();
        excluded.filter(idx, &mut layer)?;
        trace!(
            layer = idx,
            frontier = frontier.total(),
            sampled,
            kept = layer.num_edges(),
            "sampled layer"
        );
        let block = Block::build(graph, &frontier, &layer).map_err(|e| e.at_layer(idx))?;
        frontier = Frontier::from_map(block.src_map());
        blocks.push(block);
    }
    blocks.reverse();
    Ok(blocks)
}

/// Collator for node classification: seeds are nodes.
///
/// # Example
///
/// ```rust
/// use lattix_core::{EdgeType, HeteroGraph, NodeType};
/// use lattix_loader::{CollatorConfig, NodeCollator};
/// use std::collections::BTreeMap;
///
/// let follow = EdgeType::new("user", "follow", "user");
/// let g = HeteroGraph::from_edges(&follow, &[(0, 1), (0, 2), (0, 3), (1, 3), (1, 4)]);
///
/// let mut nids = BTreeMap::new();
/// nids.insert(NodeType::new("user"), vec![3, 4]);
/// let config = CollatorConfig::default().with_uniform_fanouts(&[2, 2]).with_seed(0);
/// let collator = NodeCollator::new(&g, &nids, &config).unwrap();
///
/// let batch = collator.collate(&[0]).unwrap();
/// assert_eq!(batch.blocks.len(), 2);
/// assert_eq!(batch.output_nodes[&NodeType::new("user")], vec![3]);
/// ```
#[derive(Debug, Clone)]
pub struct NodeCollator<'g, G: GraphView + ?Sized> {
    graph: &'g G,
    universe: Vec<(NodeType, NodeId)>,
    plans: Vec<LayerPlan>,
    seed: Option<u64>,
}

impl<'g, G: GraphView + ?Sized> NodeCollator<'g, G> {
    /// Create a collator over the seed nodes `nids`.
    pub fn new(
        graph: &'g G,
        nids: &BTreeMap<NodeType, Vec<NodeId>>,
        config: &CollatorConfig,
    ) -> Result<Self> {
        if config.negative_sampler.is_some() {
            return Err(ConfigError::NegativeSamplerInNodeMode.into());
        }
        if config.exclude != ExcludeMode::None {
            return Err(ConfigError::ExclusionInNodeMode.into());
        }
        let universe = flatten_universe(nids, |ty| graph.node_count(ty))?;
        let plans = config.sampler().resolve(graph)?;
        debug!(
            seeds = universe.len(),
            layers = plans.len(),
            "node collator ready"
        );
        Ok(Self {
            graph,
            universe,
            plans,
            seed: config.seed,
        })
    }

    /// Number of seed nodes in the universe.
    pub fn dataset_len(&self) -> usize {
        self.universe.len()
    }

    /// Number of blocks per minibatch.
    pub fn num_layers(&self) -> usize {
        self.plans.len()
    }

    /// The `(type, id)` a universe position refers to.
    pub fn seed_at(&self, index: usize) -> Option<(&NodeType, NodeId)> {
        self.universe.get(index).map(|(ty, id)| (ty, *id))
    }

    /// Collate one batch.
    ///
    /// With a configured seed the generator depends only on that seed and
    /// `indices`; without one it is freshly seeded.
    pub fn collate(&self, indices: &[usize]) -> Result<NodeMiniBatch> {
        self.collate_with_rng(indices, &mut batch_rng(self.seed, indices))
    }

    /// Collate one batch drawing randomness from `rng`.
    pub fn collate_with_rng<R: Rng + ?Sized>(
        &self,
        indices: &[usize],
        rng: &mut R,
    ) -> Result<NodeMiniBatch> {
        let _span = debug_span!("collate", mode = "node", batch = indices.len()).entered();

        let mut output = Frontier::new();
        let mut seed_indices: BTreeMap<NodeType, Vec<usize>> = BTreeMap::new();
        for &index in indices {
            check_index(index, self.universe.len())?;
            let (ty, id) = &self.universe[index];
            if output.get(ty).is_some_and(|s| s.contains(*id)) {
                continue;
            }
            output.insert(ty, *id);
            seed_indices.entry(ty.clone()).or_default().push(index);
        }

        let blocks = sample_blocks(
            self.graph,
            &self.plans,
            output,
            &ExcludedEdges::default(),
            rng,
        )?;
        let input_nodes = blocks
            .first()
            .map(|b| b.src_map().clone())
            .unwrap_or_default();
        let output_nodes = blocks
            .last()
            .map(|b| b.dst_map().clone())
            .unwrap_or_default();

        Ok(NodeMiniBatch {
            input_nodes,
            output_nodes,
            seed_indices,
            blocks,
        })
    }
}

/// Collator for edge classification and link prediction: seeds are edges.
///
/// Without a negative sampler this is edge mode; with one it is link mode and
/// every minibatch carries a negative pair graph.
#[derive(Debug, Clone)]
pub struct EdgeCollator<'g, G: GraphView + ?Sized> {
    graph: &'g G,
    universe: Vec<(EdgeType, EdgeId)>,
    plans: Vec<LayerPlan>,
    exclusion: Exclusion,
    negatives: Option<PreparedNegatives>,
    seed: Option<u64>,
}

impl<'g, G: GraphView + ?Sized> EdgeCollator<'g, G> {
    /// Create a collator over the seed edges `eids`.
    pub fn new(
        graph: &'g G,
        eids: &BTreeMap<EdgeType, Vec<EdgeId>>,
        config: &CollatorConfig,
        tables: ReverseTables,
    ) -> Result<Self> {
        let universe = flatten_universe(eids, |et| graph.edge_count(et))?;
        let plans = config.sampler().resolve(graph)?;
        let exclusion = Exclusion::resolve(config.exclude, tables, graph)?;
        let negatives = config
            .negative_sampler
            .as_ref()
            .map(|ns| ns.prepare(graph))
            .transpose()?;
        debug!(
            seeds = universe.len(),
            layers = plans.len(),
            exclude = ?exclusion.mode(),
            negatives = negatives.as_ref().map_or(0, |p| p.sampler().k()),
            "edge collator ready"
        );
        Ok(Self {
            graph,
            universe,
            plans,
            exclusion,
            negatives,
            seed: config.seed,
        })
    }

    /// Number of seed edges in the universe.
    pub fn dataset_len(&self) -> usize {
        self.universe.len()
    }

    /// Number of blocks per minibatch.
    pub fn num_layers(&self) -> usize {
        self.plans.len()
    }

    /// Whether minibatches carry a negative graph.
    pub fn is_link(&self) -> bool {
        self.negatives.is_some()
    }

    /// The `(type, id)` a universe position refers to.
    pub fn seed_at(&self, index: usize) -> Option<(&EdgeType, EdgeId)> {
        self.universe.get(index).map(|(et, id)| (et, *id))
    }

    /// Collate one batch.
    ///
    /// With a configured seed the generator depends only on that seed and
    /// `indices`; without one it is freshly seeded.
    pub fn collate(&self, indices: &[usize]) -> Result<EdgeMiniBatch> {
        self.collate_with_rng(indices, &mut batch_rng(self.seed, indices))
    }

    /// Collate one batch drawing randomness from `rng`.
    pub fn collate_with_rng<R: Rng + ?Sized>(
        &self,
        indices: &[usize],
        rng: &mut R,
    ) -> Result<EdgeMiniBatch> {
        let mode = if self.is_link() { "link" } else { "edge" };
        let _span = debug_span!("collate", mode, batch = indices.len()).entered();

        let mut picked: BTreeMap<EdgeType, Vec<EdgeId>> = BTreeMap::new();
        let mut seen: HashSet<usize> = HashSet::with_capacity(indices.len());
        let mut seed_indices: BTreeMap<EdgeType, Vec<usize>> = BTreeMap::new();
        for &index in indices {
            check_index(index, self.universe.len())?;
            if !seen.insert(index) {
                continue;
            }
            let (et, eid) = &self.universe[index];
            picked.entry(et.clone()).or_default().push(*eid);
            seed_indices.entry(et.clone()).or_default().push(index);
        }

        let mut seeds = BTreeMap::new();
        for (et, eids) in picked {
            let edges = SeedEdges::resolve(self.graph, &et, eids)?;
            seeds.insert(et, edges);
        }

        let negatives = self
            .negatives
            .as_ref()
            .map(|p| p.negate(self.graph, &seeds, rng))
            .transpose()?;
        let (pair_graph, neg_graph) = build_pair_graphs(self.graph, &seeds, negatives.as_ref());
        let excluded = self.exclusion.excluded(&seeds)?;

        let blocks = sample_blocks(
            self.graph,
            &self.plans,
            Frontier::from_map(pair_graph.node_map()),
            &excluded,
            rng,
        )?;
        let input_nodes = blocks
            .first()
            .map(|b| b.src_map().clone())
            .unwrap_or_default();

        Ok(EdgeMiniBatch {
            input_nodes,
            pair_graph,
            neg_graph,
            seed_indices,
            blocks,
        })
    }
}
