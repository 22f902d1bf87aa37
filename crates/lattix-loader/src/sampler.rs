//! Per-layer neighbor sampling.
//!
//! A [`MultiLayerNeighborSampler`] holds one [`LayerFanout`] per GNN layer,
//! input side first. At collator construction it is resolved against the
//! graph's edge types into [`LayerPlan`]s, and each plan turns a frontier
//! into a [`SampledLayer`].
//!
//! Two strategies exist, chosen per edge type by [`Fanout`]:
//!
//! - [`Fanout::All`] keeps every incoming edge of every frontier node
//! - [`Fanout::Uniform`] keeps at most `k` incoming edges per node, drawn
//!   without replacement; nodes with `<= k` in-edges keep all of them
//!
//! # Example
//!
//! ```rust
//! use lattix_core::{EdgeType, HeteroGraph, NodeType};
//! use lattix_loader::frontier::Frontier;
//! use lattix_loader::sampler::MultiLayerNeighborSampler;
//! use rand::SeedableRng;
//! use rand_xorshift::XorShiftRng;
//!
//! let follow = EdgeType::new("user", "follow", "user");
//! let g = HeteroGraph::from_edges(&follow, &[(0, 3), (1, 3), (2, 3)]);
//!
//! let plans = MultiLayerNeighborSampler::uniform(&[2]).resolve(&g).unwrap();
//! let mut frontier = Frontier::new();
//! frontier.insert(&NodeType::new("user"), 3);
//!
//! let mut rng = XorShiftRng::seed_from_u64(42);
//! let layer = plans[0].sample(&g, &frontier, &mut rng).unwrap();
//! assert_eq!(layer.edges(&follow).len(), 2);
//! ```

use crate::error::{ConfigError, Result};
use crate::frontier::Frontier;
use lattix_core::{EdgeType, GraphView, Neighbor};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How many in-edges of one edge type a destination keeps per layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fanout {
    /// Every incoming edge.
    All,
    /// At most `k` incoming edges, uniformly without replacement.
    Uniform(usize),
}

impl Fanout {
    fn pick<R: Rng + ?Sized>(self, candidates: &[Neighbor], rng: &mut R, out: &mut Vec<Neighbor>) {
        match self {
            Self::Uniform(k) if candidates.len() > k => {
                let mut chosen: Vec<Neighbor> =
                    candidates.choose_multiple(rng, k).copied().collect();
                chosen.sort_unstable_by_key(|n| n.eid);
                out.extend(chosen);
            }
            _ => out.extend_from_slice(candidates),
        }
    }
}

/// Fanout for one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerFanout {
    /// Same fanout for every edge type.
    Scalar(Fanout),
    /// Per edge type, keyed by relation name or canonical `src:rel:dst`.
    /// Edge types not named sample nothing.
    PerType(BTreeMap<String, Fanout>),
}

impl LayerFanout {
    fn resolve(&self, layer: usize, edge_types: &[EdgeType]) -> std::result::Result<LayerPlan, ConfigError> {
        let check = |key: &str, f: Fanout| match f {
            Fanout::Uniform(0) => Err(ConfigError::ZeroFanout {
                layer,
                key: key.to_string(),
            }),
            _ => Ok(()),
        };
        let fanouts = match self {
            Self::Scalar(f) => {
                check("*", *f)?;
                edge_types.iter().map(|et| (et.clone(), *f)).collect()
            }
            Self::PerType(map) => {
                let mut fanouts = BTreeMap::new();
                for (key, f) in map {
                    check(key, *f)?;
                    let etype = resolve_key(layer, key, edge_types)?;
                    fanouts.insert(etype, *f);
                }
                fanouts
            }
        };
        Ok(LayerPlan { fanouts })
    }
}

fn resolve_key(
    layer: usize,
    key: &str,
    edge_types: &[EdgeType],
) -> std::result::Result<EdgeType, ConfigError> {
    let unknown = || ConfigError::UnknownEdgeType {
        layer,
        key: key.to_string(),
    };
    if key.contains(':') {
        let etype: EdgeType = key.parse().map_err(|_| unknown())?;
        return if edge_types.contains(&etype) {
            Ok(etype)
        } else {
            Err(unknown())
        };
    }
    let mut matches = edge_types.iter().filter(|et| et.relation == key);
    match (matches.next(), matches.next()) {
        (Some(et), None) => Ok(et.clone()),
        (Some(_), Some(_)) => Err(ConfigError::AmbiguousRelation {
            layer,
            key: key.to_string(),
        }),
        (None, _) => Err(unknown()),
    }
}

/// Sampled incoming edges per edge type for one layer.
///
/// Holds an entry for every edge type of the graph, empty when nothing
/// was sampled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampledLayer {
    edges: BTreeMap<EdgeType, Vec<Neighbor>>,
}

impl SampledLayer {
    /// Build from per-type edge lists.
    pub fn from_edges(edges: BTreeMap<EdgeType, Vec<Neighbor>>) -> Self {
        Self { edges }
    }

    /// Sampled edges of a type; empty when the type is absent.
    pub fn edges(&self, etype: &EdgeType) -> &[Neighbor] {
        self.edges.get(etype).map_or(&[][..], Vec::as_slice)
    }

    /// Whether the layer carries an entry for `etype`.
    pub fn contains_type(&self, etype: &EdgeType) -> bool {
        self.edges.contains_key(etype)
    }

    /// Iterate over (edge type, edges), ordered by type.
    pub fn iter(&self) -> impl Iterator<Item = (&EdgeType, &[Neighbor])> {
        self.edges.iter().map(|(et, es)| (et, es.as_slice()))
    }

    /// Total sampled edges.
    pub fn num_edges(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Keep only edges for which `keep(etype, edge)` holds.
    pub fn retain(&mut self, mut keep: impl FnMut(&EdgeType, &Neighbor) -> bool) {
        for (etype, edges) in &mut self.edges {
            edges.retain(|e| keep(etype, e));
        }
    }
}

/// One layer's fanout resolved against a concrete graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPlan {
    fanouts: BTreeMap<EdgeType, Fanout>,
}

impl LayerPlan {
    /// Fanout for an edge type; `None` means nothing is sampled.
    pub fn fanout(&self, etype: &EdgeType) -> Option<Fanout> {
        self.fanouts.get(etype).copied()
    }

    /// Sample incoming edges of every frontier node.
    ///
    /// Destinations without in-edges contribute nothing.
    pub fn sample<G, R>(&self, graph: &G, frontier: &Frontier, rng: &mut R) -> Result<SampledLayer>
    where
        G: GraphView + ?Sized,
        R: Rng + ?Sized,
    {
        let mut edges = BTreeMap::new();
        for etype in graph.edge_types() {
            let mut kept = Vec::new();
            let dsts = frontier.ids(&etype.dst_type);
            if let (Some(fanout), false) = (self.fanout(&etype), dsts.is_empty()) {
                let candidates = graph.neighbors_of(&etype, dsts)?;
                let mut start = 0;
                while start < candidates.len() {
                    let dst = candidates[start].dst;
                    let mut end = start + 1;
                    while end < candidates.len() && candidates[end].dst == dst {
                        end += 1;
                    }
                    fanout.pick(&candidates[start..end], rng, &mut kept);
                    start = end;
                }
            }
            edges.insert(etype, kept);
        }
        Ok(SampledLayer { edges })
    }
}

/// Multi-layer neighbor sampler for GraphSAGE-style minibatch training.
///
/// `fanouts[0]` feeds the first (input-side) block, the last entry feeds the
/// block that produces the seed outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiLayerNeighborSampler {
    fanouts: Vec<LayerFanout>,
}

impl MultiLayerNeighborSampler {
    /// Create a sampler from an explicit schedule.
    pub fn new(fanouts: Vec<LayerFanout>) -> Self {
        Self { fanouts }
    }

    /// Full-neighbor sampling for `num_layers` layers.
    pub fn full(num_layers: usize) -> Self {
        Self::new(vec![LayerFanout::Scalar(Fanout::All); num_layers])
    }

    /// Uniform sampling with one scalar fanout per layer.
    pub fn uniform(fanouts: &[usize]) -> Self {
        Self::new(
            fanouts
                .iter()
                .map(|&k| LayerFanout::Scalar(Fanout::Uniform(k)))
                .collect(),
        )
    }

    /// Number of layers (= number of blocks per minibatch).
    pub fn num_layers(&self) -> usize {
        self.fanouts.len()
    }

    /// Resolve every layer's fanout against the graph's edge types.
    pub fn resolve<G: GraphView + ?Sized>(
        &self,
        graph: &G,
    ) -> std::result::Result<Vec<LayerPlan>, ConfigError> {
        if self.fanouts.is_empty() {
            return Err(ConfigError::EmptyFanoutSchedule);
        }
        let edge_types = graph.edge_types();
        self.fanouts
            .iter()
            .enumerate()
            .map(|(layer, f)| f.resolve(layer, &edge_types))
            .collect()
    }
}
