//! Negative edge synthesis for link prediction.
//!
//! Every strategy corrupts the destination: for a seed `u -> v` it keeps `u`
//! and draws `k` replacement destinations from the destination type's full
//! id range.
//!
//! | Strategy | Destination distribution |
//! |----------|--------------------------|
//! | [`NegativeSampler::Uniform`] | uniform over `0..node_count` |
//! | [`NegativeSampler::DegreeWeighted`] | `P(v) ∝ in_degree(v)^exponent` |
//!
//! Draws may collide with real edges. With `unique` set, a draw that hits an
//! existing edge is redrawn a bounded number of times and dropped if it never
//! lands on a non-edge.
//!
//! Destination distributions depend only on the graph, so they are built once
//! by [`NegativeSampler::prepare`] and shared read-only by every minibatch.

use crate::error::{ConfigError, Result};
use crate::pair::{NegativeEdges, SeedEdges};
use lattix_core::{EdgeType, GraphView, NodeId};
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

const MAX_RETRIES: usize = 16;

fn default_exponent() -> f64 {
    0.75
}

/// Negative sampling strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum NegativeSampler {
    /// Uniform destination corruption.
    Uniform {
        /// Negatives per seed edge.
        k: usize,
        /// Reject draws that are existing edges.
        #[serde(default)]
        unique: bool,
    },
    /// Destination corruption weighted by in-degree.
    DegreeWeighted {
        /// Negatives per seed edge.
        k: usize,
        /// Degree exponent (default 0.75).
        #[serde(default = "default_exponent")]
        exponent: f64,
        /// Reject draws that are existing edges.
        #[serde(default)]
        unique: bool,
    },
}

#[derive(Debug, Clone)]
enum DstDraw {
    Uniform(usize),
    Weighted(WeightedIndex<f64>),
}

impl DstDraw {
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> NodeId {
        match self {
            Self::Uniform(n) => rng.gen_range(0..*n),
            Self::Weighted(w) => w.sample(rng),
        }
    }
}

impl NegativeSampler {
    /// Uniform sampler with `k` negatives per seed.
    pub fn uniform(k: usize) -> Self {
        Self::Uniform { k, unique: false }
    }

    /// Degree-weighted sampler with `k` negatives per seed.
    pub fn degree_weighted(k: usize, exponent: f64) -> Self {
        Self::DegreeWeighted {
            k,
            exponent,
            unique: false,
        }
    }

    /// Require negatives that are not existing edges.
    pub fn with_unique(mut self, value: bool) -> Self {
        match &mut self {
            Self::Uniform { unique, .. } | Self::DegreeWeighted { unique, .. } => *unique = value,
        }
        self
    }

    /// Negatives per seed edge.
    pub fn k(&self) -> usize {
        match self {
            Self::Uniform { k, .. } | Self::DegreeWeighted { k, .. } => *k,
        }
    }

    fn unique(&self) -> bool {
        match self {
            Self::Uniform { unique, .. } | Self::DegreeWeighted { unique, .. } => *unique,
        }
    }

    /// Build the destination distribution of every edge type of `graph`.
    ///
    /// Degree weighting reads every destination's in-degree, so this is
    /// linear in the graph and meant to run once per collator.
    pub fn prepare<G: GraphView + ?Sized>(&self, graph: &G) -> Result<PreparedNegatives> {
        if let Self::DegreeWeighted { exponent, .. } = self {
            if !exponent.is_finite() {
                return Err(ConfigError::InvalidExponent(exponent.to_string()).into());
            }
        }
        let mut draws = BTreeMap::new();
        for etype in graph.edge_types() {
            let n = graph.node_count(&etype.dst_type)?;
            let draw = self.dst_draw(graph, &etype, n)?;
            draws.insert(etype, draw);
        }
        debug!(edge_types = draws.len(), k = self.k(), "negative tables built");
        Ok(PreparedNegatives {
            sampler: self.clone(),
            draws,
        })
    }

    fn dst_draw<G: GraphView + ?Sized>(
        &self,
        graph: &G,
        etype: &EdgeType,
        n: usize,
    ) -> Result<DstDraw> {
        let Self::DegreeWeighted { exponent, .. } = self else {
            return Ok(DstDraw::Uniform(n));
        };
        let mut weights = Vec::with_capacity(n);
        for v in 0..n {
            let d = graph.in_degree(etype, v)?;
            let w = if d == 0 { 0.0 } else { (d as f64).powf(*exponent) };
            if !w.is_finite() {
                return Err(ConfigError::InvalidExponent(exponent.to_string()).into());
            }
            weights.push(w);
        }
        match WeightedIndex::new(&weights) {
            Ok(w) => Ok(DstDraw::Weighted(w)),
            // No edges of this type: it can never be seeded.
            Err(WeightedError::NoItem | WeightedError::AllWeightsZero) => Ok(DstDraw::Uniform(n)),
            Err(_) => Err(ConfigError::InvalidExponent(exponent.to_string()).into()),
        }
    }
}

/// A [`NegativeSampler`] with its per-edge-type destination distributions.
///
/// Read-only after construction; safe to share across workers.
#[derive(Debug, Clone)]
pub struct PreparedNegatives {
    sampler: NegativeSampler,
    draws: BTreeMap<EdgeType, DstDraw>,
}

impl PreparedNegatives {
    /// The strategy these tables were built for.
    pub fn sampler(&self) -> &NegativeSampler {
        &self.sampler
    }

    /// Synthesize negatives for every seed edge, `k` per seed, in seed order.
    pub fn negate<G, R>(
        &self,
        graph: &G,
        seeds: &BTreeMap<EdgeType, SeedEdges>,
        rng: &mut R,
    ) -> Result<BTreeMap<EdgeType, NegativeEdges>>
    where
        G: GraphView + ?Sized,
        R: Rng + ?Sized,
    {
        let k = self.sampler.k();
        let mut out = BTreeMap::new();
        for (etype, s) in seeds {
            let mut negs = NegativeEdges::default();
            let n = graph.node_count(&etype.dst_type)?;
            if n > 0 && !s.is_empty() && k > 0 {
                let fallback = DstDraw::Uniform(n);
                let draw = self.draws.get(etype).unwrap_or(&fallback);
                for &u in &s.src {
                    for _ in 0..k {
                        if let Some(v) = self.draw_one(graph, etype, u, draw, rng)? {
                            negs.src.push(u);
                            negs.dst.push(v);
                        }
                    }
                }
            }
            out.insert(etype.clone(), negs);
        }
        Ok(out)
    }

    fn draw_one<G, R>(
        &self,
        graph: &G,
        etype: &EdgeType,
        u: NodeId,
        draw: &DstDraw,
        rng: &mut R,
    ) -> Result<Option<NodeId>>
    where
        G: GraphView + ?Sized,
        R: Rng + ?Sized,
    {
        if !self.sampler.unique() {
            return Ok(Some(draw.draw(rng)));
        }
        for _ in 0..MAX_RETRIES {
            let v = draw.draw(rng);
            if !graph.has_edge_between(etype, u, v)? {
                return Ok(Some(v));
            }
        }
        warn!(etype = %etype, src = u, retries = MAX_RETRIES, "dropping negative: no non-edge found");
        Ok(None)
    }
}
