//! Edge exclusion for edge and link prediction minibatches.
//!
//! Sampling the neighborhood of a seed edge's endpoints would otherwise pull
//! the seed edge itself (or its reverse twin) into the blocks, letting the
//! model read off the label it is asked to predict.
//!
//! | Mode | Removed from every sampled layer |
//! |------|----------------------------------|
//! | `none` | nothing |
//! | `self` | the seed edges (matched by edge id) |
//! | `reverse_id` | seeds plus `reverse_eids[etype][seed]` in the same edge type |
//! | `reverse_types` | seeds plus any edge of the reverse type joining `v -> u` for seed `u -> v` |
//!
//! Only those exact edges go; other edges touching the same nodes stay.

use crate::error::{ConfigError, Error, Result};
use crate::pair::SeedEdges;
use crate::sampler::SampledLayer;
use lattix_core::{EdgeId, EdgeType, GraphView, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Which edges to strip from sampled layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcludeMode {
    /// Keep everything.
    #[default]
    None,
    /// Drop the seed edges.
    #[serde(rename = "self")]
    SelfEdges,
    /// Drop seeds and their reverse edges by id.
    ReverseId,
    /// Drop seeds and the reverse-type edge joining the same endpoints.
    ReverseTypes,
}

/// Lookup tables for the reverse exclusion modes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseTables {
    /// `reverse_eids[etype][e]` is the id of the edge pairing with `e`.
    pub reverse_eids: Option<BTreeMap<EdgeType, Vec<EdgeId>>>,
    /// Edge type to its reverse edge type; must be symmetric.
    pub reverse_etypes: Option<BTreeMap<EdgeType, EdgeType>>,
}

impl ReverseTables {
    /// No tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reverse edge-id table for one edge type.
    pub fn with_reverse_eids(mut self, etype: EdgeType, reverse: Vec<EdgeId>) -> Self {
        self.reverse_eids
            .get_or_insert_with(BTreeMap::new)
            .insert(etype, reverse);
        self
    }

    /// Set the reverse edge-type map.
    pub fn with_reverse_etypes(mut self, map: BTreeMap<EdgeType, EdgeType>) -> Self {
        self.reverse_etypes = Some(map);
        self
    }
}

/// A resolved exclusion policy; stateless across minibatches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    /// Identity.
    None,
    /// Seed edges only.
    SelfEdges,
    /// Seeds plus reverse ids.
    ReverseId(BTreeMap<EdgeType, Vec<EdgeId>>),
    /// Seeds plus reverse-type endpoint matches.
    ReverseTypes(BTreeMap<EdgeType, EdgeType>),
}

impl Exclusion {
    /// Pair a mode with its table, validating what can be checked up front.
    pub fn resolve<G: GraphView + ?Sized>(
        mode: ExcludeMode,
        tables: ReverseTables,
        graph: &G,
    ) -> std::result::Result<Self, ConfigError> {
        match mode {
            ExcludeMode::None => Ok(Self::None),
            ExcludeMode::SelfEdges => Ok(Self::SelfEdges),
            ExcludeMode::ReverseId => {
                let table = tables.reverse_eids.ok_or(ConfigError::MissingReverseEids)?;
                for (etype, reverse) in &table {
                    // Unknown types surface per layer during collate.
                    let Ok(expected) = graph.edge_count(etype) else {
                        continue;
                    };
                    if reverse.len() != expected {
                        return Err(ConfigError::ReverseTableLength {
                            etype: etype.clone(),
                            expected,
                            got: reverse.len(),
                        });
                    }
                    if let Some(eid) = reverse.iter().position(|&r| r >= expected) {
                        return Err(ConfigError::ReverseIdOutOfRange {
                            etype: etype.clone(),
                            eid,
                            reverse: reverse[eid],
                        });
                    }
                }
                Ok(Self::ReverseId(table))
            }
            ExcludeMode::ReverseTypes => tables
                .reverse_etypes
                .map(Self::ReverseTypes)
                .ok_or(ConfigError::MissingReverseEtypes),
        }
    }

    /// The mode this policy implements.
    pub fn mode(&self) -> ExcludeMode {
        match self {
            Self::None => ExcludeMode::None,
            Self::SelfEdges => ExcludeMode::SelfEdges,
            Self::ReverseId(_) => ExcludeMode::ReverseId,
            Self::ReverseTypes(_) => ExcludeMode::ReverseTypes,
        }
    }

    /// Edges to strip for one minibatch's seeds.
    pub fn excluded(&self, seeds: &BTreeMap<EdgeType, SeedEdges>) -> Result<ExcludedEdges> {
        let mut out = ExcludedEdges::default();
        if matches!(self, Self::None) {
            return Ok(out);
        }
        for (etype, edges) in seeds {
            out.ids
                .entry(etype.clone())
                .or_default()
                .extend(edges.eids.iter().copied());
        }

        match self {
            Self::None | Self::SelfEdges => {}
            Self::ReverseId(table) => {
                out.required.extend(table.keys().cloned());
                for (etype, edges) in seeds {
                    let Some(reverse) = table.get(etype) else {
                        continue;
                    };
                    let ids = out.ids.entry(etype.clone()).or_default();
                    for &eid in &edges.eids {
                        let rev = reverse.get(eid).copied().ok_or_else(|| Error::InconsistentGraph {
                            layer: None,
                            etype: etype.clone(),
                            reason: format!("reverse table has no entry for edge {eid}"),
                        })?;
                        ids.insert(rev);
                    }
                }
            }
            Self::ReverseTypes(map) => {
                check_reverse_types(map)?;
                out.required.extend(map.keys().cloned());
                for (etype, edges) in seeds {
                    let Some(rev) = map.get(etype) else {
                        continue;
                    };
                    let pairs = out.pairs.entry(rev.clone()).or_default();
                    pairs.extend(edges.dst.iter().copied().zip(edges.src.iter().copied()));
                }
            }
        }
        Ok(out)
    }
}

fn check_reverse_types(map: &BTreeMap<EdgeType, EdgeType>) -> Result<()> {
    for (etype, rev) in map {
        if map.get(rev) != Some(etype) {
            return Err(Error::InconsistentGraph {
                layer: None,
                etype: rev.clone(),
                reason: format!("reverse edge-type map is not symmetric: {etype} -> {rev} has no way back"),
            });
        }
        if rev.src_type != etype.dst_type || rev.dst_type != etype.src_type {
            return Err(Error::InconsistentGraph {
                layer: None,
                etype: rev.clone(),
                reason: format!("{rev} does not run opposite to {etype}"),
            });
        }
    }
    Ok(())
}

/// Edges removed from every layer of one minibatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedEdges {
    ids: BTreeMap<EdgeType, HashSet<EdgeId>>,
    pairs: BTreeMap<EdgeType, HashSet<(NodeId, NodeId)>>,
    required: Vec<EdgeType>,
}

impl ExcludedEdges {
    /// Whether nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.ids.values().all(HashSet::is_empty) && self.pairs.values().all(HashSet::is_empty)
    }

    /// Whether `eid` of `etype` is excluded by id.
    pub fn contains_id(&self, etype: &EdgeType, eid: EdgeId) -> bool {
        self.ids.get(etype).is_some_and(|s| s.contains(&eid))
    }

    /// Whether the `src -> dst` edges of `etype` are excluded.
    pub fn contains_pair(&self, etype: &EdgeType, src: NodeId, dst: NodeId) -> bool {
        self.pairs.get(etype).is_some_and(|s| s.contains(&(src, dst)))
    }

    /// Strip excluded edges from one sampled layer.
    ///
    /// Fails when a lookup table names an edge type the layer does not carry.
    pub fn filter(&self, layer_idx: usize, layer: &mut SampledLayer) -> Result<()> {
        if let Some(etype) = self.required.iter().find(|et| !layer.contains_type(et)) {
            return Err(Error::InconsistentGraph {
                layer: Some(layer_idx),
                etype: etype.clone(),
                reason: "exclusion table names an edge type absent from the sampled layer".into(),
            });
        }
        if self.is_empty() {
            return Ok(());
        }
        layer.retain(|etype, e| {
            !self.contains_id(etype, e.eid) && !self.contains_pair(etype, e.src, e.dst)
        });
        Ok(())
    }
}
