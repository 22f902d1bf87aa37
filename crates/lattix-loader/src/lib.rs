#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

//! Neighbor-sampling minibatch construction for GNN training.
//!
//! Turns a batch of seed nodes or seed edges into the chain of bipartite
//! blocks a multi-layer GNN needs to produce predictions for exactly those
//! seeds.
//!
//! | Mode | Collator | Seeds | Extra output |
//! |------|----------|-------|--------------|
//! | node | [`NodeCollator`] | node ids | - |
//! | edge | [`EdgeCollator`] | edge ids | pair graph |
//! | link | [`EdgeCollator`] + [`NegativeSampler`] | edge ids | pair graph, negative graph |
//!
//! Pieces, in pipeline order:
//!
//! - [`sampler`] - per-layer fanout (full or uniform) over incoming edges
//! - [`exclude`] - strips seed edges and their reverses from sampled layers
//! - [`block`] - relabels a sampled layer into a [`Block`] with the
//!   destination-prefix layout
//! - [`negative`] - synthesizes corrupted edges for link prediction
//! - [`pair`] - the seed and negative pair graphs
//! - [`collator`] - orchestration and seed bookkeeping
//!
//! [`batch`] is the unrelated whole-graph path for graph-level tasks.
//!
//! # Example
//!
//! ```rust
//! use lattix_core::{EdgeType, HeteroGraph, NodeType};
//! use lattix_loader::{CollatorConfig, EdgeCollator, ExcludeMode, NegativeSampler, ReverseTables};
//! use std::collections::BTreeMap;
//!
//! let follow = EdgeType::new("user", "follow", "user");
//! let g = HeteroGraph::from_edges(&follow, &[(0, 1), (0, 2), (0, 3), (1, 3), (1, 4)]);
//!
//! let mut eids = BTreeMap::new();
//! eids.insert(follow.clone(), (0..5).collect());
//! let config = CollatorConfig::default()
//!     .with_uniform_fanouts(&[2, 2])
//!     .with_exclude(ExcludeMode::SelfEdges)
//!     .with_negative_sampler(NegativeSampler::uniform(2))
//!     .with_seed(7);
//! let collator = EdgeCollator::new(&g, &eids, &config, ReverseTables::new()).unwrap();
//!
//! let batch = collator.collate(&[0, 1]).unwrap();
//! let neg = batch.neg_graph.as_ref().unwrap();
//! assert_eq!(neg.node_map(), batch.pair_graph.node_map());
//! assert_eq!(batch.blocks.last().unwrap().dst_map(), batch.pair_graph.node_map());
//! let user = NodeType::new("user");
//! assert!(batch.input_nodes[&user].len() >= batch.pair_graph.nodes(&user).len());
//! ```

pub mod batch;
pub mod block;
pub mod collator;
pub mod config;
mod error;
pub mod exclude;
pub mod frontier;
pub mod negative;
pub mod pair;
pub mod sampler;

pub use batch::{BatchedGraph, GraphCollator};
pub use block::{Block, BlockEdges};
pub use collator::{EdgeCollator, EdgeMiniBatch, NodeCollator, NodeMiniBatch};
pub use config::CollatorConfig;
pub use error::{ConfigError, Error, Result};
pub use exclude::{ExcludeMode, ReverseTables};
pub use negative::{NegativeSampler, PreparedNegatives};
pub use pair::{PairEdges, PairGraph};
pub use sampler::{Fanout, LayerFanout, MultiLayerNeighborSampler};
