//! Collator configuration.
//!
//! Everything that can be written down in a document lives in
//! [`CollatorConfig`]; lookup tables that are arrays over the graph's edges
//! are passed separately as [`ReverseTables`](crate::exclude::ReverseTables).
//!
//! ```rust
//! use lattix_loader::config::CollatorConfig;
//! use lattix_loader::exclude::ExcludeMode;
//!
//! let config = CollatorConfig::from_json(
//!     r#"{
//!         "fanouts": [{"scalar": {"uniform": 10}}, {"scalar": "all"}],
//!         "exclude": "reverse_id",
//!         "negative_sampler": {"strategy": "uniform", "k": 5},
//!         "seed": 42
//!     }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.fanouts.len(), 2);
//! assert_eq!(config.exclude, ExcludeMode::ReverseId);
//! ```

use crate::error::ConfigError;
use crate::exclude::ExcludeMode;
use crate::negative::NegativeSampler;
use crate::sampler::{Fanout, LayerFanout, MultiLayerNeighborSampler};
use serde::{Deserialize, Serialize};

/// Collator configuration, captured once at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollatorConfig {
    /// One fanout per layer, input side first (default: two layers of 10).
    pub fanouts: Vec<LayerFanout>,
    /// Edge exclusion mode (default: none).
    pub exclude: ExcludeMode,
    /// Negative sampler; turns an edge collator into link mode.
    pub negative_sampler: Option<NegativeSampler>,
    /// Fixed random seed; `None` draws from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for CollatorConfig {
    fn default() -> Self {
        Self {
            fanouts: vec![LayerFanout::Scalar(Fanout::Uniform(10)); 2],
            exclude: ExcludeMode::None,
            negative_sampler: None,
            seed: None,
        }
    }
}

impl CollatorConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn with_fanouts(mut self, fanouts: Vec<LayerFanout>) -> Self {
        self.fanouts = fanouts;
        self
    }

    pub fn with_uniform_fanouts(mut self, fanouts: &[usize]) -> Self {
        self.fanouts = fanouts
            .iter()
            .map(|&k| LayerFanout::Scalar(Fanout::Uniform(k)))
            .collect();
        self
    }

    pub fn with_full_neighbors(mut self, num_layers: usize) -> Self {
        self.fanouts = vec![LayerFanout::Scalar(Fanout::All); num_layers];
        self
    }

    pub fn with_exclude(mut self, exclude: ExcludeMode) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_negative_sampler(mut self, sampler: NegativeSampler) -> Self {
        self.negative_sampler = Some(sampler);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The layer sampler described by `fanouts`.
    pub fn sampler(&self) -> MultiLayerNeighborSampler {
        MultiLayerNeighborSampler::new(self.fanouts.clone())
    }
}
