//! Error types for lattix-loader.

use lattix_core::{EdgeId, EdgeType};
use thiserror::Error;

/// Configuration problems, raised when a collator is built or a seed batch
/// is resolved. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The fanout schedule has no layers.
    #[error("fanout schedule is empty")]
    EmptyFanoutSchedule,

    /// A per-relation fanout names no edge type of the graph.
    #[error("layer {layer}: fanout key `{key}` matches no edge type")]
    UnknownEdgeType {
        /// Layer index, input side first.
        layer: usize,
        /// Offending key.
        key: String,
    },

    /// Uniform fanout with `k = 0`.
    #[error("layer {layer}: uniform fanout for `{key}` must be positive")]
    ZeroFanout {
        /// Layer index, input side first.
        layer: usize,
        /// Fanout key, or `*` for a scalar fanout.
        key: String,
    },

    /// A bare relation name in a fanout map matches several edge types.
    #[error("layer {layer}: relation `{key}` is ambiguous, use src:relation:dst")]
    AmbiguousRelation {
        /// Layer index, input side first.
        layer: usize,
        /// Offending key.
        key: String,
    },

    /// Negative sampling only makes sense for edge seeds.
    #[error("negative sampler configured on a node collator")]
    NegativeSamplerInNodeMode,

    /// Node seeds are not edges, so there is nothing to exclude.
    #[error("edge exclusion configured on a node collator")]
    ExclusionInNodeMode,

    /// Degree exponent yields non-finite sampling weights.
    #[error("degree-weighted negative sampler: exponent {0} gives non-finite weights")]
    InvalidExponent(String),

    /// The seed universe names a type the graph does not have.
    #[error("seed type {0} is not in the graph")]
    UnknownSeedType(String),

    /// `reverse_id` exclusion without a reverse edge-id table.
    #[error("exclude = reverse_id requires reverse edge ids")]
    MissingReverseEids,

    /// `reverse_types` exclusion without a reverse edge-type map.
    #[error("exclude = reverse_types requires a reverse edge-type map")]
    MissingReverseEtypes,

    /// Reverse edge-id table does not cover its edge type.
    #[error("reverse edge ids for {etype}: expected {expected} entries, got {got}")]
    ReverseTableLength {
        /// Edge type of the table.
        etype: EdgeType,
        /// Number of edges of that type.
        expected: usize,
        /// Table length.
        got: usize,
    },

    /// Reverse edge-id table entry outside its edge type.
    #[error("reverse id of edge {eid} in {etype} is {reverse}, out of range")]
    ReverseIdOutOfRange {
        /// Edge type of the table.
        etype: EdgeType,
        /// Edge whose entry is bad.
        eid: EdgeId,
        /// Table entry.
        reverse: EdgeId,
    },

    /// Seed index outside the configured universe.
    #[error("seed index {index} out of range (dataset length {len})")]
    SeedOutOfRange {
        /// Offending index.
        index: usize,
        /// Universe size.
        len: usize,
    },

    /// Universe entry outside the graph's id range for its type.
    #[error("seed id {id} of {ty} out of range ({count} in graph)")]
    SeedIdOutOfRange {
        /// Node or edge type name.
        ty: String,
        /// Offending id.
        id: usize,
        /// Number of nodes or edges of that type.
        count: usize,
    },

    /// The universe repeats an id.
    #[error("seed id {id} of {ty} listed twice")]
    DuplicateSeed {
        /// Node or edge type name.
        ty: String,
        /// Repeated id.
        id: usize,
    },

    /// A configuration document failed to parse.
    #[error("invalid collator config: {0}")]
    Parse(String),
}

/// Error type for minibatch collation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Fatal configuration problem.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The graph or lookup tables contradict each other; aborts one collate.
    #[error("inconsistent graph ({}) for {etype}: {reason}", layer_label(.layer))]
    InconsistentGraph {
        /// Layer index, input side first; `None` before the layer loop.
        layer: Option<usize>,
        /// Edge type involved.
        etype: EdgeType,
        /// What went wrong.
        reason: String,
    },

    /// Graph view failure.
    #[error(transparent)]
    Graph(#[from] lattix_core::Error),
}

impl Error {
    /// Attach a layer index to an [`Error::InconsistentGraph`] that lacks one.
    pub fn at_layer(self, idx: usize) -> Self {
        match self {
            Self::InconsistentGraph {
                layer: None,
                etype,
                reason,
            } => Self::InconsistentGraph {
                layer: Some(idx),
                etype,
                reason,
            },
            other => other,
        }
    }
}

fn layer_label(layer: &Option<usize>) -> String {
    match layer {
        Some(l) => format!("layer {l}"),
        None => "seed stage".to_string(),
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
