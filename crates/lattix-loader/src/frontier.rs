//! Insertion-ordered, deduplicated node sets keyed by node type.
//!
//! A [`Frontier`] is both "the destinations sampled this layer" and the
//! local id space of a block: position in the per-type sequence is the
//! local index.

use lattix_core::{NodeId, NodeType};
use std::collections::{BTreeMap, HashMap};

/// Ordered set of node ids; `ids[i]` has local index `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedIds {
    ids: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
}

impl OrderedIds {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` if absent, returning its local index either way.
    pub fn insert(&mut self, id: NodeId) -> usize {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.ids.len();
        self.index.insert(id, idx);
        self.ids.push(id);
        idx
    }

    /// Local index of `id`.
    pub fn get(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Whether `id` is present.
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Ids in local-index order.
    pub fn as_slice(&self) -> &[NodeId] {
        &self.ids
    }

    /// Number of ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Consume into the ordered id vector.
    pub fn into_vec(self) -> Vec<NodeId> {
        self.ids
    }
}

impl FromIterator<NodeId> for OrderedIds {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

/// Per-type ordered node sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontier {
    nodes: BTreeMap<NodeType, OrderedIds>,
}

impl Frontier {
    /// Create an empty frontier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from per-type id lists, deduplicating and keeping first occurrences.
    pub fn from_map(nodes: &BTreeMap<NodeType, Vec<NodeId>>) -> Self {
        Self {
            nodes: nodes
                .iter()
                .map(|(ty, ids)| (ty.clone(), ids.iter().copied().collect()))
                .collect(),
        }
    }

    /// Make sure `ty` is present even if it stays empty.
    pub fn ensure_type(&mut self, ty: &NodeType) {
        if !self.nodes.contains_key(ty) {
            self.nodes.insert(ty.clone(), OrderedIds::new());
        }
    }

    /// Insert a node, returning its local index within its type.
    pub fn insert(&mut self, ty: &NodeType, id: NodeId) -> usize {
        if let Some(set) = self.nodes.get_mut(ty) {
            return set.insert(id);
        }
        let mut set = OrderedIds::new();
        let idx = set.insert(id);
        self.nodes.insert(ty.clone(), set);
        idx
    }

    /// Ordered set for a type.
    pub fn get(&self, ty: &NodeType) -> Option<&OrderedIds> {
        self.nodes.get(ty)
    }

    /// Ids of a type in local order; empty when the type is absent.
    pub fn ids(&self, ty: &NodeType) -> &[NodeId] {
        self.nodes.get(ty).map_or(&[][..], OrderedIds::as_slice)
    }

    /// Node types present, ordered.
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.nodes.keys()
    }

    /// Total number of nodes across types.
    pub fn total(&self) -> usize {
        self.nodes.values().map(OrderedIds::len).sum()
    }

    /// Whether no type holds any node.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Plain per-type id vectors.
    pub fn to_map(&self) -> BTreeMap<NodeType, Vec<NodeId>> {
        self.nodes
            .iter()
            .map(|(ty, set)| (ty.clone(), set.as_slice().to_vec()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_ids_dedup_keeps_first() {
        let set: OrderedIds = [3, 1, 3, 0, 1].into_iter().collect();
        assert_eq!(set.as_slice(), &[3, 1, 0]);
        assert_eq!(set.get(0), Some(2));
        assert!(!set.contains(7));
    }

    #[test]
    fn test_frontier_types_and_order() {
        let user = NodeType::new("user");
        let game = NodeType::new("game");

        let mut f = Frontier::new();
        assert_eq!(f.insert(&user, 4), 0);
        assert_eq!(f.insert(&user, 2), 1);
        assert_eq!(f.insert(&user, 4), 0);
        f.ensure_type(&game);

        assert_eq!(f.ids(&user), &[4, 2]);
        assert!(f.ids(&game).is_empty());
        assert!(f.ids(&NodeType::new("item")).is_empty());
        assert_eq!(f.types().count(), 2);
        assert_eq!(f.total(), 2);
    }
}
