//! Item-side capabilities: the metric, per-item query hooks, and the
//! back-reference from an item to its node.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::node::NodeId;

/// Computes the distance between two items.
///
/// The function must be a metric: non-negative, symmetric, zero only for
/// identical items, and satisfying the triangle inequality. The tree does not
/// validate these laws; a non-metric implementation degrades branch pruning
/// silently, surfacing as wrong results rather than errors.
pub trait Distancer<T> {
    /// Distance between `a` and `b` as a non-negative, non-NaN value.
    fn distance(&self, a: &T, b: &T) -> f64;
}

/// Capabilities an indexed item exposes to the tree.
///
/// `set_node`/`get_node` carry the handle of the node wrapping the item, so a
/// caller holding the same `Arc` the tree indexes can remove it without a
/// search. [`NodeSlot`] is the intended storage for the handle.
pub trait VpTreeItem {
    /// Records the handle of the node currently wrapping this item. Called by
    /// the tree on every `set_items` and `insert`.
    fn set_node(&self, handle: Option<NodeId>);

    /// Handle of the node wrapping this item, or `None` when the item is not
    /// known to be indexed. Handles are invalidated by the next
    /// `set_items`/`rebuild`.
    fn get_node(&self) -> Option<NodeId>;

    /// Per-query exclusion. A skipped item never appears in results for
    /// `target`, but its subtree is still traversed.
    fn should_skip(&self, _target: &Self) -> bool {
        false
    }

    /// Transforms the raw distance into the priority used for ranking. The
    /// returned value must be at least `distance`: branch pruning operates on
    /// raw distances, so a priority below the raw distance can cause results
    /// to be missed.
    fn apply_affinity(&self, distance: f64, _target: &Self) -> f64 {
        distance
    }
}

const NO_NODE: usize = usize::MAX;

/// Lock-free storage for an item's node handle.
///
/// Embed one in the item type and delegate `set_node`/`get_node` to it. The
/// slot is written through `&self`, keeping items shareable across the
/// concurrent queries the tree allows.
#[derive(Debug)]
pub struct NodeSlot(AtomicUsize);

impl NodeSlot {
    /// An empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self(AtomicUsize::new(NO_NODE))
    }

    /// Stores `handle`, replacing any previous value.
    pub fn set(&self, handle: Option<NodeId>) {
        self.0.store(handle.unwrap_or(NO_NODE), Ordering::Release);
    }

    /// The stored handle, if any.
    #[must_use]
    pub fn get(&self) -> Option<NodeId> {
        match self.0.load(Ordering::Acquire) {
            NO_NODE => None,
            handle => Some(handle),
        }
    }
}

impl Default for NodeSlot {
    fn default() -> Self {
        Self::new()
    }
}
