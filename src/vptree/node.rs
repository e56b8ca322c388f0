use serde::{Deserialize, Serialize};

/// Handle of a node in the tree's arena. Node `i` wraps the item at position
/// `i` of the tree's item vector; handles stay valid until the next
/// `set_items`/`rebuild`.
pub type NodeId = usize;

/// One item's role as a vantage point, with the metric summary of the
/// candidates partitioned below it at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpTreeNode {
    /// Position of the wrapped item in the owning tree's item vector.
    pub(crate) item_index: usize,

    /// Median distance from this vantage point to its construction bucket;
    /// candidates at or under it went left, the rest right.
    pub(crate) threshold: f64,

    /// Minimum distance observed from this vantage point to its bucket.
    /// Insertions may lower it further.
    pub(crate) min_dist: f64,

    /// Maximum distance observed from this vantage point to its bucket.
    /// Insertions may raise it further.
    pub(crate) max_dist: f64,

    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,

    /// Tombstone flag. A dead node is invisible to results but keeps
    /// bounding its subtree until the next rebuild.
    pub(crate) dead: bool,
}

impl VpTreeNode {
    pub(crate) fn new(item_index: usize) -> Self {
        Self {
            item_index,
            threshold: 0.0,
            min_dist: 0.0,
            max_dist: 0.0,
            left: None,
            right: None,
            dead: false,
        }
    }

    /// Position of the wrapped item in the owning tree's item vector.
    #[must_use]
    pub const fn item_index(&self) -> usize {
        self.item_index
    }

    /// Whether the node has been marked for deletion.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Whether the node has no children.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}
