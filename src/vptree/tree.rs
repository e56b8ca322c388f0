//! The vantage-point tree: parallel construction, τ-bounded search, online
//! insertion, lazy removal, and compacting rebuild.

use std::sync::Arc;

use log::{debug, trace};
use rand::Rng;
use rayon::prelude::*;

use super::heap::{ResultHeap, SearchCandidate};
use super::item::{Distancer, VpTreeItem};
use super::node::{NodeId, VpTreeNode};

/// Scratch entry for one candidate during construction: the node being placed
/// and its distance to the current vantage point.
#[derive(Debug, Clone, Copy)]
struct BuildEntry {
    node: NodeId,
    dist: f64,
}

/// A mutable, in-memory nearest-neighbor index over items of a metric space.
///
/// The tree owns its items as shared handles (`Arc<T>`), so a caller may keep
/// the very allocation it indexed; the item's node handle then makes
/// [`remove`](Self::remove) an O(1) operation. Queries borrow the tree
/// immutably and may run concurrently with each other; all mutation takes
/// `&mut self` and is serialized by exclusive borrowing. Item positions are
/// stable from one `set_items`/`rebuild` to the next.
#[derive(Debug)]
pub struct VpTree<T, D> {
    distancer: D,
    items: Vec<Arc<T>>,
    nodes: Vec<VpTreeNode>,
    root: Option<NodeId>,
    dead_indices: Vec<usize>,
}

impl<T, D> VpTree<T, D>
where
    T: VpTreeItem + Send + Sync,
    D: Distancer<T> + Sync,
{
    /// Creates an empty index around the given metric.
    pub fn new(distancer: D) -> Self {
        Self {
            distancer,
            items: Vec::new(),
            nodes: Vec::new(),
            root: None,
            dead_indices: Vec::new(),
        }
    }

    /// Replaces the index contents with a fresh tree over `items`.
    ///
    /// Every item's node handle is rewritten; handles handed out by a
    /// previous build are invalid afterwards.
    pub fn set_items(&mut self, items: Vec<Arc<T>>) {
        self.items = items;
        self.dead_indices.clear();
        self.nodes = (0..self.items.len()).map(VpTreeNode::new).collect();
        for (index, item) in self.items.iter().enumerate() {
            item.set_node(Some(index));
        }

        let mut entries: Vec<BuildEntry> =
            (0..self.nodes.len()).map(|node| BuildEntry { node, dist: 0.0 }).collect();
        let mut rng = rand::thread_rng();
        self.root = build(&self.distancer, &self.items, &mut self.nodes, &mut entries, &mut rng);
        debug!("indexed {} items", self.items.len());
    }

    /// Current item vector, tombstoned entries included until the next
    /// [`rebuild`](Self::rebuild).
    #[must_use]
    pub fn items(&self) -> &[Arc<T>] {
        &self.items
    }

    /// Number of indexed items, tombstoned entries included.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Whether the index holds no items at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Node behind a handle, if the handle is current.
    #[must_use]
    pub fn node(&self, handle: NodeId) -> Option<&VpTreeNode> {
        self.nodes.get(handle)
    }

    /// The `k` nearest items to `target`, ascending by reported priority,
    /// paired with those priorities. Fewer than `k` items are returned when
    /// the index holds fewer live candidates.
    #[must_use]
    pub fn search(&self, target: &T, k: usize) -> (Vec<Arc<T>>, Vec<f64>) {
        self.query(target, k, f64::INFINITY, true)
    }

    /// Like [`search`](Self::search), but no returned item lies farther than
    /// `max_distance` from `target` in raw metric distance.
    #[must_use]
    pub fn search_in_range(&self, target: &T, k: usize, max_distance: f64) -> (Vec<Arc<T>>, Vec<f64>) {
        self.query(target, k, max_distance, true)
    }

    /// Adds `item` to the index without rebuilding: the new node is attached
    /// below the nearest live node, widening the `min`/`max` bounds along the
    /// descent. Repeated inserts far from existing vantage points can skew
    /// depth; rebuild when that matters.
    pub fn insert(&mut self, item: Arc<T>) {
        // An effectively empty index (nothing live) starts over.
        if self.items.len() <= self.dead_indices.len() {
            self.set_items(vec![item]);
            return;
        }
        let Some(root) = self.root else {
            self.set_items(vec![item]);
            return;
        };
        let mut current = self.nearest_node(&item).unwrap_or(root);

        let new_index = self.items.len();
        item.set_node(Some(new_index));
        self.items.push(item);
        self.nodes.push(VpTreeNode::new(new_index));

        loop {
            let vantage_index = self.nodes[current].item_index;
            let dist =
                self.distancer.distance(&self.items[vantage_index], &self.items[new_index]);
            let node = &mut self.nodes[current];
            if dist <= node.threshold {
                if dist < node.min_dist {
                    node.min_dist = dist;
                }
                match node.left {
                    Some(next) => current = next,
                    None => {
                        node.min_dist = dist;
                        node.left = Some(new_index);
                        trace!("attached item {new_index} below node {current} (left)");
                        return;
                    }
                }
            } else {
                if dist > node.max_dist {
                    node.max_dist = dist;
                }
                match node.right {
                    Some(next) => current = next,
                    None => {
                        node.max_dist = dist;
                        node.right = Some(new_index);
                        trace!("attached item {new_index} below node {current} (right)");
                        return;
                    }
                }
            }
        }
    }

    /// Hides `item` from future results. The entry stays in the tree as a
    /// tombstone and is physically reclaimed by the next
    /// [`rebuild`](Self::rebuild).
    ///
    /// When `item` carries a current node handle the removal is O(1);
    /// otherwise the nearest live node to `item` is the one marked.
    pub fn remove(&mut self, item: &T) {
        if self.root.is_none() {
            return;
        }
        if let Some(handle) = item.get_node() {
            self.mark_dead(handle);
            return;
        }
        if let Some(found) = self.nearest_node(item) {
            self.mark_dead(found);
        }
    }

    /// Rebuilds the index over the surviving items, excising tombstoned
    /// entries and re-indexing the rest densely.
    pub fn rebuild(&mut self) {
        self.dead_indices.sort_unstable();
        let mut survivors = std::mem::take(&mut self.items);
        for &index in self.dead_indices.iter().rev() {
            if index < survivors.len() {
                survivors.remove(index);
            }
        }
        debug!(
            "rebuilding over {} items ({} tombstones dropped)",
            survivors.len(),
            self.dead_indices.len()
        );
        self.set_items(survivors);
    }

    fn mark_dead(&mut self, handle: NodeId) {
        if let Some(node) = self.nodes.get_mut(handle) {
            if !node.dead {
                node.dead = true;
                self.dead_indices.push(node.item_index);
            }
        }
    }

    /// Nearest live node to `target`, affinity disabled. Used by the
    /// mutators to locate attach and removal points.
    fn nearest_node(&self, target: &T) -> Option<NodeId> {
        let root = self.root?;
        let mut heap = ResultHeap::with_capacity(1);
        let mut tau = f64::INFINITY;
        self.search_node(root, target, &mut heap, &mut tau, f64::INFINITY, false);
        heap.pop().map(|candidate| candidate.node)
    }

    fn query(
        &self,
        target: &T,
        k: usize,
        max_distance: f64,
        apply_affinity: bool,
    ) -> (Vec<Arc<T>>, Vec<f64>) {
        if k == 0 {
            return (Vec::new(), Vec::new());
        }
        let mut heap = ResultHeap::with_capacity(k);
        let mut tau = max_distance;
        if let Some(root) = self.root {
            self.search_node(root, target, &mut heap, &mut tau, max_distance, apply_affinity);
        }
        let mut results = Vec::with_capacity(heap.len());
        let mut priorities = Vec::with_capacity(heap.len());
        for candidate in heap.into_sorted() {
            results.push(Arc::clone(&self.items[candidate.item_index]));
            priorities.push(candidate.priority);
        }
        (results, priorities)
    }

    fn search_node(
        &self,
        node_id: NodeId,
        target: &T,
        heap: &mut ResultHeap,
        tau: &mut f64,
        max_distance: f64,
        apply_affinity: bool,
    ) {
        let node = &self.nodes[node_id];
        let item = &self.items[node.item_index];

        // Dead or skipped vantages yield no result, but their subtree still
        // holds live candidates.
        if node.dead || item.should_skip(target) {
            if let Some(left) = node.left {
                self.search_node(left, target, heap, tau, max_distance, apply_affinity);
            }
            if let Some(right) = node.right {
                self.search_node(right, target, heap, tau, max_distance, apply_affinity);
            }
            return;
        }

        let dist = self.distancer.distance(item, target);
        let priority = if apply_affinity && dist < max_distance {
            item.apply_affinity(dist, target)
        } else {
            dist
        };
        let bound = *tau;

        if priority < bound {
            heap.push(SearchCandidate { item_index: node.item_index, priority, node: node_id });
            if heap.is_full() {
                if let Some(worst) = heap.worst_priority() {
                    *tau = worst;
                }
            }
        }

        if node.is_leaf() {
            return;
        }

        // Pruning uses the raw distance and the bound captured above; only
        // raw distances participate in the triangle inequality.
        if dist < node.threshold {
            if let Some(left) = node.left {
                if node.min_dist - bound <= dist {
                    self.search_node(left, target, heap, tau, max_distance, apply_affinity);
                }
            }
            if let Some(right) = node.right {
                if node.threshold - bound < dist && dist < node.max_dist + bound {
                    self.search_node(right, target, heap, tau, max_distance, apply_affinity);
                }
            }
        } else {
            if let Some(right) = node.right {
                if node.min_dist - bound < dist {
                    self.search_node(right, target, heap, tau, max_distance, apply_affinity);
                }
            }
            if let Some(left) = node.left {
                if node.min_dist - bound < dist && dist < node.threshold + bound {
                    self.search_node(left, target, heap, tau, max_distance, apply_affinity);
                }
            }
        }
    }
}

/// Recursively builds a subtree over `entries`, returning its root handle.
///
/// One vantage point is drawn uniformly at random, distances from it to the
/// remaining candidates are computed in parallel, and the slice is split at
/// the median distance (the median itself lands in the right bucket).
fn build<T, D, R>(
    distancer: &D,
    items: &[Arc<T>],
    nodes: &mut [VpTreeNode],
    entries: &mut [BuildEntry],
    rng: &mut R,
) -> Option<NodeId>
where
    T: VpTreeItem + Send + Sync,
    D: Distancer<T> + Sync,
    R: Rng,
{
    if entries.is_empty() {
        return None;
    }

    let pick = rng.gen_range(0..entries.len());
    entries.swap(0, pick);
    let vantage = entries[0].node;
    let rest = &mut entries[1..];
    if rest.is_empty() {
        return Some(vantage);
    }

    // Metric pass: one distance per remaining candidate. The join below is
    // the barrier between this pass and the partition.
    let vantage_item = &items[nodes[vantage].item_index];
    {
        let nodes_view: &[VpTreeNode] = nodes;
        rest.par_iter_mut().for_each(|entry| {
            entry.dist =
                distancer.distance(vantage_item, &items[nodes_view[entry.node].item_index]);
        });
    }

    let mut min_dist = f64::INFINITY;
    let mut max_dist = f64::NEG_INFINITY;
    for entry in rest.iter() {
        min_dist = min_dist.min(entry.dist);
        max_dist = max_dist.max(entry.dist);
    }

    let median_index = rest.len() >> 1;
    let threshold = nth_element(rest, median_index + 1);

    {
        let node = &mut nodes[vantage];
        node.threshold = threshold;
        node.min_dist = min_dist;
        node.max_dist = max_dist;
    }

    let (left_bucket, right_bucket) = rest.split_at_mut(median_index);
    let left = build(distancer, items, nodes, left_bucket, rng);
    let right = build(distancer, items, nodes, right_bucket, rng);

    let node = &mut nodes[vantage];
    node.left = left;
    node.right = right;
    Some(vantage)
}

/// In-place quickselect with median-of-three pivoting: leaves the `nth`
/// smallest entries (one-based) at the front of the slice and returns the
/// distance of the `nth` one.
fn nth_element(entries: &mut [BuildEntry], mut nth: usize) -> f64 {
    let mut left = 0;
    let mut right = entries.len() - 1;
    loop {
        let pivot_index = median_of_three(entries, left, right, (left + right) >> 1);
        let pivot_new_index = partition(entries, left, right, pivot_index);
        let pivot_rank = pivot_new_index - left + 1;
        if pivot_rank == nth {
            return entries[pivot_new_index].dist;
        } else if nth < pivot_rank {
            right = pivot_new_index - 1;
        } else {
            nth -= pivot_rank;
            left = pivot_new_index + 1;
        }
    }
}

/// Lomuto partition of `entries[left..=right]` around the entry at
/// `pivot_index`; returns the pivot's final position.
fn partition(entries: &mut [BuildEntry], left: usize, right: usize, pivot_index: usize) -> usize {
    let pivot_dist = entries[pivot_index].dist;
    entries.swap(pivot_index, right);
    let mut store_index = left;
    for i in left..right {
        if entries[i].dist < pivot_dist {
            entries.swap(store_index, i);
            store_index += 1;
        }
    }
    entries.swap(right, store_index);
    store_index
}

/// Index of the median-valued entry among positions `a`, `b`, and `c`.
fn median_of_three(entries: &[BuildEntry], a: usize, b: usize, c: usize) -> usize {
    let (da, db, dc) = (entries[a].dist, entries[b].dist, entries[c].dist);
    if da < db {
        if db < dc {
            b
        } else if da < dc {
            c
        } else {
            a
        }
    } else if da < dc {
        a
    } else if db < dc {
        c
    } else {
        b
    }
}
