//! In-memory vantage-point tree for exact nearest-neighbor search.
//!
//! A VP-tree recursively partitions the indexed items around randomly chosen
//! *vantage points*: every node stores the median distance from its vantage
//! point to the items below it, and a query walks the tree discarding whole
//! subtrees whenever the triangle inequality proves they cannot hold a closer
//! item than the best results found so far. The only requirement on the item
//! type is a [`Distancer`] obeying the metric laws; the index itself never
//! assumes coordinates, dimensions, or any particular geometry.
//!
//! The tree is mutable: items can be appended online ([`VpTree::insert`]),
//! hidden via lazy deletion ([`VpTree::remove`]), and physically reclaimed by
//! a compacting rebuild ([`VpTree::rebuild`]). Queries take `&self` and may
//! run concurrently; mutations take `&mut self` and are therefore serialized
//! with everything else by the borrow checker.
//!
//! The [`geo`] module ships two ready-made geographic metrics (Haversine and
//! Vincenty) that pair naturally with the index.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vantage::{Distancer, NodeId, NodeSlot, VpTree, VpTreeItem};
//!
//! struct City {
//!     lat: f64,
//!     lon: f64,
//!     node: NodeSlot,
//! }
//!
//! impl City {
//!     fn new(lat: f64, lon: f64) -> Self {
//!         Self { lat, lon, node: NodeSlot::new() }
//!     }
//! }
//!
//! impl VpTreeItem for City {
//!     fn set_node(&self, handle: Option<NodeId>) {
//!         self.node.set(handle);
//!     }
//!
//!     fn get_node(&self) -> Option<NodeId> {
//!         self.node.get()
//!     }
//! }
//!
//! struct GreatCircle;
//!
//! impl Distancer<City> for GreatCircle {
//!     fn distance(&self, a: &City, b: &City) -> f64 {
//!         vantage::geo::haversine_earth(a.lat, a.lon, b.lat, b.lon)
//!     }
//! }
//!
//! let mut tree = VpTree::new(GreatCircle);
//! tree.set_items(vec![
//!     Arc::new(City::new(52.52, 13.40)),
//!     Arc::new(City::new(48.86, 2.35)),
//!     Arc::new(City::new(51.51, -0.13)),
//! ]);
//!
//! let (nearest, distances) = tree.search(&City::new(48.8, 2.3), 1);
//! assert_eq!(nearest.len(), 1);
//! assert!(distances[0] < 10_000.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod geo;
pub mod vptree;

pub use vptree::{Distancer, NodeId, NodeSlot, VpTree, VpTreeItem, VpTreeNode};
