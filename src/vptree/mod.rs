//! The vantage-point tree index and its item-side traits.

mod heap;
mod item;
mod node;
mod tree;

pub use item::{Distancer, NodeSlot, VpTreeItem};
pub use node::{NodeId, VpTreeNode};
pub use tree::VpTree;
