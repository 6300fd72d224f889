//! The classic B-tree map (§4.2): keys and values live at every level.

mod node;
mod tree;

pub use tree::BTreeMap;
