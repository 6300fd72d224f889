//! The B+-tree map (§4.3): values live only in leaves.

mod node;
mod tree;

pub use tree::BpTreeMap;
