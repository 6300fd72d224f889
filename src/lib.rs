//! Two cache-oriented, in-memory ordered maps keyed by a totally ordered key
//! type: [`btree::BTreeMap`], a classic B-tree with keys and values stored at
//! every level, and [`bptree::BpTreeMap`], a B+-tree with keys and values
//! stored only in the leaves. Both are shape-parametrised at compile time —
//! fan-out, search strategy, leaf-ordering policy — so the same algorithmic
//! skeleton can be tuned and measured against general-purpose hash tables.
//!
//! **These are not general-purpose replacements for `std::collections::BTreeMap`.**
//! The tradeoffs are different:
//!
//! - Keys and values are expected to be small and `Copy`.
//! - A [`Comparator`] object compares keys, so keys don't need to implement
//!   `Ord` themselves and comparison can carry external context.
//! - Node capacity, search strategy and leaf-ordering policy are compile-time
//!   choices, not runtime ones.
//! - There is no deletion, no range iteration, and no persistence: both maps
//!   only grow, by `put`, until they are dropped.
//!
//! See `SPEC_FULL.md` in the repository root for the full design rationale.

#![warn(unused_import_braces)]

use core::cmp::Ordering;

use cranelift_entity::entity_impl;

pub mod bptree;
pub mod btree;
mod error;
mod inline;
mod pool;
mod search;

pub use crate::bptree::BpTreeMap;
pub use crate::btree::BTreeMap;
pub use crate::error::{Error, ValidationError};
pub use crate::search::{
    BinaryBranchless, BranchSearch, Dynamic, LeafSearch, Linear, LinearBranchless, LinearLazy,
};

/// The maximum depth (branch levels above the leaves) either tree will ever
/// reach. Sized generously: we would run out of 32-bit node references long
/// before a `put` needed a deeper ancestor stack than this.
pub(crate) const MAX_DEPTH: usize = 48;

/// Key comparator.
///
/// Keys don't need to implement `Ord`; they are compared through a
/// comparator object that can carry whatever context the comparison needs.
/// `cmp` must be a total order: for any `a`, `b`, exactly one of
/// `cmp(a,b) == Less`, `cmp(a,b) == Equal`, `cmp(a,b) == Greater` holds, and
/// it must be transitive and consistent with itself when arguments are
/// swapped.
pub trait Comparator<K>
where
    K: Copy,
{
    /// Compare keys `a` and `b`.
    fn cmp(&self, a: K, b: K) -> Ordering;
}

/// The trivial comparator: keys compare using their own `Ord` impl.
impl<K> Comparator<K> for ()
where
    K: Copy + Ord,
{
    fn cmp(&self, a: K, b: K) -> Ordering {
        a.cmp(&b)
    }
}

/// An opaque reference to a node in a node pool.
///
/// A `Node` is a plain `u32` index; which pool it indexes, and whether the
/// slot it names is a leaf or a branch, is determined entirely by context
/// (the map that produced it, and that node's own enum tag) — never by
/// reinterpreting the reference itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node(u32);
entity_impl!(Node, "node");

/// The outcome of a successful `put` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutResult {
    /// The key was not previously present; it has been inserted.
    Inserted,
    /// The key was already present; its value has been overwritten.
    Replaced,
}
