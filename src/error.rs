//! The two error kinds the core can raise (§7): an allocator-surfaced
//! `Error::OutOfMemory` from `init`/`put`, and a `ValidationError` from
//! `validate` describing which invariant in §3 was violated.

use crate::Node;

/// Failure surfaced from an operation that allocates a node.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The node pool's backing allocator rejected a reservation. The tree
    /// is left exactly as it was before the call that returned this error;
    /// see the design notes on pre-reserving worst-case split storage.
    #[error("out of memory while allocating a tree node")]
    OutOfMemory,
}

/// A specific invariant (§3) found violated by `validate`.
///
/// In a `debug-trace` build, `put` turns these into a `debug_assert!`
/// failure rather than returning them; `validate` itself always returns the
/// `Result` so tests can assert on it directly (§8, property 5 and 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Keys within a single node are not strictly ascending.
    #[error("keys out of order in node {0}")]
    KeysOutOfOrder(Node),
    /// A child's keys escape the separator bounds implied by its parent.
    #[error("separator bound violated by child of branch {0}")]
    SeparatorBoundViolated(Node),
    /// A non-root node holds fewer than `capacity / 2` keys.
    #[error("node {0} is below minimum fill ({1} < {2})")]
    BelowMinimumFill(Node, u8, u8),
    /// A lazy leaf's `sorted` flag disagrees with the actual key order, or a
    /// strict leaf is not sorted.
    #[error("leaf {0} ordering does not match its configured policy")]
    LeafOrderingMismatch(Node),
    /// The root violates invariant 7 (empty branch root, or depth mismatch).
    #[error("malformed root at node {0}")]
    MalformedRoot(Node),
}
