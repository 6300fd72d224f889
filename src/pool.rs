//! Append-only arena for tree nodes, one per map.
//!
//! Built directly on `cranelift-entity`'s `PrimaryMap`: a `Node` reference is
//! an opaque, `Copy` index into a flat table, so a child "pointer" is one
//! machine word with no lifetime attached to it (§9, "polymorphic child
//! pointers without a tag"). Unlike the teacher's own pool, nodes here are
//! never freed individually — the core has no `deinit`/erase that would
//! produce a freed node to recycle — so the whole arena is released at once
//! when the map (and its pool) is dropped.

use cranelift_entity::PrimaryMap;

use crate::error::Error;
use crate::Node;

pub(crate) struct NodePool<N> {
    nodes: PrimaryMap<Node, N>,
}

impl<N> NodePool<N> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: PrimaryMap::new(),
        }
    }

    /// Reserve room for `additional` more nodes without allocating any of
    /// them yet. Used to pre-reserve the worst-case number of new nodes a
    /// split chain could need before any existing node is touched, so a
    /// rejected reservation leaves the tree completely unmodified instead of
    /// aborting mid-split with new, unlinked siblings already allocated
    /// (§5, §9).
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        self.nodes
            .try_reserve(additional)
            .map_err(|_| Error::OutOfMemory)
    }

    /// Allocate `data` as a new node and return its reference.
    ///
    /// Capacity for this allocation must already have been secured via
    /// [`NodePool::reserve`]; this never itself fails.
    pub(crate) fn alloc(&mut self, data: N) -> Node {
        self.nodes.push(data)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl<N> std::ops::Index<Node> for NodePool<N> {
    type Output = N;

    fn index(&self, node: Node) -> &N {
        &self.nodes[node]
    }
}

impl<N> std::ops::IndexMut<Node> for NodePool<N> {
    fn index_mut(&mut self, node: Node) -> &mut N {
        &mut self.nodes[node]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_returns_distinct_increasing_refs() {
        let mut pool: NodePool<u32> = NodePool::new();
        pool.reserve(3).unwrap();
        let a = pool.alloc(10);
        let b = pool.alloc(20);
        let c = pool.alloc(30);
        assert_eq!(pool[a], 10);
        assert_eq!(pool[b], 20);
        assert_eq!(pool[c], 30);
        assert_eq!(pool.len(), 3);
        assert_ne!(a, b);
        assert_ne!(b, c);
    }
}
