//! Node layout for the classic B-tree (§3, §4.2): keys and values live at
//! every level, branches included, so a branch that holds the search key can
//! satisfy a lookup without descending any further.

use std::mem::MaybeUninit;

use crate::inline::{
    empty_slots, init_slice, insert_at, insert_overflowing, overflowing_get, split_off,
    split_overflowing,
};
use crate::Node;

/// A node in a `BTreeMap`'s pool: either a leaf or a branch, both carrying
/// keys and values.
pub(crate) enum NodeData<K, V, const C: usize> {
    Leaf(Leaf<K, V, C>),
    Branch(Branch<K, V, C>),
}

pub(crate) struct Leaf<K, V, const C: usize> {
    len: u8,
    keys: [MaybeUninit<K>; C],
    vals: [MaybeUninit<V>; C],
}

pub(crate) struct Branch<K, V, const C: usize> {
    len: u8,
    keys: [MaybeUninit<K>; C],
    vals: [MaybeUninit<V>; C],
    /// `children[0..len]` plus `rightmost_child` give the `len + 1` child
    /// pointers; see `inline::insert_overflowing` for why the array alone
    /// is one slot too small.
    children: [MaybeUninit<Node>; C],
    rightmost_child: Node,
}

impl<K: Copy, V: Copy, const C: usize> Leaf<K, V, C> {
    pub(crate) fn empty() -> Self {
        Self {
            len: 0,
            keys: empty_slots(),
            vals: empty_slots(),
        }
    }

    pub(crate) fn one(key: K, value: V) -> Self {
        let mut leaf = Self::empty();
        leaf.keys[0] = MaybeUninit::new(key);
        leaf.vals[0] = MaybeUninit::new(value);
        leaf.len = 1;
        leaf
    }

    pub(crate) fn len(&self) -> usize {
        self.len as usize
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len() == C
    }

    pub(crate) fn keys(&self) -> &[K] {
        unsafe { init_slice(&self.keys, self.len()) }
    }

    pub(crate) fn val_at(&self, i: usize) -> V {
        debug_assert!(i < self.len());
        unsafe { self.vals[i].assume_init() }
    }

    pub(crate) fn set_val_at(&mut self, i: usize, value: V) {
        debug_assert!(i < self.len());
        self.vals[i] = MaybeUninit::new(value);
    }

    /// Insert `(key, value)` at `index`. The caller guarantees `!is_full()`.
    pub(crate) fn insert(&mut self, index: usize, key: K, value: V) {
        debug_assert!(!self.is_full());
        insert_at(&mut self.keys, self.len(), index, key);
        insert_at(&mut self.vals, self.len(), index, value);
        self.len += 1;
    }

    /// Split a full leaf at key index `m`: `self` keeps keys `[0, m)`; the
    /// returned leaf holds keys `(m, C)` moved down to index 0; `keys()[m]`
    /// and `val_at(m)` are detached entirely and returned for the caller to
    /// promote into the parent branch, exactly as `Branch::split` does (so a
    /// key lives in exactly one node of the tree, never both a leaf and its
    /// parent).
    pub(crate) fn split(&mut self, m: usize) -> (K, V, Self) {
        debug_assert!(self.is_full());
        let crit_key = unsafe { self.keys[m].assume_init() };
        let crit_val = unsafe { self.vals[m].assume_init() };

        let (keys, _) = split_off(&self.keys, self.len(), m + 1);
        let (vals, moved) = split_off(&self.vals, self.len(), m + 1);
        self.len = m as u8;
        (
            crit_key,
            crit_val,
            Self {
                len: moved as u8,
                keys,
                vals,
            },
        )
    }
}

impl<K: Copy, V: Copy, const C: usize> Branch<K, V, C> {
    /// Build the first branch of a tree: one separator and its two children.
    pub(crate) fn one(left: Node, key: K, value: V, right: Node) -> Self {
        let mut keys = empty_slots();
        let mut vals = empty_slots();
        keys[0] = MaybeUninit::new(key);
        vals[0] = MaybeUninit::new(value);
        let mut children = empty_slots();
        children[0] = MaybeUninit::new(left);
        Self {
            len: 1,
            keys,
            vals,
            children,
            rightmost_child: right,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len as usize
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len() == C
    }

    pub(crate) fn keys(&self) -> &[K] {
        unsafe { init_slice(&self.keys, self.len()) }
    }

    pub(crate) fn val_at(&self, i: usize) -> V {
        debug_assert!(i < self.len());
        unsafe { self.vals[i].assume_init() }
    }

    pub(crate) fn set_val_at(&mut self, i: usize, value: V) {
        debug_assert!(i < self.len());
        self.vals[i] = MaybeUninit::new(value);
    }

    /// The child for lower-bound index `i` (`i` in `0..=len`).
    pub(crate) fn child_at(&self, i: usize) -> Node {
        debug_assert!(i <= self.len());
        overflowing_get(&self.children, self.rightmost_child, i)
    }

    /// Insert separator `(key, value)` at index `i`, with `new_child` taking
    /// over as the child immediately to its right. The caller guarantees
    /// `!is_full()`.
    pub(crate) fn insert(&mut self, i: usize, key: K, value: V, new_child: Node) {
        debug_assert!(!self.is_full());
        let len = self.len();
        insert_at(&mut self.keys, len, i, key);
        insert_at(&mut self.vals, len, i, value);
        insert_overflowing(&mut self.children, &mut self.rightmost_child, len + 1, i + 1, new_child);
        self.len += 1;
    }

    /// Split a full branch at key index `m`: `self` keeps keys `[0, m)` and
    /// their `m + 1` children; the returned branch holds keys `(m, C)` and
    /// their children, with `self.keys()[m]` / `self.val_at(m)` left as the
    /// (now-detached) key/value to promote to the parent.
    pub(crate) fn split(&mut self, m: usize) -> (K, V, Self) {
        debug_assert!(self.is_full());
        let crit_key = unsafe { self.keys[m].assume_init() };
        let crit_val = unsafe { self.vals[m].assume_init() };

        let (rhs_keys, _) = split_off(&self.keys, self.len(), m + 1);
        let (rhs_vals, moved) = split_off(&self.vals, self.len(), m + 1);
        let (rhs_children, moved_children) =
            split_overflowing(&self.children, self.rightmost_child, m + 1);
        debug_assert_eq!(moved_children, moved + 1);

        let rhs_rightmost = unsafe { rhs_children[moved].assume_init() };
        let mut rhs_children_fixed = rhs_children;
        // `rhs_children` holds `moved_children` entries; the last one is the
        // new rightmost child and is not part of the fixed array proper.
        rhs_children_fixed[moved] = MaybeUninit::uninit();

        self.len = m as u8;
        let rhs = Self {
            len: moved as u8,
            keys: rhs_keys,
            vals: rhs_vals,
            children: rhs_children_fixed,
            rightmost_child: rhs_rightmost,
        };
        (crit_key, crit_val, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;

    #[test]
    fn leaf_insert_and_split() {
        let mut leaf = Leaf::<i32, i32, 4>::empty();
        leaf.insert(0, 10, 100);
        leaf.insert(1, 30, 300);
        leaf.insert(1, 20, 200);
        leaf.insert(3, 40, 400);
        assert!(leaf.is_full());
        assert_eq!(leaf.keys(), &[10, 20, 30, 40]);

        let (ck, cv, rhs) = leaf.split(2);
        assert_eq!((ck, cv), (30, 300));
        assert_eq!(leaf.keys(), &[10, 20]);
        assert_eq!(rhs.keys(), &[40]);
        assert_eq!(rhs.val_at(0), 400);
    }

    #[test]
    fn branch_insert_and_children() {
        let mut branch = Branch::<i32, i32, 4>::one(Node::new(0), 10, 100, Node::new(1));
        branch.insert(1, 20, 200, Node::new(2));
        branch.insert(2, 30, 300, Node::new(3));
        assert_eq!(branch.keys(), &[10, 20, 30]);
        assert_eq!(branch.child_at(0), Node::new(0));
        assert_eq!(branch.child_at(1), Node::new(1));
        assert_eq!(branch.child_at(2), Node::new(2));
        assert_eq!(branch.child_at(3), Node::new(3));
    }

    #[test]
    fn branch_split_promotes_median() {
        let mut branch = Branch::<i32, i32, 4>::one(Node::new(0), 10, 100, Node::new(1));
        branch.insert(1, 20, 200, Node::new(2));
        branch.insert(2, 30, 300, Node::new(3));
        branch.insert(3, 40, 400, Node::new(4));
        assert!(branch.is_full());

        let (ck, cv, rhs) = branch.split(2);
        assert_eq!((ck, cv), (30, 300));
        assert_eq!(branch.keys(), &[10, 20]);
        assert_eq!(branch.child_at(0), Node::new(0));
        assert_eq!(branch.child_at(1), Node::new(1));
        assert_eq!(branch.child_at(2), Node::new(2));
        assert_eq!(rhs.keys(), &[40]);
        assert_eq!(rhs.child_at(0), Node::new(3));
        assert_eq!(rhs.child_at(1), Node::new(4));
    }
}
