//! The B+-tree map (§4.3): branches hold only separator keys and children,
//! never short-circuiting a lookup; values live exclusively in leaves.

use core::cmp::Ordering;
use core::marker::PhantomData;
use std::io::{self, Write};

use crate::bptree::node::{Branch, Leaf, NodeData};
use crate::error::{Error, ValidationError};
use crate::pool::NodePool;
use crate::{BranchSearch, Comparator, LeafSearch, Node, PutResult, MAX_DEPTH};

/// A B+-tree: an ordered map from `K` to `V` where only leaves carry
/// values (§3, §4.3).
///
/// `C_BRANCH`/`C_LEAF` are the per-node-kind key capacities (both at least
/// 2); `Bs` selects the branch lower-bound strategy; `Ls` selects the leaf
/// strategy and, via [`LeafSearch::LAZY`], the leaf-ordering policy:
/// [`crate::LinearLazy`] gives unordered ("lazy") leaves, any other `Ls`
/// gives strictly-sorted leaves.
pub struct BpTreeMap<
    K,
    V,
    Cmp = (),
    Bs = crate::BinaryBranchless,
    Ls = crate::BinaryBranchless,
    const C_BRANCH: usize = 8,
    const C_LEAF: usize = 8,
> where
    K: Copy,
    V: Copy,
    Cmp: Comparator<K>,
{
    nodes: NodePool<NodeData<K, V, C_BRANCH, C_LEAF>>,
    root: Node,
    depth: u32,
    count: usize,
    comp: Cmp,
    _strategy: PhantomData<(Bs, Ls)>,
}

impl<K, V, Cmp, Bs, Ls, const C_BRANCH: usize, const C_LEAF: usize>
    BpTreeMap<K, V, Cmp, Bs, Ls, C_BRANCH, C_LEAF>
where
    K: Copy,
    V: Copy,
    Cmp: Comparator<K> + Default,
    Bs: BranchSearch<K, Cmp>,
    Ls: LeafSearch<K, Cmp>,
{
    pub fn new() -> Self {
        Self::try_new().expect("allocating the initial empty leaf should never fail")
    }

    pub fn try_new() -> Result<Self, Error> {
        Self::with_comparator(Cmp::default())
    }
}

impl<K, V, Cmp, Bs, Ls, const C_BRANCH: usize, const C_LEAF: usize> Default
    for BpTreeMap<K, V, Cmp, Bs, Ls, C_BRANCH, C_LEAF>
where
    K: Copy,
    V: Copy,
    Cmp: Comparator<K> + Default,
    Bs: BranchSearch<K, Cmp>,
    Ls: LeafSearch<K, Cmp>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, Cmp, Bs, Ls, const C_BRANCH: usize, const C_LEAF: usize>
    BpTreeMap<K, V, Cmp, Bs, Ls, C_BRANCH, C_LEAF>
where
    K: Copy,
    V: Copy,
    Cmp: Comparator<K>,
    Bs: BranchSearch<K, Cmp>,
    Ls: LeafSearch<K, Cmp>,
{
    pub fn with_comparator(comp: Cmp) -> Result<Self, Error> {
        assert!(C_BRANCH >= 2, "branch capacity must be at least 2");
        assert!(C_LEAF >= 2, "leaf capacity must be at least 2");
        let mut nodes = NodePool::new();
        nodes.reserve(1)?;
        let root = nodes.alloc(NodeData::Leaf(Leaf::empty()));
        Ok(Self {
            nodes,
            root,
            depth: 0,
            count: 0,
            comp,
            _strategy: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Look up `key`. Branches never short-circuit here (§4.3): every
    /// lookup walks all the way down to a leaf.
    pub fn get(&self, key: K) -> Option<V> {
        let mut node = self.root;
        loop {
            match &self.nodes[node] {
                NodeData::Branch(b) => {
                    let i = Bs::lower_bound(b.keys(), key, &self.comp);
                    node = b.child_at(i);
                }
                NodeData::Leaf(l) => {
                    return match Ls::search(l.keys(), key, &self.comp) {
                        Ok(i) => Some(l.val_at(i)),
                        Err(_) => None,
                    };
                }
            }
        }
    }

    /// Insert `key` with `value`, or overwrite `key`'s existing value.
    pub fn put(&mut self, key: K, value: V) -> Result<PutResult, Error> {
        self.nodes.reserve(self.depth as usize + 2)?;

        let mut stack = [(self.root, 0u8); MAX_DEPTH];
        let mut stack_len = 0usize;
        let mut node = self.root;

        let leaf_ix = loop {
            match &self.nodes[node] {
                NodeData::Branch(b) => {
                    let i = Bs::lower_bound(b.keys(), key, &self.comp);
                    let child = b.child_at(i);
                    stack[stack_len] = (node, i as u8);
                    stack_len += 1;
                    node = child;
                }
                NodeData::Leaf(l) => match Ls::search(l.keys(), key, &self.comp) {
                    Ok(i) => {
                        self.nodes[node].unwrap_leaf_mut().set_val_at(i, value);
                        return self.finish_put(PutResult::Replaced);
                    }
                    Err(i) => break i,
                },
            }
        };

        self.insert_and_split(node, leaf_ix, key, value, &mut stack[..stack_len]);
        self.count += 1;
        self.finish_put(PutResult::Inserted)
    }

    /// Trace the outcome and, under the `debug-trace` feature, re-validate
    /// every invariant in §3 immediately after mutating (§7, §9).
    fn finish_put(&self, result: PutResult) -> Result<PutResult, Error> {
        #[cfg(feature = "debug-trace")]
        {
            log::trace!("put -> {result:?}, count={}", self.count);
            self.validate()
                .expect("post-mutation invariant violated under debug-trace");
        }
        Ok(result)
    }

    fn insert_and_split(
        &mut self,
        leaf: Node,
        leaf_ix: usize,
        key: K,
        value: V,
        stack: &mut [(Node, u8)],
    ) {
        let l = self.nodes[leaf].unwrap_leaf_mut();
        if !l.is_full() {
            if Ls::LAZY {
                l.append(key, value);
            } else {
                l.insert(leaf_ix, key, value);
            }
            return;
        }

        if Ls::LAZY {
            l.sort_in_place(&self.comp);
        }
        let m = C_LEAF / 2;
        // A lazy leaf's pre-split insertion index is meaningless until the
        // leaf has been sorted; recompute it fresh against the now-ordered
        // keys (§4.3's lazy split paragraph).
        let ix = if Ls::LAZY {
            lower_bound_scan(self.nodes[leaf].unwrap_leaf().keys(), key, &self.comp)
        } else {
            leaf_ix
        };

        let leaf_ref = self.nodes[leaf].unwrap_leaf_mut();
        let sep_key = leaf_ref.keys()[m - 1];
        let mut rhs_leaf = leaf_ref.split(m);
        if ix <= m {
            self.nodes[leaf].unwrap_leaf_mut().insert(ix, key, value);
        } else {
            rhs_leaf.insert(ix - m, key, value);
        }
        let mut rhs_node = self.nodes.alloc(NodeData::Leaf(rhs_leaf));
        let mut up_key = sep_key;

        for &(parent, parent_ix) in stack.iter().rev() {
            let parent_ix = parent_ix as usize;
            if !self.nodes[parent].unwrap_branch().is_full() {
                self.nodes[parent]
                    .unwrap_branch_mut()
                    .insert(parent_ix, up_key, rhs_node);
                return;
            }

            let m = C_BRANCH / 2;
            let (crit_key, mut rhs_branch) = self.nodes[parent].unwrap_branch_mut().split(m);
            if parent_ix <= m {
                self.nodes[parent]
                    .unwrap_branch_mut()
                    .insert(parent_ix, up_key, rhs_node);
            } else {
                rhs_branch.insert(parent_ix - m - 1, up_key, rhs_node);
            }
            up_key = crit_key;
            rhs_node = self.nodes.alloc(NodeData::Branch(rhs_branch));
        }

        let new_root = Branch::one(self.root, up_key, rhs_node);
        self.root = self.nodes.alloc(NodeData::Branch(new_root));
        self.depth += 1;
    }

    /// Recursively check every invariant in §3. Leaf key ordering is
    /// skipped under the lazy policy, which has no ordering to check (§4.4).
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_node(self.root, 0, self.depth, None, None)
    }

    /// `low`/`high` are the separator bounds inherited from the parent
    /// (invariant 6: `None` stands for `-infinity`/`+infinity`); every key
    /// transitively under this node must satisfy `low < key <= high`.
    fn validate_node(
        &self,
        node: Node,
        level: u32,
        depth: u32,
        low: Option<K>,
        high: Option<K>,
    ) -> Result<(), ValidationError> {
        let in_bounds = |k: K| {
            let above_low = low.map_or(true, |lo| self.comp.cmp(lo, k) == Ordering::Less);
            let at_or_below_high = high.map_or(true, |hi| self.comp.cmp(k, hi) != Ordering::Greater);
            above_low && at_or_below_high
        };

        match &self.nodes[node] {
            NodeData::Leaf(l) => {
                if level != depth {
                    return Err(ValidationError::MalformedRoot(node));
                }
                if !Ls::LAZY {
                    let keys = l.keys();
                    if !keys.windows(2).all(|w| self.comp.cmp(w[0], w[1]) == Ordering::Less) {
                        return Err(ValidationError::KeysOutOfOrder(node));
                    }
                } else if l.is_sorted() {
                    let keys = l.keys();
                    if !keys.windows(2).all(|w| self.comp.cmp(w[0], w[1]) != Ordering::Greater) {
                        return Err(ValidationError::LeafOrderingMismatch(node));
                    }
                }
                if !l.keys().iter().all(|&k| in_bounds(k)) {
                    return Err(ValidationError::SeparatorBoundViolated(node));
                }
                if depth > 0 && l.len() < C_LEAF / 2 {
                    return Err(ValidationError::BelowMinimumFill(node, l.len() as u8, (C_LEAF / 2) as u8));
                }
                Ok(())
            }
            NodeData::Branch(b) => {
                if level >= depth {
                    return Err(ValidationError::MalformedRoot(node));
                }
                let keys = b.keys();
                if !keys.windows(2).all(|w| self.comp.cmp(w[0], w[1]) == Ordering::Less) {
                    return Err(ValidationError::KeysOutOfOrder(node));
                }
                if !keys.iter().all(|&k| in_bounds(k)) {
                    return Err(ValidationError::SeparatorBoundViolated(node));
                }
                if level > 0 && b.len() < C_BRANCH / 2 {
                    return Err(ValidationError::BelowMinimumFill(node, b.len() as u8, (C_BRANCH / 2) as u8));
                }
                if level == 0 && b.len() < 1 {
                    return Err(ValidationError::MalformedRoot(node));
                }
                for i in 0..=b.len() {
                    let child_low = if i == 0 { low } else { Some(keys[i - 1]) };
                    let child_high = if i == b.len() { high } else { Some(keys[i]) };
                    self.validate_node(b.child_at(i), level + 1, depth, child_low, child_high)?;
                }
                Ok(())
            }
        }
    }

    /// Write an indented structural dump of the tree (diagnostic only).
    pub fn print(&self, w: &mut dyn Write) -> io::Result<()> {
        self.print_node(w, self.root, 0)
    }

    fn print_node(&self, w: &mut dyn Write, node: Node, indent: usize) -> io::Result<()> {
        let pad = "  ".repeat(indent);
        match &self.nodes[node] {
            NodeData::Leaf(l) => {
                writeln!(w, "{pad}leaf {node} keys={:?} sorted={}", l.keys(), l.is_sorted())?;
            }
            NodeData::Branch(b) => {
                writeln!(w, "{pad}branch {node} keys={:?}", b.keys())?;
                for i in 0..=b.len() {
                    self.print_node(w, b.child_at(i), indent + 1)?;
                }
            }
        }
        Ok(())
    }
}

/// A plain lower-bound scan over an already-sorted slice, used only to
/// re-derive an insertion position for a lazy leaf immediately after it has
/// been sorted in place (it has no meaningful position before that).
fn lower_bound_scan<K: Copy, Cmp: Comparator<K>>(keys: &[K], key: K, comp: &Cmp) -> usize {
    for (i, &k) in keys.iter().enumerate() {
        if comp.cmp(k, key) != Ordering::Less {
            return i;
        }
    }
    keys.len()
}

impl<K, V, const CB: usize, const CL: usize> NodeData<K, V, CB, CL>
where
    K: Copy,
    V: Copy,
{
    fn unwrap_leaf(&self) -> &Leaf<K, V, CL> {
        match self {
            NodeData::Leaf(l) => l,
            NodeData::Branch(_) => panic!("expected a leaf node"),
        }
    }

    fn unwrap_leaf_mut(&mut self) -> &mut Leaf<K, V, CL> {
        match self {
            NodeData::Leaf(l) => l,
            NodeData::Branch(_) => panic!("expected a leaf node"),
        }
    }

    fn unwrap_branch(&self) -> &Branch<K, CB> {
        match self {
            NodeData::Branch(b) => b,
            NodeData::Leaf(_) => panic!("expected a branch node"),
        }
    }

    fn unwrap_branch_mut(&mut self) -> &mut Branch<K, CB> {
        match self {
            NodeData::Branch(b) => b,
            NodeData::Leaf(_) => panic!("expected a branch node"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinearLazy;

    #[test]
    fn s1_small_sequential_strict() {
        let mut m: BpTreeMap<u64, u64> = BpTreeMap::new();
        assert_eq!(m.put(1, 10).unwrap(), PutResult::Inserted);
        assert_eq!(m.put(2, 20).unwrap(), PutResult::Inserted);
        assert_eq!(m.put(3, 30).unwrap(), PutResult::Inserted);
        assert_eq!(m.len(), 3);
        assert_eq!(m.get(1), Some(10));
        assert_eq!(m.get(2), Some(20));
        assert_eq!(m.get(3), Some(30));
        m.validate().unwrap();
    }

    #[test]
    fn s2_overwrite() {
        let mut m: BpTreeMap<u64, u64> = BpTreeMap::new();
        assert_eq!(m.put(7, 1).unwrap(), PutResult::Inserted);
        assert_eq!(m.put(7, 2).unwrap(), PutResult::Replaced);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(7), Some(2));
    }

    #[test]
    fn s3_forced_splits_small_capacity() {
        let mut m: BpTreeMap<u64, u64, (), crate::BinaryBranchless, crate::BinaryBranchless, 2, 2> =
            BpTreeMap::new();
        for k in 1..=20u64 {
            m.put(k, k * 10).unwrap();
        }
        assert_eq!(m.len(), 20);
        for k in 1..=20u64 {
            assert_eq!(m.get(k), Some(k * 10));
        }
        m.validate().unwrap();
    }

    #[test]
    fn lazy_leaves_round_trip_and_sort_on_split() {
        let mut m: BpTreeMap<u64, u64, (), crate::BinaryBranchless, LinearLazy, 4, 4> =
            BpTreeMap::new();
        for k in (1..=200u64).rev() {
            m.put(k, k * 2).unwrap();
        }
        assert_eq!(m.len(), 200);
        for k in 1..=200u64 {
            assert_eq!(m.get(k), Some(k * 2));
        }
        m.validate().unwrap();
    }

    #[test]
    fn descending_inserts_strict() {
        let mut m: BpTreeMap<u64, u64, (), crate::BinaryBranchless, crate::BinaryBranchless, 4, 4> =
            BpTreeMap::new();
        for k in (1..=300u64).rev() {
            m.put(k, k).unwrap();
        }
        for k in 1..=300u64 {
            assert_eq!(m.get(k), Some(k));
        }
        m.validate().unwrap();
    }
}
