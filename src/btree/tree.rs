//! The classic B-tree (§4.2): `put`/`get` descend exactly as a B+-tree does,
//! except a branch holding an equal key answers the lookup immediately, and
//! a leaf split promotes its median key *and* value into the parent.

use core::cmp::Ordering;
use core::marker::PhantomData;
use std::io::{self, Write};

use crate::btree::node::{Branch, Leaf, NodeData};
use crate::error::{Error, ValidationError};
use crate::pool::NodePool;
use crate::{BranchSearch, Comparator, LeafSearch, Node, PutResult, MAX_DEPTH};

/// A classic B-tree: an ordered map from `K` to `V` where every node,
/// branches included, stores key-value pairs (§3, §4.2).
///
/// `C` is the per-node key capacity (at least 2); `Bs`/`Ls` select the
/// lower-bound search strategy used for branches and leaves respectively
/// (§4.1); `Cmp` is the key comparator (§3), defaulting to `()`, which
/// compares keys with their own `Ord` implementation.
pub struct BTreeMap<K, V, Cmp = (), Bs = crate::BinaryBranchless, Ls = crate::BinaryBranchless, const C: usize = 8>
where
    K: Copy,
    V: Copy,
    Cmp: Comparator<K>,
{
    nodes: NodePool<NodeData<K, V, C>>,
    root: Node,
    depth: u32,
    count: usize,
    comp: Cmp,
    _strategy: PhantomData<(Bs, Ls)>,
}

impl<K, V, Cmp, Bs, Ls, const C: usize> BTreeMap<K, V, Cmp, Bs, Ls, C>
where
    K: Copy,
    V: Copy,
    Cmp: Comparator<K> + Default,
    Bs: BranchSearch<K, Cmp>,
    Ls: BranchSearch<K, Cmp>,
{
    /// Create an empty map, panicking only if the very first node
    /// allocation fails (which, on a host with any free memory at all, it
    /// will not). See [`Self::try_new`] for the fallible form.
    pub fn new() -> Self {
        Self::try_new().expect("allocating the initial empty leaf should never fail")
    }

    /// Create an empty map, using the default-constructed comparator.
    pub fn try_new() -> Result<Self, Error> {
        Self::with_comparator(Cmp::default())
    }
}

impl<K, V, Cmp, Bs, Ls, const C: usize> Default for BTreeMap<K, V, Cmp, Bs, Ls, C>
where
    K: Copy,
    V: Copy,
    Cmp: Comparator<K> + Default,
    Bs: BranchSearch<K, Cmp>,
    Ls: BranchSearch<K, Cmp>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, Cmp, Bs, Ls, const C: usize> BTreeMap<K, V, Cmp, Bs, Ls, C>
where
    K: Copy,
    V: Copy,
    Cmp: Comparator<K>,
    Bs: BranchSearch<K, Cmp>,
    Ls: BranchSearch<K, Cmp>,
{
    /// Create an empty map using a specific comparator instance (useful when
    /// `Cmp` carries context that isn't `Default`).
    pub fn with_comparator(comp: Cmp) -> Result<Self, Error> {
        assert!(C >= 2, "node capacity must be at least 2");
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

    /// The number of distinct keys currently stored.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the map currently holds no entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Look up `key`, returning a copy of its value if present.
    ///
    /// A branch holding an equal key answers the lookup without descending
    /// any further (§4.2).
    pub fn get(&self, key: K) -> Option<V> {
        let mut node = self.root;
        loop {
            match &self.nodes[node] {
                NodeData::Branch(b) => {
                    let i = Bs::lower_bound(b.keys(), key, &self.comp);
                    if i < b.len() && self.comp.cmp(b.keys()[i], key) == Ordering::Equal {
                        return Some(b.val_at(i));
                    }
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
        // Worst case, a full split chain allocates one new sibling per
        // level plus a new root: reserve all of it up front so a failure
        // leaves the tree completely untouched (§5, §9).
        self.nodes.reserve(self.depth as usize + 2)?;

        let mut stack = [(self.root, 0u8); MAX_DEPTH];
        let mut stack_len = 0usize;
        let mut node = self.root;

        let leaf_ix = loop {
            match &self.nodes[node] {
                NodeData::Branch(b) => {
                    let i = Bs::lower_bound(b.keys(), key, &self.comp);
                    if i < b.len() && self.comp.cmp(b.keys()[i], key) == Ordering::Equal {
                        self.nodes[node].unwrap_branch_mut().set_val_at(i, value);
                        return self.finish_put(PutResult::Replaced);
                    }
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

    /// Insert `(key, value)` at `leaf_ix` in `leaf`, splitting and
    /// propagating a promoted separator up `stack` as needed (§4.2 steps
    /// 3-6). Mirrors the teacher's `Path::split_and_insert`, generalised to
    /// a branch that also carries a value.
    fn insert_and_split(
        &mut self,
        leaf: Node,
        leaf_ix: usize,
        key: K,
        value: V,
        stack: &mut [(Node, u8)],
    ) {
        if !self.nodes[leaf].unwrap_leaf().is_full() {
            self.nodes[leaf].unwrap_leaf_mut().insert(leaf_ix, key, value);
            return;
        }

        let m = C / 2;
        let (mut up_key, mut up_val, mut rhs_leaf) = self.nodes[leaf].unwrap_leaf_mut().split(m);
        if leaf_ix <= m {
            self.nodes[leaf].unwrap_leaf_mut().insert(leaf_ix, key, value);
        } else {
            rhs_leaf.insert(leaf_ix - (m + 1), key, value);
        }
        let mut rhs_node = self.nodes.alloc(NodeData::Leaf(rhs_leaf));

        // Walk back up the recorded ancestors, inserting the promoted
        // separator, splitting again if a parent is full.
        for &(parent, parent_ix) in stack.iter().rev() {
            let parent_ix = parent_ix as usize;
            if !self.nodes[parent].unwrap_branch().is_full() {
                self.nodes[parent]
                    .unwrap_branch_mut()
                    .insert(parent_ix, up_key, up_val, rhs_node);
                return;
            }

            let m = C / 2;
            let (crit_key, crit_val, mut rhs_branch) =
                self.nodes[parent].unwrap_branch_mut().split(m);
            if parent_ix <= m {
                self.nodes[parent]
                    .unwrap_branch_mut()
                    .insert(parent_ix, up_key, up_val, rhs_node);
            } else {
                rhs_branch.insert(parent_ix - m - 1, up_key, up_val, rhs_node);
            }
            up_key = crit_key;
            up_val = crit_val;
            rhs_node = self.nodes.alloc(NodeData::Branch(rhs_branch));
        }

        // The split propagated past the original root: grow the tree.
        let new_root = Branch::one(self.root, up_key, up_val, rhs_node);
        self.root = self.nodes.alloc(NodeData::Branch(new_root));
        self.depth += 1;
    }

    /// Recursively check every invariant in §3, returning the first
    /// violation found.
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
                let keys = l.keys();
                if !keys.windows(2).all(|w| self.comp.cmp(w[0], w[1]) == Ordering::Less) {
                    return Err(ValidationError::KeysOutOfOrder(node));
                }
                if !keys.iter().all(|&k| in_bounds(k)) {
                    return Err(ValidationError::SeparatorBoundViolated(node));
                }
                if depth > 0 && l.len() < C / 2 {
                    return Err(ValidationError::BelowMinimumFill(node, l.len() as u8, (C / 2) as u8));
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
                if level > 0 && b.len() < C / 2 {
                    return Err(ValidationError::BelowMinimumFill(node, b.len() as u8, (C / 2) as u8));
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
                writeln!(w, "{pad}leaf {node} keys={:?}", l.keys())?;
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

impl<K, V, const C: usize> NodeData<K, V, C>
where
    K: Copy,
    V: Copy,
{
    fn unwrap_leaf(&self) -> &Leaf<K, V, C> {
        match self {
            NodeData::Leaf(l) => l,
            NodeData::Branch(_) => panic!("expected a leaf node"),
        }
    }

    fn unwrap_leaf_mut(&mut self) -> &mut Leaf<K, V, C> {
        match self {
            NodeData::Leaf(l) => l,
            NodeData::Branch(_) => panic!("expected a leaf node"),
        }
    }

    fn unwrap_branch(&self) -> &Branch<K, V, C> {
        match self {
            NodeData::Branch(b) => b,
            NodeData::Leaf(_) => panic!("expected a branch node"),
        }
    }

    fn unwrap_branch_mut(&mut self) -> &mut Branch<K, V, C> {
        match self {
            NodeData::Branch(b) => b,
            NodeData::Leaf(_) => panic!("expected a branch node"),
        }
    }
}
