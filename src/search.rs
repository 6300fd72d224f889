//! Search primitives (§4.1): four lower-bound strategies usable by both
//! branches and leaves under strict ordering, plus a leaf-only strategy for
//! unordered ("lazy") leaves.
//!
//! All four lower-bound strategies return the same answer for the same
//! input — the index `i` such that `keys[..i]` all compare strictly less
//! than the search key and `keys[i..]` all compare greater-or-equal — they
//! only differ in how they get there. Which one is fastest depends on `C`
//! and the branch predictor, which is the whole point of making the choice
//! a compile-time parameter instead of a runtime one.

use core::cmp::Ordering;

use crate::Comparator;

/// A compile-time selectable lower-bound search strategy, usable for both
/// branch and leaf nodes under strict (sorted) ordering.
pub trait BranchSearch<K, C>
where
    K: Copy,
    C: Comparator<K>,
{
    /// The lower-bound insertion index for `key` in the sorted slice `keys`.
    fn lower_bound(keys: &[K], key: K, comp: &C) -> usize;
}

/// A compile-time selectable leaf search strategy.
///
/// `Ok(i)` means `keys[i]` is equal to `key` under `comp`; `Err(i)` gives the
/// position a new key should be inserted at to respect the leaf's ordering
/// policy (a true lower bound under strict ordering, or simply `keys.len()`
/// — "append it" — under the lazy policy, §4.3).
pub trait LeafSearch<K, C>
where
    K: Copy,
    C: Comparator<K>,
{
    /// Whether this strategy implies the lazy (unordered, append-and-scan)
    /// leaf policy of §4.3. Only [`LinearLazy`] sets this.
    const LAZY: bool = false;

    /// Search `keys` for `key`.
    fn search(keys: &[K], key: K, comp: &C) -> Result<usize, usize>;
}

/// Every strict lower-bound strategy is also a valid leaf strategy: find the
/// lower bound, then check the key actually there for equality.
impl<K, Cmp, S> LeafSearch<K, Cmp> for S
where
    K: Copy,
    Cmp: Comparator<K>,
    S: BranchSearch<K, Cmp>,
{
    fn search(keys: &[K], key: K, comp: &Cmp) -> Result<usize, usize> {
        let i = S::lower_bound(keys, key, comp);
        if i < keys.len() && comp.cmp(keys[i], key) == Ordering::Equal {
            Ok(i)
        } else {
            Err(i)
        }
    }
}

/// Scan from index 0; return the first index whose key is not less than the
/// search key. Predictable for small `n`, and the fallback tail strategy
/// `Dynamic` switches to once its bisection interval gets small.
pub struct Linear;

impl<K, Cmp> BranchSearch<K, Cmp> for Linear
where
    K: Copy,
    Cmp: Comparator<K>,
{
    fn lower_bound(keys: &[K], key: K, comp: &Cmp) -> usize {
        for (i, &k) in keys.iter().enumerate() {
            if comp.cmp(k, key) != Ordering::Less {
                return i;
            }
        }
        keys.len()
    }
}

/// Scan from the high end, folding the per-element comparison into a
/// two-element table indexed by a boolean instead of branching on it.
pub struct LinearBranchless;

impl<K, Cmp> BranchSearch<K, Cmp> for LinearBranchless
where
    K: Copy,
    Cmp: Comparator<K>,
{
    fn lower_bound(keys: &[K], key: K, comp: &Cmp) -> usize {
        let mut bound = keys.len();
        for i in (0..keys.len()).rev() {
            let still_at_or_above = comp.cmp(keys[i], key) != Ordering::Less;
            bound = [bound, i][still_at_or_above as usize];
        }
        bound
    }
}

/// Classic branchless lower-bound bisection: halve the search interval each
/// step using a two-element index table instead of an `if`, then apply one
/// final boolean correction once the interval has collapsed to one element.
pub struct BinaryBranchless;

impl<K, Cmp> BranchSearch<K, Cmp> for BinaryBranchless
where
    K: Copy,
    Cmp: Comparator<K>,
{
    fn lower_bound(keys: &[K], key: K, comp: &Cmp) -> usize {
        let n = keys.len();
        let mut base = 0usize;
        let mut len = n;
        while len > 1 {
            let half = len / 2;
            let less = comp.cmp(keys[base + half - 1], key) == Ordering::Less;
            base = [base, base + half][less as usize];
            len -= half;
        }
        let less = n > 0 && comp.cmp(keys[base], key) == Ordering::Less;
        [base, base + 1][less as usize]
    }
}

/// Binary bisection while the remaining interval is longer than `CUTOFF`,
/// then a linear scan over what's left — the hybrid strategy for node sizes
/// where neither pure strategy wins outright.
pub struct Dynamic<const CUTOFF: usize>;

impl<K, Cmp, const CUTOFF: usize> BranchSearch<K, Cmp> for Dynamic<CUTOFF>
where
    K: Copy,
    Cmp: Comparator<K>,
{
    fn lower_bound(keys: &[K], key: K, comp: &Cmp) -> usize {
        let mut lo = 0usize;
        let mut hi = keys.len();
        while hi - lo > CUTOFF {
            let mid = lo + (hi - lo) / 2;
            if comp.cmp(keys[mid], key) == Ordering::Less {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo + Linear::lower_bound(&keys[lo..hi], key, comp)
    }
}

/// Leaf-only strategy for unordered ("lazy") leaves (§4.3): an equality scan
/// that returns the index of a matching key, or `keys.len()` — append — if
/// none is present. This does **not** compute a lower bound and must never
/// be used for a branch; it has no `BranchSearch` impl; only leaves may name
/// it as their `leaf_search` strategy.
pub struct LinearLazy;

impl<K, Cmp> LeafSearch<K, Cmp> for LinearLazy
where
    K: Copy,
    Cmp: Comparator<K>,
{
    const LAZY: bool = true;

    fn search(keys: &[K], key: K, comp: &Cmp) -> Result<usize, usize> {
        for (i, &k) in keys.iter().enumerate() {
            if comp.cmp(k, key) == Ordering::Equal {
                return Ok(i);
            }
        }
        Err(keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check<Cmp, S>(comp: &Cmp, keys: &[i32])
    where
        Cmp: Comparator<i32>,
        S: BranchSearch<i32, Cmp>,
    {
        for probe in -1..=keys.len() as i32 * 10 {
            let expected = keys.iter().take_while(|&&k| k < probe).count();
            assert_eq!(
                S::lower_bound(keys, probe, comp),
                expected,
                "probe {probe} over {keys:?}"
            );
        }
    }

    #[test]
    fn lower_bound_strategies_agree() {
        let comp = ();
        let cases: &[&[i32]] = &[&[], &[5], &[1, 3, 5, 7, 9], &[2, 2, 2, 2], &[0, 10, 20, 30, 40, 50, 60]];
        for keys in cases {
            check::<_, Linear>(&comp, keys);
            check::<_, LinearBranchless>(&comp, keys);
            check::<_, BinaryBranchless>(&comp, keys);
            check::<_, Dynamic<2>>(&comp, keys);
            check::<_, Dynamic<0>>(&comp, keys);
        }
    }

    #[test]
    fn leaf_search_finds_equal_key() {
        let comp = ();
        let keys = [1, 3, 5, 7, 9];
        assert_eq!(Linear::search(&keys, 5, &comp), Ok(2));
        assert_eq!(Linear::search(&keys, 4, &comp), Err(2));
        assert_eq!(BinaryBranchless::search(&keys, 9, &comp), Ok(4));
        assert_eq!(BinaryBranchless::search(&keys, 10, &comp), Err(5));
    }

    #[test]
    fn linear_lazy_is_order_agnostic() {
        let comp = ();
        let keys = [9, 1, 5, 3];
        assert_eq!(LinearLazy::search(&keys, 5, &comp), Ok(2));
        assert_eq!(LinearLazy::search(&keys, 2, &comp), Err(4));
    }
}
