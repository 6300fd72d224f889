//! Property-based coverage of §8's universal properties against `BTreeMap`.

use std::collections::HashMap as StdHashMap;

use maps_forest::{BTreeMap, PutResult};
use proptest::prelude::*;

type Map = BTreeMap<u32, u32, (), maps_forest::BinaryBranchless, maps_forest::BinaryBranchless, 4>;

fn model_of(pairs: &[(u32, u32)]) -> StdHashMap<u32, u32> {
    let mut model = StdHashMap::new();
    for &(k, v) in pairs {
        model.insert(k, v);
    }
    model
}

proptest! {
    /// Property 1 & 4: every inserted key reads back its last-written value;
    /// every key never inserted reads back `None`.
    #[test]
    fn insert_then_lookup(pairs in prop::collection::vec((0u32..500, any::<u32>()), 0..200)) {
        let mut map = Map::new();
        for &(k, v) in &pairs {
            map.put(k, v).unwrap();
        }
        let model = model_of(&pairs);
        for k in 0u32..500 {
            prop_assert_eq!(map.get(k), model.get(&k).copied());
        }
    }

    /// Property 3: `count` tracks the number of distinct keys ever inserted.
    #[test]
    fn count_matches_distinct_keys(pairs in prop::collection::vec((0u32..500, any::<u32>()), 0..200)) {
        let mut map = Map::new();
        for &(k, v) in &pairs {
            map.put(k, v).unwrap();
        }
        prop_assert_eq!(map.len(), model_of(&pairs).len());
    }

    /// Property 2: a repeated `put` on the same key always replaces, never
    /// grows `count`, and always resolves to the most recent value.
    #[test]
    fn overwrite_preserves_count(k in 0u32..500, v1 in any::<u32>(), v2 in any::<u32>()) {
        let mut map = Map::new();
        prop_assert_eq!(map.put(k, v1).unwrap(), PutResult::Inserted);
        let before = map.len();
        prop_assert_eq!(map.put(k, v2).unwrap(), PutResult::Replaced);
        prop_assert_eq!(map.len(), before);
        prop_assert_eq!(map.get(k), Some(v2));
    }

    /// Property 5: every invariant in §3 holds after every single `put`, not
    /// just after the whole sequence.
    #[test]
    fn invariants_hold_after_every_put(pairs in prop::collection::vec((0u32..500, any::<u32>()), 0..200)) {
        let mut map = Map::new();
        for &(k, v) in &pairs {
            map.put(k, v).unwrap();
            map.validate().unwrap();
        }
    }

    /// Property 6: the final map is independent of insertion order, aside
    /// from which value wins on a repeated key.
    #[test]
    fn ordering_independence(
        pairs in prop::collection::vec((0u32..80, any::<u32>()), 0..120),
        seed in any::<u64>(),
    ) {
        let mut shuffled = pairs.clone();
        let mut state = seed | 1;
        for i in (1..shuffled.len()).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let j = (state as usize) % (i + 1);
            shuffled.swap(i, j);
        }

        let mut a = Map::new();
        for &(k, v) in &pairs {
            a.put(k, v).unwrap();
        }
        let mut b = Map::new();
        for &(k, v) in &shuffled {
            b.put(k, v).unwrap();
        }

        for k in 0u32..80 {
            prop_assert_eq!(a.get(k), b.get(k));
        }
        prop_assert_eq!(a.len(), b.len());
    }
}

// Property 8's negative half (validate aborts on a corrupted tree) needs
// access to private node state to actually corrupt anything; see
// `validate_catches_corrupted_leaf` in `src/btree/tree.rs`'s own test module.
