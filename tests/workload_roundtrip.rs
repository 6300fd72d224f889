//! S5: a reproducible pseudo-random workload round-trips through both map
//! types, then gets fully re-inserted with its own recorded values and is
//! expected to report `Replaced` everywhere with `count` unchanged.

use std::collections::HashMap;

use maps_forest::{BTreeMap, BpTreeMap, PutResult};

const WORKLOAD_SIZE: usize = 1 << 14;

/// The xorshift64 generator named in §9 of the harness design: small,
/// dependency-free, and fully reproducible from a fixed seed.
struct Xorshift64(u64);

impl Xorshift64 {
    fn new(seed: u64) -> Self {
        Self(seed | 1)
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

fn workload(seed: u64) -> Vec<(u64, u64)> {
    let mut rng = Xorshift64::new(seed);
    (0..WORKLOAD_SIZE)
        .map(|_| (rng.next_u64() % (WORKLOAD_SIZE as u64 * 4), rng.next_u64()))
        .collect()
}

fn last_value_per_key(pairs: &[(u64, u64)]) -> HashMap<u64, u64> {
    let mut last = HashMap::new();
    for &(k, v) in pairs {
        last.insert(k, v);
    }
    last
}

#[test]
fn btree_workload_round_trips() {
    let pairs = workload(0x5EED_u64);
    let mut map: BTreeMap<u64, u64, (), maps_forest::BinaryBranchless, maps_forest::BinaryBranchless, 16> =
        BTreeMap::new();
    for &(k, v) in &pairs {
        map.put(k, v).unwrap();
    }

    let last = last_value_per_key(&pairs);
    assert_eq!(map.len(), last.len());
    for (&k, &v) in &last {
        assert_eq!(map.get(k), Some(v));
    }
    map.validate().unwrap();

    let count_before = map.len();
    for (&k, &v) in &last {
        assert_eq!(map.put(k, v).unwrap(), PutResult::Replaced);
    }
    assert_eq!(map.len(), count_before);
}

#[test]
fn bptree_workload_round_trips() {
    let pairs = workload(0xC0FFEE_u64);
    let mut map: BpTreeMap<
        u64,
        u64,
        (),
        maps_forest::BinaryBranchless,
        maps_forest::BinaryBranchless,
        16,
        16,
    > = BpTreeMap::new();
    for &(k, v) in &pairs {
        map.put(k, v).unwrap();
    }

    let last = last_value_per_key(&pairs);
    assert_eq!(map.len(), last.len());
    for (&k, &v) in &last {
        assert_eq!(map.get(k), Some(v));
    }
    map.validate().unwrap();

    let count_before = map.len();
    for (&k, &v) in &last {
        assert_eq!(map.put(k, v).unwrap(), PutResult::Replaced);
    }
    assert_eq!(map.len(), count_before);
}
