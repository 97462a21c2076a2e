use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::{BTreeMap, BTreeSet};

fn validate_map(t: &BoundedIntMap) {
    assert_eq!(t.max_size() % WORD_BITS as usize, 0);
    assert_eq!(t.max_key(), t.max_size() as i64 - 1);

    let keys: Vec<i64> = t.iter().map(|(k, _)| k).collect();
    assert_eq!(keys.len(), t.len(), "iterated entries must match len");
    assert!(
        keys.windows(2).all(|w| w[0] < w[1]),
        "keys must be strictly ascending"
    );
    assert!(keys.iter().all(|&k| (0..=t.max_key()).contains(&k)));
}

#[derive(Clone, Debug, Arbitrary)]
enum MapOp {
    #[proptest(weight = 5)]
    Put(#[proptest(strategy = "-4i64..20_000")] i64, i64),
    #[proptest(weight = 3)]
    Get(#[proptest(strategy = "-4i64..40_000")] i64),
    #[proptest(weight = 2)]
    Contains(#[proptest(strategy = "-4i64..40_000")] i64),
}

#[derive(Clone, Debug, Arbitrary)]
enum ShardOp {
    Put(
        #[proptest(strategy = "prop_oneof![9 => -4i64..(1i64 << 22), 1 => any::<i64>()]")] i64,
        i64,
    ),
    Get(#[proptest(strategy = "prop_oneof![9 => -4i64..(1i64 << 23), 1 => any::<i64>()]")] i64),
}

fn set_values() -> impl Strategy<Value = Vec<i64>> {
    let value = prop_oneof![
        3 => -50i64..500,
        1 => any::<i64>(),
    ];
    prop::collection::vec(value, 0..=1500)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_map_equivalence(
        capacity in 0usize..300,
        ops in prop::collection::vec(any::<MapOp>(), 0..=1000),
    ) {
        let mut t = BoundedIntMap::with_capacity(capacity);
        let mut m: BTreeMap<i64, i64> = BTreeMap::new();

        for op in ops {
            match op {
                MapOp::Put(key, value) => {
                    let got = t.put(key, value);
                    if key < 0 {
                        prop_assert_eq!(got, Err(Error::OutOfRange { key }));
                    } else {
                        prop_assert_eq!(got, Ok(m.insert(key, value)));
                    }
                }
                MapOp::Get(key) => {
                    let expected = m.get(&key).copied();
                    prop_assert_eq!(t.get(key), expected);

                    let mut out = [0, 0];
                    prop_assert_eq!(t.get_into(key, &mut out), expected.is_some());
                    prop_assert_eq!(out, expected.map_or([0, 0], |v| [1, v]));
                }
                MapOp::Contains(key) => {
                    prop_assert_eq!(t.contains_key(key), m.contains_key(&key));
                }
            }
            prop_assert_eq!(t.len(), m.len());
        }

        validate_map(&t);
        let got: Vec<(i64, i64)> = t.iter().collect();
        let expected: Vec<(i64, i64)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_growth_doubles(
        capacity in 0usize..5000,
        keys in prop::collection::vec(0i64..5000, 0..50),
    ) {
        let mut t = BoundedIntMap::with_capacity(capacity);
        for &k in &keys {
            t.put(k % (t.max_key() + 1), k).unwrap();
        }
        let before: Vec<(i64, i64)> = t.iter().collect();

        let old = t.max_size();
        t.put(old as i64, -1).unwrap();
        prop_assert_eq!(t.max_size(), 2 * old);
        prop_assert_eq!(t.max_key(), 2 * old as i64 - 1);
        prop_assert_eq!(t.get(old as i64), Some(-1));
        for (k, v) in before {
            prop_assert_eq!(t.get(k), Some(v));
        }
    }

    #[test]
    fn prop_sharded_equivalence(ops in prop::collection::vec(any::<ShardOp>(), 0..=500)) {
        let mut t = ShardedBoundedIntMap::new();
        let mut m: BTreeMap<i64, i64> = BTreeMap::new();

        for op in ops {
            match op {
                ShardOp::Put(key, value) => {
                    let got = t.put(key, value);
                    if key < 0 {
                        prop_assert!(got.is_err());
                    } else {
                        prop_assert_eq!(got, Ok(m.insert(key, value)));
                    }
                }
                ShardOp::Get(key) => {
                    prop_assert_eq!(t.get(key), m.get(&key).copied());
                    prop_assert_eq!(t.contains_key(key), m.contains_key(&key));
                }
            }
        }

        prop_assert_eq!(t.len(), m.len());
        let got: Vec<(i64, i64)> = t.iter().collect();
        let expected: Vec<(i64, i64)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_frozen_membership(
        batches in prop::collection::vec(set_values(), 0..4),
        queries in prop::collection::vec(-100i64..1000, 0..200),
    ) {
        let mut builder = LongSetBuilder::new();
        let mut model: BTreeSet<i64> = BTreeSet::new();
        let mut accepted = 0;

        for (i, batch) in batches.iter().enumerate() {
            if i % 2 == 0 {
                builder.add_all(batch);
            } else {
                for &v in batch {
                    builder.add(v);
                }
            }
            for &v in batch.iter().filter(|&&v| v >= 0) {
                model.insert(v);
                accepted += 1;
            }
        }
        prop_assert_eq!(builder.len(), accepted);

        let set = builder.finalize();
        prop_assert_eq!(set.len(), accepted);
        prop_assert_eq!(set.distinct_len(), model.len());

        let mut stored: Vec<i64> = set.iter().collect();
        stored.sort_unstable();
        prop_assert_eq!(&stored, &model.iter().copied().collect::<Vec<_>>());

        for &v in &model {
            prop_assert!(set.contains(v));
        }
        for &v in &queries {
            prop_assert_eq!(set.contains(v), model.contains(&v));
        }

        let report = set.report();
        if accepted == 0 {
            prop_assert_eq!(report.bucket_count, 1);
        } else {
            prop_assert!(report.bucket_count > 2 * accepted);
            prop_assert!(report.bucket_count <= 5 * accepted);
        }
        prop_assert!(set.max_collisions() <= report.max_bucket_len);
        prop_assert_eq!(set.lookup_count(), (model.len() + queries.len()) as u64);
    }
}
