use super::{AvlTreeMap, AvlTreeSet};

use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u32),
    Remove(u16),
    Get(u16),
    Clear,
}

fn key_strategy() -> impl Strategy<Value = u16> + Clone {
    // Small key space so removals and lookups hit existing keys often
    0u16..512
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        50 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        30 => key.clone().prop_map(Op::Remove),
        19 => key.prop_map(Op::Get),
        1 => Just(Op::Clear),
    ];
    prop::collection::vec(op, 0..=1000)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_map_matches_btree_map(ops in ops_strategy()) {
        let mut t: AvlTreeMap<u16, u32> = AvlTreeMap::new();
        let mut m: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    // The tree keeps equal keys side by side, stick to unique ones here
                    if m.contains_key(&key) {
                        prop_assert!(t.contains_key(&key));
                    } else {
                        let capacity = t.capacity();
                        t.insert(key, value);
                        m.insert(key, value);
                        prop_assert!(t.capacity() >= capacity);
                    }
                }
                Op::Remove(key) => {
                    let capacity = t.capacity();
                    prop_assert_eq!(t.remove(&key), m.remove(&key));
                    prop_assert_eq!(t.capacity(), capacity);
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                }
                Op::Clear => {
                    let capacity = t.capacity();
                    t.clear();
                    m.clear();
                    prop_assert_eq!(t.capacity(), capacity);
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        t.check_consistency();
        let got: Vec<(u16, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, u32)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_set_counts_duplicates(ops in ops_strategy()) {
        let mut t: AvlTreeSet<u16> = AvlTreeSet::new();
        let mut counts: BTreeMap<u16, usize> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(value, _) => {
                    t.insert(value);
                    *counts.entry(value).or_default() += 1;
                }
                Op::Remove(value) => {
                    let expected = match counts.get_mut(&value) {
                        Some(count) => {
                            *count -= 1;
                            if *count == 0 {
                                counts.remove(&value);
                            }
                            true
                        }
                        None => false,
                    };
                    prop_assert_eq!(t.remove(&value), expected);
                }
                Op::Get(value) => {
                    prop_assert_eq!(t.contains(&value), counts.contains_key(&value));
                }
                Op::Clear => {
                    t.clear();
                    counts.clear();
                }
            }

            prop_assert_eq!(t.len(), counts.values().sum::<usize>());
        }

        t.check_consistency();
        let got: Vec<u16> = t.iter().copied().collect();
        let expected: Vec<u16> = counts
            .iter()
            .flat_map(|(value, count)| std::iter::repeat(*value).take(*count))
            .collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_round_trip_leaves_empty(mut values in prop::collection::hash_set(any::<i32>(), 0..300)
        .prop_map(|values| values.into_iter().collect::<Vec<_>>())
        .prop_shuffle())
    {
        let mut t = AvlTreeSet::new();
        for value in &values {
            t.insert(*value);
        }
        t.check_consistency();
        prop_assert_eq!(t.len(), values.len());

        values.reverse();
        for value in &values {
            prop_assert!(t.remove(value));
        }
        t.check_consistency();
        prop_assert!(t.is_empty());
        prop_assert_eq!(t.height(), 0);
    }
}
