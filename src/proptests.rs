use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

type Entry = (String, String, u64);

fn validate_tree(t: &Pretree) {
    // The flat form must decode back to the same number of nodes.
    let mut flat = t.clone();
    flat.freeze().unwrap();
    let rebuilt = Pretree::from_flat(
        t.config().clone(),
        flat.flat().unwrap().as_chars().to_vec(),
    )
    .unwrap();
    assert_eq!(rebuilt.node_count().unwrap(), t.node_count().unwrap());

    let mut by_depth: Vec<(usize, u64)> = Vec::new();
    t.walk(|e| by_depth.push((e.depth, e.votes.total()))).unwrap();
    for (i, &(depth, total)) in by_depth.iter().enumerate() {
        let below: u64 = by_depth[i + 1..]
            .iter()
            .take_while(|&&(d, _)| d > depth)
            .filter(|&&(d, _)| d == depth + 1)
            .map(|&(_, t)| t)
            .sum();
        // Every key ends in a leaf, so inner votes are exactly the children's.
        if below > 0 {
            assert_eq!(total, below, "inner node votes must sum its children");
        }
    }
}

fn word_strategy() -> impl Strategy<Value = String> + Clone {
    // A small alphabet forces shared prefixes and splits.
    "[abcd]{1,6}"
}

fn entries_strategy() -> impl Strategy<Value = Vec<Entry>> {
    prop::collection::vec((word_strategy(), "[xyz]", 1u64..=5), 0..=60)
}

fn trained(entries: &[Entry], reverse: bool) -> Pretree {
    let mut t = Pretree::new();
    t.set_reverse(reverse);
    for (word, class, count) in entries {
        t.train(word, class, *count).unwrap();
    }
    t
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_save_load_roundtrip(
        entries in entries_strategy(),
        reverse in any::<bool>(),
        threshold in prop_oneof![Just(0.0), Just(0.5), Just(0.75)],
    ) {
        let mut t = trained(&entries, reverse);
        t.set_threshold(threshold).unwrap();
        let expected: Vec<(String, f64)> = entries
            .iter()
            .map(|(w, c, _)| (t.classify(w), t.probability_for_class(w, c)))
            .collect();

        let bytes = t.to_bytes().unwrap();
        let loaded = Pretree::from_bytes(&bytes).unwrap();
        prop_assert!(loaded.is_flat());
        prop_assert_eq!(loaded.config(), t.config());
        for ((w, c, _), (class, p)) in entries.iter().zip(&expected) {
            prop_assert_eq!(&loaded.classify(w), class);
            prop_assert_eq!(loaded.probability_for_class(w, c), *p);
        }
    }

    #[test]
    fn prop_representations_agree(
        entries in entries_strategy(),
        queries in prop::collection::vec("[abcde]{0,8}", 0..=30),
        reverse in any::<bool>(),
    ) {
        let object = trained(&entries, reverse);
        validate_tree(&object);
        let mut frozen = object.clone();
        frozen.freeze().unwrap();

        let words = entries.iter().map(|(w, _, _)| w.as_str()).chain(queries.iter().map(String::as_str));
        for word in words {
            prop_assert_eq!(object.classify(word), frozen.classify(word));
            for mode in [LookupMode::Exact, LookupMode::NearestBelow, LookupMode::NearestAbove] {
                prop_assert_eq!(
                    object.get(word, mode).unwrap(),
                    frozen.get(word, mode).unwrap()
                );
            }
        }
        prop_assert_eq!(object.to_map().unwrap(), frozen.to_map().unwrap());
        prop_assert!(frozen.is_flat());
    }

    #[test]
    fn prop_counts_accumulate(
        word in word_strategy(),
        class in "[xyz]",
        n in 1u64..=20,
    ) {
        let mut once = Pretree::new();
        once.train(&word, &class, n).unwrap();
        let mut repeated = Pretree::new();
        for _ in 0..n {
            repeated.train(&word, &class, 1).unwrap();
        }
        prop_assert_eq!(once.to_map().unwrap(), repeated.to_map().unwrap());
        prop_assert_eq!(repeated.total_count().unwrap(), n);
    }

    #[test]
    fn prop_prune_keeps_unambiguous_decisions(
        entries in entries_strategy(),
        queries in prop::collection::vec("[abcde]{0,8}", 0..=30),
        reverse in any::<bool>(),
    ) {
        let mut t = trained(&entries, reverse);
        let words: Vec<&str> = entries
            .iter()
            .map(|(w, _, _)| w.as_str())
            .chain(queries.iter().map(String::as_str))
            .collect();
        let before: BTreeMap<&str, Option<String>> = words
            .iter()
            .map(|&w| {
                let votes = t.class_distribution(w).unwrap();
                (w, votes.only_label().map(str::to_string))
            })
            .collect();
        let nodes = t.node_count().unwrap();

        t.prune().unwrap();
        prop_assert!(t.node_count().unwrap() <= nodes);
        for (word, label) in before {
            if let Some(label) = label {
                prop_assert_eq!(t.classify(word), label, "word {:?}", word);
            }
        }
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

/// Node keys with their votes, independent of label order.
fn shape(t: &Pretree) -> BTreeMap<String, Vec<(String, u64)>> {
    let mut out = BTreeMap::new();
    t.walk(|e| {
        let mut votes: Vec<(String, u64)> = e.votes.iter().map(|v| (v.label.clone(), v.count)).collect();
        votes.sort();
        out.insert(e.key.iter().collect(), votes);
    })
    .unwrap();
    out
}

#[test]
fn exhaustive_insert_order_small_set() {
    let words = ["a", "b", "ab", "abc", "abd", "ba"];
    // Distinct counts per label rule out ties, so decisions cannot depend on
    // first-seen order.
    let entries: Vec<(&str, String, u64)> = words
        .iter()
        .enumerate()
        .map(|(i, &w)| (w, format!("c{i}"), i as u64 + 1))
        .collect();

    let reference = {
        let mut t = Pretree::new();
        for (w, c, n) in &entries {
            t.train(w, c, *n).unwrap();
        }
        t
    };
    let expected_shape = shape(&reference);
    let queries = ["a", "abx", "abcd", "b", "bb", "zz", ""];

    for_each_permutation(&entries, |perm| {
        let mut t = Pretree::new();
        for (w, c, n) in &perm {
            t.train(w, c, *n).unwrap();
        }
        validate_tree(&t);
        assert_eq!(shape(&t), expected_shape);
        for query in queries {
            assert_eq!(t.classify(query), reference.classify(query), "query {query:?}");
        }
    });
}
