//! Property tests against a brute-force model of the key set.

use std::collections::BTreeSet;

use marisa_trie_r::{BuildConfig, Keyset, NodeOrder, TailMode, Trie};
use proptest::{
    collection::vec,
    prelude::{any, prop_assert, prop_assert_eq, prop_oneof, Just, Strategy},
    proptest,
    test_runner::Config as ProptestConfig,
};

/// Small alphabet so that keys share prefixes and suffixes.
fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    vec(prop_oneof![Just(b'a'), Just(b'b'), Just(b'c'), Just(0u8), any::<u8>()], 1..12)
}

fn config_strategy() -> impl Strategy<Value = BuildConfig> {
    (
        1u32..5,
        prop_oneof![Just(TailMode::Text), Just(TailMode::Binary)],
        prop_oneof![Just(NodeOrder::Label), Just(NodeOrder::Weight)],
    )
        .prop_map(|(num_tries, tail_mode, node_order)| {
            BuildConfig::new()
                .with_num_tries(num_tries)
                .with_tail_mode(tail_mode)
                .with_node_order(node_order)
        })
}

fn build(keys: &[Vec<u8>], config: BuildConfig) -> Trie {
    let keyset: Keyset = keys.iter().collect();
    Trie::build(&keyset, config).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_ids_are_a_bijection(keys in vec(key_strategy(), 1..60), config in config_strategy()) {
        let trie = build(&keys, config);
        let distinct: BTreeSet<&Vec<u8>> = keys.iter().collect();
        prop_assert_eq!(trie.num_keys(), distinct.len());

        let mut ids = BTreeSet::new();
        for key in &distinct {
            let id = trie.lookup(key.as_slice());
            prop_assert!(id.is_some());
            let id = id.unwrap();
            prop_assert!((id as usize) < trie.num_keys());
            ids.insert(id);
            let restored = trie.reverse_lookup(id);
            prop_assert_eq!(restored.as_ref(), Some(*key));
        }
        prop_assert_eq!(ids.len(), distinct.len());
    }

    #[test]
    fn prop_absent_keys_not_found(
        keys in vec(key_strategy(), 1..40),
        probes in vec(key_strategy(), 1..40),
    ) {
        let trie = build(&keys, BuildConfig::default());
        for probe in &probes {
            prop_assert_eq!(trie.contains(probe.as_slice()), keys.contains(probe));
        }
    }

    #[test]
    fn prop_common_prefixes_match_model(
        keys in vec(key_strategy(), 1..40),
        query in key_strategy(),
        config in config_strategy(),
    ) {
        let trie = build(&keys, config);
        let expected: Vec<&[u8]> = (1..=query.len())
            .map(|len| &query[..len])
            .filter(|prefix| keys.iter().any(|k| k.as_slice() == *prefix))
            .collect();
        let found: Vec<&[u8]> = trie.common_prefixes(query.as_slice()).map(|(_, k)| k).collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn prop_predictive_matches_model(
        keys in vec(key_strategy(), 1..40),
        query in vec(prop_oneof![Just(b'a'), Just(b'b'), Just(0u8)], 0..3),
        config in config_strategy(),
    ) {
        let trie = build(&keys, config);
        let expected: BTreeSet<&[u8]> = keys
            .iter()
            .filter(|k| k.starts_with(&query))
            .map(|k| k.as_slice())
            .collect();

        let found: Vec<(u32, Vec<u8>)> = trie.predictive(query.as_slice()).collect();
        prop_assert_eq!(found.len(), expected.len());
        for window in found.windows(2) {
            prop_assert!(window[0].0 < window[1].0);
        }
        for (id, key) in &found {
            prop_assert!(expected.contains(key.as_slice()));
            prop_assert_eq!(trie.lookup(key.as_slice()), Some(*id));
        }
    }

    #[test]
    fn prop_bytes_roundtrip(keys in vec(key_strategy(), 1..40), config in config_strategy()) {
        let trie = build(&keys, config);
        let bytes = trie.to_bytes();
        prop_assert_eq!(bytes.len(), trie.io_size());
        let restored = Trie::from_bytes(&bytes).unwrap();
        for key in &keys {
            prop_assert_eq!(restored.lookup(key.as_slice()), trie.lookup(key.as_slice()));
        }
    }
}
