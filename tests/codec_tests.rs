//! Integration tests for saving, loading and mapping tries.

use std::io::Cursor;

use marisa_trie_r::{BuildConfig, Keyset, NodeOrder, TailMode, Trie, TrieError};
use tempfile::TempDir;

fn words() -> Vec<String> {
    let mut words: Vec<String> = (0..500)
        .map(|i| format!("key-{:05}-{}", i * 7919 % 100_000, i % 13))
        .collect();
    words.extend(["apple", "applet", "application", "apply", "banana", "band"].map(String::from));
    words
}

fn build(config: BuildConfig) -> (Trie, Vec<String>) {
    let words = words();
    let keys: Keyset = words.iter().collect();
    (Trie::build(&keys, config).unwrap(), words)
}

fn assert_same_answers(expected: &Trie, actual: &Trie, words: &[String]) {
    assert_eq!(actual.num_keys(), expected.num_keys());
    assert_eq!(actual.num_tries(), expected.num_tries());
    assert_eq!(actual.num_nodes(), expected.num_nodes());
    assert_eq!(actual.config(), expected.config());
    for word in words {
        let id = expected.lookup(word);
        assert_eq!(actual.lookup(word), id, "{}", word);
        let id = id.unwrap();
        assert_eq!(actual.reverse_lookup(id), expected.reverse_lookup(id));
    }
    let a: Vec<_> = expected.predictive("app").collect();
    let b: Vec<_> = actual.predictive("app").collect();
    assert_eq!(a, b);
    let a: Vec<_> = expected.common_prefixes("applications").collect();
    let b: Vec<_> = actual.common_prefixes("applications").collect();
    assert_eq!(a, b);
}

mod roundtrip_tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let (trie, words) = build(BuildConfig::default());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("words.marisa");

        trie.save(&path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, trie.io_size());

        let loaded = Trie::load(&path).unwrap();
        assert!(!loaded.is_mapped());
        assert_same_answers(&trie, &loaded, &words);
    }

    #[cfg(feature = "mmap")]
    #[test]
    fn test_save_and_mmap() {
        let (trie, words) = build(BuildConfig::default());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("words.marisa");
        trie.save(&path).unwrap();

        let mapped = Trie::mmap(&path).unwrap();
        assert!(mapped.is_mapped());
        assert_same_answers(&trie, &mapped, &words);
        // A mapped trie serializes to the same bytes.
        assert_eq!(mapped.to_bytes(), trie.to_bytes());
    }

    #[cfg(feature = "mmap")]
    #[test]
    fn test_mapped_trie_outlives_other_handles() {
        let (trie, _) = build(BuildConfig::default());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("words.marisa");
        trie.save(&path).unwrap();
        drop(trie);

        let mapped = Trie::mmap(&path).unwrap();
        let handle = std::thread::spawn(move || mapped.lookup("banana"));
        assert!(handle.join().unwrap().is_some());
    }

    #[test]
    fn test_write_to_and_read_from() {
        let config = BuildConfig::new()
            .with_num_tries(2)
            .with_tail_mode(TailMode::Binary)
            .with_node_order(NodeOrder::Label);
        let (trie, words) = build(config);

        let mut buf = Vec::new();
        trie.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), trie.io_size());

        let restored = Trie::read_from(Cursor::new(buf)).unwrap();
        assert_same_answers(&trie, &restored, &words);
        assert_eq!(restored.config().tail_mode, TailMode::Binary);
        assert_eq!(restored.config().node_order, NodeOrder::Label);
    }

    #[test]
    fn test_io_size_for_every_shape() {
        for num_tries in [1, 2, 3, 4] {
            for tail_mode in [TailMode::Text, TailMode::Binary] {
                let config = BuildConfig::new()
                    .with_num_tries(num_tries)
                    .with_tail_mode(tail_mode);
                let (trie, _) = build(config);
                assert_eq!(trie.to_bytes().len(), trie.io_size());
            }
        }
    }

    #[test]
    fn test_reload_every_shape() {
        let dir = TempDir::new().unwrap();
        for num_tries in [1, 2, 3, 4] {
            for tail_mode in [TailMode::Text, TailMode::Binary] {
                let config = BuildConfig::new()
                    .with_num_tries(num_tries)
                    .with_tail_mode(tail_mode);
                let (trie, words) = build(config);
                let bytes = trie.to_bytes();

                let restored = Trie::from_bytes(&bytes).unwrap();
                assert_same_answers(&trie, &restored, &words);

                let path = dir
                    .path()
                    .join(format!("shape-{}-{:?}.marisa", num_tries, tail_mode));
                trie.save(&path).unwrap();
                let loaded = Trie::load(&path).unwrap();
                assert_same_answers(&trie, &loaded, &words);

                #[cfg(feature = "mmap")]
                {
                    let mapped = Trie::mmap(&path).unwrap();
                    assert_same_answers(&trie, &mapped, &words);
                }
            }
        }
    }

    #[test]
    fn test_small_multi_level_tries_reload() {
        let keys: Keyset = ["ho", "hoge", "hogehoge", "mogemoge"].into_iter().collect();
        for num_tries in 1..=3 {
            let config = BuildConfig::new().with_num_tries(num_tries);
            let trie = Trie::build(&keys, config).unwrap();
            let restored = Trie::from_bytes(&trie.to_bytes()).unwrap();
            assert_eq!(restored.num_tries(), trie.num_tries());
            for key in ["ho", "hoge", "hogehoge", "mogemoge"] {
                assert_eq!(restored.lookup(key), trie.lookup(key), "{}", key);
            }
            assert_eq!(restored.lookup("hog"), None);
        }
    }

    #[test]
    fn test_saving_is_deterministic() {
        let (a, _) = build(BuildConfig::default());
        let (b, _) = build(BuildConfig::default());
        assert_eq!(a.to_bytes(), b.to_bytes());
    }
}

mod corruption_tests {
    use super::*;

    fn is_corrupt(result: Result<Trie, TrieError>) -> bool {
        matches!(result, Err(TrieError::CorruptFormat(_)))
    }

    #[test]
    fn test_every_truncation_rejected() {
        let (trie, _) = build(BuildConfig::default());
        let bytes = trie.to_bytes();
        for len in (0..bytes.len()).step_by(7) {
            assert!(is_corrupt(Trie::from_bytes(&bytes[..len])), "length {}", len);
        }
        assert!(is_corrupt(Trie::from_bytes(&bytes[..bytes.len() - 1])));
    }

    #[test]
    fn test_flipped_byte_rejected() {
        let (trie, _) = build(BuildConfig::default());
        let bytes = trie.to_bytes();
        for pos in [0, 9, 40, bytes.len() / 2, bytes.len() - 20, bytes.len() - 2] {
            let mut damaged = bytes.clone();
            damaged[pos] ^= 0x40;
            assert!(is_corrupt(Trie::from_bytes(&damaged)), "byte {}", pos);
        }
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let (trie, _) = build(BuildConfig::default());
        let mut bytes = trie.to_bytes();
        bytes.extend_from_slice(&[0; 8]);
        assert!(is_corrupt(Trie::from_bytes(&bytes)));
    }

    #[test]
    fn test_not_a_trie() {
        assert!(is_corrupt(Trie::from_bytes(b"")));
        assert!(is_corrupt(Trie::from_bytes(&[0xAB; 256])));
    }

    #[test]
    fn test_corrupt_file_on_disk() {
        let (trie, _) = build(BuildConfig::default());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.marisa");
        let mut bytes = trie.to_bytes();
        bytes.truncate(bytes.len() / 2);
        std::fs::write(&path, &bytes).unwrap();

        assert!(is_corrupt(Trie::load(&path)));
        #[cfg(feature = "mmap")]
        assert!(is_corrupt(Trie::mmap(&path)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.marisa");
        assert!(matches!(Trie::load(&path), Err(TrieError::Io(_))));
        #[cfg(feature = "mmap")]
        assert!(matches!(Trie::mmap(&path), Err(TrieError::Io(_))));
    }
}
