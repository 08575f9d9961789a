//! MARISA-style static trie dictionary for Rust
//!
//! This library maps a fixed set of byte strings to dense integer ids and
//! back, with support for:
//! - Exact lookup and reverse lookup (id to key)
//! - Common-prefix search (stored keys that prefix a query)
//! - Predictive search (stored keys that start with a query)
//! - Recursive trie cascading with a suffix tail for compact storage
//! - Saving, loading and memory-mapping the compiled trie
//!
//! # Example
//!
//! ```rust
//! use marisa_trie_r::{BuildConfig, Keyset, Trie};
//!
//! let mut keyset = Keyset::new();
//! for key in ["ho", "hoge", "hogehoge", "mogemoge"] {
//!     keyset.push(key);
//! }
//!
//! // Build with the default config
//! let trie = Trie::build(&keyset, BuildConfig::default()).unwrap();
//!
//! // Exact match
//! assert_eq!(trie.lookup("hoge"), Some(2));
//! assert_eq!(trie.lookup("foo"), None);
//! assert_eq!(trie.reverse_lookup(0).unwrap(), b"ho");
//!
//! // Keys below a prefix
//! let found: Vec<_> = trie.predictive("h").collect();
//! assert_eq!(found.len(), 3);
//! ```
//!
//! # Configuration
//!
//! | Field | Values | Default |
//! |-------|--------|---------|
//! | `num_tries` | `1..=127` | `3` |
//! | `cache_level` | `huge`, `large`, `normal`, `small`, `tiny` | `normal` |
//! | `tail_mode` | `text`, `binary` | `text` |
//! | `node_order` | `label`, `weight` | `weight` |
//!
//! With `node_order = weight`, heavier edges are tried first while walking
//! the trie. Ids always stay dense in `0..num_keys()`.

mod codec;
pub mod config;
pub mod error;
pub mod keyset;
mod succinct;
pub mod trie;

// Re-export commonly used items
pub use config::{
    BuildConfig, CacheLevel, NodeOrder, TailMode, DEFAULT_NUM_TRIES, MAX_NUM_TRIES, MIN_NUM_TRIES,
};
pub use error::{BuildErrorKind, Result, TrieError};
pub use keyset::{Key, Keyset, DEFAULT_WEIGHT};
pub use trie::{CommonPrefixes, Predictions, Trie, TrieBuilder};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_workflow() {
        // Collect keys, one of them twice
        let mut keyset = Keyset::new();
        keyset.push("ho");
        keyset.push("hoge");
        keyset.push("hogehoge");
        keyset.push("mogemoge");
        keyset.push("hoge");
        assert_eq!(keyset.len(), 5);

        // Build from a JSON config
        let config = BuildConfig::from_json(r#"{ "num_tries": 2 }"#).unwrap();
        let trie = TrieBuilder::new(config).build(&keyset).unwrap();
        assert_eq!(trie.num_keys(), 4);
        assert!(trie.num_tries() <= 2);

        // Every key maps back to itself
        for key in &keyset {
            let id = trie.lookup(key.as_bytes()).unwrap();
            assert_eq!(trie.reverse_lookup(id).unwrap(), key.as_bytes());
        }

        // Prefixes of a long query, shortest first
        let prefixes: Vec<_> = trie
            .common_prefixes("hogehogehoge")
            .map(|(_, key)| key)
            .collect();
        assert_eq!(prefixes, vec![&b"ho"[..], &b"hoge"[..], &b"hogehoge"[..]]);

        // Round trip through bytes
        let restored = Trie::from_bytes(&trie.to_bytes()).unwrap();
        assert_eq!(restored.lookup("mogemoge"), trie.lookup("mogemoge"));
        assert_eq!(restored.config(), trie.config());
    }
}
