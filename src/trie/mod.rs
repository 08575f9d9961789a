//! The static trie and its construction.
//!
//! A trie is a cascade of LOUDS levels. The first level maps keys to ids;
//! each deeper level stores the multi-byte edges of the level above it, and
//! the edges of the last level live in the tail.

mod builder;
mod cache;
pub(crate) mod level;
mod query;
pub(crate) mod tail;

use std::fmt;

pub use builder::TrieBuilder;
pub(crate) use cache::{Cache, ENTRY_WORDS as CACHE_ENTRY_WORDS};
pub use query::{CommonPrefixes, Predictions};

use crate::codec;
use crate::config::BuildConfig;
use level::Level;
use tail::Tail;

/// An immutable, compressed set of byte strings.
///
/// Every distinct key has a dense id in `0..num_keys()`. A trie is either
/// built from a [`Keyset`](crate::Keyset), loaded into memory, or mapped from
/// a file; queries behave the same in all three cases.
pub struct Trie {
    pub(crate) levels: Vec<Level>,
    pub(crate) tail: Tail,
    pub(crate) config: BuildConfig,
    pub(crate) num_keys: usize,
    pub(crate) io_size: usize,
}

impl Trie {
    pub(crate) fn from_parts(levels: Vec<Level>, tail: Tail, config: BuildConfig) -> Self {
        let num_keys = levels
            .first()
            .map_or(0, |level| level.terminal_flags.num_ones());
        let mut trie = Self {
            levels,
            tail,
            config,
            num_keys,
            io_size: 0,
        };
        trie.io_size = codec::io_size(&trie);
        trie
    }

    /// Number of cascading levels actually built.
    pub fn num_tries(&self) -> usize {
        self.levels.len()
    }

    /// Number of distinct keys.
    pub fn num_keys(&self) -> usize {
        self.num_keys
    }

    /// Nodes across all levels.
    pub fn num_nodes(&self) -> usize {
        self.levels.iter().map(Level::num_nodes).sum()
    }

    /// Same as [`num_keys`](Self::num_keys).
    pub fn size(&self) -> usize {
        self.num_keys
    }

    /// Bytes held by the trie's arrays.
    pub fn total_size(&self) -> usize {
        self.levels.iter().map(Level::total_size).sum::<usize>() + self.tail.total_size()
    }

    /// Exact length of the serialized form.
    pub fn io_size(&self) -> usize {
        self.io_size
    }

    /// Configuration in effect: real level count and tail mode.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }
}

impl fmt::Debug for Trie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trie")
            .field("num_tries", &self.num_tries())
            .field("num_keys", &self.num_keys)
            .field("num_nodes", &self.num_nodes())
            .field("total_size", &self.total_size())
            .field("tail_bytes", &self.tail.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keyset;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_trie_is_send_sync() {
        assert_send_sync::<Trie>();
    }

    #[test]
    fn test_stats() {
        let keys: Keyset = ["ho", "hoge", "hogehoge", "mogemoge"].into_iter().collect();
        let trie = Trie::build(&keys, BuildConfig::default()).unwrap();
        assert_eq!(trie.num_keys(), 4);
        assert_eq!(trie.size(), 4);
        assert_eq!(trie.num_tries(), 3);
        assert!(trie.num_nodes() >= 5);
        assert!(trie.total_size() > 0);
        assert_eq!(trie.io_size(), trie.to_bytes().len());
    }

    #[test]
    fn test_debug_output() {
        let keys: Keyset = ["a"].into_iter().collect();
        let trie = Trie::build(&keys, BuildConfig::default()).unwrap();
        let text = format!("{:?}", trie);
        assert!(text.contains("num_keys: 1"));
    }
}
