//! Build configuration.
//!
//! A [`BuildConfig`] is validated as a whole before any build work starts.
//! It can be assembled with the `with_*` setters or parsed from JSON:
//!
//! ```
//! use marisa_trie_r::{BuildConfig, NodeOrder, TailMode};
//!
//! let config = BuildConfig::from_json(r#"{ "num_tries": 2, "tail_mode": "binary" }"#).unwrap();
//! assert_eq!(config.num_tries, 2);
//! assert_eq!(config.tail_mode, TailMode::Binary);
//! assert_eq!(config.node_order, NodeOrder::Weight);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrieError};

/// Smallest accepted number of cascading trie levels.
pub const MIN_NUM_TRIES: u32 = 1;
/// Largest accepted number of cascading trie levels.
pub const MAX_NUM_TRIES: u32 = 127;
/// Number of cascading trie levels used when none is given.
pub const DEFAULT_NUM_TRIES: u32 = 3;

const NUM_TRIES_MASK: u32 = 0x0007F;
const CACHE_LEVEL_MASK: u32 = 0x00F80;
const TAIL_MODE_MASK: u32 = 0x0F000;
const NODE_ORDER_MASK: u32 = 0xF0000;
const CONFIG_MASK: u32 = NUM_TRIES_MASK | CACHE_LEVEL_MASK | TAIL_MODE_MASK | NODE_ORDER_MASK;

/// Density of the per-level transition cache.
///
/// A larger cache speeds up lookups at the cost of memory. It never changes
/// which keys are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheLevel {
    Huge,
    Large,
    #[default]
    Normal,
    Small,
    Tiny,
}

impl CacheLevel {
    /// Number of keys per cache slot.
    pub(crate) fn divisor(self) -> usize {
        match self {
            CacheLevel::Huge => 128,
            CacheLevel::Large => 256,
            CacheLevel::Normal => 512,
            CacheLevel::Small => 1024,
            CacheLevel::Tiny => 2048,
        }
    }

    fn flag(self) -> u32 {
        match self {
            CacheLevel::Huge => 0x00080,
            CacheLevel::Large => 0x00100,
            CacheLevel::Normal => 0x00200,
            CacheLevel::Small => 0x00400,
            CacheLevel::Tiny => 0x00800,
        }
    }

    fn from_flag(flag: u32) -> Option<Self> {
        match flag {
            0 | 0x00200 => Some(CacheLevel::Normal),
            0x00080 => Some(CacheLevel::Huge),
            0x00100 => Some(CacheLevel::Large),
            0x00400 => Some(CacheLevel::Small),
            0x00800 => Some(CacheLevel::Tiny),
            _ => None,
        }
    }
}

/// Encoding of the suffixes stored below the last trie level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailMode {
    /// NUL-terminated strings with suffix sharing. Falls back to `Binary`
    /// when a suffix contains a NUL byte.
    #[default]
    Text,
    /// Length-prefixed strings, stored individually.
    Binary,
}

impl TailMode {
    fn flag(self) -> u32 {
        match self {
            TailMode::Text => 0x01000,
            TailMode::Binary => 0x02000,
        }
    }

    fn from_flag(flag: u32) -> Option<Self> {
        match flag {
            0 | 0x01000 => Some(TailMode::Text),
            0x02000 => Some(TailMode::Binary),
            _ => None,
        }
    }

    pub(crate) fn code(self) -> u64 {
        match self {
            TailMode::Text => 0,
            TailMode::Binary => 1,
        }
    }

    pub(crate) fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(TailMode::Text),
            1 => Some(TailMode::Binary),
            _ => None,
        }
    }
}

/// Order in which sibling edges are enumerated; this fixes id assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeOrder {
    /// Ascending label byte.
    Label,
    /// Heaviest subtree first; ties keep label order.
    #[default]
    Weight,
}

impl NodeOrder {
    fn flag(self) -> u32 {
        match self {
            NodeOrder::Label => 0x10000,
            NodeOrder::Weight => 0x20000,
        }
    }

    fn from_flag(flag: u32) -> Option<Self> {
        match flag {
            0 | 0x20000 => Some(NodeOrder::Weight),
            0x10000 => Some(NodeOrder::Label),
            _ => None,
        }
    }
}

/// Parameters of a trie build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Number of cascading trie levels
    pub num_tries: u32,
    /// Transition cache density
    pub cache_level: CacheLevel,
    /// Tail encoding
    pub tail_mode: TailMode,
    /// Sibling enumeration order
    pub node_order: NodeOrder,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            num_tries: DEFAULT_NUM_TRIES,
            cache_level: CacheLevel::default(),
            tail_mode: TailMode::default(),
            node_order: NodeOrder::default(),
        }
    }
}

impl BuildConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of cascading trie levels.
    pub fn with_num_tries(mut self, num_tries: u32) -> Self {
        self.num_tries = num_tries;
        self
    }

    /// Set the cache level.
    pub fn with_cache_level(mut self, cache_level: CacheLevel) -> Self {
        self.cache_level = cache_level;
        self
    }

    /// Set the tail mode.
    pub fn with_tail_mode(mut self, tail_mode: TailMode) -> Self {
        self.tail_mode = tail_mode;
        self
    }

    /// Set the node order.
    pub fn with_node_order(mut self, node_order: NodeOrder) -> Self {
        self.node_order = node_order;
        self
    }

    /// Check every field; nothing is applied if any field is out of range.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_NUM_TRIES..=MAX_NUM_TRIES).contains(&self.num_tries) {
            return Err(TrieError::InvalidConfig(format!(
                "num_tries {} outside [{}, {}]",
                self.num_tries, MIN_NUM_TRIES, MAX_NUM_TRIES
            )));
        }
        Ok(())
    }

    /// Parse a config from JSON and validate it. Missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: BuildConfig = serde_json::from_str(text)
            .map_err(|e| TrieError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Packed flag word used by the persisted header.
    pub(crate) fn to_flags(self) -> u32 {
        self.num_tries
            | self.cache_level.flag()
            | self.tail_mode.flag()
            | self.node_order.flag()
    }

    /// Decode a packed flag word. A zero field takes its default.
    pub(crate) fn from_flags(flags: u32) -> Result<Self> {
        if flags & !CONFIG_MASK != 0 {
            return Err(TrieError::InvalidConfig(format!(
                "unknown config bits {:#x}",
                flags & !CONFIG_MASK
            )));
        }

        let num_tries = match flags & NUM_TRIES_MASK {
            0 => DEFAULT_NUM_TRIES,
            n => n,
        };
        let cache_level = CacheLevel::from_flag(flags & CACHE_LEVEL_MASK);
        let tail_mode = TailMode::from_flag(flags & TAIL_MODE_MASK);
        let node_order = NodeOrder::from_flag(flags & NODE_ORDER_MASK);

        match (cache_level, tail_mode, node_order) {
            (Some(cache_level), Some(tail_mode), Some(node_order)) => {
                let config = Self {
                    num_tries,
                    cache_level,
                    tail_mode,
                    node_order,
                };
                config.validate()?;
                Ok(config)
            }
            _ => Err(TrieError::InvalidConfig(format!(
                "invalid config flags {:#x}",
                flags
            ))),
        }
    }
}
