//! Per-level transition cache.
//!
//! The first level caches downward transitions keyed by `(parent, label)`;
//! deeper levels are walked upward and cache `child -> parent`. Each slot
//! keeps the heaviest transition that hashed to it.

use crate::config::CacheLevel;
use crate::succinct::Array;

const INVALID_NODE: u32 = u32::MAX;
const INVALID_EXTRA: u32 = u32::MAX;
pub(crate) const ENTRY_WORDS: usize = 4;

/// Number of slots for a level with `num_keys` distinct keys.
///
/// First-level caches keep at least 256 slots so that, for a fixed parent,
/// every label maps to a distinct slot.
pub(crate) fn cache_size(first_level: bool, num_keys: usize, level: CacheLevel) -> usize {
    let mut size = if first_level { 256 } else { 1 };
    while size < num_keys / level.divisor() {
        size *= 2;
    }
    size
}

#[inline]
fn downward_slot(parent: usize, label: u8, mask: usize) -> usize {
    (parent ^ (parent << 5) ^ label as usize) & mask
}

/// A cached edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CacheEntry {
    parent: u32,
    child: u32,
    base: u8,
    extra: u32,
}

impl CacheEntry {
    #[inline]
    pub(crate) fn parent(&self) -> usize {
        self.parent as usize
    }

    #[inline]
    pub(crate) fn child(&self) -> usize {
        self.child as usize
    }

    /// Edge label of a single-byte edge.
    #[inline]
    pub(crate) fn label(&self) -> u8 {
        self.base
    }

    /// Link value of a multi-byte edge.
    #[inline]
    pub(crate) fn link(&self) -> Option<usize> {
        if self.extra == INVALID_EXTRA {
            None
        } else {
            Some(self.base as usize | ((self.extra as usize) << 8))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Cache {
    /// `ENTRY_WORDS` words per slot: parent, child, base, extra
    pub(crate) entries: Array<u32>,
    mask: usize,
}

impl Cache {
    /// Wrap raw slot words. The slot count must be a power of two.
    pub(crate) fn from_words(entries: Array<u32>) -> Self {
        let slots = entries.len() / ENTRY_WORDS;
        Self {
            entries,
            mask: slots.saturating_sub(1),
        }
    }

    pub(crate) fn num_slots(&self) -> usize {
        self.entries.len() / ENTRY_WORDS
    }

    #[inline]
    fn entry(&self, slot: usize) -> CacheEntry {
        let base = slot * ENTRY_WORDS;
        CacheEntry {
            parent: self.entries.get(base),
            child: self.entries.get(base + 1),
            base: self.entries.get(base + 2) as u8,
            extra: self.entries.get(base + 3),
        }
    }

    /// Cached child of `parent` along the edge starting with `label`.
    #[inline]
    pub(crate) fn find_child(&self, parent: usize, label: u8) -> Option<CacheEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let entry = self.entry(downward_slot(parent, label, self.mask));
        let hit = entry.parent() == parent && (entry.link().is_some() || entry.label() == label);
        hit.then_some(entry)
    }

    /// Cached edge ending at `child`.
    #[inline]
    pub(crate) fn find_parent(&self, child: usize) -> Option<CacheEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let entry = self.entry(child & self.mask);
        (entry.child() == child).then_some(entry)
    }

    /// Slot words must decode to valid node ids or the empty marker.
    pub(crate) fn check(&self, num_nodes: usize) -> bool {
        let slots = self.num_slots();
        if self.entries.len() % ENTRY_WORDS != 0 || (slots != 0 && !slots.is_power_of_two()) {
            return false;
        }
        (0..slots).all(|slot| {
            let entry = self.entry(slot);
            if entry.child == INVALID_NODE {
                entry.parent == INVALID_NODE
            } else {
                entry.child() < num_nodes && entry.parent() < num_nodes
            }
        })
    }

    pub(crate) fn total_size(&self) -> usize {
        self.entries.size_in_bytes()
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    parent: u32,
    child: u32,
    weight: f32,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            parent: 0,
            child: 0,
            weight: f32::MIN_POSITIVE,
        }
    }
}

/// Collects the heaviest transitions while a level is laid out.
#[derive(Debug)]
pub(crate) struct CacheBuilder {
    slots: Vec<Slot>,
    mask: usize,
    downward: bool,
}

impl CacheBuilder {
    pub(crate) fn new(size: usize, downward: bool) -> Self {
        debug_assert!(size.is_power_of_two());
        Self {
            slots: vec![Slot::default(); size],
            mask: size - 1,
            downward,
        }
    }

    pub(crate) fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn insert(&mut self, parent: u32, child: u32, weight: f32, label: u8) {
        let slot = if self.downward {
            downward_slot(parent as usize, label, self.mask)
        } else {
            child as usize & self.mask
        };
        let entry = &mut self.slots[slot];
        if weight > entry.weight {
            *entry = Slot {
                parent,
                child,
                weight,
            };
        }
    }

    /// Resolve labels and link values once the level's links are known.
    ///
    /// `extra_of` returns the high link bits of a link node, or `None`.
    pub(crate) fn finish(self, bases: &[u8], extra_of: impl Fn(usize) -> Option<u32>) -> Cache {
        let mut words = Vec::with_capacity(self.slots.len() * ENTRY_WORDS);
        for slot in &self.slots {
            // Child 0 is the root and never cached, so it marks an unused slot.
            if slot.child != 0 {
                let child = slot.child as usize;
                words.push(slot.parent);
                words.push(slot.child);
                words.push(bases[child] as u32);
                words.push(extra_of(child).unwrap_or(INVALID_EXTRA));
            } else {
                words.extend_from_slice(&[INVALID_NODE, INVALID_NODE, 0, INVALID_EXTRA]);
            }
        }
        Cache::from_words(words.into())
    }
}
