//! Trie construction.
//!
//! Each level is laid out breadth-first over the sorted keys. Edges longer
//! than one byte become links; their strings are the keys of the next level,
//! or go to the tail once `num_tries` levels exist.

use std::borrow::Cow;
use std::collections::VecDeque;

use tracing::debug;

use super::cache::{cache_size, CacheBuilder};
use super::level::Level;
use super::tail::Tail;
use super::Trie;
use crate::config::{BuildConfig, NodeOrder};
use crate::error::{BuildErrorKind, Result, TrieError};
use crate::keyset::Keyset;
use crate::succinct::{BitVector, BitVectorBuilder, FlatVector};

/// Builds a [`Trie`] from a [`Keyset`] with a fixed [`BuildConfig`].
///
/// The keyset is only read, so one keyset can feed any number of builds.
#[derive(Debug, Clone, Default)]
pub struct TrieBuilder {
    config: BuildConfig,
}

#[derive(Debug)]
struct BuildKey<'a> {
    bytes: Cow<'a, [u8]>,
    weight: f32,
    /// Position in the input of this level
    id: usize,
    /// Node where the key ends
    terminal: u32,
}

impl<'a> BuildKey<'a> {
    fn new(bytes: Cow<'a, [u8]>, weight: f32) -> Self {
        Self {
            bytes,
            weight,
            id: 0,
            terminal: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct KeyRange {
    begin: usize,
    end: usize,
    key_pos: usize,
}

#[derive(Debug, Clone, Copy)]
struct WeightedRange {
    range: KeyRange,
    weight: f32,
}

/// Multi-byte edge collected while laying out a level.
#[derive(Debug)]
struct LinkString {
    bytes: Vec<u8>,
    weight: f32,
}

/// A level whose link values are not known yet.
#[derive(Debug)]
struct LevelDraft {
    louds: BitVectorBuilder,
    link_flags: BitVectorBuilder,
    bases: Vec<u8>,
    cache: CacheBuilder,
    num_l1_nodes: usize,
    link_values: Vec<u32>,
}

impl TrieBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn build(&self, keyset: &Keyset) -> Result<Trie> {
        self.config.validate()?;
        if keyset.is_empty() {
            return Err(TrieError::build(
                BuildErrorKind::EmptyKeyset,
                "keyset is empty",
            ));
        }
        if let Some(index) = keyset.iter().position(|key| key.is_empty()) {
            return Err(TrieError::build(
                BuildErrorKind::EmptyKey,
                format!("key at index {} is empty", index),
            ));
        }

        let num_tries = self.config.num_tries as usize;
        let mut keys: Vec<BuildKey<'_>> = keyset
            .iter()
            .map(|key| BuildKey::new(Cow::Borrowed(key.as_bytes()), key.weight()))
            .collect();
        let mut drafts: Vec<LevelDraft> = Vec::new();
        let mut key_terminals = Vec::new();
        let mut tail = Tail::new(self.config.tail_mode, Default::default());

        loop {
            let first = drafts.is_empty();
            let (draft, terminals, links) = build_level(&mut keys, &self.config, first)?;
            match drafts.last_mut() {
                Some(prev) => prev.link_values = terminals,
                None => key_terminals = terminals,
            }
            debug!(
                level = drafts.len(),
                keys = keys.len(),
                nodes = draft.bases.len(),
                links = links.len(),
                cache_slots = draft.cache.num_slots(),
                "built trie level"
            );
            drafts.push(draft);

            if links.is_empty() {
                break;
            }
            if drafts.len() == num_tries {
                // The tail stores each edge in query order.
                let entries: Vec<Vec<u8>> = links
                    .into_iter()
                    .map(|link| if first { link.bytes } else { reversed(link.bytes) })
                    .collect();
                let (built, offsets) = Tail::build(&entries, self.config.tail_mode)?;
                if let Some(last) = drafts.last_mut() {
                    last.link_values = offsets;
                }
                tail = built;
                break;
            }

            // A nested level is walked upward, so its keys run against query order.
            keys = links
                .into_iter()
                .map(|link| {
                    let bytes = if first { reversed(link.bytes) } else { link.bytes };
                    BuildKey::new(Cow::Owned(bytes), link.weight)
                })
                .collect();
        }

        let levels = drafts
            .into_iter()
            .enumerate()
            .map(|(i, draft)| {
                let terminal_flags = if i == 0 {
                    build_terminal_flags(draft.bases.len(), &key_terminals)
                } else {
                    BitVectorBuilder::new().build(false, false)
                };
                finish_level(draft, terminal_flags, i == 0)
            })
            .collect::<Vec<_>>();

        let config = BuildConfig {
            num_tries: levels.len() as u32,
            tail_mode: tail.mode,
            ..self.config
        };
        let trie = Trie::from_parts(levels, tail, config);
        debug!(
            keys = trie.num_keys(),
            levels = trie.num_tries(),
            nodes = trie.num_nodes(),
            bytes = trie.total_size(),
            "built trie"
        );
        Ok(trie)
    }
}

impl Trie {
    /// Build a trie with `config`; see [`TrieBuilder::build`].
    pub fn build(keyset: &Keyset, config: BuildConfig) -> Result<Trie> {
        TrieBuilder::new(config).build(keyset)
    }
}

fn reversed(mut bytes: Vec<u8>) -> Vec<u8> {
    bytes.reverse();
    bytes
}

/// Lay out one level and return it with each input key's terminal node and
/// the level's link strings, in link-node order.
fn build_level(
    keys: &mut [BuildKey<'_>],
    config: &BuildConfig,
    first: bool,
) -> Result<(LevelDraft, Vec<u32>, Vec<LinkString>)> {
    for (i, key) in keys.iter_mut().enumerate() {
        key.id = i;
    }
    keys.sort_by(|a, b| a.bytes.cmp(&b.bytes));
    let num_unique = 1 + keys.windows(2).filter(|w| w[0].bytes != w[1].bytes).count();

    let mut cache = CacheBuilder::new(cache_size(first, num_unique, config.cache_level), first);
    let mut louds = BitVectorBuilder::new();
    louds.push(true);
    louds.push(false);
    let mut bases = vec![0u8];
    let mut link_flags = BitVectorBuilder::new();
    link_flags.push(false);
    let mut links = Vec::new();
    let mut num_l1_nodes = 0;

    let mut queue = VecDeque::new();
    queue.push_back(KeyRange {
        begin: 0,
        end: keys.len(),
        key_pos: 0,
    });
    let mut children: Vec<WeightedRange> = Vec::new();

    while let Some(mut range) = queue.pop_front() {
        let node_id = link_flags.len() - queue.len() - 1;

        while range.begin < range.end && keys[range.begin].bytes.len() == range.key_pos {
            keys[range.begin].terminal = node_id as u32;
            range.begin += 1;
        }
        if range.begin == range.end {
            louds.push(false);
            continue;
        }

        children.clear();
        let mut weight = keys[range.begin].weight as f64;
        for i in range.begin + 1..range.end {
            if keys[i - 1].bytes[range.key_pos] != keys[i].bytes[range.key_pos] {
                children.push(WeightedRange {
                    range: KeyRange {
                        begin: range.begin,
                        end: i,
                        key_pos: range.key_pos,
                    },
                    weight: weight as f32,
                });
                range.begin = i;
                weight = 0.0;
            }
            weight += keys[i].weight as f64;
        }
        children.push(WeightedRange {
            range,
            weight: weight as f32,
        });
        if config.node_order == NodeOrder::Weight {
            children.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        }
        if node_id == 0 {
            num_l1_nodes = children.len();
        }

        for child in &mut children {
            let head = &keys[child.range.begin].bytes;
            let mut key_pos = child.range.key_pos + 1;
            while key_pos < head.len() {
                let agree = (child.range.begin + 1..child.range.end)
                    .all(|j| keys[j - 1].bytes[key_pos] == keys[j].bytes[key_pos]);
                if !agree {
                    break;
                }
                key_pos += 1;
            }

            let child_id = u32::try_from(link_flags.len()).map_err(|_| {
                TrieError::build(
                    BuildErrorKind::SizeLimit,
                    "trie level exceeds 32-bit node ids",
                )
            })?;
            let label = head[child.range.key_pos];
            cache.insert(node_id as u32, child_id, child.weight, label);

            if key_pos == child.range.key_pos + 1 {
                bases.push(label);
                link_flags.push(false);
            } else {
                bases.push(0);
                link_flags.push(true);
                links.push(LinkString {
                    bytes: head[child.range.key_pos..key_pos].to_vec(),
                    weight: child.weight,
                });
            }
            child.range.key_pos = key_pos;
            queue.push_back(child.range);
            louds.push(true);
        }
        louds.push(false);
    }
    louds.push(false);

    let mut terminals = vec![0u32; keys.len()];
    for key in keys.iter() {
        terminals[key.id] = key.terminal;
    }

    let draft = LevelDraft {
        louds,
        link_flags,
        bases,
        cache,
        num_l1_nodes,
        link_values: Vec::new(),
    };
    Ok((draft, terminals, links))
}

fn build_terminal_flags(num_nodes: usize, terminals: &[u32]) -> BitVector {
    let mut flags = vec![false; num_nodes];
    for &node in terminals {
        flags[node as usize] = true;
    }
    let mut builder = BitVectorBuilder::new();
    for flag in flags {
        builder.push(flag);
    }
    builder.build(false, true)
}

/// Store link values and freeze a level.
fn finish_level(draft: LevelDraft, terminal_flags: BitVector, first: bool) -> Level {
    let LevelDraft {
        louds,
        link_flags,
        mut bases,
        cache,
        num_l1_nodes,
        link_values,
    } = draft;

    let link_nodes: Vec<usize> = (0..bases.len()).filter(|&i| link_flags.get(i)).collect();
    debug_assert_eq!(link_nodes.len(), link_values.len());
    let mut extras = Vec::with_capacity(link_values.len());
    for (&node, &value) in link_nodes.iter().zip(&link_values) {
        bases[node] = value as u8;
        extras.push(value >> 8);
    }

    let link_flags = link_flags.build(false, false);
    let extras = FlatVector::build(&extras);
    let cache = cache.finish(&bases, |child| {
        link_flags
            .get(child)
            .then(|| extras.get(link_flags.rank1(child)))
    });

    Level {
        louds: louds.build(first, true),
        terminal_flags,
        link_flags,
        bases: bases.into(),
        extras,
        cache,
        num_l1_nodes,
    }
}
