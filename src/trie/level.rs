//! One LOUDS-encoded trie level.
//!
//! Node 0 is the root. Nodes are numbered in breadth-first order; the
//! children of a node occupy a contiguous id range. Every non-root node has
//! one label byte: either the edge label, or the low 8 bits of a link value
//! when the edge is longer than one byte.

use std::ops::Range;

use super::cache::Cache;
use crate::succinct::{Array, BitVector, FlatVector};

#[derive(Debug, Clone, Default)]
pub(crate) struct Level {
    pub(crate) louds: BitVector,
    /// Only set on the first level
    pub(crate) terminal_flags: BitVector,
    pub(crate) link_flags: BitVector,
    pub(crate) bases: Array<u8>,
    /// High bits of link values, indexed by link rank
    pub(crate) extras: FlatVector,
    pub(crate) cache: Cache,
    /// Children of the root are nodes `1..=num_l1_nodes`
    pub(crate) num_l1_nodes: usize,
}

impl Level {
    pub(crate) fn num_nodes(&self) -> usize {
        self.bases.len()
    }

    #[inline]
    pub(crate) fn is_terminal(&self, node_id: usize) -> bool {
        self.terminal_flags.get(node_id)
    }

    /// Id of the key ending at a terminal node.
    #[inline]
    pub(crate) fn key_id(&self, node_id: usize) -> u32 {
        self.terminal_flags.rank1(node_id) as u32
    }

    /// Node where key `id` ends.
    #[inline]
    pub(crate) fn terminal_node(&self, id: usize) -> usize {
        self.terminal_flags.select1(id)
    }

    #[inline]
    pub(crate) fn is_link(&self, node_id: usize) -> bool {
        self.link_flags.get(node_id)
    }

    #[inline]
    pub(crate) fn label(&self, node_id: usize) -> u8 {
        self.bases.get(node_id)
    }

    /// Next-level node id or tail offset of a link node.
    #[inline]
    pub(crate) fn link(&self, node_id: usize) -> usize {
        let extra = self.extras.get(self.link_flags.rank1(node_id)) as usize;
        self.bases.get(node_id) as usize | (extra << 8)
    }

    #[inline]
    pub(crate) fn parent(&self, node_id: usize) -> usize {
        self.louds.select1(node_id) - node_id - 1
    }

    /// LOUDS position of the first child bit of `node_id`.
    #[inline]
    pub(crate) fn child_pos(&self, node_id: usize) -> usize {
        self.louds.select0(node_id) + 1
    }

    /// Node id of the child encoded at LOUDS position `louds_pos`.
    #[inline]
    pub(crate) fn child_at(&self, louds_pos: usize, node_id: usize) -> usize {
        louds_pos - node_id - 1
    }

    #[inline]
    pub(crate) fn has_child_at(&self, louds_pos: usize) -> bool {
        self.louds.get(louds_pos)
    }

    /// Ids of all children of `node_id`.
    pub(crate) fn children(&self, node_id: usize) -> Range<usize> {
        let start = self.child_pos(node_id);
        let count = (start..)
            .take_while(|&pos| self.louds.get(pos))
            .count();
        let first = self.child_at(start, node_id);
        first..first + count
    }

    /// Structural consistency of decoded arrays.
    pub(crate) fn check(&self, first: bool) -> bool {
        let n = self.num_nodes();
        let terminals_ok = if first {
            self.terminal_flags.len() == n && self.terminal_flags.has_select1()
        } else {
            self.terminal_flags.is_empty()
        };
        n >= 1
            && self.louds.len() == 2 * n + 2
            && self.louds.num_ones() == n
            && self.louds.has_select1()
            && (!first || self.louds.has_select0())
            && self.link_flags.len() == n
            && self.extras.len() == self.link_flags.num_ones()
            && self.num_l1_nodes < n
            && terminals_ok
            && self.cache.check(n)
    }

    pub(crate) fn total_size(&self) -> usize {
        self.louds.total_size()
            + self.terminal_flags.total_size()
            + self.link_flags.total_size()
            + self.bases.size_in_bytes()
            + self.extras.total_size()
            + self.cache.total_size()
    }
}
