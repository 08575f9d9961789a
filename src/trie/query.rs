//! Lookup, reverse lookup, common-prefix and predictive search.
//!
//! The first level is walked downward from the root. Links into deeper
//! levels are resolved by walking those levels upward from the link target,
//! which emits the edge bytes in query order.

use std::iter::FusedIterator;
use std::ops::Range;

use super::Trie;

/// Cursor over a query while it is matched against the trie.
#[derive(Debug)]
pub(crate) struct QueryContext<'q> {
    pub(crate) query: &'q [u8],
    pub(crate) query_pos: usize,
    pub(crate) node_id: usize,
    /// Bytes of the key matched so far, beyond the query when predicting
    pub(crate) key_buf: Vec<u8>,
}

impl<'q> QueryContext<'q> {
    pub(crate) fn new(query: &'q [u8]) -> Self {
        Self {
            query,
            query_pos: 0,
            node_id: 0,
            key_buf: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn at_end(&self) -> bool {
        self.query_pos >= self.query.len()
    }

    #[inline]
    pub(crate) fn current(&self) -> u8 {
        self.query[self.query_pos]
    }

    #[inline]
    pub(crate) fn advance(&mut self) {
        self.query_pos += 1;
    }
}

impl Trie {
    /// Id of `key` if it is stored.
    pub fn lookup<Q: AsRef<[u8]> + ?Sized>(&self, key: &Q) -> Option<u32> {
        let mut ctx = QueryContext::new(key.as_ref());
        while !ctx.at_end() {
            if !self.find_child(&mut ctx) {
                return None;
            }
        }
        let level = &self.levels[0];
        level
            .is_terminal(ctx.node_id)
            .then(|| level.key_id(ctx.node_id))
    }

    /// Whether `key` is stored.
    pub fn contains<Q: AsRef<[u8]> + ?Sized>(&self, key: &Q) -> bool {
        self.lookup(key).is_some()
    }

    /// Key bytes stored under `id`, or `None` when `id >= num_keys()`.
    pub fn reverse_lookup(&self, id: u32) -> Option<Vec<u8>> {
        let id = id as usize;
        if id >= self.num_keys {
            return None;
        }

        let level = &self.levels[0];
        let mut node = level.terminal_node(id);
        let mut key = Vec::new();
        // The key is collected back to front, then flipped once.
        while node != 0 {
            if level.is_link(node) {
                let start = key.len();
                self.restore_link(0, level.link(node), &mut key);
                key[start..].reverse();
            } else {
                key.push(level.label(node));
            }
            if node <= level.num_l1_nodes {
                break;
            }
            node = level.parent(node);
        }
        key.reverse();
        Some(key)
    }

    /// Stored keys that are prefixes of `query`, shortest first.
    pub fn common_prefixes<'q, Q: AsRef<[u8]> + ?Sized>(
        &self,
        query: &'q Q,
    ) -> CommonPrefixes<'_, 'q> {
        CommonPrefixes {
            trie: self,
            ctx: QueryContext::new(query.as_ref()),
            done: false,
        }
    }

    /// Visit every stored prefix of `query` in order of increasing length.
    ///
    /// The first error returned by `visit` stops the search and is returned.
    pub fn common_prefix_search<Q, F, E>(&self, query: &Q, mut visit: F) -> Result<(), E>
    where
        Q: AsRef<[u8]> + ?Sized,
        F: FnMut(u32, &[u8]) -> Result<(), E>,
    {
        for (id, key) in self.common_prefixes(query) {
            visit(id, key)?;
        }
        Ok(())
    }

    /// Stored keys starting with `query`, in ascending id order.
    pub fn predictive<Q: AsRef<[u8]> + ?Sized>(&self, query: &Q) -> Predictions<'_> {
        let mut ctx = QueryContext::new(query.as_ref());
        while !ctx.at_end() {
            if !self.predictive_find_child(&mut ctx) {
                return Predictions {
                    trie: self,
                    root: 0,
                    prefix: Vec::new(),
                    depth: 0..0,
                    cursor: 0,
                };
            }
        }
        let root = ctx.node_id;
        Predictions {
            trie: self,
            root,
            prefix: ctx.key_buf,
            depth: root..root + 1,
            cursor: root,
        }
    }

    /// Visit every stored key starting with `query`, in ascending id order.
    ///
    /// The first error returned by `visit` stops the search and is returned.
    pub fn predictive_search<Q, F, E>(&self, query: &Q, mut visit: F) -> Result<(), E>
    where
        Q: AsRef<[u8]> + ?Sized,
        F: FnMut(u32, &[u8]) -> Result<(), E>,
    {
        for (id, key) in self.predictive(query) {
            visit(id, &key)?;
        }
        Ok(())
    }

    /// Follow the first-level edge matching the query at `ctx`.
    fn find_child(&self, ctx: &mut QueryContext<'_>) -> bool {
        let level = &self.levels[0];
        let node = ctx.node_id;

        if let Some(entry) = level.cache.find_child(node, ctx.current()) {
            match entry.link() {
                Some(link) => {
                    if !self.match_link(0, link, ctx) {
                        return false;
                    }
                }
                None => ctx.advance(),
            }
            ctx.node_id = entry.child();
            return true;
        }

        let mut louds_pos = level.child_pos(node);
        while level.has_child_at(louds_pos) {
            let child = level.child_at(louds_pos, node);
            if level.is_link(child) {
                let start = ctx.query_pos;
                if self.match_link(0, level.link(child), ctx) {
                    ctx.node_id = child;
                    return true;
                }
                // Siblings never share a first byte.
                if ctx.query_pos != start {
                    return false;
                }
            } else if level.label(child) == ctx.current() {
                ctx.advance();
                ctx.node_id = child;
                return true;
            }
            louds_pos += 1;
        }
        false
    }

    /// Like `find_child`, but an edge may extend past the end of the query.
    fn predictive_find_child(&self, ctx: &mut QueryContext<'_>) -> bool {
        let level = &self.levels[0];
        let node = ctx.node_id;

        if let Some(entry) = level.cache.find_child(node, ctx.current()) {
            match entry.link() {
                Some(link) => {
                    if !self.prefix_match_link(0, link, ctx) {
                        return false;
                    }
                }
                None => {
                    ctx.key_buf.push(entry.label());
                    ctx.advance();
                }
            }
            ctx.node_id = entry.child();
            return true;
        }

        let mut louds_pos = level.child_pos(node);
        while level.has_child_at(louds_pos) {
            let child = level.child_at(louds_pos, node);
            if level.is_link(child) {
                let start = ctx.query_pos;
                if self.prefix_match_link(0, level.link(child), ctx) {
                    ctx.node_id = child;
                    return true;
                }
                if ctx.query_pos != start {
                    return false;
                }
            } else if level.label(child) == ctx.current() {
                ctx.key_buf.push(ctx.current());
                ctx.advance();
                ctx.node_id = child;
                return true;
            }
            louds_pos += 1;
        }
        false
    }

    /// Append the bytes of the first-level edge into `node` to `out`.
    fn append_edge(&self, node: usize, out: &mut Vec<u8>) {
        let level = &self.levels[0];
        if level.is_link(node) {
            self.restore_link(0, level.link(node), out);
        } else {
            out.push(level.label(node));
        }
    }

    /// Match a link owned by `level` against the query.
    fn match_link(&self, level: usize, link: usize, ctx: &mut QueryContext<'_>) -> bool {
        if level + 1 < self.levels.len() {
            self.match_upward(level + 1, link, ctx)
        } else {
            self.tail.match_at(ctx, link)
        }
    }

    fn prefix_match_link(&self, level: usize, link: usize, ctx: &mut QueryContext<'_>) -> bool {
        if level + 1 < self.levels.len() {
            self.prefix_match_upward(level + 1, link, ctx)
        } else {
            self.tail.prefix_match(ctx, link)
        }
    }

    fn restore_link(&self, level: usize, link: usize, out: &mut Vec<u8>) {
        if level + 1 < self.levels.len() {
            self.restore_upward(level + 1, link, out);
        } else {
            self.tail.restore(link, out);
        }
    }

    /// Match the path from `node` up to the root of a nested level.
    fn match_upward(&self, level_idx: usize, mut node: usize, ctx: &mut QueryContext<'_>) -> bool {
        let level = &self.levels[level_idx];
        loop {
            if let Some(entry) = level.cache.find_parent(node) {
                let matched = match entry.link() {
                    Some(link) => self.match_link(level_idx, link, ctx),
                    None => match_byte(entry.label(), ctx),
                };
                if !matched {
                    return false;
                }
                node = entry.parent();
                if node == 0 {
                    return true;
                }
            } else {
                let matched = if level.is_link(node) {
                    self.match_link(level_idx, level.link(node), ctx)
                } else {
                    match_byte(level.label(node), ctx)
                };
                if !matched {
                    return false;
                }
                if node <= level.num_l1_nodes {
                    return true;
                }
                node = level.parent(node);
            }
            if ctx.at_end() {
                return false;
            }
        }
    }

    /// Like `match_upward`, completing the edge once the query runs out.
    fn prefix_match_upward(
        &self,
        level_idx: usize,
        mut node: usize,
        ctx: &mut QueryContext<'_>,
    ) -> bool {
        let level = &self.levels[level_idx];
        loop {
            if let Some(entry) = level.cache.find_parent(node) {
                let matched = match entry.link() {
                    Some(link) => self.prefix_match_link(level_idx, link, ctx),
                    None => prefix_match_byte(entry.label(), ctx),
                };
                if !matched {
                    return false;
                }
                node = entry.parent();
                if node == 0 {
                    return true;
                }
            } else {
                let matched = if level.is_link(node) {
                    self.prefix_match_link(level_idx, level.link(node), ctx)
                } else {
                    prefix_match_byte(level.label(node), ctx)
                };
                if !matched {
                    return false;
                }
                if node <= level.num_l1_nodes {
                    return true;
                }
                node = level.parent(node);
            }
            if ctx.at_end() {
                self.restore_upward(level_idx, node, &mut ctx.key_buf);
                return true;
            }
        }
    }

    /// Append the bytes on the path from `node` up to the root of a nested level.
    fn restore_upward(&self, level_idx: usize, mut node: usize, out: &mut Vec<u8>) {
        let level = &self.levels[level_idx];
        loop {
            if let Some(entry) = level.cache.find_parent(node) {
                match entry.link() {
                    Some(link) => self.restore_link(level_idx, link, out),
                    None => out.push(entry.label()),
                }
                node = entry.parent();
                if node == 0 {
                    return;
                }
            } else {
                if level.is_link(node) {
                    self.restore_link(level_idx, level.link(node), out);
                } else {
                    out.push(level.label(node));
                }
                if node <= level.num_l1_nodes {
                    return;
                }
                node = level.parent(node);
            }
        }
    }
}

#[inline]
fn match_byte(label: u8, ctx: &mut QueryContext<'_>) -> bool {
    if ctx.at_end() || ctx.current() != label {
        return false;
    }
    ctx.advance();
    true
}

#[inline]
fn prefix_match_byte(label: u8, ctx: &mut QueryContext<'_>) -> bool {
    if !match_byte(label, ctx) {
        return false;
    }
    ctx.key_buf.push(label);
    true
}

/// Iterator over the stored prefixes of a query.
///
/// Yields `(id, key)` with `key` borrowed from the query.
#[derive(Debug)]
pub struct CommonPrefixes<'t, 'q> {
    trie: &'t Trie,
    ctx: QueryContext<'q>,
    done: bool,
}

impl<'t, 'q> Iterator for CommonPrefixes<'t, 'q> {
    type Item = (u32, &'q [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let level = &self.trie.levels[0];
        while !self.done {
            if self.ctx.at_end() || !self.trie.find_child(&mut self.ctx) {
                self.done = true;
                break;
            }
            let node = self.ctx.node_id;
            if level.is_terminal(node) {
                let query = self.ctx.query;
                return Some((level.key_id(node), &query[..self.ctx.query_pos]));
            }
        }
        None
    }
}

impl FusedIterator for CommonPrefixes<'_, '_> {}

/// Iterator over the stored keys below a query prefix.
///
/// Walks the subtree one depth at a time. Nodes of one depth form a
/// contiguous id range, so only that range is held; keys are rebuilt from
/// the parent chain when a terminal is reached.
#[derive(Debug)]
pub struct Predictions<'t> {
    trie: &'t Trie,
    /// Node the query ended on
    root: usize,
    /// Key bytes leading to `root`
    prefix: Vec<u8>,
    /// Nodes of the depth being visited
    depth: Range<usize>,
    cursor: usize,
}

impl Predictions<'_> {
    fn key_of(&self, mut node: usize) -> Vec<u8> {
        let level = &self.trie.levels[0];
        let mut path = Vec::new();
        while node != self.root {
            path.push(node);
            node = level.parent(node);
        }
        let mut key = self.prefix.clone();
        for &node in path.iter().rev() {
            self.trie.append_edge(node, &mut key);
        }
        key
    }
}

impl Iterator for Predictions<'_> {
    type Item = (u32, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        let level = &self.trie.levels[0];
        // Depth by depth below the query node visits terminals in id order.
        while !self.depth.is_empty() {
            if self.cursor == self.depth.end {
                let start = level.children(self.depth.start).start;
                let end = level.children(self.depth.end - 1).end;
                self.depth = start..end;
                self.cursor = start;
                continue;
            }
            let node = self.cursor;
            self.cursor += 1;
            if level.is_terminal(node) {
                return Some((level.key_id(node), self.key_of(node)));
            }
        }
        None
    }
}

impl FusedIterator for Predictions<'_> {}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::{BuildConfig, Keyset};

    fn words() -> BTreeSet<String> {
        (0u64..300)
            .map(|i| format!("{:x}/{}", i * 2_654_435_761 % 4096, i % 7))
            .collect()
    }

    fn build(words: &BTreeSet<String>) -> Trie {
        let keys: Keyset = words.iter().collect();
        Trie::build(&keys, BuildConfig::default()).unwrap()
    }

    #[test]
    fn test_predictive_rebuilds_keys_below_query() {
        let words = words();
        let trie = build(&words);
        for query in ["", "a", "1", "ff", "3/", "zz"] {
            let expected: BTreeSet<&str> = words
                .iter()
                .filter(|w| w.starts_with(query))
                .map(String::as_str)
                .collect();
            let found: Vec<(u32, Vec<u8>)> = trie.predictive(query).collect();
            assert_eq!(found.len(), expected.len(), "{}", query);
            for window in found.windows(2) {
                assert!(window[0].0 < window[1].0);
            }
            for (id, key) in &found {
                let key = std::str::from_utf8(key).unwrap();
                assert!(expected.contains(key), "{} under {}", key, query);
                assert_eq!(trie.lookup(key), Some(*id));
            }
        }
    }

    #[test]
    fn test_key_of_follows_parent_chain() {
        let words = words();
        let trie = build(&words);
        let predictions = trie.predictive("");
        let level = &trie.levels[0];
        for id in 0..trie.num_keys() {
            let node = level.terminal_node(id);
            assert_eq!(Some(predictions.key_of(node)), trie.reverse_lookup(id as u32));
        }
    }

    #[test]
    fn test_predictions_stay_exhausted() {
        let trie = build(&words());
        let mut predictions = trie.predictive("1");
        while predictions.next().is_some() {}
        assert!(predictions.depth.is_empty());
        assert!(predictions.next().is_none());

        let mut missing = trie.predictive("not-there");
        assert!(missing.depth.is_empty());
        assert!(missing.next().is_none());
    }
}
