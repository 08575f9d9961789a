//! Suffix store below the last trie level.

use tracing::{debug, warn};

use super::query::QueryContext;
use crate::config::TailMode;
use crate::error::{BuildErrorKind, Result, TrieError};
use crate::succinct::Array;

#[derive(Debug, Clone, Default)]
pub(crate) struct Tail {
    pub(crate) mode: TailMode,
    pub(crate) buf: Array<u8>,
}

impl Tail {
    pub(crate) fn new(mode: TailMode, buf: Array<u8>) -> Self {
        Self { mode, buf }
    }

    /// Store `entries` and return each entry's offset.
    ///
    /// Text mode shares an entry that is a suffix of another one; it is
    /// downgraded to binary mode when an entry contains a NUL byte.
    pub(crate) fn build(entries: &[Vec<u8>], mode: TailMode) -> Result<(Self, Vec<u32>)> {
        let mode = match mode {
            TailMode::Text if entries.iter().any(|e| e.contains(&0)) => {
                warn!("tail entry contains NUL, switching to binary tail");
                TailMode::Binary
            }
            mode => mode,
        };

        let (buf, offsets) = match mode {
            TailMode::Text => build_text(entries),
            TailMode::Binary => build_binary(entries),
        };
        if buf.len() > u32::MAX as usize {
            return Err(TrieError::build(
                BuildErrorKind::SizeLimit,
                format!("tail of {} bytes exceeds 32-bit offsets", buf.len()),
            ));
        }
        debug!(?mode, entries = entries.len(), bytes = buf.len(), "built tail");

        let offsets = offsets.into_iter().map(|o| o as u32).collect();
        Ok((Self::new(mode, buf.into()), offsets))
    }

    /// Entry bytes at `offset`.
    #[inline]
    fn entry(&self, offset: usize) -> &[u8] {
        let buf = self.buf.as_slice();
        match self.mode {
            TailMode::Text => {
                let rest = &buf[offset..];
                let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
                &rest[..end]
            }
            TailMode::Binary => {
                let (len, start) = read_len(buf, offset);
                &buf[start..start + len]
            }
        }
    }

    /// Match the entry at `offset` against the query; the query may not end inside it.
    pub(crate) fn match_at(&self, ctx: &mut QueryContext<'_>, offset: usize) -> bool {
        for &b in self.entry(offset) {
            if ctx.at_end() || ctx.current() != b {
                return false;
            }
            ctx.advance();
        }
        true
    }

    /// Like `match_at`, but an exhausted query completes the key from the entry.
    pub(crate) fn prefix_match(&self, ctx: &mut QueryContext<'_>, offset: usize) -> bool {
        let entry = self.entry(offset);
        for (i, &b) in entry.iter().enumerate() {
            if ctx.at_end() {
                ctx.key_buf.extend_from_slice(&entry[i..]);
                return true;
            }
            if ctx.current() != b {
                return false;
            }
            ctx.key_buf.push(b);
            ctx.advance();
        }
        true
    }

    /// Append the entry at `offset`.
    pub(crate) fn restore(&self, offset: usize, out: &mut Vec<u8>) {
        out.extend_from_slice(self.entry(offset));
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    /// Text tails must end with a terminator.
    pub(crate) fn check(&self) -> bool {
        match self.mode {
            TailMode::Text => self.buf.as_slice().last().map_or(true, |&b| b == 0),
            TailMode::Binary => true,
        }
    }

    pub(crate) fn total_size(&self) -> usize {
        self.buf.size_in_bytes()
    }
}

fn build_text(entries: &[Vec<u8>]) -> (Vec<u8>, Vec<usize>) {
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| entries[a].iter().rev().cmp(entries[b].iter().rev()));

    let mut offsets = vec![0usize; entries.len()];
    let mut buf = Vec::new();
    let mut last: Option<usize> = None;

    // Longest first within a suffix chain, so shorter entries can point into it.
    for &current in order.iter().rev() {
        let bytes = &entries[current];
        let shared = last.and_then(|prev| {
            let prev_bytes = &entries[prev];
            let common = bytes
                .iter()
                .rev()
                .zip(prev_bytes.iter().rev())
                .take_while(|(a, b)| a == b)
                .count();
            (common == bytes.len()).then(|| offsets[prev] + prev_bytes.len() - common)
        });
        offsets[current] = match shared {
            Some(offset) => offset,
            None => {
                let offset = buf.len();
                buf.extend_from_slice(bytes);
                buf.push(0);
                offset
            }
        };
        last = Some(current);
    }

    (buf, offsets)
}

fn build_binary(entries: &[Vec<u8>]) -> (Vec<u8>, Vec<usize>) {
    let mut buf = Vec::new();
    let offsets = entries
        .iter()
        .map(|entry| {
            let offset = buf.len();
            write_len(&mut buf, entry.len());
            buf.extend_from_slice(entry);
            offset
        })
        .collect();
    (buf, offsets)
}

/// LEB128 length prefix
fn write_len(buf: &mut Vec<u8>, mut len: usize) {
    while len >= 0x80 {
        buf.push((len as u8) | 0x80);
        len >>= 7;
    }
    buf.push(len as u8);
}

/// Decode a length prefix, returning the length and the start of the data.
fn read_len(buf: &[u8], mut pos: usize) -> (usize, usize) {
    let mut len = 0usize;
    let mut shift = 0;
    loop {
        let byte = buf[pos];
        pos += 1;
        len |= ((byte & 0x7F) as usize) << shift;
        if byte & 0x80 == 0 {
            return (len, pos);
        }
        shift += 7;
    }
}
