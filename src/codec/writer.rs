//! Serialization of a trie into its persisted layout.

use super::{FOOTER_MAGIC, FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};
use crate::succinct::{Array, BitVector, Element, FlatVector};
use crate::trie::level::Level;
use crate::trie::tail::Tail;
use crate::trie::Trie;

/// Append-only little-endian writer.
#[derive(Debug, Default)]
pub(crate) struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn count(&mut self, value: usize) {
        self.u64(value as u64);
    }

    /// Element count, elements, then zero padding to 8 bytes.
    fn array<T: Element>(&mut self, array: &Array<T>) {
        self.count(array.len());
        array.encode_into(&mut self.buf);
        let padded = self.buf.len().next_multiple_of(8);
        self.buf.resize(padded, 0);
    }

    fn bit_vector(&mut self, bv: &BitVector) {
        self.count(bv.num_bits);
        self.count(bv.num_ones);
        self.array(&bv.words);
        self.array(&bv.ranks);
        self.array(&bv.select0s);
        self.array(&bv.select1s);
    }

    fn flat_vector(&mut self, fv: &FlatVector) {
        self.count(fv.len);
        self.u64(fv.value_size as u64);
        self.array(&fv.words);
    }

    fn level(&mut self, level: &Level) {
        self.count(level.num_l1_nodes);
        self.bit_vector(&level.louds);
        self.bit_vector(&level.terminal_flags);
        self.bit_vector(&level.link_flags);
        self.array(&level.bases);
        self.flat_vector(&level.extras);
        self.array(&level.cache.entries);
    }

    fn tail(&mut self, tail: &Tail) {
        self.u64(tail.mode.code());
        self.array(&tail.buf);
    }

    pub(crate) fn trie(mut self, trie: &Trie) -> Vec<u8> {
        self.buf.extend_from_slice(&MAGIC);
        self.u32(VERSION);
        self.u32(trie.config.to_flags());
        self.count(trie.num_keys);
        self.u32(trie.levels.len() as u32);
        self.u32(0);
        debug_assert_eq!(self.buf.len(), HEADER_SIZE);

        for level in &trie.levels {
            self.level(level);
        }
        self.tail(&trie.tail);

        let crc = crc32fast::hash(&self.buf);
        self.count(self.buf.len() + FOOTER_SIZE);
        self.u32(crc);
        self.buf.extend_from_slice(&FOOTER_MAGIC);
        self.buf
    }
}

fn array_size<T: Element>(array: &Array<T>) -> usize {
    8 + (array.len() * T::WIDTH).next_multiple_of(8)
}

fn bit_vector_size(bv: &BitVector) -> usize {
    16 + array_size(&bv.words)
        + array_size(&bv.ranks)
        + array_size(&bv.select0s)
        + array_size(&bv.select1s)
}

fn level_size(level: &Level) -> usize {
    8 + bit_vector_size(&level.louds)
        + bit_vector_size(&level.terminal_flags)
        + bit_vector_size(&level.link_flags)
        + array_size(&level.bases)
        + 16
        + array_size(&level.extras.words)
        + array_size(&level.cache.entries)
}

/// Serialized length, without encoding anything.
pub(crate) fn io_size(trie: &Trie) -> usize {
    HEADER_SIZE
        + trie.levels.iter().map(level_size).sum::<usize>()
        + 8
        + array_size(&trie.tail.buf)
        + FOOTER_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_padding() {
        let mut encoder = Encoder::default();
        let array: Array<u8> = vec![1, 2, 3].into();
        encoder.array(&array);
        assert_eq!(encoder.buf.len(), 16);
        assert_eq!(&encoder.buf[..8], &3u64.to_le_bytes());
        assert_eq!(&encoder.buf[8..11], &[1, 2, 3]);
        assert!(encoder.buf[11..].iter().all(|&b| b == 0));
        assert_eq!(array_size(&array), 16);
    }

    #[test]
    fn test_empty_array_takes_length_only() {
        let mut encoder = Encoder::default();
        encoder.array(&Array::<u64>::default());
        assert_eq!(encoder.buf.len(), 8);
    }
}
