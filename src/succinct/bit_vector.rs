//! Bit vector with rank/select indices.
//!
//! Ranks are sampled once per 512-bit block; select hints record the block of
//! every 512th one (or zero), so both queries scan at most a block or two.

use super::array::Array;

const WORD_BITS: usize = 64;
const BLOCK_WORDS: usize = 8;
const BLOCK_BITS: usize = WORD_BITS * BLOCK_WORDS;
const SELECT_INTERVAL: usize = 512;

/// Growable bit sequence used during construction.
#[derive(Debug, Clone, Default)]
pub(crate) struct BitVectorBuilder {
    words: Vec<u64>,
    len: usize,
}

impl BitVectorBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, bit: bool) {
        let word_idx = self.len / WORD_BITS;
        if word_idx == self.words.len() {
            self.words.push(0);
        }
        if bit {
            self.words[word_idx] |= 1u64 << (self.len % WORD_BITS);
        }
        self.len += 1;
    }

    #[inline]
    pub(crate) fn get(&self, idx: usize) -> bool {
        get_bit(&self.words, idx)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Freeze into a queryable vector. Select hints are only built when asked for.
    pub(crate) fn build(self, enable_select0: bool, enable_select1: bool) -> BitVector {
        let num_ones = self.words.iter().map(|w| w.count_ones() as usize).sum();
        let ranks = index_rank(&self.words);
        let select0s = if enable_select0 {
            index_select(&self.words, self.len, false)
        } else {
            Vec::new()
        };
        let select1s = if enable_select1 {
            index_select(&self.words, self.len, true)
        } else {
            Vec::new()
        };

        BitVector {
            words: self.words.into(),
            num_bits: self.len,
            num_ones,
            ranks: ranks.into(),
            select0s: select0s.into(),
            select1s: select1s.into(),
        }
    }
}

/// Immutable bit vector
#[derive(Debug, Clone)]
pub(crate) struct BitVector {
    pub(crate) words: Array<u64>,
    pub(crate) num_bits: usize,
    pub(crate) num_ones: usize,
    /// Ones before each block, plus the total
    pub(crate) ranks: Array<u32>,
    /// Block holding every `SELECT_INTERVAL`th zero
    pub(crate) select0s: Array<u32>,
    /// Block holding every `SELECT_INTERVAL`th one
    pub(crate) select1s: Array<u32>,
}

impl Default for BitVector {
    /// An empty vector still carries the closing rank entry.
    fn default() -> Self {
        BitVectorBuilder::new().build(false, false)
    }
}

impl BitVector {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.num_bits
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.num_bits == 0
    }

    pub(crate) fn num_ones(&self) -> usize {
        self.num_ones
    }

    pub(crate) fn num_zeros(&self) -> usize {
        self.num_bits - self.num_ones
    }

    pub(crate) fn has_select0(&self) -> bool {
        self.num_zeros() == 0 || !self.select0s.is_empty()
    }

    pub(crate) fn has_select1(&self) -> bool {
        self.num_ones == 0 || !self.select1s.is_empty()
    }

    #[inline]
    pub(crate) fn get(&self, idx: usize) -> bool {
        debug_assert!(idx < self.num_bits);
        (self.words.get(idx / WORD_BITS) >> (idx % WORD_BITS)) & 1 == 1
    }

    /// Ones in `[0, idx)`.
    #[inline]
    pub(crate) fn rank1(&self, idx: usize) -> usize {
        debug_assert!(idx <= self.num_bits);
        let block = idx / BLOCK_BITS;
        let word_idx = idx / WORD_BITS;
        let mut rank = self.ranks.get(block) as usize;
        for w in block * BLOCK_WORDS..word_idx {
            rank += self.words.get(w).count_ones() as usize;
        }
        let bit_idx = idx % WORD_BITS;
        if bit_idx != 0 {
            let mask = (1u64 << bit_idx) - 1;
            rank += (self.words.get(word_idx) & mask).count_ones() as usize;
        }
        rank
    }

    /// Position of the `i`-th one (0-based).
    pub(crate) fn select1(&self, i: usize) -> usize {
        debug_assert!(i < self.num_ones);
        let mut block = self.select1s.get(i / SELECT_INTERVAL) as usize;
        while (self.ranks.get(block + 1) as usize) <= i {
            block += 1;
        }
        let mut remaining = i - self.ranks.get(block) as usize;
        let mut w = block * BLOCK_WORDS;
        loop {
            let word = self.words.get(w);
            let count = word.count_ones() as usize;
            if remaining < count {
                return w * WORD_BITS + select_in_word(word, remaining);
            }
            remaining -= count;
            w += 1;
        }
    }

    /// Position of the `i`-th zero (0-based).
    pub(crate) fn select0(&self, i: usize) -> usize {
        debug_assert!(i < self.num_zeros());
        let zeros_before = |block: usize| block * BLOCK_BITS - self.ranks.get(block) as usize;

        let mut block = self.select0s.get(i / SELECT_INTERVAL) as usize;
        while zeros_before(block + 1) <= i {
            block += 1;
        }
        let mut remaining = i - zeros_before(block);
        let mut w = block * BLOCK_WORDS;
        loop {
            let word = !self.words.get(w);
            let count = word.count_ones() as usize;
            if remaining < count {
                return w * WORD_BITS + select_in_word(word, remaining);
            }
            remaining -= count;
            w += 1;
        }
    }

    /// In-memory footprint in bytes.
    pub(crate) fn total_size(&self) -> usize {
        self.words.size_in_bytes()
            + self.ranks.size_in_bytes()
            + self.select0s.size_in_bytes()
            + self.select1s.size_in_bytes()
    }
}

/// Get bit at index from bitmap
#[inline]
fn get_bit(bitmap: &[u64], idx: usize) -> bool {
    let word_idx = idx / WORD_BITS;
    if word_idx >= bitmap.len() {
        return false;
    }
    (bitmap[word_idx] >> (idx % WORD_BITS)) & 1 == 1
}

/// Cumulative count of ones at each block boundary
fn index_rank(bitmap: &[u64]) -> Vec<u32> {
    let num_blocks = bitmap.len().div_ceil(BLOCK_WORDS);
    let mut ranks = Vec::with_capacity(num_blocks + 1);
    let mut count = 0u32;
    ranks.push(0);

    for block in bitmap.chunks(BLOCK_WORDS) {
        count += block.iter().map(|w| w.count_ones()).sum::<u32>();
        ranks.push(count);
    }

    ranks
}

/// Block index of every `SELECT_INTERVAL`th one (or zero)
fn index_select(bitmap: &[u64], num_bits: usize, ones: bool) -> Vec<u32> {
    let mut selects = Vec::new();
    let mut count = 0usize;

    for (word_idx, &word) in bitmap.iter().enumerate() {
        let word = if ones {
            word
        } else {
            !word & valid_mask(word_idx, num_bits)
        };
        let in_word = word.count_ones() as usize;
        let mut next = count.div_ceil(SELECT_INTERVAL) * SELECT_INTERVAL;
        while next < count + in_word {
            selects.push((word_idx / BLOCK_WORDS) as u32);
            next += SELECT_INTERVAL;
        }
        count += in_word;
    }

    selects
}

/// Bits of word `word_idx` that lie below `num_bits`
fn valid_mask(word_idx: usize, num_bits: usize) -> u64 {
    let start = word_idx * WORD_BITS;
    if start + WORD_BITS <= num_bits {
        u64::MAX
    } else {
        (1u64 << (num_bits - start)) - 1
    }
}

/// Position of the `k`-th set bit within a word
#[inline]
fn select_in_word(mut word: u64, k: usize) -> usize {
    for _ in 0..k {
        word &= word - 1;
    }
    word.trailing_zeros() as usize
}
