//! Bit-packed vector of unsigned integers.

use super::array::Array;

const WORD_BITS: usize = 64;

/// Each value takes `value_size` bits, the width of the largest value.
#[derive(Debug, Clone, Default)]
pub(crate) struct FlatVector {
    pub(crate) words: Array<u64>,
    pub(crate) value_size: u32,
    pub(crate) len: usize,
}

impl FlatVector {
    pub(crate) fn build(values: &[u32]) -> Self {
        let max = values.iter().copied().max().unwrap_or(0);
        let value_size = u32::BITS - max.leading_zeros();
        let num_words = (values.len() * value_size as usize).div_ceil(WORD_BITS);
        let mut words = vec![0u64; num_words];

        if value_size != 0 {
            for (i, &value) in values.iter().enumerate() {
                let pos = i * value_size as usize;
                let word_idx = pos / WORD_BITS;
                let offset = pos % WORD_BITS;
                words[word_idx] |= (value as u64) << offset;
                if offset + value_size as usize > WORD_BITS {
                    words[word_idx + 1] |= (value as u64) >> (WORD_BITS - offset);
                }
            }
        }

        Self {
            words: words.into(),
            value_size,
            len: values.len(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> u32 {
        debug_assert!(index < self.len);
        if self.value_size == 0 {
            return 0;
        }
        let value_size = self.value_size as usize;
        let mask = (1u64 << value_size) - 1;
        let pos = index * value_size;
        let word_idx = pos / WORD_BITS;
        let offset = pos % WORD_BITS;
        let mut value = self.words.get(word_idx) >> offset;
        if offset + value_size > WORD_BITS {
            value |= self.words.get(word_idx + 1) << (WORD_BITS - offset);
        }
        (value & mask) as u32
    }

    /// Words required to hold `len` values of `value_size` bits.
    pub(crate) fn words_for(len: usize, value_size: u32) -> usize {
        (len * value_size as usize).div_ceil(WORD_BITS)
    }

    pub(crate) fn total_size(&self) -> usize {
        self.words.size_in_bytes()
    }
}
