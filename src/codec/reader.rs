//! Decoding of the persisted layout, into owned memory or over a mapping.

#[cfg(feature = "mmap")]
use std::sync::Arc;

#[cfg(feature = "mmap")]
use memmap2::Mmap;

use super::{FOOTER_MAGIC, FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};
use crate::config::{BuildConfig, TailMode};
use crate::error::{Result, TrieError};
#[cfg(feature = "mmap")]
use crate::succinct::MappedSlice;
use crate::succinct::{Array, BitVector, Element, FlatVector};
use crate::trie::level::Level;
use crate::trie::tail::Tail;
use crate::trie::{Cache, Trie, CACHE_ENTRY_WORDS};

const BLOCK_WORDS: usize = 8;
const SELECT_INTERVAL: usize = 512;

/// Bounds-checked cursor over a serialized trie.
pub(crate) struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    #[cfg(feature = "mmap")]
    map: Option<Arc<Mmap>>,
}

impl<'a> Decoder<'a> {
    /// Decode arrays into owned memory.
    pub(crate) fn owned(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            #[cfg(feature = "mmap")]
            map: None,
        }
    }

    /// Decode arrays as views into `map`; `data` must be the mapped bytes.
    #[cfg(feature = "mmap")]
    pub(crate) fn mapped(data: &'a [u8], map: Arc<Mmap>) -> Self {
        Self {
            data,
            pos: 0,
            map: Some(map),
        }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| TrieError::corrupt(format!("truncated while reading {}", what)))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        let bytes = self.take(4, what)?;
        Ok(u32::decode(bytes))
    }

    fn u64(&mut self, what: &str) -> Result<u64> {
        let bytes = self.take(8, what)?;
        Ok(u64::decode(bytes))
    }

    fn count(&mut self, what: &str) -> Result<usize> {
        let value = self.u64(what)?;
        usize::try_from(value)
            .map_err(|_| TrieError::corrupt(format!("{} {} out of range", what, value)))
    }

    fn array<T: Element>(&mut self, what: &str) -> Result<Array<T>> {
        let len = self.count(what)?;
        let bytes = len
            .checked_mul(T::WIDTH)
            .and_then(|n| n.checked_next_multiple_of(8))
            .ok_or_else(|| TrieError::corrupt(format!("{} length {} out of range", what, len)))?;
        let raw = self.take(bytes, what)?;

        #[cfg(feature = "mmap")]
        if let Some(map) = &self.map {
            let offset = self.pos - bytes;
            return Ok(Array::Mapped(MappedSlice::new(Arc::clone(map), offset, len)));
        }
        Ok(raw[..len * T::WIDTH]
            .chunks_exact(T::WIDTH)
            .map(T::decode)
            .collect::<Vec<T>>()
            .into())
    }

    fn bit_vector(&mut self, what: &str) -> Result<BitVector> {
        let num_bits = self.count(what)?;
        let num_ones = self.count(what)?;
        let bv = BitVector {
            words: self.array(what)?,
            num_bits,
            num_ones,
            ranks: self.array(what)?,
            select0s: self.array(what)?,
            select1s: self.array(what)?,
        };

        let num_blocks = bv.words.len().div_ceil(BLOCK_WORDS);
        let samples_ok = |samples: &Array<u32>, count: usize| {
            (samples.is_empty() || samples.len() == count.div_ceil(SELECT_INTERVAL))
                && samples.iter().all(|block| (block as usize) < num_blocks)
        };
        let valid = num_ones <= num_bits
            && bv.words.len() == num_bits.div_ceil(64)
            && bv.ranks.len() == num_blocks + 1
            && bv.ranks.get(num_blocks) as usize == num_ones
            && samples_ok(&bv.select0s, num_bits - num_ones)
            && samples_ok(&bv.select1s, num_ones);
        if !valid {
            return Err(TrieError::corrupt(format!("inconsistent {}", what)));
        }
        Ok(bv)
    }

    fn flat_vector(&mut self, what: &str) -> Result<FlatVector> {
        let len = self.count(what)?;
        let value_size = self.u64(what)?;
        let words = self.array(what)?;
        if value_size > 32 {
            return Err(TrieError::corrupt(format!("{} value size {}", what, value_size)));
        }
        let value_size = value_size as u32;
        if len.checked_mul(value_size as usize).is_none()
            || words.len() != FlatVector::words_for(len, value_size)
        {
            return Err(TrieError::corrupt(format!("inconsistent {}", what)));
        }
        Ok(FlatVector {
            words,
            value_size,
            len,
        })
    }

    fn level(&mut self, index: usize) -> Result<Level> {
        let level = Level {
            num_l1_nodes: self.count("first-level node count")?,
            louds: self.bit_vector("louds bits")?,
            terminal_flags: self.bit_vector("terminal bits")?,
            link_flags: self.bit_vector("link bits")?,
            bases: self.array("labels")?,
            extras: self.flat_vector("link values")?,
            cache: {
                let entries = self.array::<u32>("cache")?;
                if entries.len() % CACHE_ENTRY_WORDS != 0 {
                    return Err(TrieError::corrupt("cache length"));
                }
                Cache::from_words(entries)
            },
        };
        if !level.check(index == 0) {
            return Err(TrieError::corrupt(format!("inconsistent level {}", index)));
        }
        Ok(level)
    }

    fn tail(&mut self) -> Result<Tail> {
        let code = self.u64("tail mode")?;
        let mode = TailMode::from_code(code)
            .ok_or_else(|| TrieError::corrupt(format!("unknown tail mode {}", code)))?;
        let tail = Tail::new(mode, self.array("tail")?);
        if !tail.check() {
            return Err(TrieError::corrupt("unterminated tail"));
        }
        Ok(tail)
    }

    /// Verify the footer, then decode everything before it.
    pub(crate) fn trie(mut self) -> Result<Trie> {
        let total = self.data.len();
        if total < HEADER_SIZE + FOOTER_SIZE {
            return Err(TrieError::corrupt(format!("{} bytes is too short", total)));
        }

        let body_len = total - FOOTER_SIZE;
        let footer = &self.data[body_len..];
        if footer[12..16] != FOOTER_MAGIC {
            return Err(TrieError::corrupt("bad footer magic"));
        }
        let recorded_len = u64::decode(&footer[..8]);
        if recorded_len != total as u64 {
            return Err(TrieError::corrupt(format!(
                "length mismatch: recorded {}, actual {}",
                recorded_len, total
            )));
        }
        let expected_crc = u32::decode(&footer[8..12]);
        let actual_crc = crc32fast::hash(&self.data[..body_len]);
        if actual_crc != expected_crc {
            return Err(TrieError::corrupt(format!(
                "CRC32 mismatch: expected {:08x}, got {:08x}",
                expected_crc, actual_crc
            )));
        }
        self.data = &self.data[..body_len];

        if self.take(MAGIC.len(), "magic")? != MAGIC {
            return Err(TrieError::corrupt("bad magic"));
        }
        let version = self.u32("version")?;
        if version != VERSION {
            return Err(TrieError::corrupt(format!("unsupported version {}", version)));
        }
        let flags = self.u32("config flags")?;
        let config = BuildConfig::from_flags(flags)
            .map_err(|e| TrieError::corrupt(format!("config flags: {}", e)))?;
        let num_keys = self.count("key count")?;
        let num_levels = self.u32("level count")? as usize;
        let _reserved = self.u32("reserved")?;
        if num_levels == 0 || num_levels != config.num_tries as usize {
            return Err(TrieError::corrupt(format!("level count {}", num_levels)));
        }

        let levels = (0..num_levels)
            .map(|i| self.level(i))
            .collect::<Result<Vec<_>>>()?;
        let tail = self.tail()?;
        if self.pos != self.data.len() {
            return Err(TrieError::corrupt("trailing bytes before footer"));
        }

        let trie = Trie::from_parts(levels, tail, config);
        if trie.num_keys() != num_keys {
            return Err(TrieError::corrupt(format!(
                "key count mismatch: header {}, decoded {}",
                num_keys,
                trie.num_keys()
            )));
        }
        Ok(trie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_reads_fail() {
        let mut decoder = Decoder::owned(&[1, 2, 3]);
        let err = decoder.u32("field").unwrap_err();
        assert!(matches!(err, TrieError::CorruptFormat(_)));
    }

    #[test]
    fn test_array_rejects_overlong_length() {
        let mut data = u64::MAX.to_le_bytes().to_vec();
        data.extend_from_slice(&[0; 8]);
        let mut decoder = Decoder::owned(&data);
        assert!(decoder.array::<u64>("array").is_err());
    }

    #[test]
    fn test_owned_array_skips_padding() {
        let mut data = 3u64.to_le_bytes().to_vec();
        data.extend_from_slice(&[9, 8, 7, 0, 0, 0, 0, 0]);
        let mut decoder = Decoder::owned(&data);
        let array = decoder.array::<u8>("labels").unwrap();
        assert_eq!(array.as_slice(), &[9, 8, 7]);
        assert_eq!(decoder.pos, 16);
    }
}
