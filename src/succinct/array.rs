//! Fixed-width little-endian arrays backed by owned memory or a shared mapping.

use std::fmt;
#[cfg(feature = "mmap")]
use std::marker::PhantomData;
#[cfg(feature = "mmap")]
use std::sync::Arc;

#[cfg(feature = "mmap")]
use memmap2::Mmap;

/// Plain integer element with a fixed little-endian encoding.
pub(crate) trait Element: Copy + Default + fmt::Debug {
    const WIDTH: usize;

    fn decode(bytes: &[u8]) -> Self;

    fn encode(self, out: &mut Vec<u8>);
}

impl Element for u8 {
    const WIDTH: usize = 1;

    #[inline]
    fn decode(bytes: &[u8]) -> Self {
        bytes[0]
    }

    fn encode(self, out: &mut Vec<u8>) {
        out.push(self);
    }
}

impl Element for u32 {
    const WIDTH: usize = 4;

    #[inline]
    fn decode(bytes: &[u8]) -> Self {
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn encode(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Element for u64 {
    const WIDTH: usize = 8;

    #[inline]
    fn decode(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[..8]);
        u64::from_le_bytes(raw)
    }

    fn encode(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

/// Read-only view into a memory-mapped file.
#[cfg(feature = "mmap")]
#[derive(Clone)]
pub(crate) struct MappedSlice<T> {
    map: Arc<Mmap>,
    offset: usize,
    len: usize,
    _marker: PhantomData<T>,
}

#[cfg(feature = "mmap")]
impl<T: Element> MappedSlice<T> {
    /// Caller guarantees `offset + len * T::WIDTH <= map.len()`.
    pub(crate) fn new(map: Arc<Mmap>, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len * T::WIDTH <= map.len());
        Self {
            map,
            offset,
            len,
            _marker: PhantomData,
        }
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        &self.map[self.offset..self.offset + self.len * T::WIDTH]
    }
}

/// Immutable array of `T`.
#[derive(Clone)]
pub(crate) enum Array<T: Element> {
    Owned(Vec<T>),
    #[cfg(feature = "mmap")]
    Mapped(MappedSlice<T>),
}

impl<T: Element> Default for Array<T> {
    fn default() -> Self {
        Array::Owned(Vec::new())
    }
}

impl<T: Element> From<Vec<T>> for Array<T> {
    fn from(values: Vec<T>) -> Self {
        Array::Owned(values)
    }
}

impl<T: Element> Array<T> {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        match self {
            Array::Owned(values) => values.len(),
            #[cfg(feature = "mmap")]
            Array::Mapped(slice) => slice.len,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> T {
        match self {
            Array::Owned(values) => values[index],
            #[cfg(feature = "mmap")]
            Array::Mapped(slice) => {
                let start = slice.offset + index * T::WIDTH;
                T::decode(&slice.map[start..start + T::WIDTH])
            }
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Bytes occupied by the elements.
    pub(crate) fn size_in_bytes(&self) -> usize {
        self.len() * T::WIDTH
    }

    /// Append the little-endian encoding of every element.
    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Array::Owned(values) => {
                out.reserve(values.len() * T::WIDTH);
                for &value in values {
                    value.encode(out);
                }
            }
            #[cfg(feature = "mmap")]
            Array::Mapped(slice) => out.extend_from_slice(slice.bytes()),
        }
    }

    /// Whether the elements live in a mapping rather than owned memory.
    pub(crate) fn is_mapped(&self) -> bool {
        match self {
            Array::Owned(_) => false,
            #[cfg(feature = "mmap")]
            Array::Mapped(_) => true,
        }
    }
}

impl Array<u8> {
    #[inline]
    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Array::Owned(values) => values,
            #[cfg(feature = "mmap")]
            Array::Mapped(slice) => slice.bytes(),
        }
    }
}

impl<T: Element> fmt::Debug for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("len", &self.len())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}
