//! Persisted trie format.
//!
//! All integers are little-endian and every array starts on an 8-byte
//! boundary, so a mapped file can be read in place:
//!
//! ```text
//! header  magic "MarisaR\0" | version u32 | config flags u32
//!         | key count u64 | level count u32 | reserved u32
//! level*  first-level node count u64 | louds | terminals | links
//!         | labels | link high bits | cache
//! tail    mode u64 | bytes
//! footer  total length u64 | crc32 u32 | "RSRM"
//! ```
//!
//! The CRC covers everything before the footer.

mod reader;
mod writer;

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::trie::Trie;
use reader::Decoder;
use writer::Encoder;
pub(crate) use writer::io_size;

pub(crate) const MAGIC: [u8; 8] = *b"MarisaR\0";
pub(crate) const FOOTER_MAGIC: [u8; 4] = *b"RSRM";
pub(crate) const VERSION: u32 = 1;
pub(crate) const HEADER_SIZE: usize = 32;
pub(crate) const FOOTER_SIZE: usize = 16;

impl Trie {
    /// Serialize into a new buffer of exactly [`io_size`](Self::io_size) bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        Encoder::with_capacity(self.io_size).trie(self)
    }

    /// Serialize into `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Write the trie to a file, replacing it if it exists.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes())?;
        debug!(path = %path.display(), bytes = self.io_size, "saved trie");
        Ok(())
    }

    /// Decode a trie into owned memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Trie> {
        Decoder::owned(bytes).trie()
    }

    /// Read a whole serialized trie from `reader`.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Trie> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Load a file into owned memory.
    pub fn load(path: impl AsRef<Path>) -> Result<Trie> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let trie = Self::from_bytes(&bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "loaded trie");
        Ok(trie)
    }

    /// Map a file read-only and query it in place.
    ///
    /// The mapping lives as long as the returned trie. The file must not be
    /// modified while it is mapped.
    #[cfg(feature = "mmap")]
    pub fn mmap(path: impl AsRef<Path>) -> Result<Trie> {
        use std::sync::Arc;

        let path = path.as_ref();
        let file = fs::File::open(path)?;
        // SAFETY: the mapping is read-only and never handed out mutably; the
        // caller is responsible for not truncating the file while mapped.
        let map = Arc::new(unsafe { memmap2::Mmap::map(&file)? });
        let trie = Decoder::mapped(&map[..], Arc::clone(&map)).trie()?;
        debug!(path = %path.display(), bytes = map.len(), "mapped trie");
        Ok(trie)
    }

    /// Whether the trie's arrays are views into a mapped file.
    pub fn is_mapped(&self) -> bool {
        self.levels
            .first()
            .is_some_and(|level| level.louds.words.is_mapped())
    }
}
