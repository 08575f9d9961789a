//! Key collection fed to a build.

use crate::error::{BuildErrorKind, Result, TrieError};

/// Weight given to keys pushed without one.
pub const DEFAULT_WEIGHT: f32 = 1.0;

/// A byte string with its build weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    bytes: Box<[u8]>,
    weight: f32,
}

impl Key {
    /// Create a key, copying the bytes.
    pub fn new(bytes: impl AsRef<[u8]>, weight: f32) -> Self {
        Self {
            bytes: bytes.as_ref().into(),
            weight,
        }
    }

    /// Key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Build weight
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the key has no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Append-only collection of keys.
///
/// A keyset is only read by builds, so one keyset can feed several builds
/// with different configurations.
#[derive(Debug, Clone, Default)]
pub struct Keyset {
    keys: Vec<Key>,
    total_length: usize,
}

impl Keyset {
    /// Create an empty keyset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key with the default weight.
    pub fn push(&mut self, key: impl AsRef<[u8]>) {
        self.push_weighted(key, DEFAULT_WEIGHT);
    }

    /// Append a key with an explicit weight.
    pub fn push_weighted(&mut self, key: impl AsRef<[u8]>, weight: f32) {
        let key = Key::new(key, weight);
        self.total_length += key.len();
        self.keys.push(key);
    }

    /// Reserve room for `additional` keys, reporting failure instead of aborting.
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.keys.try_reserve(additional).map_err(|e| {
            TrieError::build(
                BuildErrorKind::ResourceExhausted,
                format!("Failed to reserve {} keys: {}", additional, e),
            )
        })
    }

    /// Number of keys, duplicates included
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the keyset is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sum of key lengths
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Key at insertion position `index`
    pub fn get(&self, index: usize) -> Option<&Key> {
        self.keys.get(index)
    }

    /// Keys in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Key> {
        self.keys.iter()
    }
}

impl<'a> IntoIterator for &'a Keyset {
    type Item = &'a Key;
    type IntoIter = std::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: AsRef<[u8]>> Extend<K> for Keyset {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.push(key);
        }
    }
}

impl<K: AsRef<[u8]>> FromIterator<K> for Keyset {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut keyset = Keyset::new();
        keyset.extend(iter);
        keyset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_keyset() {
        let keyset = Keyset::new();
        assert!(keyset.is_empty());
        assert_eq!(keyset.len(), 0);
        assert_eq!(keyset.total_length(), 0);
        assert!(keyset.get(0).is_none());
    }

    #[test]
    fn test_push_copies_bytes() {
        let mut keyset = Keyset::new();
        let mut buf = b"apple".to_vec();
        keyset.push(&buf);
        buf[0] = b'X';
        assert_eq!(keyset.get(0).unwrap().as_bytes(), b"apple");
        assert_eq!(keyset.get(0).unwrap().weight(), DEFAULT_WEIGHT);
    }

    #[test]
    fn test_push_weighted_and_totals() {
        let mut keyset = Keyset::new();
        keyset.push_weighted("ab", 2.5);
        keyset.push("cde");
        assert_eq!(keyset.len(), 2);
        assert_eq!(keyset.total_length(), 5);
        assert_eq!(keyset.get(0).unwrap().weight(), 2.5);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let keyset: Keyset = ["a", "a", "b"].into_iter().collect();
        assert_eq!(keyset.len(), 3);
    }

    #[test]
    fn test_binary_keys() {
        let mut keyset = Keyset::new();
        keyset.push([0u8, 255, 0]);
        assert_eq!(keyset.get(0).unwrap().as_bytes(), &[0u8, 255, 0]);
    }

    #[test]
    fn test_try_reserve() {
        let mut keyset = Keyset::new();
        assert!(keyset.try_reserve(16).is_ok());
        let err = keyset.try_reserve(usize::MAX).unwrap_err();
        assert_eq!(err.build_kind(), Some(BuildErrorKind::ResourceExhausted));
    }
}
