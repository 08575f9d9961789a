//! Succinct building blocks.
//!
//! Every array here is either owned or a view into a read-only mapping, so a
//! persisted trie can be queried in place.

mod array;
mod bit_vector;
mod flat_vector;

#[cfg(feature = "mmap")]
pub(crate) use array::MappedSlice;
pub(crate) use array::{Array, Element};
pub(crate) use bit_vector::{BitVector, BitVectorBuilder};
pub(crate) use flat_vector::FlatVector;
