#![doc = include_str!("../README.md")]

pub mod codec;
mod containers;
mod event;
mod internal_cache;
mod mock_storage;
mod scratchpad;
pub mod storage;
mod utils;

#[cfg(test)]
mod state_tests;

use std::fmt::Display;

pub use containers::{StateMap, StateMapError, StateValue, StateValueError, StateVec, StateVecError};
pub use event::Event;
pub use internal_cache::OrderedReadsAndWrites;
pub use mock_storage::MockStorage;
pub use scratchpad::{StateCheckpoint, WorkingSet};
pub use storage::Storage;
pub use utils::AlignedVec;

/// A prefix prepended to each key before insertion and retrieval from the
/// storage.
///
/// All the collection types in this crate are backed by the same storage
/// instance, which means that inserting the same key into two different
/// collections would collide. Every collection is therefore instantiated with
/// a unique prefix that is prepended to each key.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Clone,
    borsh::BorshDeserialize,
    borsh::BorshSerialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Prefix {
    prefix: AlignedVec,
}

impl Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let buf = self.prefix.as_ref();
        match std::str::from_utf8(buf) {
            Ok(s) => write!(f, "{:?}", s),
            Err(_) => write!(f, "0x{}", hex::encode(buf)),
        }
    }
}

impl Prefix {
    pub fn new(prefix: Vec<u8>) -> Self {
        Self {
            prefix: AlignedVec::new(prefix),
        }
    }

    pub fn as_aligned_vec(&self) -> &AlignedVec {
        &self.prefix
    }

    pub fn len(&self) -> usize {
        self.prefix.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a new [`Prefix`] allocated by extending the current one with
    /// the given bytes.
    pub fn extended(&self, bytes: &[u8]) -> Self {
        let mut prefix = self.clone();
        prefix.prefix.extend(&AlignedVec::new(bytes.to_vec()));
        prefix
    }
}
