use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::internal_cache::OrderedReadsAndWrites;
use crate::storage::{StorageKey, StorageValue};
use crate::Storage;

/// An in-memory [`Storage`] implementation.
///
/// This is the storage used by tests and by contexts that do not need an
/// authenticated backing store. Cloning is cheap and clones share the same
/// underlying map.
#[derive(Clone, Default)]
pub struct MockStorage {
    slots: Arc<RwLock<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MockStorage {
    fn get(&self, key: &StorageKey) -> Option<StorageValue> {
        self.slots
            .read()
            .expect("Storage lock must not be poisoned")
            .get(key.as_ref())
            .map(|bytes| StorageValue::from(bytes.clone()))
    }

    fn commit(&self, state_accesses: OrderedReadsAndWrites) -> anyhow::Result<()> {
        let mut slots = self
            .slots
            .write()
            .expect("Storage lock must not be poisoned");
        for (key, value) in state_accesses.ordered_writes {
            match value {
                Some(value) => {
                    slots.insert(key.key.to_vec(), value.value.to_vec());
                }
                None => {
                    slots.remove(key.key.as_ref());
                }
            }
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.slots
            .read()
            .expect("Storage lock must not be poisoned")
            .is_empty()
    }
}
