use std::collections::HashMap;
use std::sync::Arc;

use crate::storage::{StorageKey, StorageValue};
use crate::Storage;

/// The key type used inside the transaction cache.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub key: Arc<Vec<u8>>,
}

/// The value type used inside the transaction cache. `None` encodes deletion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheValue {
    pub value: Arc<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum CacheEntry {
    /// The value was fetched from the backing store and not modified since.
    Read(Option<CacheValue>),
    /// The value was written (or deleted) within the current transaction.
    Written(Option<CacheValue>),
}

impl CacheEntry {
    fn value(&self) -> Option<CacheValue> {
        match self {
            CacheEntry::Read(v) | CacheEntry::Written(v) => v.clone(),
        }
    }
}

/// Caches reads and writes for a (key, value) pair. On the first read the
/// value is fetched from the backing [`Storage`]. On following reads, the
/// cache checks if the value we read was inserted before. Writes always go to
/// the cache and are only applied to the backing store on commit.
#[derive(Default)]
pub struct StorageInternalCache {
    entries: HashMap<CacheKey, CacheEntry>,
    ordered_db_reads: Vec<(CacheKey, Option<CacheValue>)>,
}

/// A struct that contains the values read from the backing store and the
/// values to be written, both in deterministic order.
#[derive(Debug, Default)]
pub struct OrderedReadsAndWrites {
    pub ordered_reads: Vec<(CacheKey, Option<CacheValue>)>,
    pub ordered_writes: Vec<(CacheKey, Option<CacheValue>)>,
}

impl From<StorageInternalCache> for OrderedReadsAndWrites {
    fn from(val: StorageInternalCache) -> Self {
        let mut writes: Vec<(CacheKey, Option<CacheValue>)> = val
            .entries
            .into_iter()
            .filter_map(|(k, entry)| match entry {
                CacheEntry::Written(v) => Some((k, v)),
                CacheEntry::Read(_) => None,
            })
            .collect();
        writes.sort_by(|(k1, _), (k2, _)| k1.cmp(k2));
        Self {
            ordered_reads: val.ordered_db_reads,
            ordered_writes: writes,
        }
    }
}

impl StorageInternalCache {
    /// Gets a value from the cache or reads it from the provided [`Storage`].
    pub(crate) fn get_or_fetch<S: Storage>(
        &mut self,
        key: &StorageKey,
        value_reader: &S,
    ) -> Option<StorageValue> {
        let cache_key = key.to_cache_key();

        if let Some(entry) = self.entries.get(&cache_key) {
            return entry.value().map(Into::into);
        }

        // If the value does not exist in the cache, then fetch it from the
        // backing store and record the read.
        let storage_value = value_reader.get(key);
        let cache_value = storage_value.as_ref().map(|v| v.clone().into_cache_value());
        self.add_read(cache_key, cache_value);
        storage_value
    }

    pub(crate) fn set(&mut self, key: &StorageKey, value: StorageValue) {
        let cache_key = key.to_cache_key();
        self.entries
            .insert(cache_key, CacheEntry::Written(Some(value.into_cache_value())));
    }

    pub(crate) fn delete(&mut self, key: &StorageKey) {
        let cache_key = key.to_cache_key();
        self.entries.insert(cache_key, CacheEntry::Written(None));
    }

    fn add_read(&mut self, key: CacheKey, value: Option<CacheValue>) {
        self.entries
            .insert(key.clone(), CacheEntry::Read(value.clone()));
        self.ordered_db_reads.push((key, value));
    }
}
