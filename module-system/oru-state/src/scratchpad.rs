use std::collections::HashMap;
use std::fmt::Debug;

use crate::codec::{StateCodec, StateKeyCodec, StateValueCodec};
use crate::event::Event;
use crate::internal_cache::{CacheKey, CacheValue, OrderedReadsAndWrites, StorageInternalCache};
use crate::storage::{StorageKey, StorageValue};
use crate::{Prefix, Storage};

/// A working set accumulates reads and writes on top of the underlying store.
pub struct Delta<S: Storage> {
    inner: S,
    cache: StorageInternalCache,
}

/// A wrapper that adds additional writes on top of an underlying [`Delta`].
///
/// These are handy for implementing operations that might revert on top of an
/// existing working set, without running the risk that the whole working set
/// will be discarded if some particular operation reverts.
struct RevertableDelta<S: Storage> {
    /// The inner (non-revertable) delta.
    inner: Delta<S>,
    /// A cache containing the most recent values written. Reads are first
    /// checked against this map, and if the key is not present, the underlying
    /// [`Delta`] is checked.
    writes: HashMap<CacheKey, Option<CacheValue>>,
}

impl<S: Storage> Debug for RevertableDelta<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevertableDelta").finish()
    }
}

/// This structure is responsible for storing the `read-write` set
/// and is obtained from the [`WorkingSet`] by using either the `checkpoint`
/// or `revert` method.
pub struct StateCheckpoint<S: Storage> {
    delta: Delta<S>,
}

impl<S: Storage> StateCheckpoint<S> {
    pub fn new(inner: S) -> Self {
        Self {
            delta: Delta::new(inner),
        }
    }

    pub fn to_revertable(self) -> WorkingSet<S> {
        WorkingSet {
            delta: self.delta.get_revertable_wrapper(),
            events: Default::default(),
        }
    }

    /// Extracts the ordered reads and writes collected so far, leaving the
    /// checkpoint empty. The result is suitable for [`Storage::commit`].
    pub fn freeze(&mut self) -> OrderedReadsAndWrites {
        self.delta.freeze()
    }
}

/// This structure contains the read-write set and the events collected during
/// the execution of a transaction. There are two ways to convert it into a
/// [`StateCheckpoint`]:
/// 1. By using the `checkpoint` method, where all the changes are added to
///    the underlying [`StateCheckpoint`].
/// 2. By using the `revert` method, where the most recent changes are
///    reverted and the previous [`StateCheckpoint`] is returned.
pub struct WorkingSet<S: Storage> {
    delta: RevertableDelta<S>,
    events: Vec<Event>,
}

impl<S: Storage> WorkingSet<S> {
    pub fn new(inner: S) -> Self {
        StateCheckpoint::new(inner).to_revertable()
    }

    /// Commits the current changes into the underlying checkpoint.
    pub fn checkpoint(self) -> StateCheckpoint<S> {
        StateCheckpoint {
            delta: self.delta.commit(),
        }
    }

    /// Discards the current changes, returning the checkpoint as it was
    /// before this working set was created. Events are discarded with them.
    pub fn revert(self) -> StateCheckpoint<S> {
        StateCheckpoint {
            delta: self.delta.revert(),
        }
    }

    pub(crate) fn get(&mut self, key: &StorageKey) -> Option<StorageValue> {
        self.delta.get(key)
    }

    pub(crate) fn set(&mut self, key: &StorageKey, value: StorageValue) {
        self.delta.set(key, value)
    }

    pub(crate) fn delete(&mut self, key: &StorageKey) {
        self.delta.delete(key)
    }

    pub fn add_event(&mut self, key: &str, value: &str) {
        self.events.push(Event::new(key, value));
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn backing(&self) -> &S {
        &self.delta.inner.inner
    }
}

impl<S: Storage> WorkingSet<S> {
    pub(crate) fn set_value<K, V, C>(&mut self, prefix: &Prefix, key: &K, value: &V, codec: &C)
    where
        C: StateCodec<K, V>,
    {
        let storage_key = StorageKey::new(prefix, key, codec);
        let storage_value = StorageValue::new(value, codec);
        self.set(&storage_key, storage_value);
    }

    pub(crate) fn get_value<K, V, C>(&mut self, prefix: &Prefix, key: &K, codec: &C) -> Option<V>
    where
        C: StateCodec<K, V>,
    {
        let storage_key = StorageKey::new(prefix, key, codec);
        self.get_decoded(&storage_key, codec)
    }

    pub(crate) fn remove_value<K, V, C>(&mut self, prefix: &Prefix, key: &K, codec: &C) -> Option<V>
    where
        C: StateCodec<K, V>,
    {
        let storage_key = StorageKey::new(prefix, key, codec);
        let storage_value = self.get_decoded(&storage_key, codec)?;
        self.delete(&storage_key);
        Some(storage_value)
    }

    pub(crate) fn delete_value<K, C>(&mut self, prefix: &Prefix, key: &K, codec: &C)
    where
        C: StateKeyCodec<K>,
    {
        let storage_key = StorageKey::new(prefix, key, codec);
        self.delete(&storage_key);
    }

    pub(crate) fn set_singleton<V, C>(&mut self, prefix: &Prefix, value: &V, codec: &C)
    where
        C: StateValueCodec<V>,
    {
        let storage_key = StorageKey::singleton(prefix);
        let storage_value = StorageValue::new(value, codec);
        self.set(&storage_key, storage_value);
    }

    pub(crate) fn get_singleton<V, C>(&mut self, prefix: &Prefix, codec: &C) -> Option<V>
    where
        C: StateValueCodec<V>,
    {
        let storage_key = StorageKey::singleton(prefix);
        self.get_decoded(&storage_key, codec)
    }

    pub(crate) fn remove_singleton<V, C>(&mut self, prefix: &Prefix, codec: &C) -> Option<V>
    where
        C: StateValueCodec<V>,
    {
        let storage_key = StorageKey::singleton(prefix);
        let storage_value = self.get_decoded(&storage_key, codec)?;
        self.delete(&storage_key);
        Some(storage_value)
    }

    pub(crate) fn delete_singleton(&mut self, prefix: &Prefix) {
        let storage_key = StorageKey::singleton(prefix);
        self.delete(&storage_key);
    }

    fn get_decoded<V, C>(&mut self, storage_key: &StorageKey, codec: &C) -> Option<V>
    where
        C: StateValueCodec<V>,
    {
        let storage_value = self.get(storage_key)?;

        // It is ok to panic here. Deserialization problem means that something
        // is terribly wrong.
        Some(codec.decode_value(storage_value.value()))
    }
}

impl<S: Storage> RevertableDelta<S> {
    fn get(&mut self, key: &StorageKey) -> Option<StorageValue> {
        let cache_key = key.to_cache_key();
        if let Some(value) = self.writes.get(&cache_key) {
            return value.clone().map(Into::into);
        }
        self.inner.get(key)
    }

    fn set(&mut self, key: &StorageKey, value: StorageValue) {
        self.writes
            .insert(key.to_cache_key(), Some(value.into_cache_value()));
    }

    fn delete(&mut self, key: &StorageKey) {
        self.writes.insert(key.to_cache_key(), None);
    }
}

impl<S: Storage> RevertableDelta<S> {
    fn commit(self) -> Delta<S> {
        let mut inner = self.inner;

        let mut writes: Vec<(CacheKey, Option<CacheValue>)> = self.writes.into_iter().collect();
        writes.sort_by(|(k1, _), (k2, _)| k1.cmp(k2));
        for (k, v) in writes {
            match v {
                Some(v) => inner.set(&k.into(), StorageValue::from(v)),
                None => inner.delete(&k.into()),
            }
        }

        inner
    }

    fn revert(self) -> Delta<S> {
        self.inner
    }
}

impl<S: Storage> Delta<S> {
    fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Default::default(),
        }
    }

    fn get_revertable_wrapper(self) -> RevertableDelta<S> {
        RevertableDelta {
            inner: self,
            writes: Default::default(),
        }
    }
}

impl<S: Storage> Debug for Delta<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delta").finish()
    }
}

impl<S: Storage> Delta<S> {
    fn get(&mut self, key: &StorageKey) -> Option<StorageValue> {
        self.cache.get_or_fetch(key, &self.inner)
    }

    fn set(&mut self, key: &StorageKey, value: StorageValue) {
        self.cache.set(key, value)
    }

    fn delete(&mut self, key: &StorageKey) {
        self.cache.delete(key)
    }

    fn freeze(&mut self) -> OrderedReadsAndWrites {
        std::mem::take(&mut self.cache).into()
    }
}
