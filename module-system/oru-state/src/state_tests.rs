use super::*;
use crate::storage::{StorageKey, StorageValue};

fn commit(storage: &MockStorage, working_set: WorkingSet<MockStorage>) {
    let changes = working_set.checkpoint().freeze();
    storage.commit(changes).expect("Commit must succeed");
}

#[test]
fn test_workingset_get() {
    let key = StorageKey::from("key");
    let value = StorageValue::from("value");

    let storage = MockStorage::new();
    let mut working_set = WorkingSet::new(storage.clone());
    working_set.set(&key, value.clone());

    assert_eq!(Some(value), working_set.get(&key));
}

#[test]
fn test_workingset_delete() {
    let key = StorageKey::from("key");
    let value = StorageValue::from("value");

    let storage = MockStorage::new();
    let mut working_set = WorkingSet::new(storage.clone());
    working_set.set(&key, value.clone());
    commit(&storage, working_set);

    let mut working_set = WorkingSet::new(storage.clone());
    assert_eq!(Some(value), working_set.get(&key));
    working_set.delete(&key);
    assert_eq!(None, working_set.get(&key));
    commit(&storage, working_set);

    let mut working_set = WorkingSet::new(storage);
    assert_eq!(None, working_set.get(&key));
}

#[test]
fn test_workingset_revert_discards_changes() {
    let key = StorageKey::from("key");
    let value = StorageValue::from("value");
    let overwrite = StorageValue::from("overwrite");

    let storage = MockStorage::new();
    let mut working_set = WorkingSet::new(storage.clone());
    working_set.set(&key, value.clone());
    commit(&storage, working_set);

    // A reverted working set must not leak its writes into the checkpoint.
    let mut working_set = WorkingSet::new(storage.clone());
    working_set.set(&key, overwrite);
    let mut checkpoint = working_set.revert();
    let changes = checkpoint.freeze();
    assert!(changes.ordered_writes.is_empty());
    storage.commit(changes).unwrap();

    let mut working_set = WorkingSet::new(storage);
    assert_eq!(Some(value), working_set.get(&key));
}

#[test]
fn test_value_and_map_roundtrip() {
    let storage = MockStorage::new();
    let mut working_set = WorkingSet::new(storage.clone());

    let value = StateValue::<u64>::new(Prefix::new(b"test/value".to_vec()));
    let map = StateMap::<String, u64>::new(Prefix::new(b"test/map".to_vec()));

    value.set(&11, &mut working_set);
    map.set(&"alice".to_string(), &7, &mut working_set);
    commit(&storage, working_set);

    let mut working_set = WorkingSet::new(storage);
    assert_eq!(Some(11), value.get(&mut working_set));
    assert_eq!(Some(7), map.get(&"alice".to_string(), &mut working_set));
    assert_eq!(None, map.get(&"bob".to_string(), &mut working_set));

    assert_eq!(Some(7), map.remove(&"alice".to_string(), &mut working_set));
    assert!(map.get_or_err(&"alice".to_string(), &mut working_set).is_err());
}

#[test]
fn test_state_vec() {
    let storage = MockStorage::new();
    let mut ws = WorkingSet::new(storage.clone());

    let prefix = Prefix::new(b"test/vec".to_vec());
    let state_vec = StateVec::<u32>::new(prefix);

    state_vec.push(&1, &mut ws);
    state_vec.push(&2, &mut ws);
    assert_eq!(vec![1, 2], state_vec.iter(&mut ws).collect::<Vec<_>>());
    assert_eq!(2, state_vec.len(&mut ws));

    assert_eq!(Some(2), state_vec.pop(&mut ws));
    state_vec.set(0, &10, &mut ws).unwrap();
    assert_eq!(vec![10], state_vec.iter(&mut ws).collect::<Vec<_>>());
    assert!(state_vec.set(1, &8, &mut ws).is_err());

    state_vec.set_all(vec![11, 12, 13], &mut ws);
    assert_eq!(vec![11, 12, 13], state_vec.iter(&mut ws).collect::<Vec<_>>());
    assert_eq!(Some(13), state_vec.last(&mut ws));

    // Contents survive a commit.
    commit(&storage, ws);
    let mut ws = WorkingSet::new(storage);
    assert_eq!(vec![11, 12, 13], state_vec.iter(&mut ws).collect::<Vec<_>>());

    state_vec.clear(&mut ws);
    assert_eq!(0, state_vec.len(&mut ws));
    assert_eq!(None, state_vec.get(0, &mut ws));
}

#[test]
fn test_events_are_dropped_on_revert() {
    let storage = MockStorage::new();
    let mut working_set = WorkingSet::new(storage);
    working_set.add_event("key", "value");
    assert_eq!(1, working_set.events().len());
    working_set.revert();
}
