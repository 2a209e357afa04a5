use std::{collections::HashMap, hash::Hash};

/// A very basic concurrent hashmap that is hard to misuse in an async context.
/// A lock is only ever held for the duration of one map operation, never across an await.
pub struct SafeMap<K: Hash + Eq, V>(std::sync::RwLock<HashMap<K, V>>);

impl<K: Hash + Eq, V> Default for SafeMap<K, V> {
    fn default() -> Self { Self::new() }
}

impl<K: Hash + Eq, V> SafeMap<K, V> {
    pub fn new() -> Self { Self(std::sync::RwLock::new(HashMap::new())) }

    pub fn insert(&self, key: K, value: V) -> Option<V> { self.0.write().expect("Failed to lock the map").insert(key, value) }

    pub fn remove(&self, key: &K) -> Option<V> { self.0.write().expect("Failed to lock the map").remove(key) }

    /// Remove and return every entry
    pub fn take_all(&self) -> Vec<(K, V)> { self.0.write().expect("Failed to lock the map").drain().collect() }

    /// Run `f` against the value for `key` while holding the lock. `f` must not block.
    pub fn with<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> { self.0.read().expect("Failed to lock the map").get(key).map(f) }
}
