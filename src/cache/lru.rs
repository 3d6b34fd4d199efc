//! Fixed-capacity LRU cache of per-station record runs.
//!
//! Recency is a doubly linked sequence threaded through an arena of slots
//! addressed by stable indices, with two sentinel slots bounding the list:
//! the slot after `HEAD` is the least-recently-used entry, the slot before
//! `TAIL` the most-recently-used. A `HashMap` maps each key to its slot
//! index, and evicted slots go on a free list for reuse. A slot is therefore
//! either live in both the list and the index, or in neither.

use crate::types::record::DailyRecord;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Index of the sentinel bounding the least-recently-used end.
const HEAD: usize = 0;
/// Index of the sentinel bounding the most-recently-used end.
const TAIL: usize = 1;

struct Entry {
    key: String,
    records: Arc<[DailyRecord]>,
}

struct Slot {
    prev: usize,
    next: usize,
    /// `None` only for the two sentinels and free-listed slots.
    entry: Option<Entry>,
}

struct LruInner {
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
    free: Vec<usize>,
}

impl LruInner {
    /// Unlinks `slot` from the recency list. The slot keeps its entry.
    fn detach(&mut self, slot: usize) {
        let prev = self.slots[slot].prev;
        let next = self.slots[slot].next;
        self.slots[prev].next = next;
        self.slots[next].prev = prev;
    }

    /// Links `slot` in just before `TAIL`, making it most-recently-used.
    fn attach_mru(&mut self, slot: usize) {
        let prev = self.slots[TAIL].prev;
        self.slots[prev].next = slot;
        self.slots[slot].prev = prev;
        self.slots[slot].next = TAIL;
        self.slots[TAIL].prev = slot;
    }

    /// Moves `slot` to the most-recently-used position.
    fn promote(&mut self, slot: usize) {
        if self.slots[TAIL].prev != slot {
            self.detach(slot);
            self.attach_mru(slot);
        }
    }

    /// Removes the least-recently-used entry from both structures and
    /// returns it. Only called with at least one live entry; the sentinels
    /// guarantee `HEAD.next` is that entry.
    fn evict_lru(&mut self) -> Option<(String, Arc<[DailyRecord]>)> {
        let slot = self.slots[HEAD].next;
        debug_assert_ne!(slot, TAIL, "evict_lru called on an empty cache");
        self.detach(slot);
        let entry = self.slots[slot].entry.take()?;
        self.index.remove(&entry.key);
        self.free.push(slot);
        Some((entry.key, entry.records))
    }

    /// Places `entry` in a reused or fresh slot and returns its index. The
    /// caller links the slot into the recency list.
    fn alloc(&mut self, entry: Entry) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot].entry = Some(entry);
                slot
            }
            None => {
                self.slots.push(Slot {
                    prev: HEAD,
                    next: TAIL,
                    entry: Some(entry),
                });
                self.slots.len() - 1
            }
        }
    }
}

/// Bounded in-memory cache mapping station id to its run of daily records.
///
/// Every operation takes one cache-wide lock for its whole duration, so
/// operations are fully serialized; none of them performs I/O while holding
/// it. A missing key is a normal outcome, never an error.
pub struct RecordCache {
    inner: Mutex<LruInner>,
    capacity: NonZeroUsize,
}

impl RecordCache {
    /// Creates an empty cache holding at most `capacity` stations.
    pub fn new(capacity: NonZeroUsize) -> Self {
        let sentinels = vec![
            Slot {
                prev: HEAD,
                next: TAIL,
                entry: None,
            },
            Slot {
                prev: HEAD,
                next: TAIL,
                entry: None,
            },
        ];
        Self {
            inner: Mutex::new(LruInner {
                slots: sentinels,
                index: HashMap::new(),
                free: Vec::new(),
            }),
            capacity,
        }
    }

    /// Returns the records cached for `key`, promoting the entry to
    /// most-recently-used. A miss has no side effects.
    pub async fn get(&self, key: &str) -> Option<Arc<[DailyRecord]>> {
        let mut inner = self.inner.lock().await;
        let slot = *inner.index.get(key)?;
        inner.promote(slot);
        inner.slots[slot]
            .entry
            .as_ref()
            .map(|entry| Arc::clone(&entry.records))
    }

    /// Stores `records` under `key` and makes the entry most-recently-used.
    ///
    /// An existing key is overwritten in place without changing the cache
    /// size. A new key first evicts the least-recently-used entry when the
    /// cache is full; the evicted pair is returned to the caller.
    pub async fn insert(
        &self,
        key: &str,
        records: Arc<[DailyRecord]>,
    ) -> Option<(String, Arc<[DailyRecord]>)> {
        let mut inner = self.inner.lock().await;

        if let Some(slot) = inner.index.get(key).copied() {
            if let Some(entry) = inner.slots[slot].entry.as_mut() {
                entry.records = records;
            }
            inner.promote(slot);
            return None;
        }

        let evicted = if inner.index.len() == self.capacity.get() {
            inner.evict_lru()
        } else {
            None
        };

        let slot = inner.alloc(Entry {
            key: key.to_owned(),
            records,
        });
        inner.index.insert(key.to_owned(), slot);
        inner.attach_mru(slot);
        evicted
    }

    /// Visits every entry from most- to least-recently-used, stopping early
    /// when `visit` returns `false`. Recency order is left untouched.
    pub async fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&str, &Arc<[DailyRecord]>) -> bool,
    {
        let inner = self.inner.lock().await;
        let mut slot = inner.slots[TAIL].prev;
        while slot != HEAD {
            if let Some(entry) = inner.slots[slot].entry.as_ref() {
                if !visit(&entry.key, &entry.records) {
                    return;
                }
            }
            slot = inner.slots[slot].prev;
        }
    }

    /// Number of stations currently cached.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.index.len()
    }

    /// `true` when no station is cached.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// The configured maximum number of cached stations.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn cache(capacity: usize) -> RecordCache {
        RecordCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    fn no_records() -> Arc<[DailyRecord]> {
        Vec::new().into()
    }

    async fn walked_keys(cache: &RecordCache) -> Vec<String> {
        let mut keys = Vec::new();
        cache
            .range(|key, _| {
                keys.push(key.to_owned());
                true
            })
            .await;
        keys
    }

    #[tokio::test]
    async fn miss_returns_none_without_side_effects() {
        let cache = cache(3);
        assert!(cache.get("724940").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn never_holds_more_keys_than_capacity() {
        let cache = cache(3);
        for i in 0..20 {
            cache.insert(&format!("station-{i}"), no_records()).await;
            assert!(cache.len().await <= cache.capacity());
        }
        assert_eq!(cache.len().await, 3);
    }

    #[tokio::test]
    async fn get_protects_an_entry_from_eviction() {
        let cache = cache(3);
        cache.insert("k1", no_records()).await;
        cache.insert("k2", no_records()).await;
        cache.insert("k3", no_records()).await;

        assert!(cache.get("k1").await.is_some());

        let evicted = cache.insert("k4", no_records()).await;
        assert_eq!(evicted.map(|(key, _)| key).as_deref(), Some("k2"));
        assert!(cache.get("k1").await.is_some());
        assert!(cache.get("k2").await.is_none());
    }

    #[tokio::test]
    async fn repeated_get_does_not_change_eviction_order() {
        let cache = cache(3);
        cache.insert("k1", no_records()).await;
        cache.insert("k2", no_records()).await;
        cache.insert("k3", no_records()).await;

        cache.get("k1").await;
        cache.get("k1").await;
        cache.get("k1").await;

        // k2 is still the least-recently-used entry.
        assert_eq!(walked_keys(&cache).await, ["k1", "k3", "k2"]);
    }

    #[tokio::test]
    async fn overwrite_at_capacity_keeps_size_and_promotes() {
        let cache = cache(2);
        cache.insert("k1", no_records()).await;
        cache.insert("k2", no_records()).await;

        let evicted = cache.insert("k1", no_records()).await;
        assert!(evicted.is_none());
        assert_eq!(cache.len().await, 2);
        assert_eq!(walked_keys(&cache).await, ["k1", "k2"]);
    }

    #[tokio::test]
    async fn range_visits_most_recent_first_and_stops_on_false() {
        let cache = cache(3);
        cache.insert("k1", no_records()).await;
        cache.insert("k2", no_records()).await;
        cache.insert("k3", no_records()).await;

        assert_eq!(walked_keys(&cache).await, ["k3", "k2", "k1"]);

        let mut visited = Vec::new();
        cache
            .range(|key, _| {
                visited.push(key.to_owned());
                false
            })
            .await;
        assert_eq!(visited, ["k3"]);

        // The walk itself must not disturb recency.
        assert_eq!(walked_keys(&cache).await, ["k3", "k2", "k1"]);
    }

    #[tokio::test]
    async fn evicted_slots_are_reused_for_new_entries() {
        let cache = cache(2);
        for i in 0..10 {
            cache.insert(&format!("station-{i}"), no_records()).await;
        }

        let inner = cache.inner.lock().await;
        // Two sentinels plus one slot per live entry; churn reuses slots
        // instead of growing the arena.
        assert_eq!(inner.slots.len(), 2 + 2);
        assert_eq!(inner.free.len(), 0);
    }

    #[tokio::test]
    async fn concurrent_churn_keeps_list_and_index_consistent() {
        let cache = Arc::new(cache(16));

        let mut tasks = Vec::new();
        for i in 0..8 {
            let cache = Arc::clone(&cache);
            tasks.push(tokio::spawn(async move {
                let key = format!("station-{i}");
                for _ in 0..50 {
                    cache.insert(&key, no_records()).await;
                    assert!(cache.get(&key).await.is_some());
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let walked: HashSet<String> = walked_keys(&cache).await.into_iter().collect();
        assert_eq!(walked.len(), cache.len().await);

        let inner = cache.inner.lock().await;
        let indexed: HashSet<String> = inner.index.keys().cloned().collect();
        assert_eq!(walked, indexed);
    }
}
