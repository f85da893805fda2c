use crate::entry::Entry;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::store::CacheStore;

use core::fmt;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crossbeam_utils::CachePadded;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

type Shard<H> = RwLock<HashMap<String, Arc<Entry>, H>>;

#[inline]
pub(crate) fn hash_key<H: BuildHasher>(hasher: &H, key: &str) -> u64 {
  let mut state = hasher.build_hasher();
  key.hash(&mut state);
  state.finish()
}

/// An in-memory store partitioned into independently locked shards.
///
/// Operations on different keys rarely contend for the same lock. Lookups
/// take a shard read lock; `put`, `invalidate` and `remove` take the shard
/// write lock, so invalidation's read-modify-replace is atomic per key.
///
/// Build one with [`MemoryStoreBuilder`](crate::MemoryStoreBuilder).
pub struct MemoryStore<H = ahash::RandomState> {
  shards: Box<[CachePadded<Shard<H>>]>,
  hasher: H,
  metrics: Metrics,
  initialized: OnceCell<()>,
}

impl<H> fmt::Debug for MemoryStore<H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MemoryStore")
      .field("num_shards", &self.shards.len())
      .field("metrics", &self.metrics.snapshot())
      .finish_non_exhaustive()
  }
}

impl<H> MemoryStore<H>
where
  H: BuildHasher + Clone,
{
  /// `num_shards` must be a non-zero power of two; the builder guarantees it.
  pub(crate) fn new(num_shards: usize, hasher: H) -> Self {
    let mut shards = Vec::with_capacity(num_shards);
    for _ in 0..num_shards {
      let shard_map = HashMap::with_hasher(hasher.clone());
      shards.push(CachePadded::new(RwLock::new(shard_map)));
    }

    Self {
      shards: shards.into_boxed_slice(),
      hasher,
      metrics: Metrics::new(),
      initialized: OnceCell::new(),
    }
  }
}

impl<H: BuildHasher> MemoryStore<H> {
  #[inline]
  fn shard(&self, key: &str) -> &Shard<H> {
    let hash = hash_key(&self.hasher, key);
    // Shard count is a power of two.
    let index = hash as usize & (self.shards.len() - 1);
    &self.shards[index]
  }

  pub(crate) fn iter_shards(&self) -> impl Iterator<Item = &Shard<H>> {
    self.shards.iter().map(|padded| &**padded)
  }

  pub fn num_shards(&self) -> usize {
    self.shards.len()
  }

  /// Number of stored entries. Not a consistent snapshot under concurrent
  /// writes.
  pub fn len(&self) -> usize {
    self.iter_shards().map(|s| s.read().len()).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.iter_shards().all(|s| s.read().is_empty())
  }

  /// Checks for a key without counting a hit or miss.
  pub fn contains_key(&self, key: &str) -> bool {
    self.shard(key).read().contains_key(key)
  }

  /// Returns a point-in-time snapshot of the store's counters.
  pub fn metrics(&self) -> MetricsSnapshot {
    self.metrics.snapshot()
  }
}

impl<H> CacheStore for MemoryStore<H>
where
  H: BuildHasher + Send + Sync,
{
  fn initialize(&self) {
    self.initialized.get_or_init(|| {
      tracing::debug!(shards = self.shards.len(), "memory store initialized");
    });
  }

  fn get(&self, key: &str) -> Option<Arc<Entry>> {
    let found = self.shard(key).read().get(key).cloned();
    match &found {
      Some(_) => self.metrics.hits.fetch_add(1, Ordering::Relaxed),
      None => self.metrics.misses.fetch_add(1, Ordering::Relaxed),
    };
    found
  }

  fn put(&self, key: &str, entry: Entry) {
    let size = entry.size_bytes();
    let mut guard = self.shard(key).write();
    let previous = guard.insert(key.to_owned(), Arc::new(entry));
    // Byte accounting stays under the shard lock so `clear` cannot interleave.
    self.metrics.add_bytes(size);
    if let Some(old) = &previous {
      self.metrics.sub_bytes(old.size_bytes());
    }
    drop(guard);

    self.metrics.puts.fetch_add(1, Ordering::Relaxed);
    if previous.is_some() {
      self.metrics.replacements.fetch_add(1, Ordering::Relaxed);
    }
    tracing::trace!(key, size, "entry stored");
  }

  fn invalidate(&self, key: &str, full_expire: bool) {
    let mut guard = self.shard(key).write();
    let Some(slot) = guard.get_mut(key) else {
      return;
    };

    let replacement = if full_expire {
      slot.fully_expired()
    } else {
      slot.soft_expired()
    };
    *slot = Arc::new(replacement);
    drop(guard);

    if full_expire {
      self.metrics.invalidations.fetch_add(1, Ordering::Relaxed);
    } else {
      self.metrics.soft_invalidations.fetch_add(1, Ordering::Relaxed);
    }
    tracing::trace!(key, full_expire, "entry invalidated");
  }

  fn remove(&self, key: &str) {
    let mut guard = self.shard(key).write();
    let Some(entry) = guard.remove(key) else {
      return;
    };
    self.metrics.sub_bytes(entry.size_bytes());
    drop(guard);

    self.metrics.removals.fetch_add(1, Ordering::Relaxed);
    tracing::trace!(key, "entry removed");
  }

  fn clear(&self) {
    // Lock every shard first so no writer observes a half-cleared store.
    let mut guards = self.iter_shards().map(|s| s.write()).collect::<Vec<_>>();
    for guard in guards.iter_mut() {
      guard.clear();
    }
    self.metrics.current_bytes.store(0, Ordering::Relaxed);
    drop(guards);

    self.metrics.clears.fetch_add(1, Ordering::Relaxed);
    tracing::debug!("memory store cleared");
  }
}
