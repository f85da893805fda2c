use crate::builder::MemoryStoreBuilder;
use crate::entry::Entry;
use crate::error::BuildError;
use crate::store::{CacheStore, MemoryStore};

use std::hash::BuildHasher;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PersistentEntry {
  pub(crate) key: String,
  pub(crate) entry: Entry,
}

/// A serializable, point-in-time copy of a [`MemoryStore`].
///
/// Created with [`MemoryStore::to_snapshot`] and restored with
/// [`MemoryStoreBuilder::build_from_snapshot`]. Entry lifetimes are absolute
/// timestamps, so an entry that expires while persisted is expired on
/// restore. Any `serde` format works for the bytes on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
  pub(crate) entries: Vec<PersistentEntry>,
  shards: usize,
}

impl StoreSnapshot {
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Iterates over the captured `(key, entry)` pairs.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
    self.entries.iter().map(|p| (p.key.as_str(), &p.entry))
  }
}

impl<H: BuildHasher> MemoryStore<H> {
  /// Captures every stored entry. Each shard is read-locked in turn, so the
  /// result is consistent per shard, not across shards.
  pub fn to_snapshot(&self) -> StoreSnapshot {
    let mut entries = Vec::new();
    for shard in self.iter_shards() {
      let guard = shard.read();
      entries.extend(guard.iter().map(|(key, entry)| PersistentEntry {
        key: key.clone(),
        entry: (**entry).clone(),
      }));
    }

    StoreSnapshot {
      entries,
      shards: self.num_shards(),
    }
  }
}

impl<H> MemoryStoreBuilder<H>
where
  H: BuildHasher + Clone + Send + Sync,
{
  /// Builds a store pre-populated from `snapshot`.
  ///
  /// The snapshot's shard count overrides the builder's.
  pub fn build_from_snapshot(self, snapshot: StoreSnapshot) -> Result<MemoryStore<H>, BuildError> {
    let store = self.shards(snapshot.shards).build()?;
    for persisted in snapshot.entries {
      store.put(&persisted.key, persisted.entry);
    }
    tracing::debug!(entries = store.len(), "memory store restored from snapshot");
    Ok(store)
  }
}
