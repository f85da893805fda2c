//! The cache store contract and the bundled backends.

mod memory;
mod null;

pub use memory::MemoryStore;
pub use null::NoCache;

use crate::entry::Entry;

use std::sync::Arc;

/// Keyed storage of [`Entry`] values.
///
/// One slot per key. Implementations are shared by every producer thread and
/// must serialize their own mutations; callers provide no external locking.
/// Backend failures are the backend's concern: a `get` that cannot be served
/// is simply a miss.
pub trait CacheStore: Send + Sync {
  /// Performs any potentially slow setup, such as opening backing storage.
  ///
  /// Expected to be called once, from a worker thread, before first use.
  /// Extra calls must be harmless.
  fn initialize(&self);

  /// Returns the entry stored under `key`, or `None` on a miss.
  fn get(&self, key: &str) -> Option<Arc<Entry>>;

  /// Stores `entry` under `key`, replacing any existing entry wholesale.
  fn put(&self, key: &str, entry: Entry);

  /// Invalidates the entry stored under `key`.
  ///
  /// With `full_expire`, the next `get` returns an entry for which
  /// [`Entry::is_expired`] is true. Otherwise only [`Entry::refresh_needed`]
  /// is forced and the hard TTL is left untouched, so the body stays usable
  /// while it is revalidated. A missing key is a no-op.
  fn invalidate(&self, key: &str, full_expire: bool);

  /// Removes the entry stored under `key`.
  fn remove(&self, key: &str);

  /// Removes every entry.
  fn clear(&self);
}

impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
  fn initialize(&self) {
    (**self).initialize()
  }

  fn get(&self, key: &str) -> Option<Arc<Entry>> {
    (**self).get(key)
  }

  fn put(&self, key: &str, entry: Entry) {
    (**self).put(key, entry)
  }

  fn invalidate(&self, key: &str, full_expire: bool) {
    (**self).invalidate(key, full_expire)
  }

  fn remove(&self, key: &str) {
    (**self).remove(key)
  }

  fn clear(&self) {
    (**self).clear()
  }
}
