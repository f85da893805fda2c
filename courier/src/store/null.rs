use crate::entry::Entry;
use crate::store::CacheStore;

use std::sync::Arc;

/// A store that never holds anything. Every lookup is a miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl CacheStore for NoCache {
  fn initialize(&self) {}

  fn get(&self, _key: &str) -> Option<Arc<Entry>> {
    None
  }

  fn put(&self, _key: &str, _entry: Entry) {}

  fn invalidate(&self, _key: &str, _full_expire: bool) {}

  fn remove(&self, _key: &str) {}

  fn clear(&self) {}
}
