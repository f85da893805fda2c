use crate::error::BuildError;
use crate::store::MemoryStore;

use core::fmt;
use std::hash::BuildHasher;

/// A builder for [`MemoryStore`].
pub struct MemoryStoreBuilder<H = ahash::RandomState> {
  pub(crate) shards: usize,
  pub(crate) hasher: H,
}

impl<H> fmt::Debug for MemoryStoreBuilder<H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MemoryStoreBuilder")
      .field("shards", &self.shards)
      .finish_non_exhaustive()
  }
}

impl<H: BuildHasher + Default> MemoryStoreBuilder<H> {
  /// Creates a new builder with default settings.
  pub fn new() -> Self {
    Self {
      shards: (num_cpus::get() * 4).max(1).next_power_of_two(),
      hasher: H::default(),
    }
  }
}

impl Default for MemoryStoreBuilder<ahash::RandomState> {
  fn default() -> Self {
    Self::new()
  }
}

impl<H> MemoryStoreBuilder<H> {
  /// Sets the number of independently locked shards.
  ///
  /// Non-zero values are rounded up to the next power of two. Zero is
  /// rejected by `build`.
  pub fn shards(mut self, shards: usize) -> Self {
    self.shards = if shards == 0 {
      0
    } else {
      shards.next_power_of_two()
    };
    self
  }

  /// Sets the hasher used to pick a key's shard and to hash keys within it.
  pub fn hasher<H2>(self, hasher: H2) -> MemoryStoreBuilder<H2> {
    MemoryStoreBuilder {
      shards: self.shards,
      hasher,
    }
  }

  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    if self.shards == 0 {
      return Err(BuildError::ZeroShards);
    }
    Ok(())
  }
}

impl<H: BuildHasher + Clone> MemoryStoreBuilder<H> {
  /// Builds the store.
  pub fn build(self) -> Result<MemoryStore<H>, BuildError> {
    self.validate()?;
    Ok(MemoryStore::new(self.shards, self.hasher))
  }
}
