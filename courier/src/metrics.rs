use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// Lock-free counters for a cache store.
#[derive(Debug)]
pub(crate) struct Metrics {
  // --- Lookups ---
  pub(crate) hits: CachePadded<AtomicU64>,
  pub(crate) misses: CachePadded<AtomicU64>,

  // --- Writes ---
  pub(crate) puts: CachePadded<AtomicU64>,
  pub(crate) replacements: CachePadded<AtomicU64>,
  pub(crate) invalidations: CachePadded<AtomicU64>,
  pub(crate) soft_invalidations: CachePadded<AtomicU64>,
  pub(crate) removals: CachePadded<AtomicU64>,
  pub(crate) clears: CachePadded<AtomicU64>,

  // --- Size ---
  pub(crate) current_bytes: CachePadded<AtomicU64>,

  created_at: Instant,
}

impl Default for Metrics {
  fn default() -> Self {
    Self {
      hits: CachePadded::new(AtomicU64::new(0)),
      misses: CachePadded::new(AtomicU64::new(0)),
      puts: CachePadded::new(AtomicU64::new(0)),
      replacements: CachePadded::new(AtomicU64::new(0)),
      invalidations: CachePadded::new(AtomicU64::new(0)),
      soft_invalidations: CachePadded::new(AtomicU64::new(0)),
      removals: CachePadded::new(AtomicU64::new(0)),
      clears: CachePadded::new(AtomicU64::new(0)),
      current_bytes: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub(crate) fn add_bytes(&self, bytes: usize) {
    self.current_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
  }

  #[inline]
  pub(crate) fn sub_bytes(&self, bytes: usize) {
    self.current_bytes.fetch_sub(bytes as u64, Ordering::Relaxed);
  }

  pub(crate) fn snapshot(&self) -> MetricsSnapshot {
    let hits = self.hits.load(Ordering::Relaxed);
    let misses = self.misses.load(Ordering::Relaxed);
    let total_lookups = hits + misses;

    MetricsSnapshot {
      hits,
      misses,
      hit_ratio: if total_lookups == 0 {
        0.0
      } else {
        hits as f64 / total_lookups as f64
      },
      puts: self.puts.load(Ordering::Relaxed),
      replacements: self.replacements.load(Ordering::Relaxed),
      invalidations: self.invalidations.load(Ordering::Relaxed),
      soft_invalidations: self.soft_invalidations.load(Ordering::Relaxed),
      removals: self.removals.load(Ordering::Relaxed),
      clears: self.clears.load(Ordering::Relaxed),
      current_bytes: self.current_bytes.load(Ordering::Relaxed),
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time snapshot of a store's counters.
#[derive(Clone)]
pub struct MetricsSnapshot {
  /// Lookups that found an entry (fresh or not).
  pub hits: u64,
  /// Lookups that found nothing.
  pub misses: u64,
  /// hits / (hits + misses).
  pub hit_ratio: f64,
  /// Total `put` calls.
  pub puts: u64,
  /// `put` calls that replaced an existing entry.
  pub replacements: u64,
  /// Full invalidations of an existing entry.
  pub invalidations: u64,
  /// Soft invalidations of an existing entry.
  pub soft_invalidations: u64,
  /// `remove` calls that deleted an entry.
  pub removals: u64,
  /// `clear` calls.
  pub clears: u64,
  /// Approximate bytes held by stored entries.
  pub current_bytes: u64,
  pub uptime_secs: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("hit_ratio", &format!("{:.2}%", self.hit_ratio * 100.0))
      .field("puts", &self.puts)
      .field("replacements", &self.replacements)
      .field("invalidations", &self.invalidations)
      .field("soft_invalidations", &self.soft_invalidations)
      .field("removals", &self.removals)
      .field("clears", &self.clears)
      .field("current_bytes", &self.current_bytes)
      .field("uptime_secs", &self.uptime_secs)
      .finish()
  }
}
