use core::fmt;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Marker appended by `post_response` before the delivery task is queued.
pub const POST_RESPONSE: &str = "post-response";
/// Marker appended by `post_error` before the delivery task is queued.
pub const POST_ERROR: &str = "post-error";
/// Marker appended on the poster's context after an intermediate delivery.
pub const INTERMEDIATE_RESPONSE: &str = "intermediate-response";

/// One recorded pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
  pub label: String,
  /// Name (or id, for unnamed threads) of the thread that added the marker.
  pub thread: String,
  /// Time since the owning log was created.
  pub elapsed: Duration,
}

/// An append-only, thread-safe trace of the stages a request went through.
///
/// Markers are never removed and are kept in the order they were added.
pub struct MarkerLog {
  created_at: Instant,
  markers: Mutex<Vec<Marker>>,
  finished: AtomicBool,
}

impl Default for MarkerLog {
  fn default() -> Self {
    Self {
      created_at: Instant::now(),
      markers: Mutex::new(Vec::new()),
      finished: AtomicBool::new(false),
    }
  }
}

impl fmt::Debug for MarkerLog {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MarkerLog")
      .field("markers", &self.markers.lock().len())
      .field("finished", &self.finished.load(Ordering::Relaxed))
      .finish()
  }
}

impl MarkerLog {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a marker stamped with the current thread and elapsed time.
  pub fn add(&self, label: &str) {
    if self.finished.load(Ordering::Acquire) {
      tracing::warn!(label, "marker added after the log was finished");
    }

    let marker = Marker {
      label: label.to_owned(),
      thread: current_thread_label(),
      elapsed: self.created_at.elapsed(),
    };
    self.markers.lock().push(marker);
  }

  /// Returns a snapshot of all markers in insertion order.
  pub fn markers(&self) -> Vec<Marker> {
    self.markers.lock().clone()
  }

  /// Returns just the labels, in insertion order.
  pub fn labels(&self) -> Vec<String> {
    self.markers.lock().iter().map(|m| m.label.clone()).collect()
  }

  pub fn len(&self) -> usize {
    self.markers.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.markers.lock().is_empty()
  }

  pub fn is_finished(&self) -> bool {
    self.finished.load(Ordering::Acquire)
  }

  /// Marks the log finished and emits the per-stage timings as one debug
  /// event. Only the first call logs.
  pub fn finish(&self, header: &str) {
    if self.finished.swap(true, Ordering::AcqRel) {
      return;
    }
    if !tracing::enabled!(tracing::Level::DEBUG) {
      return;
    }

    let markers = self.markers.lock();
    let total = markers
      .last()
      .map_or(Duration::ZERO, |m| m.elapsed);

    let mut stages = String::new();
    let mut previous = Duration::ZERO;
    for marker in markers.iter() {
      let delta = marker.elapsed.saturating_sub(previous);
      previous = marker.elapsed;
      let _ = write!(
        stages,
        "\n  (+{:>4} ms) [{}] {}",
        delta.as_millis(),
        marker.thread,
        marker.label
      );
    }

    tracing::debug!(
      total_ms = total.as_millis() as u64,
      "{}{}",
      header,
      stages
    );
  }
}

fn current_thread_label() -> String {
  let current = thread::current();
  match current.name() {
    Some(name) => name.to_owned(),
    None => format!("{:?}", current.id()),
  }
}
