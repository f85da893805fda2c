use crate::error::FetchError;
use crate::marker::MarkerLog;

use core::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Why a request was finished by the delivery layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinishReason {
  /// The final response or error was delivered.
  Done,
  /// The request was canceled before its delivery task ran; no callback
  /// was invoked.
  CanceledAtDelivery,
}

impl FinishReason {
  pub fn as_str(&self) -> &'static str {
    match self {
      FinishReason::Done => "done",
      FinishReason::CanceledAtDelivery => "canceled-at-delivery",
    }
  }
}

impl fmt::Display for FinishReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The surface of a request that the delivery layer talks to.
///
/// Requests are created and owned by the caller; delivery only holds `Arc`
/// clones inside queued tasks. Every callback except `is_canceled` and
/// `add_marker` is invoked on the poster's execution context.
pub trait Request: Send + Sync {
  /// The parsed payload type handed to `deliver_response`.
  type Output: Send;

  /// Whether the request has been canceled. May be set from any thread,
  /// so implementations must back this with an atomically visible flag.
  fn is_canceled(&self) -> bool;

  /// Appends a debug marker to the request's log.
  fn add_marker(&self, label: &str);

  /// Success callback.
  fn deliver_response(&self, response: Self::Output);

  /// Error callback.
  fn deliver_error(&self, error: FetchError);

  /// Terminal transition. Called at most once per fetch by the delivery
  /// layer; calling it twice is a caller error.
  fn finish(&self, reason: FinishReason);

  /// Records that a response has been posted for this request.
  fn mark_delivered(&self) {}
}

const NOT_FINISHED: u8 = 0;
const FINISHED_DONE: u8 = 1;
const FINISHED_CANCELED: u8 = 2;

/// Bookkeeping shared by most `Request` implementations.
///
/// Cancellation, the delivered flag and the finish reason are plain atomics,
/// so a producer thread never contends with the poster for a lock.
#[derive(Debug, Default)]
pub struct RequestState {
  canceled: AtomicBool,
  delivered: AtomicBool,
  finished: AtomicU8,
  markers: MarkerLog,
}

impl RequestState {
  pub fn new() -> Self {
    Self::default()
  }

  /// Cancels the request. Visible to the poster's next check; a delivery
  /// task that already passed its check is not stopped.
  pub fn cancel(&self) {
    self.canceled.store(true, Ordering::Release);
  }

  #[inline]
  pub fn is_canceled(&self) -> bool {
    self.canceled.load(Ordering::Acquire)
  }

  pub fn mark_delivered(&self) {
    self.delivered.store(true, Ordering::Release);
  }

  pub fn has_had_response_delivered(&self) -> bool {
    self.delivered.load(Ordering::Acquire)
  }

  #[inline]
  pub fn markers(&self) -> &MarkerLog {
    &self.markers
  }

  pub fn add_marker(&self, label: &str) {
    self.markers.add(label);
  }

  /// Records the terminal transition and finishes the marker log.
  ///
  /// Returns `false` if the request was already finished; the first reason
  /// is kept.
  pub fn record_finish(&self, reason: FinishReason, header: &str) -> bool {
    let code = match reason {
      FinishReason::Done => FINISHED_DONE,
      FinishReason::CanceledAtDelivery => FINISHED_CANCELED,
    };

    if let Err(previous) =
      self
        .finished
        .compare_exchange(NOT_FINISHED, code, Ordering::AcqRel, Ordering::Acquire)
    {
      let previous = decode_reason(previous).map_or("unknown", |r| r.as_str());
      tracing::warn!(
        request = header,
        reason = reason.as_str(),
        previous,
        "request finished twice"
      );
      return false;
    }

    self.markers.add(reason.as_str());
    self.markers.finish(header);
    true
  }

  /// The reason the request was finished, if it has been.
  pub fn finish_reason(&self) -> Option<FinishReason> {
    decode_reason(self.finished.load(Ordering::Acquire))
  }

  pub fn is_finished(&self) -> bool {
    self.finish_reason().is_some()
  }
}

fn decode_reason(code: u8) -> Option<FinishReason> {
  match code {
    FINISHED_DONE => Some(FinishReason::Done),
    FINISHED_CANCELED => Some(FinishReason::CanceledAtDelivery),
    _ => None,
  }
}
