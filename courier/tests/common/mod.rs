#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fibre_courier::{FetchError, FinishReason, PostError, Poster, Request, RequestState, Task};
use parking_lot::Mutex;

pub const SHORT_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything the delivery layer did to a request, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  Response(String),
  Error(FetchError),
  Finish(FinishReason),
}

/// A request that records every callback it receives.
#[derive(Debug, Default)]
pub struct RecordingRequest {
  pub state: RequestState,
  events: Mutex<Vec<Event>>,
}

impl RecordingRequest {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn cancel(&self) {
    self.state.cancel();
  }

  pub fn events(&self) -> Vec<Event> {
    self.events.lock().clone()
  }

  pub fn responses(&self) -> Vec<String> {
    self
      .events()
      .into_iter()
      .filter_map(|e| match e {
        Event::Response(body) => Some(body),
        _ => None,
      })
      .collect()
  }

  pub fn finishes(&self) -> Vec<FinishReason> {
    self
      .events()
      .into_iter()
      .filter_map(|e| match e {
        Event::Finish(reason) => Some(reason),
        _ => None,
      })
      .collect()
  }

  pub fn markers(&self) -> Vec<String> {
    self.state.markers().labels()
  }
}

impl Request for RecordingRequest {
  type Output = String;

  fn is_canceled(&self) -> bool {
    self.state.is_canceled()
  }

  fn add_marker(&self, label: &str) {
    self.state.add_marker(label);
  }

  fn deliver_response(&self, response: String) {
    self.events.lock().push(Event::Response(response));
  }

  fn deliver_error(&self, error: FetchError) {
    self.events.lock().push(Event::Error(error));
  }

  fn finish(&self, reason: FinishReason) {
    self.events.lock().push(Event::Finish(reason));
    self.state.record_finish(reason, "test-request");
  }

  fn mark_delivered(&self) {
    self.state.mark_delivered();
  }
}

/// A poster that queues tasks until the test runs them explicitly.
#[derive(Default)]
pub struct ManualPoster {
  queue: Mutex<VecDeque<Task>>,
  closed: AtomicBool,
}

impl ManualPoster {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn pending(&self) -> usize {
    self.queue.lock().len()
  }

  /// Runs the oldest queued task. Returns false if the queue was empty.
  pub fn run_one(&self) -> bool {
    let task = self.queue.lock().pop_front();
    match task {
      Some(task) => {
        task();
        true
      }
      None => false,
    }
  }

  /// Runs queued tasks until the queue is empty, including tasks queued by
  /// the tasks themselves.
  pub fn run_all(&self) -> usize {
    let mut ran = 0;
    while self.run_one() {
      ran += 1;
    }
    ran
  }

  pub fn close(&self) {
    self.closed.store(true, Ordering::Release);
  }
}

impl Poster for ManualPoster {
  fn post(&self, task: Task) -> Result<(), PostError> {
    if self.closed.load(Ordering::Acquire) {
      return Err(PostError::Closed);
    }
    self.queue.lock().push_back(task);
    Ok(())
  }
}

/// Blocks until every task posted before this call has run.
pub fn flush(poster: &dyn Poster) {
  let (tx, rx) = fibre::mpsc::unbounded();
  poster
    .post(Box::new(move || {
      let _ = tx.send(());
    }))
    .expect("poster should accept the flush task");
  rx.recv_timeout(SHORT_TIMEOUT)
    .expect("poster did not drain in time");
}
