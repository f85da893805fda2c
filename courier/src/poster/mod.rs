//! Posters: FIFO, single-context executors for delivery tasks.

mod inline;
mod threaded;
#[cfg(feature = "tokio")]
mod tokio_rt;

pub use inline::InlinePoster;
pub use threaded::{ThreadPoster, ThreadPosterBuilder};
#[cfg(feature = "tokio")]
pub use tokio_rt::TokioPoster;

use crate::error::PostError;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A unit of work submitted to a [`Poster`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs submitted tasks one at a time on a single logical execution context.
///
/// Tasks submitted to the same poster run in submission order. There is no
/// ordering across posters, no priority and no way to withdraw a task once
/// it was accepted.
pub trait Poster: Send + Sync {
  /// Queues `task`. Returns [`PostError::Closed`] if the poster no longer
  /// accepts work, in which case the task is dropped without running.
  fn post(&self, task: Task) -> Result<(), PostError>;
}

impl<P: Poster + ?Sized> Poster for Arc<P> {
  fn post(&self, task: Task) -> Result<(), PostError> {
    (**self).post(task)
  }
}

/// Runs a task, containing any panic so the consumer context survives a
/// misbehaving callback.
pub(crate) fn run_task(task: Task) {
  if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
    tracing::error!(panic = panic_message(&*payload), "delivery task panicked");
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
  if let Some(message) = payload.downcast_ref::<&'static str>() {
    message
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.as_str()
  } else {
    "<non-string panic payload>"
  }
}
