use crate::error::{BuildError, PostError};
use crate::poster::{run_task, Poster, Task};

use core::fmt;
use std::thread::{self, JoinHandle, ThreadId};

use fibre::mpsc;
use parking_lot::Mutex;

const DEFAULT_THREAD_NAME: &str = "fibre-courier-poster";

/// A poster backed by one dedicated OS thread draining an unbounded MPSC queue.
///
/// Any number of producer threads may post; the consumer thread runs tasks
/// strictly in the order they entered the queue. Posting never waits on the
/// consumer, so tasks running on the poster thread may post follow-up work.
///
/// A task that panics is logged and the consumer moves on to the next one.
///
/// Dropping the poster disconnects the queue; the consumer thread still runs
/// every task already queued and then exits. Use [`shutdown`](Self::shutdown)
/// to also wait for that.
pub struct ThreadPoster {
  // Producers clone the sender out under this lock; the consumer never
  // touches it.
  sender: Mutex<Option<mpsc::UnboundedSender<Task>>>,
  handle: Mutex<Option<JoinHandle<()>>>,
  thread_id: ThreadId,
}

impl fmt::Debug for ThreadPoster {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ThreadPoster")
      .field("thread_id", &self.thread_id)
      .field("closed", &self.sender.lock().is_none())
      .finish()
  }
}

impl ThreadPoster {
  /// Spawns a poster with default settings.
  pub fn spawn() -> Result<Self, BuildError> {
    ThreadPosterBuilder::new().build()
  }

  pub fn builder() -> ThreadPosterBuilder {
    ThreadPosterBuilder::new()
  }

  /// True if the caller is running on this poster's consumer thread.
  ///
  /// Cancelling from inside a task (where this is true) is the only way to
  /// guarantee a later queued delivery for the same request is suppressed.
  pub fn is_current(&self) -> bool {
    thread::current().id() == self.thread_id
  }

  pub fn is_closed(&self) -> bool {
    self.sender.lock().is_none()
  }

  /// Stops accepting tasks, lets the consumer run everything already queued,
  /// and waits for it to exit.
  ///
  /// Called from the consumer thread itself, this only stops accepting tasks;
  /// joining there would deadlock.
  pub fn shutdown(&self) {
    drop(self.sender.lock().take());

    if self.is_current() {
      return;
    }
    if let Some(handle) = self.handle.lock().take() {
      if handle.join().is_err() {
        tracing::error!("poster thread exited abnormally");
      }
    }
  }
}

impl Poster for ThreadPoster {
  fn post(&self, task: Task) -> Result<(), PostError> {
    let sender = match self.sender.lock().as_ref() {
      Some(sender) => sender.clone(),
      None => return Err(PostError::Closed),
    };

    // Unbounded: `send` only fails once the consumer is gone.
    sender.send(task).map_err(|_| PostError::Closed)
  }
}

/// A builder for [`ThreadPoster`].
#[derive(Debug, Clone)]
pub struct ThreadPosterBuilder {
  name: String,
}

impl Default for ThreadPosterBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl ThreadPosterBuilder {
  pub fn new() -> Self {
    Self {
      name: DEFAULT_THREAD_NAME.to_string(),
    }
  }

  /// Sets the consumer thread's name. Defaults to `fibre-courier-poster`.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  /// Spawns the consumer thread.
  pub fn build(self) -> Result<ThreadPoster, BuildError> {
    let (tx, rx): (mpsc::UnboundedSender<Task>, mpsc::UnboundedReceiver<Task>) = mpsc::unbounded();

    let name = self.name.clone();
    let handle = thread::Builder::new().name(self.name).spawn(move || {
      // Ends once every sender is gone and the queue is drained.
      while let Ok(task) = rx.recv() {
        run_task(task);
      }
      tracing::debug!(poster = %name, "poster queue disconnected; consumer exiting");
    })?;

    Ok(ThreadPoster {
      sender: Mutex::new(Some(tx)),
      thread_id: handle.thread().id(),
      handle: Mutex::new(Some(handle)),
    })
  }
}
