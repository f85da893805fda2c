use crate::error::PostError;
use crate::poster::{run_task, Poster, Task};

use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// A poster that drains its queue on a single Tokio task.
///
/// Posting never blocks: the queue is unbounded. Tasks run one after another
/// in submission order on the spawned drain task, so they should be short;
/// a long-running callback stalls every delivery behind it.
///
/// The drain task ends when the poster is dropped and the queue is empty.
#[derive(Debug, Clone)]
pub struct TokioPoster {
  sender: mpsc::UnboundedSender<Task>,
}

impl TokioPoster {
  /// Creates a poster on the current Tokio runtime.
  /// Panics if called outside of a Tokio runtime.
  pub fn new() -> Self {
    Self::with_handle(&Handle::current())
  }

  /// Creates a poster whose drain task is spawned on `handle`.
  pub fn with_handle(handle: &Handle) -> Self {
    let (sender, mut receiver) = mpsc::unbounded_channel::<Task>();
    handle.spawn(async move {
      while let Some(task) = receiver.recv().await {
        run_task(task);
      }
      tracing::debug!("tokio poster queue closed; drain task exiting");
    });
    Self { sender }
  }

  pub fn is_closed(&self) -> bool {
    self.sender.is_closed()
  }
}

impl Poster for TokioPoster {
  fn post(&self, task: Task) -> Result<(), PostError> {
    self.sender.send(task).map_err(|_| PostError::Closed)
  }
}
