use crate::error::PostError;
use crate::poster::{run_task, Poster, Task};

/// Runs each task immediately on the thread that posts it.
///
/// Suited to single-threaded hosts and tests. With several posting threads
/// there is no single execution context and no cross-thread ordering.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlinePoster;

impl Poster for InlinePoster {
  fn post(&self, task: Task) -> Result<(), PostError> {
    run_task(task);
    Ok(())
  }
}
