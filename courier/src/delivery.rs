use crate::error::{FetchError, PostError};
use crate::marker::{INTERMEDIATE_RESPONSE, POST_ERROR, POST_RESPONSE};
use crate::poster::{Poster, Task};
use crate::request::{FinishReason, Request};
use crate::response::Response;

use core::fmt;
use std::sync::Arc;

type OnDelivered = Box<dyn FnOnce() + Send + 'static>;

/// Hands responses produced on worker threads to their requests on a single
/// consumer context.
///
/// Each `post_*` call appends a marker to the request on the calling thread
/// and submits exactly one task to the injected [`Poster`]. When the poster
/// runs the task it:
///
/// 1. checks [`Request::is_canceled`] at that moment (not at post time);
/// 2. if canceled, finishes the request with
///    [`FinishReason::CanceledAtDelivery`] and invokes no callback;
/// 3. otherwise calls exactly one of `deliver_response` / `deliver_error`;
/// 4. for an intermediate response, appends `"intermediate-response"` and
///    leaves the request open;
/// 5. otherwise finishes the request with [`FinishReason::Done`];
/// 6. finally runs the `on_delivered` callback, if one was given.
///
/// # Cancellation is best-effort
///
/// A request canceled from another thread may still receive its callback:
/// once a task has passed step 1, a cancel that lands afterwards does not
/// stop steps 3 to 5. Callers that need a hard guarantee must cancel on the
/// poster's own execution context (for example from inside a posted task),
/// or guard their own listener.
///
/// # Ordering
///
/// Tasks run in the order they reached the poster. Two producers racing to
/// post for the same request are not reordered; the caller must post the
/// intermediate response before the final one.
#[derive(Clone)]
pub struct ResponseDelivery {
  poster: Arc<dyn Poster>,
}

impl fmt::Debug for ResponseDelivery {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ResponseDelivery").finish_non_exhaustive()
  }
}

impl ResponseDelivery {
  pub fn new(poster: Arc<dyn Poster>) -> Self {
    Self { poster }
  }

  /// Convenience for wrapping an owned poster.
  pub fn with_poster<P: Poster + 'static>(poster: P) -> Self {
    Self::new(Arc::new(poster))
  }

  /// Posts a parsed response (success or error) for delivery.
  pub fn post_response<R>(&self, request: Arc<R>, response: Response<R::Output>) -> Result<(), PostError>
  where
    R: Request + 'static,
  {
    self.post_response_inner(request, response, None)
  }

  /// Posts a response and runs `on_delivered` on the poster's context after
  /// the request's callback and finish bookkeeping. Not run if the request
  /// turns out to be canceled.
  pub fn post_response_then<R, F>(
    &self,
    request: Arc<R>,
    response: Response<R::Output>,
    on_delivered: F,
  ) -> Result<(), PostError>
  where
    R: Request + 'static,
    F: FnOnce() + Send + 'static,
  {
    self.post_response_inner(request, response, Some(Box::new(on_delivered)))
  }

  /// Posts a final error for delivery.
  pub fn post_error<R>(&self, request: Arc<R>, error: FetchError) -> Result<(), PostError>
  where
    R: Request + 'static,
  {
    request.add_marker(POST_ERROR);
    tracing::trace!(error = %error, "posting error");
    self.submit(DeliveryTask {
      request,
      response: Response::error(error),
      on_delivered: None,
    })
  }

  fn post_response_inner<R>(
    &self,
    request: Arc<R>,
    response: Response<R::Output>,
    on_delivered: Option<OnDelivered>,
  ) -> Result<(), PostError>
  where
    R: Request + 'static,
  {
    request.mark_delivered();
    request.add_marker(POST_RESPONSE);
    tracing::trace!(
      success = response.is_success(),
      intermediate = response.intermediate,
      "posting response"
    );
    self.submit(DeliveryTask {
      request,
      response,
      on_delivered,
    })
  }

  fn submit<R>(&self, task: DeliveryTask<R>) -> Result<(), PostError>
  where
    R: Request + 'static,
  {
    let job: Task = Box::new(move || {
      task.run();
    });
    self.poster.post(job).map_err(|err| {
      tracing::warn!("delivery task rejected; poster is closed");
      err
    })
  }
}

/// Where a delivery left its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivered {
  CanceledAtDelivery,
  OpenForMore,
  Finished,
}

struct DeliveryTask<R: Request> {
  request: Arc<R>,
  response: Response<R::Output>,
  on_delivered: Option<OnDelivered>,
}

impl<R: Request> DeliveryTask<R> {
  fn run(self) -> Delivered {
    let DeliveryTask {
      request,
      response,
      on_delivered,
    } = self;

    if request.is_canceled() {
      request.finish(FinishReason::CanceledAtDelivery);
      tracing::debug!("request canceled before delivery; callback suppressed");
      return Delivered::CanceledAtDelivery;
    }

    match response.result {
      Ok(value) => request.deliver_response(value),
      Err(error) => request.deliver_error(error),
    }

    let state = if response.intermediate {
      request.add_marker(INTERMEDIATE_RESPONSE);
      Delivered::OpenForMore
    } else {
      request.finish(FinishReason::Done);
      Delivered::Finished
    };

    if let Some(callback) = on_delivered {
      callback();
    }

    tracing::trace!(state = ?state, "delivery complete");
    state
  }
}
