use crate::entry::Entry;
use crate::error::FetchError;

use std::sync::Arc;

/// The outcome of a fetch: a parsed payload or a classified error.
///
/// An `intermediate` response is not the final word for its request; more
/// deliveries will follow (e.g. a stale cache hit delivered while the network
/// refresh is in flight).
#[derive(Debug)]
pub struct Response<T> {
  /// The parsed payload or the error that prevented it.
  pub result: Result<T, FetchError>,
  /// The cache entry the payload was parsed from or should be stored as.
  pub cache_entry: Option<Arc<Entry>>,
  /// True if more deliveries for the same request will follow.
  pub intermediate: bool,
}

impl<T> Response<T> {
  /// A successful, final response.
  pub fn success(value: T, cache_entry: Option<Arc<Entry>>) -> Self {
    Self {
      result: Ok(value),
      cache_entry,
      intermediate: false,
    }
  }

  /// A failed, final response.
  pub fn error(error: FetchError) -> Self {
    Self {
      result: Err(error),
      cache_entry: None,
      intermediate: false,
    }
  }

  /// Marks this response as intermediate.
  pub fn into_intermediate(mut self) -> Self {
    self.intermediate = true;
    self
  }

  #[inline]
  pub fn is_success(&self) -> bool {
    self.result.is_ok()
  }
}

impl<T> From<FetchError> for Response<T> {
  fn from(error: FetchError) -> Self {
    Response::error(error)
  }
}
