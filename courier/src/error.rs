use std::io;

use thiserror::Error;

/// Errors that can occur when building a store or a poster.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The store was configured with zero shards.
  #[error("shard count cannot be zero")]
  ZeroShards,
  /// The poster's consumer thread could not be started.
  #[error("failed to spawn poster thread: {0}")]
  Spawn(#[from] io::Error),
}

/// Returned when a task is submitted to a poster that has shut down.
///
/// The task was not queued and will never run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PostError {
  #[error("poster is closed")]
  Closed,
}

/// A classified fetch failure carried by an error-flavored [`Response`].
///
/// The delivery layer treats it as opaque and hands it to the request's
/// error callback unchanged.
///
/// [`Response`]: crate::Response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  #[error("request timed out")]
  Timeout,

  #[error("no connection could be established")]
  NoConnection,

  #[error("network error: {message}")]
  Network { message: String },

  #[error("server responded with status {status}")]
  Server { status: u16 },

  #[error("authentication failed with status {status}")]
  AuthFailure { status: u16 },

  #[error("failed to parse response: {message}")]
  Parse { message: String },

  #[error("{message}")]
  Other { message: String },
}

impl FetchError {
  pub fn network(message: impl Into<String>) -> Self {
    FetchError::Network {
      message: message.into(),
    }
  }

  pub fn parse(message: impl Into<String>) -> Self {
    FetchError::Parse {
      message: message.into(),
    }
  }

  pub fn other(message: impl Into<String>) -> Self {
    FetchError::Other {
      message: message.into(),
    }
  }
}
