//! The cache-coherency and response-delivery core of a client-side HTTP
//! request framework.
//!
//! # Features
//! - **Freshness model**: [`Entry`] carries absolute hard (`ttl`) and soft
//!   (`soft_ttl`) expiries, evaluated against the wall clock on every call,
//!   for stale-while-revalidate serving.
//! - **Pluggable stores**: the [`CacheStore`] contract with a sharded,
//!   concurrent [`MemoryStore`] and a null [`NoCache`] backend.
//! - **Exactly-once delivery**: [`ResponseDelivery`] hands concurrently
//!   produced responses to their requests through a FIFO [`Poster`], with a
//!   documented best-effort cancellation check at delivery time.
//! - **Persistence**: Optional `serde` feature for snapshotting a memory store.

// Public modules that form the API
pub mod builder;
pub mod delivery;
pub mod entry;
pub mod error;
pub mod header;
pub mod marker;
pub mod metrics;
pub mod poster;
pub mod request;
pub mod response;
pub mod store;
pub mod time;

#[cfg(feature = "serde")]
pub mod snapshot;

// Re-export the primary user-facing types for convenience
pub use builder::MemoryStoreBuilder;
pub use delivery::ResponseDelivery;
pub use entry::{Entry, EntryBuilder};
pub use error::{BuildError, FetchError, PostError};
pub use header::{Header, ResponseHeaders};
pub use marker::{Marker, MarkerLog};
pub use metrics::MetricsSnapshot;
pub use poster::{InlinePoster, Poster, Task, ThreadPoster, ThreadPosterBuilder};
#[cfg(feature = "tokio")]
pub use poster::TokioPoster;
pub use request::{FinishReason, Request, RequestState};
pub use response::Response;
pub use store::{CacheStore, MemoryStore, NoCache};

#[cfg(feature = "serde")]
pub use snapshot::StoreSnapshot;
