use crate::header::{Header, ResponseHeaders};
use crate::time;

use std::borrow::Cow;
use std::time::Duration;

use bytes::Bytes;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A cached artifact together with the metadata needed for cache coherency.
///
/// An `Entry` is an immutable value. Stores hand out `Arc<Entry>` clones and
/// never modify a stored entry in place; invalidation swaps in a new entry
/// with adjusted lifetimes instead.
///
/// All timestamps are absolute epoch milliseconds. `ttl` and `soft_ttl` are
/// not validated against each other; a `soft_ttl` past the `ttl` is accepted
/// as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Entry {
  data: Bytes,
  validator: Option<String>,
  server_date: i64,
  last_modified: i64,
  ttl: i64,
  soft_ttl: i64,
  response_headers: ResponseHeaders,
  all_response_headers: Option<Vec<Header>>,
}

impl Entry {
  /// Starts building an entry around `data`.
  pub fn builder(data: impl Into<Bytes>) -> EntryBuilder {
    EntryBuilder::new(data)
  }

  /// The cached payload.
  #[inline]
  pub fn data(&self) -> &Bytes {
    &self.data
  }

  /// The origin-issued validator (an ETag or equivalent), if any.
  #[inline]
  pub fn validator(&self) -> Option<&str> {
    self.validator.as_deref()
  }

  /// Response date as reported by the origin. Informational only.
  #[inline]
  pub fn server_date(&self) -> i64 {
    self.server_date
  }

  /// Last-modified date of the resource as reported by the origin.
  #[inline]
  pub fn last_modified(&self) -> i64 {
    self.last_modified
  }

  /// Hard expiry. Past this instant the entry must not be served.
  #[inline]
  pub fn ttl(&self) -> i64 {
    self.ttl
  }

  /// Soft expiry. Past this instant the entry may be served but should be
  /// revalidated against the origin.
  #[inline]
  pub fn soft_ttl(&self) -> i64 {
    self.soft_ttl
  }

  #[inline]
  pub fn response_headers(&self) -> &ResponseHeaders {
    &self.response_headers
  }

  /// The raw header list with duplicates and original casing, if the
  /// producer recorded one.
  #[inline]
  pub fn all_response_headers(&self) -> Option<&[Header]> {
    self.all_response_headers.as_deref()
  }

  /// Returns the most complete header list available: the raw list when
  /// present, otherwise one rebuilt from the case-insensitive map.
  pub fn all_headers(&self) -> Cow<'_, [Header]> {
    match &self.all_response_headers {
      Some(all) => Cow::Borrowed(all.as_slice()),
      None => Cow::Owned(self.response_headers.to_headers()),
    }
  }

  /// True if the entry is expired and must not be used.
  ///
  /// Evaluated against the wall clock on every call.
  #[inline]
  pub fn is_expired(&self) -> bool {
    self.is_expired_at(time::now_millis())
  }

  /// True if a refresh from the origin is needed.
  ///
  /// Evaluated against the wall clock on every call.
  #[inline]
  pub fn refresh_needed(&self) -> bool {
    self.refresh_needed_at(time::now_millis())
  }

  #[inline]
  pub fn is_expired_at(&self, now_millis: i64) -> bool {
    self.ttl < now_millis
  }

  #[inline]
  pub fn refresh_needed_at(&self, now_millis: i64) -> bool {
    self.soft_ttl < now_millis
  }

  /// Approximate memory footprint: payload plus header bytes.
  pub fn size_bytes(&self) -> usize {
    let raw_headers: usize = self
      .all_response_headers
      .iter()
      .flatten()
      .map(|h| h.name().len() + h.value().len())
      .sum();
    self.data.len() + self.response_headers.byte_len() + raw_headers
  }

  /// Consumes the entry and returns its payload.
  pub fn into_data(self) -> Bytes {
    self.data
  }

  /// A copy whose soft TTL has elapsed; the hard TTL is untouched.
  pub(crate) fn soft_expired(&self) -> Self {
    Self {
      soft_ttl: 0,
      ..self.clone()
    }
  }

  /// A copy that is both expired and in need of refresh.
  pub(crate) fn fully_expired(&self) -> Self {
    Self {
      ttl: 0,
      soft_ttl: 0,
      ..self.clone()
    }
  }
}

/// Fluent constructor for [`Entry`].
///
/// Lifetimes default to `0`, i.e. an entry built without `ttl`/`soft_ttl` is
/// already expired.
#[derive(Debug, Clone)]
pub struct EntryBuilder {
  data: Bytes,
  validator: Option<String>,
  server_date: i64,
  last_modified: i64,
  ttl: i64,
  soft_ttl: i64,
  response_headers: ResponseHeaders,
  all_response_headers: Option<Vec<Header>>,
}

impl EntryBuilder {
  pub fn new(data: impl Into<Bytes>) -> Self {
    Self {
      data: data.into(),
      validator: None,
      server_date: 0,
      last_modified: 0,
      ttl: 0,
      soft_ttl: 0,
      response_headers: ResponseHeaders::new(),
      all_response_headers: None,
    }
  }

  pub fn validator(mut self, validator: impl Into<String>) -> Self {
    self.validator = Some(validator.into());
    self
  }

  pub fn server_date(mut self, millis: i64) -> Self {
    self.server_date = millis;
    self
  }

  pub fn last_modified(mut self, millis: i64) -> Self {
    self.last_modified = millis;
    self
  }

  /// Sets the absolute hard expiry in epoch millis.
  pub fn ttl(mut self, millis: i64) -> Self {
    self.ttl = millis;
    self
  }

  /// Sets the absolute soft expiry in epoch millis.
  pub fn soft_ttl(mut self, millis: i64) -> Self {
    self.soft_ttl = millis;
    self
  }

  /// Sets the hard expiry to `duration` from now.
  pub fn expires_in(self, duration: Duration) -> Self {
    let ttl = time::now_millis().saturating_add(duration.as_millis() as i64);
    self.ttl(ttl)
  }

  /// Sets the soft expiry to `duration` from now.
  pub fn refresh_in(self, duration: Duration) -> Self {
    let soft_ttl = time::now_millis().saturating_add(duration.as_millis() as i64);
    self.soft_ttl(soft_ttl)
  }

  /// Adds a single header to the case-insensitive map.
  pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.response_headers.insert(name, value);
    self
  }

  pub fn response_headers(mut self, headers: ResponseHeaders) -> Self {
    self.response_headers = headers;
    self
  }

  /// Records the raw header list. If no map was supplied, `build` derives
  /// it from this list.
  pub fn all_response_headers(mut self, headers: Vec<Header>) -> Self {
    self.all_response_headers = Some(headers);
    self
  }

  pub fn build(self) -> Entry {
    let response_headers = match &self.all_response_headers {
      Some(all) if self.response_headers.is_empty() => ResponseHeaders::from(all.as_slice()),
      _ => self.response_headers,
    };

    Entry {
      data: self.data,
      validator: self.validator,
      server_date: self.server_date,
      last_modified: self.last_modified,
      ttl: self.ttl,
      soft_ttl: self.soft_ttl,
      response_headers,
      all_response_headers: self.all_response_headers,
    }
  }
}
