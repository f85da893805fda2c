use core::fmt;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single raw response header, exactly as received from the origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Header {
  name: String,
  value: String,
}

impl Header {
  pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      value: value.into(),
    }
  }

  #[inline]
  pub fn name(&self) -> &str {
    &self.name
  }

  #[inline]
  pub fn value(&self) -> &str {
    &self.value
  }
}

impl fmt::Display for Header {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.name, self.value)
  }
}

/// A case-insensitive header map holding at most one value per name.
///
/// Lookups ignore ASCII case. The name is stored with the casing of the most
/// recent insert. When the origin sent the same header more than once, only
/// the last value survives here; [`Entry::all_response_headers`] keeps the
/// full list when the producer recorded it.
///
/// [`Entry::all_response_headers`]: crate::Entry::all_response_headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Vec<Header>", into = "Vec<Header>"))]
pub struct ResponseHeaders {
  // Keyed by the lowercased name.
  map: BTreeMap<String, Header>,
}

impl ResponseHeaders {
  /// Creates an empty header map.
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts a header, returning the previous value stored under the same
  /// case-insensitive name.
  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
    let header = Header::new(name, value);
    self
      .map
      .insert(header.name.to_ascii_lowercase(), header)
      .map(|previous| previous.value)
  }

  /// Returns the value for `name`, ignoring case.
  pub fn get(&self, name: &str) -> Option<&str> {
    self.map.get(&name.to_ascii_lowercase()).map(Header::value)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.map.contains_key(&name.to_ascii_lowercase())
  }

  /// Removes the header stored under `name`, ignoring case.
  pub fn remove(&mut self, name: &str) -> Option<String> {
    self
      .map
      .remove(&name.to_ascii_lowercase())
      .map(|header| header.value)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.map.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }

  /// Iterates over `(name, value)` pairs, ordered by lowercased name.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.map.values().map(|h| (h.name(), h.value()))
  }

  /// Flattens the map into a list of raw headers.
  pub fn to_headers(&self) -> Vec<Header> {
    self.map.values().cloned().collect()
  }

  pub(crate) fn byte_len(&self) -> usize {
    self
      .map
      .values()
      .map(|h| h.name.len() + h.value.len())
      .sum()
  }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for ResponseHeaders {
  fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
    let mut headers = Self::new();
    headers.extend(iter);
    headers
  }
}

impl<N: Into<String>, V: Into<String>> Extend<(N, V)> for ResponseHeaders {
  fn extend<I: IntoIterator<Item = (N, V)>>(&mut self, iter: I) {
    for (name, value) in iter {
      self.insert(name, value);
    }
  }
}

impl From<&[Header]> for ResponseHeaders {
  /// Collapses a raw header list; for duplicate names the last one wins.
  fn from(headers: &[Header]) -> Self {
    headers
      .iter()
      .map(|h| (h.name.clone(), h.value.clone()))
      .collect()
  }
}

impl From<Vec<Header>> for ResponseHeaders {
  fn from(headers: Vec<Header>) -> Self {
    headers.into_iter().map(|h| (h.name, h.value)).collect()
  }
}

impl From<ResponseHeaders> for Vec<Header> {
  fn from(headers: ResponseHeaders) -> Self {
    headers.map.into_values().collect()
  }
}
