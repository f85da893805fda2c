use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
///
/// Entry lifetimes are absolute epoch millis as computed from origin headers,
/// so this reads `SystemTime`, not a monotonic `Instant`. A clock set before
/// 1970 reads as 0.
#[inline]
pub fn now_millis() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map_or(0, |d| d.as_millis() as i64)
}
