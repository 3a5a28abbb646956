//! Fixed-window rate limiting types and the shared key scheme.
//!
//! The counter itself lives in the storage layer (see
//! [`crate::store::PlatformStore::consume_rate_limit`]) so the
//! read-increment-compare is atomic under concurrent callers. This module
//! owns the key scheme and the decision type.

use serde::Serialize;
use uuid::Uuid;

/// Outcome of one rate-limit consumption attempt.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RateDecision {
  pub allowed:             bool,
  /// Seconds until the current window expires. Positive when denied, 0
  /// when allowed.
  pub retry_after_seconds: i64,
}

/// Build the canonical rate-limit key for a privileged operation.
///
/// Every endpoint uses the same `operation:actor` scheme so a burst on one
/// operation cannot consume another's budget, and two actors never share a
/// window.
pub fn rate_limit_key(operation: &str, actor_id: Uuid) -> String {
  format!("{operation}:{actor_id}")
}
