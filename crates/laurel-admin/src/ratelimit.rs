//! Rate-limit enforcement for privileged operations.

use chrono::{DateTime, Utc};
use laurel_core::{ratelimit::rate_limit_key, store::PlatformStore};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Consume one request from the caller's window for `operation`, or reject
/// with `RATE_LIMITED` and a retry hint. Runs after the authorization
/// guard, so the key is always scoped to a verified actor.
pub async fn enforce<S>(
  state: &AppState<S>,
  operation: &str,
  actor_id: Uuid,
  now: DateTime<Utc>,
) -> Result<(), ApiError>
where
  S: PlatformStore,
{
  let key = rate_limit_key(operation, actor_id);
  let decision = state
    .store
    .consume_rate_limit(
      &key,
      state.config.rate_limit_max_requests,
      state.config.rate_limit_window_seconds,
      now,
    )
    .await
    .map_err(ApiError::store)?;

  if decision.allowed {
    Ok(())
  } else {
    tracing::warn!(%key, retry_after = decision.retry_after_seconds, "rate limited");
    Err(ApiError::RateLimited {
      retry_after: decision.retry_after_seconds,
    })
  }
}
