//! `POST /admin/event-action` — privileged event mutations: close,
//! delete (with backup), and result finalization.

use axum::{extract::State, http::HeaderMap, response::Response};
use chrono::{DateTime, Utc};
use laurel_core::{
  audit::NewAuditLogEntry,
  event::Event,
  ranking::{ensure_finalizable, rank},
  store::PlatformStore,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{AdminContext, extract_access_token, require_admin},
  error::{ApiError, respond},
  handlers::parse_body,
  ratelimit,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventActionRequest {
  pub access_token: Option<String>,
  pub action:       Option<String>,
  pub event_id:     Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventActionResponse {
  pub ok:           bool,
  pub action:       String,
  pub event_id:     Uuid,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub backup:       Option<serde_json::Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub finalized_at: Option<DateTime<Utc>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ranked_count: Option<usize>,
  #[serde(rename = "request_id")]
  pub request_id:   Uuid,
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  body: String,
) -> Response
where
  S: PlatformStore,
{
  let request_id = Uuid::new_v4();
  let req: EventActionRequest = parse_body(&body);
  respond(run(&state, &headers, req, request_id).await, request_id)
}

async fn run<S>(
  state: &AppState<S>,
  headers: &HeaderMap,
  req: EventActionRequest,
  request_id: Uuid,
) -> Result<EventActionResponse, ApiError>
where
  S: PlatformStore,
{
  let now = Utc::now();
  let token = extract_access_token(headers, req.access_token);
  let ctx = require_admin(state.store.as_ref(), token, now).await?;
  ratelimit::enforce(state, "event-action", ctx.identity_id, now).await?;

  let event_id = req
    .event_id
    .as_deref()
    .ok_or_else(|| ApiError::BadRequest("eventId is required".to_string()))?;
  let event_id = Uuid::parse_str(event_id)
    .map_err(|_| ApiError::BadRequest("eventId is not a valid id".to_string()))?;

  let event = state
    .store
    .get_event(event_id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::EventNotFound(event_id))?;

  match req.action.as_deref() {
    Some("close_event") => close_event(state, &ctx, event, request_id, now).await,
    Some("delete_event") => delete_event(state, &ctx, event, request_id).await,
    Some("finalize_results") => {
      finalize_results(state, &ctx, event, request_id, now).await
    }
    Some(other) => {
      Err(ApiError::BadRequest(format!("unsupported action: {other:?}")))
    }
    None => Err(ApiError::BadRequest("action is required".to_string())),
  }
}

// ─── close_event ─────────────────────────────────────────────────────────────

async fn close_event<S>(
  state: &AppState<S>,
  ctx: &AdminContext,
  event: Event,
  request_id: Uuid,
  now: DateTime<Utc>,
) -> Result<EventActionResponse, ApiError>
where
  S: PlatformStore,
{
  let closed = state
    .store
    .close_event(event.event_id, now.date_naive())
    .await
    .map_err(ApiError::store)?;
  if !closed {
    // Deleted out from under us between the lookup and the update.
    return Err(ApiError::EventNotFound(event.event_id));
  }
  tracing::info!(%request_id, event_id = %event.event_id, "event closed");

  record_audit(
    state,
    ctx,
    "close_event",
    event.event_id,
    json!({
      "title": event.title,
      "before_status": event.status,
      "after_status": "closed",
    }),
  )
  .await?;

  Ok(EventActionResponse {
    ok: true,
    action: "close_event".to_string(),
    event_id: event.event_id,
    backup: None,
    finalized_at: None,
    ranked_count: None,
    request_id,
  })
}

// ─── delete_event ────────────────────────────────────────────────────────────

async fn delete_event<S>(
  state: &AppState<S>,
  ctx: &AdminContext,
  event: Event,
  request_id: Uuid,
) -> Result<EventActionResponse, ApiError>
where
  S: PlatformStore,
{
  let backup = state
    .store
    .delete_event(event.event_id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::EventNotFound(event.event_id))?;
  tracing::info!(
    %request_id,
    event_id = %event.event_id,
    submissions = backup.submissions,
    "event deleted"
  );

  let backup_json =
    serde_json::to_value(&backup).map_err(|e| ApiError::Store(Box::new(e)))?;

  record_audit(
    state,
    ctx,
    "delete_event",
    event.event_id,
    json!({ "title": event.title, "backup": backup_json }),
  )
  .await?;

  Ok(EventActionResponse {
    ok: true,
    action: "delete_event".to_string(),
    event_id: event.event_id,
    backup: Some(backup_json),
    finalized_at: None,
    ranked_count: None,
    request_id,
  })
}

// ─── finalize_results ────────────────────────────────────────────────────────

async fn finalize_results<S>(
  state: &AppState<S>,
  ctx: &AdminContext,
  event: Event,
  request_id: Uuid,
  now: DateTime<Utc>,
) -> Result<EventActionResponse, ApiError>
where
  S: PlatformStore,
{
  ensure_finalizable(&event).map_err(ApiError::from_core)?;

  let submissions = state
    .store
    .ranking_submissions(event.event_id)
    .await
    .map_err(ApiError::store)?;
  let judgments = state
    .store
    .judgments_for_event(event.event_id)
    .await
    .map_err(ApiError::store)?;

  let ranked =
    rank(event.event_id, &submissions, &judgments).map_err(ApiError::from_core)?;

  // The precondition was checked above, but the write itself re-asserts it:
  // of two racing finalize calls only one commits, the other lands here.
  let committed = state
    .store
    .finalize_event(event.event_id, &ranked, now)
    .await
    .map_err(ApiError::store)?;
  if !committed {
    return Err(ApiError::AlreadyFinalized(event.event_id));
  }
  tracing::info!(
    %request_id,
    event_id = %event.event_id,
    ranked = ranked.len(),
    "results finalized"
  );

  record_audit(
    state,
    ctx,
    "finalize_results",
    event.event_id,
    json!({
      "title": event.title,
      "finalized_count": ranked.len(),
      "finalized_at": now,
    }),
  )
  .await?;

  Ok(EventActionResponse {
    ok: true,
    action: "finalize_results".to_string(),
    event_id: event.event_id,
    backup: None,
    finalized_at: Some(now),
    ranked_count: Some(ranked.len()),
    request_id,
  })
}

// ─── Audit helper ────────────────────────────────────────────────────────────

/// Append the audit entry for a mutation that already succeeded. A failure
/// here is reported to the caller as `AUDIT_LOG_FAILED`; the mutation is
/// not rolled back.
async fn record_audit<S>(
  state: &AppState<S>,
  ctx: &AdminContext,
  action: &str,
  event_id: Uuid,
  metadata: serde_json::Value,
) -> Result<(), ApiError>
where
  S: PlatformStore,
{
  state
    .store
    .append_audit(NewAuditLogEntry {
      actor_id:    ctx.identity_id,
      action:      action.to_string(),
      target_type: "event".to_string(),
      target_id:   event_id.to_string(),
      metadata,
    })
    .await
    .map(|_| ())
    .map_err(|e| ApiError::AuditLogFailed(Box::new(e)))
}
