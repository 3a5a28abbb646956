//! `POST /admin/audit-logs` — recent audit entries with actor details
//! resolved.

use std::collections::HashMap;

use axum::{extract::State, http::HeaderMap, response::Response};
use chrono::Utc;
use laurel_core::{
  audit::AuditLogEntry, store::PlatformStore, user::employee_no_from_email,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  auth::{extract_access_token, require_admin},
  error::{ApiError, respond},
  handlers::parse_body,
  ratelimit,
};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditLogsRequest {
  pub access_token: Option<String>,
  pub limit:        Option<i64>,
}

/// An audit entry with the actor's name and employee number resolved from
/// their profile row. `-` placeholders stand in for unknown actors.
#[derive(Debug, Serialize)]
pub struct EnrichedAuditEntry {
  #[serde(flatten)]
  pub entry:             AuditLogEntry,
  pub actor_name:        String,
  pub actor_employee_no: String,
}

#[derive(Debug, Serialize)]
pub struct AuditLogsResponse {
  pub logs:       Vec<EnrichedAuditEntry>,
  pub request_id: Uuid,
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
  let req: AuditLogsRequest = parse_body(&body);
  respond(run(&state, &headers, req, request_id).await, request_id)
}

async fn run<S>(
  state: &AppState<S>,
  headers: &HeaderMap,
  req: AuditLogsRequest,
  request_id: Uuid,
) -> Result<AuditLogsResponse, ApiError>
where
  S: PlatformStore,
{
  let now = Utc::now();
  let token = extract_access_token(headers, req.access_token);
  let ctx = require_admin(state.store.as_ref(), token, now).await?;
  ratelimit::enforce(state, "audit-logs", ctx.identity_id, now).await?;

  let limit = req.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize;
  let entries = state
    .store
    .list_audit(limit)
    .await
    .map_err(ApiError::store)?;

  // One batched lookup for all distinct actors.
  let mut actor_ids: Vec<Uuid> = entries.iter().map(|e| e.actor_id).collect();
  actor_ids.sort_unstable();
  actor_ids.dedup();
  let actors: HashMap<Uuid, (String, String)> = state
    .store
    .get_users_by_ids(&actor_ids)
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .map(|user| {
      let name = user.name.unwrap_or_else(|| "-".to_string());
      let employee_no = employee_no_from_email(&user.email)
        .unwrap_or("-")
        .to_string();
      (user.user_id, (name, employee_no))
    })
    .collect();

  let logs = entries
    .into_iter()
    .map(|entry| {
      let (actor_name, actor_employee_no) = actors
        .get(&entry.actor_id)
        .cloned()
        .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
      EnrichedAuditEntry { entry, actor_name, actor_employee_no }
    })
    .collect();

  Ok(AuditLogsResponse { logs, request_id })
}
