//! `POST /admin/judgment-analytics` — per-judge scoring statistics.

use std::collections::HashMap;

use axum::{extract::State, http::HeaderMap, response::Response};
use chrono::Utc;
use laurel_core::{
  analytics::{JudgeStats, judge_stats},
  store::PlatformStore,
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

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsRequest {
  pub access_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
  pub stats:      Vec<JudgeStats>,
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
  let req: AnalyticsRequest = parse_body(&body);
  respond(run(&state, &headers, req, request_id).await, request_id)
}

async fn run<S>(
  state: &AppState<S>,
  headers: &HeaderMap,
  req: AnalyticsRequest,
  request_id: Uuid,
) -> Result<AnalyticsResponse, ApiError>
where
  S: PlatformStore,
{
  let now = Utc::now();
  let token = extract_access_token(headers, req.access_token);
  let ctx = require_admin(state.store.as_ref(), token, now).await?;
  ratelimit::enforce(state, "judgment-analytics", ctx.identity_id, now).await?;

  let scores = state
    .store
    .list_judgment_scores()
    .await
    .map_err(ApiError::store)?;

  let mut judge_ids: Vec<Uuid> = scores.iter().map(|s| s.judge_id).collect();
  judge_ids.sort_unstable();
  judge_ids.dedup();
  let names: HashMap<Uuid, (String, String)> = state
    .store
    .get_users_by_ids(&judge_ids)
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .map(|user| {
      (
        user.user_id,
        (
          user.name.unwrap_or_else(|| "unknown".to_string()),
          user.department.unwrap_or_default(),
        ),
      )
    })
    .collect();

  Ok(AnalyticsResponse {
    stats: judge_stats(&scores, &names),
    request_id,
  })
}
