//! `POST /admin/dashboard-metrics` — event health metrics and the
//! delayed-event list.

use axum::{extract::State, http::HeaderMap, response::Response};
use chrono::Utc;
use laurel_core::{
  metrics::{
    DashboardFilters, DashboardTotals, EventDepartmentStats, EventProgress,
    StatusFilter, dashboard,
  },
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
pub struct MetricsRequest {
  pub access_token:     Option<String>,
  pub near_days:        Option<i64>,
  pub review_threshold: Option<f64>,
  pub status_filter:    Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
  pub metrics:                DashboardTotals,
  pub delayed_events:         Vec<EventProgress>,
  pub event_department_stats: Vec<EventDepartmentStats>,
  pub filters:                DashboardFilters,
  #[serde(rename = "request_id")]
  pub request_id:             Uuid,
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
  let req: MetricsRequest = parse_body(&body);
  respond(run(&state, &headers, req, request_id).await, request_id)
}

async fn run<S>(
  state: &AppState<S>,
  headers: &HeaderMap,
  req: MetricsRequest,
  request_id: Uuid,
) -> Result<MetricsResponse, ApiError>
where
  S: PlatformStore,
{
  let now = Utc::now();
  let token = extract_access_token(headers, req.access_token);
  let ctx = require_admin(state.store.as_ref(), token, now).await?;
  ratelimit::enforce(state, "dashboard-metrics", ctx.identity_id, now).await?;

  // Unknown filter strings fall back to "all", like every other
  // out-of-range filter value.
  let status_filter = req.status_filter.as_deref().and_then(parse_status_filter);
  let filters =
    DashboardFilters::clamped(req.near_days, req.review_threshold, status_filter);

  let events = state.store.list_events().await.map_err(ApiError::store)?;
  let snapshot = state
    .store
    .progress_snapshot()
    .await
    .map_err(ApiError::store)?;

  let (_per_event, metrics, delayed_events) =
    dashboard(&events, &snapshot, &filters, now.date_naive());

  Ok(MetricsResponse {
    metrics,
    delayed_events,
    event_department_stats: snapshot.department_stats,
    filters,
    request_id,
  })
}

fn parse_status_filter(s: &str) -> Option<StatusFilter> {
  match s {
    "all" => Some(StatusFilter::All),
    "draft" => Some(StatusFilter::Draft),
    "active" => Some(StatusFilter::Active),
    "closed" => Some(StatusFilter::Closed),
    _ => None,
  }
}
